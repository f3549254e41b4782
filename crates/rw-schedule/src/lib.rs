//! `rw-schedule` — the time-ordered pending-start queue.
//!
//! # Why this exists
//!
//! Most scheduled trains are not due most ticks.  The dispatcher never scans
//! them; it asks the queue for the earliest start time (O(1) on a sorted
//! queue) and drains the due prefix only when that time has arrived.
//!
//! Queue sizes are scheduled-train counts — dozens, not per-tick volume —
//! so the backing store is a plain `Vec` kept sorted by an O(n) insertion
//! scan.  What matters is the ordering contract, not asymptotics: ties keep
//! insertion order because the scan inserts before the first entry whose
//! start time is *strictly* greater.

pub mod start_list;


pub use start_list::StartList;
