//! Probe construction.
//!
//! Turns a set of names and host entries into a deterministic, idempotent
//! shell probe program plus the exact set of evidence identifiers the
//! program will produce. Pure code generation: no I/O, no concurrency.

pub mod compiler;
pub mod evidence;
pub mod lookup;
