//! Background Tasks Module
//!
//! Contains the scavenger loop that runs for the lifetime of a cache
//! manager instance.

mod scavenger;

pub(crate) use scavenger::spawn_scavenger_task;
