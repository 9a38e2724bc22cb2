//! Mainbound — synchronous dispatch onto a designated main thread 🧵
//!
//! This crate guarantees that a unit of work executes on the one thread a
//! process has designated as its main thread, no matter which thread asks,
//! and hands control (and optionally a value) back to the caller only after
//! the work has completed. Calls made on the main thread itself run in place,
//! so nested dispatch cannot deadlock.
//!

mod main_thread;
mod wait;

pub use main_thread::{call_on_main, is_main_thread, run_on_main, MainLoop};
pub use wait::block_on;
