// src/process/mod.rs

//! External process supervision.
//!
//! Commands run through the platform shell. Stdout and stderr are drained
//! concurrently while the process runs, and on timeout or cancellation the
//! whole process tree is brought down, not just the direct child.

mod capture;
pub mod command;
pub mod outcome;
pub mod supervisor;
pub mod tree;

pub use command::ShellCommand;
pub use outcome::ProcessOutcome;
pub use supervisor::{ProcessHandle, ProcessSupervisor};
pub use tree::ProcessTree;
