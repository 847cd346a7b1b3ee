//! The quarry command-line importer.
//!
//! Resolves config and log directories, runs the import with Ctrl-C
//! cancellation and terminal progress, summarizes the result and pastes it
//! into an [`EditSession`].

pub mod platform;
pub mod progress;
pub mod report;
pub mod runner;
pub mod session;

pub use platform::{PlatformDirs, PlatformError};
pub use progress::TerminalProgress;
pub use session::EditSession;
