//! FICCT Core - Shared error, configuration and logging types
//!
//! Every other crate in the workspace reports failures through [`FicctError`]
//! and reads its settings from [`FicctConfig`].

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
