//! Desktop shell asset bootstrapper
//!
//! Chooses between the asset tree bundled with the application and the
//! updated copy in the writable working directory, syncs the newer one into
//! the working directory and schedules navigation to it.

pub mod bootstrap;
pub mod config;
pub mod host;
pub mod local_host;
pub mod log_buffer;
pub mod logging;
pub mod paths;
pub mod settings;
pub mod timer;
pub mod version;

pub use bootstrap::{BootError, BootOutcome, Bootstrapper};
pub use host::{HostEnvironment, HostError};
pub use local_host::LocalHost;
