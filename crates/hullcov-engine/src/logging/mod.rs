//! Logging setup.
//!
//! Library code only uses the `log` facade. Binaries call [`init_logging`]
//! once to install `env_logger`.

mod init;

pub use init::{LoggingConfig, init_logging};
