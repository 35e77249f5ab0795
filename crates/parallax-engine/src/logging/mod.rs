//! Logger initialization on top of the `log` facade (`env_logger` backend).

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
