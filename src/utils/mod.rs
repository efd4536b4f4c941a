// src/utils/mod.rs

pub mod error;
pub mod logger;
pub mod time;

// Re-export commonly used items
pub use error::{EconomyError, EconomyResult, ErrorKind};
pub use logger::{init_logger, logger, Logger};
pub use time::{Clock, FixedClock, SystemClock};
