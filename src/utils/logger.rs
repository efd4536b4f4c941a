// src/utils/logger.rs

//! Structured event logging.
//!
//! Events are rendered as single-line JSON objects and handed to the `log`
//! facade under the `guild_economy` target, so whichever `log` backend the
//! host bot installs decides where they end up.

use crate::types::GuildId;
use log::{Level, LevelFilter};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::OnceLock;

pub const LOG_TARGET: &str = "guild_economy";

#[derive(Debug, Clone)]
pub struct Logger {
    level: LevelFilter,
    context: Map<String, Value>,
}

impl Logger {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            context: Map::new(),
        }
    }

    /// Level from `LOG_LEVEL`, defaulting to info when unset or unparseable.
    pub fn from_env() -> Self {
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
            .unwrap_or(LevelFilter::Info);
        Self::new(level)
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn with_context(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut child = self.clone();
        child.context.insert(key.to_string(), value.into());
        child
    }

    /// Child logger tagging every event with the guild id.
    pub fn for_guild(&self, guild_id: GuildId) -> Self {
        self.with_context("guild_id", guild_id)
    }

    fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn render(&self, level: Level, message: &str, meta: Option<&Value>) -> String {
        let mut event = Map::new();
        event.insert(
            "timestamp".to_string(),
            Value::String(
                chrono::Utc::now()
                    .format("%Y-%m-%d %H:%M:%S%.3f UTC")
                    .to_string(),
            ),
        );
        event.insert("level".to_string(), Value::String(level.to_string()));
        event.insert("message".to_string(), Value::String(message.to_string()));
        if !self.context.is_empty() {
            event.insert("context".to_string(), Value::Object(self.context.clone()));
        }
        if let Some(meta) = meta {
            event.insert("meta".to_string(), meta.clone());
        }
        Value::Object(event).to_string()
    }

    pub fn event(&self, level: Level, message: &str, meta: Option<&Value>) {
        if self.enabled(level) {
            log::log!(target: LOG_TARGET, level, "{}", self.render(level, message, meta));
        }
    }

    pub fn error(&self, message: &str, meta: Option<&Value>) {
        self.event(Level::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&Value>) {
        self.event(Level::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&Value>) {
        self.event(Level::Info, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&Value>) {
        self.event(Level::Debug, message, meta);
    }
}

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Sets the process-wide logger. Later calls are ignored.
pub fn init_logger(level: LevelFilter) {
    GLOBAL_LOGGER.set(Logger::new(level)).ok();
}

pub fn logger() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::from_env)
}

#[macro_export]
macro_rules! log_error {
    ($msg:expr) => {
        $crate::utils::logger::logger().error($msg, None)
    };
    ($msg:expr, $meta:expr) => {
        $crate::utils::logger::logger().error($msg, Some(&$meta))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($msg:expr) => {
        $crate::utils::logger::logger().warn($msg, None)
    };
    ($msg:expr, $meta:expr) => {
        $crate::utils::logger::logger().warn($msg, Some(&$meta))
    };
}

#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        $crate::utils::logger::logger().info($msg, None)
    };
    ($msg:expr, $meta:expr) => {
        $crate::utils::logger::logger().info($msg, Some(&$meta))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($msg:expr) => {
        $crate::utils::logger::logger().debug($msg, None)
    };
    ($msg:expr, $meta:expr) => {
        $crate::utils::logger::logger().debug($msg, Some(&$meta))
    };
}
