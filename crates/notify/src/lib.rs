//! User-facing notices shown by the portal flows
//!
//! Every flow outcome is reported through exactly one [`Notice`]. The trait
//! keeps the surface swappable: the CLI prints to the terminal, tests capture
//! what the user would have seen.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use strum::{AsRefStr, Display};

#[derive(Display, AsRefStr, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Prints notices to the terminal. Errors go to stderr so scripted callers
/// can keep stdout clean.
#[derive(Clone, Copy, Debug, Default)]
pub struct TermNotifier;

impl Notifier for TermNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Error => eprintln!("[{}] {}", notice.level, notice.message),
            _ => println!("[{}] {}", notice.level, notice.message),
        }
    }
}

/// Captures notices in order so tests can assert on exactly what the user
/// would have seen. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct BufferNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl BufferNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .map(|notice| notice.message)
            .collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }

    pub fn clear(&self) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for BufferNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
