//! User-visible notices.
//!
//! The engine never shows anything itself; it hands [`Notice`]s to an injected
//! [`NotificationSink`]. The CLI prints them, tests collect them.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Receives notices meant for the user
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!(title = %notice.title, "{}", notice.description),
            NoticeLevel::Warning => warn!(title = %notice.title, "{}", notice.description),
            NoticeLevel::Info | NoticeLevel::Success => {
                info!(title = %notice.title, "{}", notice.description)
            }
        }
    }
}

/// Sink that keeps every notice in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notices received so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drain the notices received so far
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|notice| notice.level == level).count()
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.notify(Notice::new(NoticeLevel::Success, "Success", "Saved"));
        sink.notify(Notice::new(NoticeLevel::Error, "Error", "Failed"));

        assert_eq!(sink.count(NoticeLevel::Error), 1);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.notices().is_empty());
    }
}
