//! Notifications Module
//!
//! User-facing event queue. This module only holds the list; the store owns
//! the removal timers and calls back into it when one fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notifications rendered at once; older ones stay until cleared.
pub const MAX_VISIBLE: usize = 5;

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Button attached to a notification.
///
/// `action` is an identifier the presentation layer maps to a store action,
/// e.g. `"connection.reconnect"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub action: String,
}

impl NotificationAction {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
}

/// Content of a notification before the center assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub actions: Vec<NotificationAction>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            actions: Vec::new(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }
}

// == Notification Center ==
/// Newest-first list of notifications with monotonic id assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    next_id: NotificationId,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends a notification and returns its id.
    pub fn push(&mut self, new: NewNotification, now: DateTime<Utc>) -> NotificationId {
        self.next_id += 1;
        let id = self.next_id;
        self.items.insert(
            0,
            Notification {
                id,
                kind: new.kind,
                title: new.title,
                message: new.message,
                created_at: now,
                read: false,
                actions: new.actions,
            },
        );
        id
    }

    /// Removes a notification. Returns `false` when it was already gone.
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(item) => {
                item.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for item in &mut self.items {
            item.read = true;
        }
    }

    /// Drops every notification; ids keep increasing afterwards.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn all(&self) -> &[Notification] {
        &self.items
    }

    /// The most recent notifications, newest first.
    pub fn visible(&self) -> &[Notification] {
        &self.items[..self.items.len().min(MAX_VISIBLE)]
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.items.iter().any(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_prepends_with_monotonic_ids() {
        let mut center = NotificationCenter::new();
        let first = center.push(NewNotification::info("a", "first"), Utc::now());
        let second = center.push(NewNotification::info("b", "second"), Utc::now());

        assert!(second > first);
        assert_eq!(center.all()[0].id, second);
        assert_eq!(center.unread_count(), 2);
    }

    #[test]
    fn test_visible_caps_at_five() {
        let mut center = NotificationCenter::new();
        for i in 0..8 {
            center.push(NewNotification::info("n", format!("{}", i)), Utc::now());
        }

        assert_eq!(center.len(), 8);
        assert_eq!(center.visible().len(), MAX_VISIBLE);
        assert_eq!(center.visible()[0].message, "7");
    }

    #[test]
    fn test_remove_twice_reports_missing() {
        let mut center = NotificationCenter::new();
        let id = center.push(NewNotification::warning("w", "m"), Utc::now());

        assert!(center.remove(id));
        assert!(!center.remove(id));
    }

    #[test]
    fn test_ids_survive_clear() {
        let mut center = NotificationCenter::new();
        let id = center.push(NewNotification::error("e", "m"), Utc::now());
        center.clear();
        let next = center.push(NewNotification::error("e", "m"), Utc::now());
        assert!(next > id);
    }

    #[test]
    fn test_mark_read() {
        let mut center = NotificationCenter::new();
        let id = center.push(NewNotification::success("s", "m"), Utc::now());
        center.push(NewNotification::success("s", "m"), Utc::now());

        assert!(center.mark_read(id));
        assert_eq!(center.unread_count(), 1);
        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
    }
}
