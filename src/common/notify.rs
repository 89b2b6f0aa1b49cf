// src/common/notify.rs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// Quantas notificações ficam na fila antes de descartar as mais antigas
const MAX_PENDING: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Mensagem transitória (toast/snackbar) mostrada ao usuário.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Fila compartilhada de notificações. Clonar compartilha a mesma fila.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<VecDeque<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, notification: Notification) -> Notification {
        match notification.level {
            NotificationLevel::Error => tracing::warn!("🔔 {}", notification.message),
            _ => tracing::debug!("🔔 {}", notification.message),
        }

        let mut queue = self.lock();
        if queue.len() == MAX_PENDING {
            queue.pop_front();
        }
        queue.push_back(notification.clone());
        notification
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.push(Notification::new(NotificationLevel::Success, message))
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.push(Notification::new(NotificationLevel::Error, message))
    }

    pub fn pending(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().back().cloned()
    }

    /// Remove e devolve tudo o que estava na fila (a view exibe e esquece).
    pub fn drain(&self) -> Vec<Notification> {
        self.lock().drain(..).collect()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue() {
        let notifier = Notifier::new();
        notifier.success("ok");
        notifier.error("falhou");

        let drained = notifier.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained[1].is_error());
        assert!(notifier.pending().is_empty());
    }

    #[test]
    fn oldest_notifications_are_dropped_when_full() {
        let notifier = Notifier::new();
        for i in 0..(MAX_PENDING + 5) {
            notifier.error(format!("erro {i}"));
        }
        let pending = notifier.pending();
        assert_eq!(pending.len(), MAX_PENDING);
        assert_eq!(pending[0].message, "erro 5");
    }

    #[test]
    fn dismiss_removes_by_id() {
        let notifier = Notifier::new();
        let note = notifier.error("x");
        assert!(notifier.dismiss(note.id));
        assert!(!notifier.dismiss(note.id));
    }
}
