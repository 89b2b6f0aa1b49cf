// src/session.rs

// Contexto de sessão injetável: token + perfil do usuário logado.
//
// Ciclo de vida:
//   Anonymous --set()--> Authenticated --clear()--> Anonymous   (logout)
//                                      --expire()-> Expired     (401 do backend)
// Expired significa "mande o usuário para a tela de login".

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::models::auth::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Session>>>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SessionStatus::Anonymous);
        Self {
            inner: Arc::new(RwLock::new(None)),
            status: Arc::new(status),
        }
    }

    /// Sessão já autenticada (útil em testes e ao restaurar um token salvo).
    pub fn with_token(token: impl Into<String>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Authenticated);
        Self {
            inner: Arc::new(RwLock::new(Some(Session { token: token.into(), user: None }))),
            status: Arc::new(status),
        }
    }

    pub async fn get(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.inner.read().await.as_ref().and_then(|s| s.user.clone())
    }

    /// Preenchida no login.
    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
        self.status.send_replace(SessionStatus::Authenticated);
    }

    pub async fn set_user(&self, user: UserProfile) {
        if let Some(session) = self.inner.write().await.as_mut() {
            session.user = Some(user);
        }
    }

    /// Logout explícito.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
        self.status.send_replace(SessionStatus::Anonymous);
    }

    /// Token rejeitado pelo backend: limpa e sinaliza que é preciso logar de novo.
    pub async fn expire(&self) {
        let had_session = self.inner.write().await.take().is_some();
        if had_session {
            tracing::warn!("🔒 Sessão expirada, redirecionando para o login.");
        }
        self.status.send_replace(SessionStatus::Expired);
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Para a camada de navegação reagir a login/logout/expiração.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle_transitions() {
        let session = SessionContext::new();
        let mut watcher = session.subscribe();
        assert_eq!(session.status(), SessionStatus::Anonymous);

        session.set(Session { token: "abc".into(), user: None }).await;
        assert!(session.is_authenticated());
        assert_eq!(session.token().await.as_deref(), Some("abc"));
        assert!(watcher.has_changed().unwrap());
        assert_eq!(*watcher.borrow_and_update(), SessionStatus::Authenticated);

        session.expire().await;
        assert_eq!(session.status(), SessionStatus::Expired);
        assert!(session.token().await.is_none());

        session.set(Session { token: "def".into(), user: None }).await;
        session.clear().await;
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(session.get().await.is_none());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let session = SessionContext::new();
        let other = session.clone();
        session.set(Session { token: "t".into(), user: None }).await;
        assert!(other.is_authenticated());
        assert_eq!(other.token().await.as_deref(), Some("t"));
    }
}
