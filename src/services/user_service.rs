// src/services/user_service.rs

use serde_json::json;

use crate::{
    api::{ApiClient, EntityId},
    common::{error::AppError, notify::Notifier},
    models::auth::User,
    services::{RestMutations, rest_mutations},
    sync::{SubmitOutcome, derive, mutation::notify_failure},
};

/// Gestão de usuários do sistema.
pub struct UserService {
    notifier: Notifier,
    client: ApiClient,
    pub users: RestMutations<User>,
}

impl UserService {
    pub fn new(client: ApiClient, notifier: Notifier) -> Self {
        let users = rest_mutations(&client, &notifier, "users");
        Self { notifier, client, users }
    }

    pub fn search(&self, term: &str) -> Vec<User> {
        self.users
            .store()
            .with_items(|items| derive::search(items, term).into_iter().cloned().collect())
    }

    /// Ativa/desativa na hora; se o servidor recusar, o valor anterior volta.
    pub async fn toggle_active(&self, id: EntityId) -> SubmitOutcome<User> {
        let Some(current) = self.users.store().get(id) else {
            let err = AppError::NotFound(format!("/users/{}/", id));
            return notify_failure(Err(err), &self.notifier, self.client.locale());
        };

        let next = !current.is_active;
        tracing::info!("Usuário '{}' -> ativo = {}", current.username, next);
        self.users
            .toggle(id, |u| u.is_active = next, json!({ "is_active": next }))
            .await
    }
}
