// src/services/auth.rs

use validator::Validate;

use crate::{
    api::ApiClient,
    common::error::AppResult,
    models::auth::{AuthResponse, LoginPayload, UserProfile},
    session::Session,
};

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Autentica, guarda o token na sessão e devolve o perfil do usuário.
    pub async fn login(&self, payload: &LoginPayload) -> AppResult<UserProfile> {
        payload.validate()?;

        // Um token velho não deve acompanhar o pedido de login
        self.client.session().clear().await;

        let response: AuthResponse = self.client.post_json("/auth/login/", payload).await?;

        self.client
            .session()
            .set(Session { token: response.token, user: response.user.clone() })
            .await;

        let profile = match response.user {
            Some(profile) => profile,
            // Alguns backends devolvem só o token
            None => self.restore_profile().await?,
        };

        tracing::info!("✅ Login de '{}' realizado", profile.username);
        Ok(profile)
    }

    /// Recarrega o perfil do usuário logado (ex: ao reabrir o app com token salvo).
    pub async fn restore_profile(&self) -> AppResult<UserProfile> {
        let profile: UserProfile = self.client.get_json("/auth/me/").await?;
        self.client.session().set_user(profile.clone()).await;
        Ok(profile)
    }

    /// Logout sempre limpa a sessão local, mesmo se o servidor falhar.
    pub async fn logout(&self) {
        if self.client.session().token().await.is_some() {
            if let Err(e) = self.client.post_empty("/auth/logout/").await {
                tracing::warn!("Falha ao invalidar o token no servidor: {}", e);
            }
        }
        self.client.session().clear().await;
        tracing::info!("Sessão encerrada");
    }
}
