// src/api/resource.rs

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use validator::Validate;

use crate::{api::client::ApiClient, common::error::AppResult};

/// Id opaco atribuído pelo backend.
pub type EntityId = i64;

/// Registro pertencente ao servidor, com o formulário (rascunho) que o cria/edita.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Draft: Serialize + Validate + Send + Sync;

    fn id(&self) -> EntityId;
}

/// Campos de texto usados pela busca da tela.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Uma coleção remota (lista + CRUD). É a costura que permite trocar a API
/// REST por uma implementação em memória nos testes.
#[async_trait]
pub trait RemoteCollection: Send + Sync + 'static {
    type Entity: Entity;

    fn endpoint(&self) -> &str;

    async fn list(&self) -> AppResult<Vec<Self::Entity>>;

    async fn create(&self, draft: &<Self::Entity as Entity>::Draft) -> AppResult<Self::Entity>;

    async fn update(
        &self,
        id: EntityId,
        draft: &<Self::Entity as Entity>::Draft,
    ) -> AppResult<Self::Entity>;

    /// Atualização parcial (toggles).
    async fn patch(&self, id: EntityId, patch: &Value) -> AppResult<Self::Entity>;

    async fn remove(&self, id: EntityId) -> AppResult<()>;
}

/// Recurso REST convencional: `GET/POST {endpoint}`, `PUT/PATCH/DELETE {endpoint}{id}/`.
#[derive(Debug, Clone)]
pub struct RestCollection<T> {
    client: ApiClient,
    endpoint: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> RestCollection<T> {
    pub fn new(client: ApiClient, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let endpoint = format!("/{}/", endpoint.trim_matches('/'));
        Self { client, endpoint, _marker: PhantomData }
    }

    pub fn detail_path(&self, id: EntityId) -> String {
        format!("{}{}/", self.endpoint, id)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl<T: Entity> RemoteCollection for RestCollection<T> {
    type Entity = T;

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list(&self) -> AppResult<Vec<T>> {
        self.client.get_json(&self.endpoint).await
    }

    async fn create(&self, draft: &T::Draft) -> AppResult<T> {
        self.client.post_json(&self.endpoint, draft).await
    }

    async fn update(&self, id: EntityId, draft: &T::Draft) -> AppResult<T> {
        self.client.put_json(&self.detail_path(id), draft).await
    }

    async fn patch(&self, id: EntityId, patch: &Value) -> AppResult<T> {
        self.client.patch_json(&self.detail_path(id), patch).await
    }

    async fn remove(&self, id: EntityId) -> AppResult<()> {
        self.client.delete(&self.detail_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::i18n::Locale, models::catalog::Specialty, session::SessionContext};
    use std::time::Duration;

    #[test]
    fn endpoints_are_normalized() {
        let client = ApiClient::new(
            "http://localhost:8000/api",
            Duration::from_secs(1),
            SessionContext::new(),
            Locale::Pt,
        )
        .unwrap();
        let specialties = RestCollection::<Specialty>::new(client, "specialties");
        assert_eq!(specialties.endpoint(), "/specialties/");
        assert_eq!(specialties.detail_path(12), "/specialties/12/");
    }
}
