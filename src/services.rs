// src/services.rs

// Serviços de tela: cada um junta o cache, as visões derivadas e as mutações
// de que uma página precisa.

pub mod agenda_service;
pub mod auth;
pub mod catalog_service;
pub mod chat_service;
pub mod clinical_service;
pub mod dashboard_service;
pub mod document_service;
pub mod finance_service;
pub mod patient_service;
pub mod user_service;

use std::sync::Arc;

use crate::{
    api::{ApiClient, Entity, RestCollection},
    common::notify::Notifier,
    sync::{CollectionStore, Mutations},
};

pub type RestStore<T> = CollectionStore<RestCollection<T>>;
pub type RestMutations<T> = Mutations<RestCollection<T>>;

/// Cache + mutações de um endpoint REST, com a reconciliação padrão (recarga).
pub fn rest_mutations<T: Entity>(
    client: &ApiClient,
    notifier: &Notifier,
    endpoint: impl Into<String>,
) -> RestMutations<T> {
    let store = Arc::new(CollectionStore::new(RestCollection::new(client.clone(), endpoint)));
    Mutations::new(store, notifier.clone(), client.locale())
}
