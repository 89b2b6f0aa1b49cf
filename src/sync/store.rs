// src/sync/store.rs

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::{
    api::resource::{Entity, EntityId, RemoteCollection},
    common::error::AppResult,
};

struct CacheState<T> {
    items: Vec<T>,
    loaded: bool,
    error: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    // Resposta chegou depois do unmount ou de um load mais novo: ignorada
    Discarded,
}

/// Espelho em memória de uma coleção do servidor, durante a vida de uma tela.
///
/// `load()` substitui o array inteiro; em caso de falha marca o erro e mantém o
/// que já havia. Depois de `unmount()` nenhuma resposta em voo altera o estado.
pub struct CollectionStore<R: RemoteCollection> {
    remote: R,
    state: RwLock<CacheState<R::Entity>>,
    generation: AtomicU64,
    mounted: AtomicBool,
}

impl<R: RemoteCollection> CollectionStore<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            state: RwLock::new(CacheState {
                items: Vec::new(),
                loaded: false,
                error: None,
                loaded_at: None,
            }),
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<R::Entity>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<R::Entity>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_mounted() && self.generation.load(Ordering::SeqCst) == generation
    }

    // =========================================================================
    //  CARGA
    // =========================================================================

    pub async fn load(&self) -> AppResult<LoadOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.remote.list().await;

        if !self.is_current(generation) {
            tracing::debug!("Resposta de {} descartada (tela desmontada ou carga mais nova).", self.remote.endpoint());
            return Ok(LoadOutcome::Discarded);
        }

        let mut state = self.write();
        match result {
            Ok(items) => {
                let count = items.len();
                state.items = items;
                state.loaded = true;
                state.error = None;
                state.loaded_at = Some(Utc::now());
                tracing::debug!("{} carregado: {} registros", self.remote.endpoint(), count);
                Ok(LoadOutcome::Loaded { count })
            }
            Err(e) => {
                // Mantém o cache anterior (ou vazio na primeira carga)
                tracing::warn!("Falha ao carregar {}: {}", self.remote.endpoint(), e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Chamado depois de toda mutação bem-sucedida.
    pub async fn invalidate(&self) -> AppResult<LoadOutcome> {
        self.load().await
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub fn items(&self) -> Vec<R::Entity> {
        self.read().items.clone()
    }

    /// Acesso emprestado, sem clonar a coleção.
    pub fn with_items<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&[R::Entity]) -> O,
    {
        f(&self.read().items)
    }

    pub fn get(&self, id: EntityId) -> Option<R::Entity> {
        self.read().items.iter().find(|item| item.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        self.read().loaded_at
    }

    // =========================================================================
    //  ALTERAÇÕES LOCAIS (otimista / reconciliação por patch)
    // =========================================================================

    /// Aplica `f` no registro e devolve o valor anterior (para rollback).
    pub fn apply_local<F>(&self, id: EntityId, f: F) -> Option<R::Entity>
    where
        F: FnOnce(&mut R::Entity),
    {
        let mut state = self.write();
        let item = state.items.iter_mut().find(|item| item.id() == id)?;
        let prior = item.clone();
        f(item);
        Some(prior)
    }

    /// Recoloca um valor anterior no lugar do registro de mesmo id.
    pub fn restore(&self, prior: R::Entity) {
        let mut state = self.write();
        if let Some(item) = state.items.iter_mut().find(|item| item.id() == prior.id()) {
            *item = prior;
        }
    }

    pub fn upsert_local(&self, entity: R::Entity) {
        let mut state = self.write();
        match state.items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(item) => *item = entity,
            None => state.items.push(entity),
        }
    }

    pub fn remove_local(&self, id: EntityId) -> bool {
        let mut state = self.write();
        let before = state.items.len();
        state.items.retain(|item| item.id() != id);
        state.items.len() != before
    }
}
