// src/sync/testing.rs

// Coleção remota em memória para os testes das camadas de sincronização.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    api::resource::{Entity, EntityId, RemoteCollection},
    common::error::{AppError, AppResult},
    models::{
        auth::{User, UserDraft},
        patient::{Patient, PatientDraft},
    },
};

type Builder<T> = Arc<dyn Fn(EntityId, &<T as Entity>::Draft) -> T + Send + Sync>;

#[derive(Clone)]
pub struct FakeRemote<T: Entity> {
    items: Arc<Mutex<Vec<T>>>,
    next_id: Arc<AtomicI64>,
    fail_list: Arc<AtomicBool>,
    fail_mutation: Arc<Mutex<Option<(u16, Option<String>)>>>,
    delay: Duration,
    pub creates: Arc<AtomicUsize>,
    pub patches: Arc<AtomicUsize>,
    build: Builder<T>,
}

impl<T: Entity> FakeRemote<T> {
    pub fn new(items: Vec<T>, build: impl Fn(EntityId, &T::Draft) -> T + Send + Sync + 'static) -> Self {
        let next_id = items.iter().map(Entity::id).max().unwrap_or(0) + 1;
        Self {
            items: Arc::new(Mutex::new(items)),
            next_id: Arc::new(AtomicI64::new(next_id)),
            fail_list: Arc::new(AtomicBool::new(false)),
            fail_mutation: Arc::new(Mutex::new(None)),
            delay: Duration::ZERO,
            creates: Arc::new(AtomicUsize::new(0)),
            patches: Arc::new(AtomicUsize::new(0)),
            build: Arc::new(build),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn replace(&self, items: Vec<T>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn server_items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    pub fn fail_next_list(&self) {
        self.fail_list.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_mutation(&self, status: u16, message: Option<&str>) {
        *self.fail_mutation.lock().unwrap() = Some((status, message.map(str::to_string)));
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn take_failure(&self) -> AppResult<()> {
        match self.fail_mutation.lock().unwrap().take() {
            Some((status, message)) => Err(AppError::Server { status, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<T: Entity> RemoteCollection for FakeRemote<T> {
    type Entity = T;

    fn endpoint(&self) -> &str {
        "/fake/"
    }

    async fn list(&self) -> AppResult<Vec<T>> {
        self.pause().await;
        if self.fail_list.swap(false, Ordering::SeqCst) {
            return Err(AppError::Server { status: 500, message: None });
        }
        Ok(self.server_items())
    }

    async fn create(&self, draft: &T::Draft) -> AppResult<T> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.take_failure()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entity = (self.build)(id, draft);
        self.items.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: EntityId, draft: &T::Draft) -> AppResult<T> {
        self.pause().await;
        self.take_failure()?;
        let entity = (self.build)(id, draft);
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| AppError::NotFound(format!("/fake/{id}/")))?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn patch(&self, id: EntityId, patch: &Value) -> AppResult<T> {
        self.patches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.take_failure()?;
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| AppError::NotFound(format!("/fake/{id}/")))?;

        // Merge raso do JSON, como um PATCH de verdade
        let mut current = serde_json::to_value(&*slot)?;
        if let (Some(target), Some(changes)) = (current.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        *slot = serde_json::from_value(current)?;
        Ok(slot.clone())
    }

    async fn remove(&self, id: EntityId) -> AppResult<()> {
        self.pause().await;
        self.take_failure()?;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Err(AppError::NotFound(format!("/fake/{id}/")));
        }
        Ok(())
    }
}

// --- Fixtures ---

pub fn patient(id: EntityId, name: &str, document_id: Option<&str>) -> Patient {
    Patient {
        id,
        name: name.to_string(),
        document_id: document_id.map(str::to_string),
        birth_date: None,
        phone: None,
        email: None,
        insurance_provider: None,
        insurance_plan: None,
        visit_count: 0,
    }
}

pub fn patient_draft(name: &str) -> PatientDraft {
    PatientDraft { name: name.to_string(), ..Default::default() }
}

pub fn patients_remote(items: Vec<Patient>) -> FakeRemote<Patient> {
    FakeRemote::new(items, |id, draft: &PatientDraft| Patient {
        id,
        name: draft.name.clone(),
        document_id: draft.document_id.clone(),
        birth_date: draft.birth_date,
        phone: draft.phone.clone(),
        email: draft.email.clone(),
        insurance_provider: draft.insurance_provider,
        insurance_plan: draft.insurance_plan,
        visit_count: 0,
    })
}

pub fn user(id: EntityId, username: &str, is_active: bool) -> User {
    User {
        id,
        username: username.to_string(),
        full_name: None,
        email: None,
        role: None,
        is_active,
    }
}

pub fn users_remote(items: Vec<User>) -> FakeRemote<User> {
    FakeRemote::new(items, |id, draft: &UserDraft| User {
        id,
        username: draft.username.clone(),
        full_name: draft.full_name.clone(),
        email: draft.email.clone(),
        role: draft.role.clone(),
        is_active: draft.is_active,
    })
}
