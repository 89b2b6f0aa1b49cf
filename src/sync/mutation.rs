// src/sync/mutation.rs

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use validator::Validate;

use crate::{
    api::resource::{Entity, EntityId, RemoteCollection},
    common::{
        error::{AppError, AppResult},
        i18n::Locale,
        notify::{Notification, Notifier},
    },
    sync::store::CollectionStore,
};

type DraftOf<R> = <<R as RemoteCollection>::Entity as Entity>::Draft;

// =============================================================================
//  DIÁLOGO DE FORMULÁRIO
// =============================================================================

/// Estado de um formulário modal: aberto/fechado e "enviando".
#[derive(Debug, Default)]
pub struct FormDialog {
    open: AtomicBool,
    submitting: AtomicBool,
}

impl FormDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// `None` se já existe um envio em andamento.
    pub fn begin_submit(&self) -> Option<SubmitGuard<'_>> {
        self.submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SubmitGuard { flag: &self.submitting })
    }
}

/// Libera o formulário ao sair de escopo, inclusive em erro.
pub struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome<T> {
    Done(T),
    Failed(Notification),
    // Segundo envio enquanto o primeiro estava em voo
    Ignored,
}

impl<T> SubmitOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, SubmitOutcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            SubmitOutcome::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            SubmitOutcome::Failed(note) => Some(note),
            _ => None,
        }
    }
}

// =============================================================================
//  RECONCILIAÇÃO
// =============================================================================

/// Como o cache volta a refletir o servidor depois de uma mutação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Recarrega a coleção inteira.
    #[default]
    Refetch,
    /// Aplica só o registro devolvido pelo servidor.
    Patch,
}

/// Mutações sobre uma coleção cacheada: valida, envia, reconcilia e notifica.
pub struct Mutations<R: RemoteCollection> {
    store: Arc<CollectionStore<R>>,
    notifier: Notifier,
    locale: Locale,
    mode: ReconcileMode,
    // Registros com PATCH otimista em voo
    toggling: Mutex<HashSet<EntityId>>,
}

/// Marca um registro como "alternando" até sair de escopo.
struct ToggleGuard<'a> {
    toggling: &'a Mutex<HashSet<EntityId>>,
    id: EntityId,
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.toggling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl<R: RemoteCollection> Mutations<R> {
    pub fn new(store: Arc<CollectionStore<R>>, notifier: Notifier, locale: Locale) -> Self {
        Self {
            store,
            notifier,
            locale,
            mode: ReconcileMode::default(),
            toggling: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &Arc<CollectionStore<R>> {
        &self.store
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    pub async fn create(&self, dialog: &FormDialog, draft: &DraftOf<R>) -> SubmitOutcome<R::Entity> {
        let Some(_guard) = dialog.begin_submit() else {
            return SubmitOutcome::Ignored;
        };

        let result = match draft.validate() {
            Ok(()) => self.store.remote().create(draft).await,
            Err(e) => Err(AppError::from(e)),
        };

        match result {
            Ok(entity) => {
                tracing::info!("✅ Registro {} criado em {}", entity.id(), self.store.remote().endpoint());
                self.reconcile_saved(&entity).await;
                self.succeed(dialog, entity, "success.saved")
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn update(
        &self,
        dialog: &FormDialog,
        id: EntityId,
        draft: &DraftOf<R>,
    ) -> SubmitOutcome<R::Entity> {
        let Some(_guard) = dialog.begin_submit() else {
            return SubmitOutcome::Ignored;
        };

        let result = match draft.validate() {
            Ok(()) => self.store.remote().update(id, draft).await,
            Err(e) => Err(AppError::from(e)),
        };

        match result {
            Ok(entity) => {
                tracing::info!("✅ Registro {} atualizado em {}", id, self.store.remote().endpoint());
                self.reconcile_saved(&entity).await;
                self.succeed(dialog, entity, "success.saved")
            }
            Err(e) => self.fail(e),
        }
    }

    /// Exclusão disparada de uma linha da lista (confirmação já feita pela tela).
    pub async fn remove(&self, id: EntityId) -> SubmitOutcome<EntityId> {
        match self.store.remote().remove(id).await {
            Ok(()) => {
                tracing::info!("Registro {} removido de {}", id, self.store.remote().endpoint());
                self.reconcile_removed(id).await;
                self.notifier.success(self.locale.translate("success.removed"));
                SubmitOutcome::Done(id)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Exclusão a partir do formulário de edição.
    pub async fn remove_in(&self, dialog: &FormDialog, id: EntityId) -> SubmitOutcome<EntityId> {
        let Some(_guard) = dialog.begin_submit() else {
            return SubmitOutcome::Ignored;
        };

        let outcome = self.remove(id).await;
        if outcome.is_done() {
            dialog.close();
        }
        outcome
    }

    /// Atualização otimista: aplica no cache, envia o PATCH e desfaz se o
    /// servidor recusar. Não recarrega a coleção em caso de sucesso.
    ///
    /// Um segundo toggle no mesmo registro enquanto o primeiro está em voo é
    /// ignorado, como o duplo clique num formulário.
    pub async fn toggle<F>(&self, id: EntityId, apply: F, patch: Value) -> SubmitOutcome<R::Entity>
    where
        F: FnOnce(&mut R::Entity),
    {
        let Some(_guard) = self.begin_toggle(id) else {
            return SubmitOutcome::Ignored;
        };

        let Some(prior) = self.store.apply_local(id, apply) else {
            return self.fail(AppError::NotFound(format!("{}{}/", self.store.remote().endpoint(), id)));
        };

        match self.store.remote().patch(id, &patch).await {
            Ok(entity) => {
                if self.store.is_mounted() {
                    self.store.upsert_local(entity.clone());
                }
                SubmitOutcome::Done(entity)
            }
            Err(e) => {
                tracing::warn!("Alteração otimista em {} desfeita: {}", id, e);
                if self.store.is_mounted() {
                    self.store.restore(prior);
                }
                self.fail(e)
            }
        }
    }

    fn begin_toggle(&self, id: EntityId) -> Option<ToggleGuard<'_>> {
        let mut toggling = self.toggling.lock().unwrap_or_else(PoisonError::into_inner);
        toggling
            .insert(id)
            .then(|| ToggleGuard { toggling: &self.toggling, id })
    }

    // Uma falha no recarregamento não desfaz uma mutação já aceita pelo servidor
    async fn refetch(&self) {
        if let Err(e) = self.store.invalidate().await {
            tracing::warn!("Recarga de {} falhou após mutação: {}", self.store.remote().endpoint(), e);
        }
    }

    async fn reconcile_saved(&self, entity: &R::Entity) {
        match self.mode {
            ReconcileMode::Refetch => self.refetch().await,
            ReconcileMode::Patch if self.store.is_mounted() => self.store.upsert_local(entity.clone()),
            ReconcileMode::Patch => {}
        }
    }

    async fn reconcile_removed(&self, id: EntityId) {
        match self.mode {
            ReconcileMode::Refetch => self.refetch().await,
            ReconcileMode::Patch if self.store.is_mounted() => {
                self.store.remove_local(id);
            }
            ReconcileMode::Patch => {}
        }
    }

    fn succeed<T>(&self, dialog: &FormDialog, value: T, key: &str) -> SubmitOutcome<T> {
        dialog.close();
        self.notifier.success(self.locale.translate(key));
        SubmitOutcome::Done(value)
    }

    fn fail<T>(&self, err: AppError) -> SubmitOutcome<T> {
        let note = self.notifier.push(err.to_notification(self.locale));
        SubmitOutcome::Failed(note)
    }
}

/// Executa uma chamada avulsa (fora de `Mutations`) com a mesma política de
/// notificação de erro.
pub fn notify_failure<T>(result: AppResult<T>, notifier: &Notifier, locale: Locale) -> SubmitOutcome<T> {
    match result {
        Ok(value) => SubmitOutcome::Done(value),
        Err(e) => SubmitOutcome::Failed(notifier.push(e.to_notification(locale))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{FakeRemote, patient, patient_draft, patients_remote, user, users_remote};
    use crate::models::{auth::User, patient::Patient};
    use serde_json::json;
    use std::time::Duration;

    async fn patients_with(
        remote: FakeRemote<Patient>,
        mode: ReconcileMode,
    ) -> (Mutations<FakeRemote<Patient>>, Notifier) {
        let store = Arc::new(CollectionStore::new(remote));
        store.load().await.unwrap();
        let notifier = Notifier::new();
        let mutations = Mutations::new(store, notifier.clone(), Locale::Pt).with_mode(mode);
        (mutations, notifier)
    }

    #[tokio::test]
    async fn create_then_remove_changes_the_list_by_one() {
        for mode in [ReconcileMode::Refetch, ReconcileMode::Patch] {
            let remote = patients_remote(vec![patient(1, "Ana", None), patient(2, "Bruno", None)]);
            let (mutations, _) = patients_with(remote, mode).await;
            let dialog = FormDialog::new();
            dialog.open();

            let created = mutations.create(&dialog, &patient_draft("Carla")).await.done().unwrap();
            assert_eq!(mutations.store().len(), 3);
            assert!(!dialog.is_open());
            assert!(mutations.store().get(created.id).is_some());

            assert!(mutations.remove(created.id).await.is_done());
            assert_eq!(mutations.store().len(), 2);
            assert!(mutations.store().get(created.id).is_none());
        }
    }

    #[tokio::test]
    async fn failed_update_keeps_cache_and_dialog() {
        let remote = patients_remote(vec![patient(1, "Ana", None)]);
        let (mutations, notifier) = patients_with(remote.clone(), ReconcileMode::Refetch).await;
        let before = mutations.store().items();

        let dialog = FormDialog::new();
        dialog.open();
        remote.fail_next_mutation(400, Some("Paciente com consultas futuras."));

        let outcome = mutations.update(&dialog, 1, &patient_draft("Ana Maria")).await;
        let note = outcome.notification().unwrap();
        assert_eq!(note.message, "Paciente com consultas futuras.");
        assert!(dialog.is_open());
        assert!(!dialog.is_submitting());
        assert_eq!(mutations.store().items(), before);
        assert_eq!(notifier.pending().len(), 1);
    }

    #[tokio::test]
    async fn failure_without_server_message_gets_a_generic_one() {
        let remote = patients_remote(vec![patient(1, "Ana", None)]);
        let (mutations, _) = patients_with(remote.clone(), ReconcileMode::Patch).await;
        remote.fail_next_mutation(500, None);

        let outcome = mutations.remove(1).await;
        let note = outcome.notification().unwrap();
        assert!(!note.message.trim().is_empty());
        assert_eq!(mutations.store().len(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_server() {
        let remote = patients_remote(vec![]);
        let (mutations, _) = patients_with(remote.clone(), ReconcileMode::Refetch).await;
        let dialog = FormDialog::new();
        dialog.open();

        let outcome = mutations.create(&dialog, &patient_draft("")).await;
        assert!(outcome.notification().unwrap().message.contains("O nome é obrigatório."));
        assert_eq!(remote.creates.load(Ordering::SeqCst), 0);
        assert!(dialog.is_open());
    }

    #[tokio::test]
    async fn double_submit_sends_a_single_create() {
        let remote = patients_remote(vec![]).with_delay(Duration::from_millis(30));
        let (mutations, _) = patients_with(remote.clone(), ReconcileMode::Patch).await;
        let dialog = FormDialog::new();
        dialog.open();
        let draft = patient_draft("Ana");

        let (first, second) = tokio::join!(
            mutations.create(&dialog, &draft),
            mutations.create(&dialog, &draft)
        );

        assert!(first.is_done());
        assert!(matches!(second, SubmitOutcome::Ignored));
        assert_eq!(remote.creates.load(Ordering::SeqCst), 1);
        assert_eq!(mutations.store().len(), 1);
        assert!(!dialog.is_submitting());
    }

    async fn users_with(remote: FakeRemote<User>) -> Mutations<FakeRemote<User>> {
        let store = Arc::new(CollectionStore::new(remote));
        store.load().await.unwrap();
        Mutations::new(store, Notifier::new(), Locale::Pt)
    }

    #[tokio::test]
    async fn rejected_toggle_rolls_back() {
        let remote = users_remote(vec![user(1, "ana", true), user(2, "bruno", true)]);
        let mutations = users_with(remote.clone()).await;
        remote.fail_next_mutation(403, Some("Você não pode desativar a si mesmo."));

        let outcome = mutations
            .toggle(1, |u| u.is_active = false, json!({"is_active": false}))
            .await;

        assert!(outcome.notification().is_some());
        assert!(mutations.store().get(1).unwrap().is_active);
        assert!(remote.server_items()[0].is_active);
    }

    #[tokio::test]
    async fn accepted_toggle_keeps_the_new_value_without_refetch() {
        let remote = users_remote(vec![user(1, "ana", true)]);
        let mutations = users_with(remote.clone()).await;
        let loaded_at = mutations.store().last_loaded_at();

        let outcome = mutations
            .toggle(1, |u| u.is_active = false, json!({"is_active": false}))
            .await;

        assert!(outcome.is_done());
        assert!(!mutations.store().get(1).unwrap().is_active);
        assert!(!remote.server_items()[0].is_active);
        assert_eq!(remote.patches.load(Ordering::SeqCst), 1);
        assert_eq!(mutations.store().last_loaded_at(), loaded_at);
    }

    #[tokio::test]
    async fn toggled_value_is_visible_before_the_server_answers() {
        let remote = users_remote(vec![user(1, "ana", true)]).with_delay(Duration::from_millis(50));
        let mutations = users_with(remote.clone()).await;

        let read_mid_flight = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            (
                mutations.store().get(1).unwrap().is_active,
                remote.server_items()[0].is_active,
            )
        };
        let (outcome, (cached, on_server)) = tokio::join!(
            mutations.toggle(1, |u| u.is_active = false, json!({"is_active": false})),
            read_mid_flight
        );

        assert!(!cached);
        assert!(on_server);
        assert!(outcome.is_done());
        assert!(!mutations.store().get(1).unwrap().is_active);
    }

    #[tokio::test]
    async fn second_toggle_on_the_same_record_is_ignored_while_in_flight() {
        let remote = users_remote(vec![user(1, "ana", true), user(2, "bruno", true)])
            .with_delay(Duration::from_millis(30));
        let mutations = users_with(remote.clone()).await;

        let (first, second, other) = tokio::join!(
            mutations.toggle(1, |u| u.is_active = false, json!({"is_active": false})),
            mutations.toggle(1, |u| u.is_active = true, json!({"is_active": true})),
            mutations.toggle(2, |u| u.is_active = false, json!({"is_active": false}))
        );

        assert!(first.is_done());
        assert!(matches!(second, SubmitOutcome::Ignored));
        assert!(other.is_done());
        assert_eq!(remote.patches.load(Ordering::SeqCst), 2);
        assert!(!mutations.store().get(1).unwrap().is_active);

        // Liberado depois da resposta
        let again = mutations
            .toggle(1, |u| u.is_active = true, json!({"is_active": true}))
            .await;
        assert!(again.is_done());
        assert!(mutations.store().get(1).unwrap().is_active);
    }

    #[tokio::test]
    async fn toggle_on_missing_record_fails_without_request() {
        let remote = users_remote(vec![]);
        let mutations = users_with(remote.clone()).await;
        let outcome = mutations.toggle(9, |_| {}, json!({})).await;
        assert!(outcome.notification().is_some());
        assert_eq!(remote.patches.load(Ordering::SeqCst), 0);
    }
}
