// src/services/patient_service.rs

use std::sync::Arc;

use crate::{
    api::{ApiClient, EntityId},
    common::{error::AppResult, notify::Notifier},
    models::{
        catalog::InsurancePlan,
        patient::{Patient, PatientDraft},
    },
    services::{RestMutations, RestStore, rest_mutations},
    sync::{FormDialog, LoadOutcome, SubmitOutcome, derive},
};

/// Lista de pacientes com busca e o formulário de cadastro.
pub struct PatientService {
    notifier: Notifier,
    client: ApiClient,
    patients: RestMutations<Patient>,
    plans: Arc<RestStore<InsurancePlan>>,
}

impl PatientService {
    pub fn new(client: ApiClient, notifier: Notifier, plans: Arc<RestStore<InsurancePlan>>) -> Self {
        let patients = rest_mutations(&client, &notifier, "patients");
        Self { notifier, client, patients, plans }
    }

    pub fn store(&self) -> &RestStore<Patient> {
        self.patients.store()
    }

    pub async fn load(&self) -> AppResult<LoadOutcome> {
        self.store().load().await
    }

    pub fn close(&self) {
        self.store().unmount();
    }

    /// Busca por nome ou documento, sem diferenciar maiúsculas.
    pub fn search(&self, term: &str) -> Vec<Patient> {
        self.store()
            .with_items(|items| derive::search(items, term).into_iter().cloned().collect())
    }

    pub fn plans_for(&self, provider: Option<EntityId>) -> Vec<InsurancePlan> {
        self.plans.with_items(|plans| {
            derive::plans_for_provider(plans, provider).into_iter().cloned().collect()
        })
    }

    /// Cria (`id = None`) ou edita um paciente.
    pub async fn save(
        &self,
        dialog: &FormDialog,
        id: Option<EntityId>,
        draft: &PatientDraft,
    ) -> SubmitOutcome<Patient> {
        let plan_ok = self.plans.with_items(|plans| {
            derive::plan_belongs_to_provider(plans, draft.insurance_provider, draft.insurance_plan)
        });
        if !plan_ok {
            let message = self.client.locale().translate("error.plan_provider");
            return SubmitOutcome::Failed(self.notifier.error(message));
        }

        match id {
            Some(id) => self.patients.update(dialog, id, draft).await,
            None => self.patients.create(dialog, draft).await,
        }
    }

    pub async fn remove(&self, id: EntityId) -> SubmitOutcome<EntityId> {
        self.patients.remove(id).await
    }
}
