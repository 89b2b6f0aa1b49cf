// src/services/catalog_service.rs

use std::sync::Arc;

use crate::{
    api::{ApiClient, EntityId},
    common::{error::AppResult, notify::Notifier},
    models::catalog::{InsurancePlan, InsuranceProvider, Practitioner, Specialty},
    services::{RestMutations, RestStore, rest_mutations},
    sync::derive,
};

/// Cadastros auxiliares. Todos são CRUD simples sobre o próprio endpoint.
pub struct CatalogService {
    pub providers: RestMutations<InsuranceProvider>,
    pub plans: RestMutations<InsurancePlan>,
    pub specialties: RestMutations<Specialty>,
    pub practitioners: RestMutations<Practitioner>,
}

impl CatalogService {
    pub fn new(client: &ApiClient, notifier: &Notifier) -> Self {
        Self {
            providers: rest_mutations(client, notifier, "insurance-providers"),
            plans: rest_mutations(client, notifier, "insurance-plans"),
            specialties: rest_mutations(client, notifier, "specialties"),
            practitioners: rest_mutations(client, notifier, "practitioners"),
        }
    }

    /// Carrega os quatro cadastros em paralelo.
    pub async fn load(&self) -> AppResult<()> {
        tokio::try_join!(
            self.providers.store().load(),
            self.plans.store().load(),
            self.specialties.store().load(),
            self.practitioners.store().load(),
        )?;
        Ok(())
    }

    pub fn close(&self) {
        self.providers.store().unmount();
        self.plans.store().unmount();
        self.specialties.store().unmount();
        self.practitioners.store().unmount();
    }

    /// Compartilhado com a tela de pacientes (seleção operadora -> plano).
    pub fn plans_store(&self) -> Arc<RestStore<InsurancePlan>> {
        Arc::clone(self.plans.store())
    }

    pub fn plans_for(&self, provider: Option<EntityId>) -> Vec<InsurancePlan> {
        self.plans.store().with_items(|plans| {
            derive::plans_for_provider(plans, provider).into_iter().cloned().collect()
        })
    }

    pub fn search_specialties(&self, term: &str) -> Vec<Specialty> {
        self.specialties
            .store()
            .with_items(|items| derive::search(items, term).into_iter().cloned().collect())
    }

    pub fn search_practitioners(&self, term: &str) -> Vec<Practitioner> {
        self.practitioners
            .store()
            .with_items(|items| derive::search(items, term).into_iter().cloned().collect())
    }

    /// Profissionais que atendem a especialidade escolhida no agendamento.
    pub fn practitioners_for(&self, specialty: EntityId) -> Vec<Practitioner> {
        self.practitioners.store().with_items(|items| {
            items
                .iter()
                .filter(|p| p.specialties.contains(&specialty))
                .cloned()
                .collect()
        })
    }
}
