// src/models/catalog.rs

// Cadastros auxiliares (só CRUD): operadoras de convênio, planos,
// especialidades e profissionais.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::resource::{Entity, EntityId, Searchable};

// --- Operadora de convênio ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceProvider {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub ans_code: Option<String>, // registro na ANS
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct InsuranceProviderDraft {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub ans_code: Option<String>,
}

// --- Plano (pertence a uma operadora) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePlan {
    pub id: EntityId,
    pub name: String,
    pub provider: EntityId,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct InsurancePlanDraft {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub provider: EntityId,
}

// --- Especialidade / procedimento ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct SpecialtyDraft {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub price: Option<Decimal>,
    #[validate(range(min = 5, max = 480, message = "Duração entre 5 e 480 minutos."))]
    pub duration_minutes: Option<u32>,
}

// --- Profissional ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub council_number: Option<String>, // CRM/CRO/CRP...
    #[serde(default)]
    pub specialties: Vec<EntityId>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct PractitionerDraft {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub council_number: Option<String>,
    pub specialties: Vec<EntityId>,
}

impl Entity for InsuranceProvider {
    type Draft = InsuranceProviderDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for InsurancePlan {
    type Draft = InsurancePlanDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Specialty {
    type Draft = SpecialtyDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Practitioner {
    type Draft = PractitionerDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Searchable for InsuranceProvider {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.ans_code.as_deref());
        fields
    }
}

impl Searchable for Specialty {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Searchable for Practitioner {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.council_number.as_deref());
        fields
    }
}
