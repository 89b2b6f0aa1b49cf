// src/models/clinical.rs

// Prontuário: cada componente pertence a um paciente e só é criado/acrescentado.
// Não há versionamento: o registro mais recente preenche o formulário.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::resource::{Entity, EntityId};

// =============================================================================
//  ANAMNESE (uma por paciente)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anamnesis {
    pub id: EntityId,
    pub patient: EntityId,
    #[serde(default)]
    pub chief_complaint: String,
    #[serde(default)]
    pub history_of_present_illness: String,
    #[serde(default)]
    pub past_medical_history: String,
    #[serde(default)]
    pub family_history: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
pub struct AnamnesisDraft {
    #[validate(length(min = 1, message = "Informe a queixa principal."))]
    pub chief_complaint: String,
    pub history_of_present_illness: String,
    pub past_medical_history: String,
    pub family_history: String,
    pub allergies: String,
    pub medications: String,
}

impl From<&Anamnesis> for AnamnesisDraft {
    fn from(record: &Anamnesis) -> Self {
        Self {
            chief_complaint: record.chief_complaint.clone(),
            history_of_present_illness: record.history_of_present_illness.clone(),
            past_medical_history: record.past_medical_history.clone(),
            family_history: record.family_history.clone(),
            allergies: record.allergies.clone(),
            medications: record.medications.clone(),
        }
    }
}

/// O que a aba de anamnese deve mostrar.
///
/// Paciente sem anamnese (404 no backend) não é erro: abre o formulário vazio.
#[derive(Debug, Clone, PartialEq)]
pub enum AnamnesisView {
    Create(AnamnesisDraft),
    Edit(Anamnesis),
}

impl AnamnesisView {
    pub fn is_create(&self) -> bool {
        matches!(self, AnamnesisView::Create(_))
    }

    /// Valores iniciais do formulário, nos dois modos.
    pub fn form(&self) -> AnamnesisDraft {
        match self {
            AnamnesisView::Create(draft) => draft.clone(),
            AnamnesisView::Edit(record) => AnamnesisDraft::from(record),
        }
    }
}

// =============================================================================
//  EVOLUÇÃO (nota SOAP)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evolution {
    pub id: EntityId,
    pub patient: EntityId,
    #[serde(default)]
    pub appointment: Option<EntityId>,
    #[serde(default)]
    pub subjective: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub assessment: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct EvolutionDraft {
    pub appointment: Option<EntityId>,
    #[validate(length(min = 1, message = "O campo subjetivo é obrigatório."))]
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
}

// =============================================================================
//  RECEITA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PrescriptionItem {
    #[validate(length(min = 1, message = "Informe o medicamento."))]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: EntityId,
    pub patient: EntityId,
    #[serde(default)]
    pub items: Vec<PrescriptionItem>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct PrescriptionDraft {
    #[validate(length(min = 1, message = "A receita precisa de ao menos um item."), nested)]
    pub items: Vec<PrescriptionItem>,
    pub notes: Option<String>,
}

// =============================================================================
//  ATESTADO
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateKind {
    #[default]
    Attendance, // Declaração de comparecimento
    SickLeave,  // Afastamento
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: EntityId,
    pub patient: EntityId,
    #[serde(default)]
    pub kind: CertificateKind,
    #[serde(default)]
    pub days_off: Option<u32>,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CertificateDraft {
    pub kind: CertificateKind,
    #[validate(range(min = 1, max = 365, message = "Dias de afastamento entre 1 e 365."))]
    pub days_off: Option<u32>,
    pub cid: Option<String>,
    #[validate(length(min = 1, message = "O texto do atestado é obrigatório."))]
    pub text: String,
}

// =============================================================================
//  ANEXOS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: EntityId,
    pub patient: EntityId,
    #[serde(default)]
    pub description: Option<String>,
    pub file_name: String,
    // Local de armazenamento devolvido pelo servidor (download posterior)
    pub file_url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

// Upload é multipart, não JSON: a validação é a mesma dos outros formulários
#[derive(Debug, Clone, Validate)]
pub struct AttachmentUpload {
    #[validate(length(min = 1, message = "Informe o nome do arquivo."))]
    pub file_name: String,
    pub content_type: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "O arquivo está vazio."))]
    pub bytes: Vec<u8>,
}

impl Entity for Anamnesis {
    type Draft = AnamnesisDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Evolution {
    type Draft = EvolutionDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Prescription {
    type Draft = PrescriptionDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Certificate {
    type Draft = CertificateDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}
