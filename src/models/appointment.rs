// src/models/appointment.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::resource::{Entity, EntityId, Searchable};
use crate::common::datetime;

// --- Enums ---

/// Status do agendamento.
///
/// O valor vem de um backend que não controlamos: qualquer string desconhecida
/// é preservada em `Other` em vez de falhar a desserialização.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Scheduled,
    AwaitingPayment,
    Confirmed,
    Completed,
    NoShow,
    Cancelled,
    Other(String),
}

impl AppointmentStatus {
    pub const KNOWN: [AppointmentStatus; 6] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::AwaitingPayment,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::NoShow,
        AppointmentStatus::Cancelled,
    ];

    /// Aceita "AwaitingPayment", "awaiting_payment", "AWAITING-PAYMENT"...
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "scheduled" => AppointmentStatus::Scheduled,
            "awaitingpayment" => AppointmentStatus::AwaitingPayment,
            "confirmed" => AppointmentStatus::Confirmed,
            "completed" => AppointmentStatus::Completed,
            "noshow" => AppointmentStatus::NoShow,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::AwaitingPayment => "AwaitingPayment",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::NoShow => "NoShow",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Other(raw) => raw,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled)
    }

    /// Completed, NoShow e Cancelled encerram o atendimento.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::NoShow | AppointmentStatus::Cancelled
        )
    }

    /// Fluxo esperado: Scheduled -> AwaitingPayment -> Confirmed -> Completed,
    /// com NoShow/Cancelled a partir de qualquer estado antes de Completed.
    ///
    /// Só informativo: o formulário permite qualquer troca de status, esta função
    /// serve para a tela avisar quando a troca foge do fluxo.
    pub fn can_transition_to(&self, next: &AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        if self == next {
            return true;
        }
        match (self, next) {
            (Scheduled, AwaitingPayment | Confirmed) => true,
            (AwaitingPayment, Confirmed) => true,
            (Confirmed, Completed) => true,
            (Scheduled | AwaitingPayment | Confirmed, NoShow | Cancelled) => true,
            _ => false,
        }
    }
}

impl From<String> for AppointmentStatus {
    fn from(raw: String) -> Self {
        AppointmentStatus::parse(&raw)
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Status como veio do backend: a variante reconhecida e a grafia original.
///
/// Um registro lido e regravado sem trocar de status devolve exatamente a
/// mesma string ("awaiting_payment" continua "awaiting_payment"). Só um status
/// escolhido na tela usa a grafia canônica.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StatusValue {
    kind: AppointmentStatus,
    wire: String,
}

impl StatusValue {
    pub fn kind(&self) -> &AppointmentStatus {
        &self.kind
    }

    pub fn wire(&self) -> &str {
        &self.wire
    }

    /// Troca o status mantendo o estilo do backend (snake_case ou PascalCase).
    pub fn with_kind(&self, kind: AppointmentStatus) -> Self {
        if kind == self.kind {
            return self.clone();
        }
        let lower_case = !self.wire.chars().any(char::is_uppercase);
        let wire = match &kind {
            AppointmentStatus::Other(raw) => raw.clone(),
            known if lower_case => snake_case(known.as_str()),
            known => known.as_str().to_string(),
        };
        Self { kind, wire }
    }
}

// "AwaitingPayment" -> "awaiting_payment"
fn snake_case(pascal: &str) -> String {
    let mut out = String::with_capacity(pascal.len() + 4);
    for (i, c) in pascal.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

impl std::ops::Deref for StatusValue {
    type Target = AppointmentStatus;

    fn deref(&self) -> &AppointmentStatus {
        &self.kind
    }
}

impl PartialEq for StatusValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl PartialEq<AppointmentStatus> for StatusValue {
    fn eq(&self, other: &AppointmentStatus) -> bool {
        &self.kind == other
    }
}

impl From<String> for StatusValue {
    fn from(wire: String) -> Self {
        Self { kind: AppointmentStatus::parse(&wire), wire }
    }
}

impl From<AppointmentStatus> for StatusValue {
    fn from(kind: AppointmentStatus) -> Self {
        let wire = kind.as_str().to_string();
        Self { kind, wire }
    }
}

impl From<StatusValue> for String {
    fn from(status: StatusValue) -> Self {
        status.wire
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    InPerson,
    Telehealth,
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: EntityId,

    #[serde(with = "datetime::lenient")]
    pub start: NaiveDateTime,
    #[serde(with = "datetime::lenient")]
    pub end: NaiveDateTime,

    pub patient: EntityId,
    #[serde(default)]
    pub patient_name: Option<String>,

    #[serde(default)]
    pub practitioner: Option<EntityId>,
    #[serde(default)]
    pub practitioner_name: Option<String>,

    #[serde(default)]
    pub specialty: Option<EntityId>,
    #[serde(default)]
    pub specialty_name: Option<String>,

    pub status: StatusValue,
    #[serde(default)]
    pub modality: Modality,

    // Flags de pagamento / primeira consulta
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub first_visit: bool,

    // Pagamento criado junto com o agendamento
    #[serde(default)]
    pub payment: Option<EntityId>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    /// Título exibido no calendário.
    pub fn title(&self) -> String {
        match &self.patient_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Paciente #{}", self.patient),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl Entity for Appointment {
    type Draft = AppointmentDraft;

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(3);
        fields.extend(self.patient_name.as_deref());
        fields.extend(self.practitioner_name.as_deref());
        fields.extend(self.specialty_name.as_deref());
        fields
    }
}

// Formulário de agendamento: criado a partir do clique num horário do
// calendário ou editado a partir de um evento existente.
#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_time_range"))]
pub struct AppointmentDraft {
    #[serde(with = "datetime::lenient")]
    pub start: NaiveDateTime,
    #[serde(with = "datetime::lenient")]
    pub end: NaiveDateTime,
    pub patient: EntityId,
    pub practitioner: Option<EntityId>,
    pub specialty: Option<EntityId>,
    pub status: StatusValue,
    pub modality: Modality,
    pub first_visit: bool,
    #[validate(length(max = 2000, message = "Observação muito longa."))]
    pub notes: Option<String>,
}

impl AppointmentDraft {
    /// Rascunho para um horário livre clicado no calendário.
    pub fn for_slot(start: NaiveDateTime, end: NaiveDateTime, patient: EntityId) -> Self {
        Self {
            start,
            end,
            patient,
            practitioner: None,
            specialty: None,
            status: AppointmentStatus::Scheduled.into(),
            modality: Modality::InPerson,
            first_visit: false,
            notes: None,
        }
    }
}

impl From<&Appointment> for AppointmentDraft {
    fn from(appointment: &Appointment) -> Self {
        Self {
            start: appointment.start,
            end: appointment.end,
            patient: appointment.patient,
            practitioner: appointment.practitioner,
            specialty: appointment.specialty,
            status: appointment.status.clone(),
            modality: appointment.modality,
            first_visit: appointment.first_visit,
            notes: appointment.notes.clone(),
        }
    }
}

fn validate_time_range(draft: &AppointmentDraft) -> Result<(), ValidationError> {
    if draft.end <= draft.start {
        let mut err = ValidationError::new("invalid_range");
        err.message = Some("O término deve ser depois do início.".into());
        return Err(err);
    }
    Ok(())
}
