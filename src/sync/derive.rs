// src/sync/derive.rs

// Visões derivadas: funções puras sobre (coleção, estado local da tela).
// Nada aqui altera o cache.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::{
    api::resource::{EntityId, Searchable},
    common::i18n::Locale,
    models::{
        appointment::{Appointment, AppointmentStatus, Modality},
        catalog::InsurancePlan,
        finance::Expense,
    },
};

// =============================================================================
//  BUSCA
// =============================================================================

/// Filtro de texto: substring sem diferenciar maiúsculas em qualquer campo de
/// busca. Termo vazio devolve tudo, na mesma ordem.
pub fn search<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    if term.is_empty() {
        return items.iter().collect();
    }
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

// =============================================================================
//  STATUS -> APRESENTAÇÃO
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub icon: &'static str,
    pub color: &'static str,
    pub label: String,
}

impl Badge {
    fn new(icon: &'static str, color: &'static str, locale: Locale, key: &str) -> Self {
        Self { icon, color, label: locale.translate(key) }
    }
}

/// Mapeamento total: todo status, inclusive os que não conhecemos, tem badge.
pub fn status_badge(status: &AppointmentStatus, locale: Locale) -> Badge {
    match status {
        AppointmentStatus::Scheduled => Badge::new("event", "info", locale, "status.scheduled"),
        AppointmentStatus::AwaitingPayment => {
            Badge::new("payments", "warning", locale, "status.awaiting_payment")
        }
        AppointmentStatus::Confirmed => Badge::new("check_circle", "primary", locale, "status.confirmed"),
        AppointmentStatus::Completed => Badge::new("task_alt", "success", locale, "status.completed"),
        AppointmentStatus::NoShow => Badge::new("person_off", "grey", locale, "status.no_show"),
        AppointmentStatus::Cancelled => Badge::new("cancel", "error", locale, "status.cancelled"),
        AppointmentStatus::Other(raw) => {
            tracing::debug!("Status desconhecido vindo do backend: {:?}", raw);
            Badge::new("help", "secondary", locale, "status.unknown")
        }
    }
}

/// Versão para strings cruas (ex: filtros vindos da URL).
pub fn status_badge_for(raw: &str, locale: Locale) -> Badge {
    status_badge(&AppointmentStatus::parse(raw), locale)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentPresentation {
    pub status: Badge,
    pub visit: Badge,
    pub payment: Badge,
    pub modality: Option<Badge>,
}

pub fn present(appointment: &Appointment, locale: Locale) -> AppointmentPresentation {
    let visit = if appointment.first_visit {
        Badge::new("fiber_new", "accent", locale, "flag.first_visit")
    } else {
        Badge::new("replay", "grey", locale, "flag.return_visit")
    };

    let payment = if appointment.paid {
        Badge::new("paid", "success", locale, "flag.paid")
    } else {
        Badge::new("money_off", "warning", locale, "flag.unpaid")
    };

    let modality = match appointment.modality {
        Modality::Telehealth => Some(Badge::new("videocam", "info", locale, "flag.telehealth")),
        Modality::InPerson => None,
    };

    AppointmentPresentation {
        status: status_badge(&appointment.status, locale),
        visit,
        payment,
        modality,
    }
}

// =============================================================================
//  AGENDAMENTOS -> EVENTOS DO CALENDÁRIO
// =============================================================================

/// Evento genérico do widget de calendário. `meta` carrega o agendamento
/// original como JSON opaco, o widget não conhece a entidade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: &'static str,
    pub meta: Value,
}

/// Cancelados não aparecem no calendário.
pub fn calendar_events(appointments: &[Appointment]) -> Vec<CalendarEvent> {
    appointments
        .iter()
        .filter(|a| !a.status.is_cancelled())
        .map(|a| CalendarEvent {
            id: a.id.to_string(),
            title: a.title(),
            start: a.start,
            end: a.end,
            color: status_badge(&a.status, Locale::default()).color,
            meta: serde_json::to_value(a).unwrap_or(Value::Null),
        })
        .collect()
}

// =============================================================================
//  FILTROS DA AGENDA
// =============================================================================

#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    // Vazio = todos os status
    pub statuses: Vec<AppointmentStatus>,
    pub practitioner: Option<EntityId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub unpaid_only: bool,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(appointment.status.kind()) {
            return false;
        }
        if let Some(practitioner) = self.practitioner {
            if appointment.practitioner != Some(practitioner) {
                return false;
            }
        }
        let day = appointment.start.date();
        if self.date_from.is_some_and(|from| day < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| day > to) {
            return false;
        }
        !(self.unpaid_only && appointment.paid)
    }
}

pub fn filter_appointments<'a>(
    appointments: &'a [Appointment],
    filter: &AppointmentFilter,
) -> Vec<&'a Appointment> {
    appointments.iter().filter(|a| filter.matches(a)).collect()
}

/// Agendamentos de um dia, em ordem de horário.
pub fn appointments_on(appointments: &[Appointment], day: NaiveDate) -> Vec<&Appointment> {
    let mut found: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.start.date() == day)
        .collect();
    found.sort_by_key(|a| a.start);
    found
}

// =============================================================================
//  CONVÊNIO / FINANCEIRO
// =============================================================================

/// Planos disponíveis para a operadora selecionada.
pub fn plans_for_provider(plans: &[InsurancePlan], provider: Option<EntityId>) -> Vec<&InsurancePlan> {
    match provider {
        Some(provider) => plans.iter().filter(|p| p.provider == provider).collect(),
        None => Vec::new(),
    }
}

/// O plano escolhido continua válido para a operadora?
pub fn plan_belongs_to_provider(
    plans: &[InsurancePlan],
    provider: Option<EntityId>,
    plan: Option<EntityId>,
) -> bool {
    match plan {
        None => true,
        Some(plan) => plans_for_provider(plans, provider).iter().any(|p| p.id == plan),
    }
}

pub fn expenses_total<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Decimal {
    expenses.into_iter().map(|e| e.amount).sum()
}
