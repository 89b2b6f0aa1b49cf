// src/services/agenda_service.rs

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    api::{ApiClient, EntityId},
    common::{
        error::{AppError, AppResult},
        notify::Notifier,
    },
    models::{
        appointment::{Appointment, AppointmentDraft, AppointmentStatus},
        finance::{Payment, PaymentForm},
    },
    services::{RestMutations, RestStore, rest_mutations},
    sync::{
        FormDialog, LoadOutcome, SubmitOutcome,
        derive::{self, AppointmentFilter, AppointmentPresentation, CalendarEvent},
        mutation::notify_failure,
    },
};

/// Tela de agenda: calendário, listas do dia e de pendentes, pagamento.
pub struct AgendaService {
    client: ApiClient,
    notifier: Notifier,
    appointments: RestMutations<Appointment>,
}

impl AgendaService {
    pub fn new(client: ApiClient, notifier: Notifier) -> Self {
        let appointments = rest_mutations(&client, &notifier, "appointments");
        Self { client, notifier, appointments }
    }

    pub fn store(&self) -> &RestStore<Appointment> {
        self.appointments.store()
    }

    pub async fn load(&self) -> AppResult<LoadOutcome> {
        self.store().load().await
    }

    /// A tela saiu: respostas pendentes não alteram mais o cache.
    pub fn close(&self) {
        self.store().unmount();
    }

    // =========================================================================
    //  VISÕES
    // =========================================================================

    pub fn calendar(&self) -> Vec<CalendarEvent> {
        self.store().with_items(derive::calendar_events)
    }

    pub fn filtered(&self, filter: &AppointmentFilter) -> Vec<Appointment> {
        self.store()
            .with_items(|items| derive::filter_appointments(items, filter).into_iter().cloned().collect())
    }

    pub fn on_day(&self, day: NaiveDate) -> Vec<Appointment> {
        self.store()
            .with_items(|items| derive::appointments_on(items, day).into_iter().cloned().collect())
    }

    pub fn present(&self, id: EntityId) -> Option<AppointmentPresentation> {
        self.store()
            .get(id)
            .map(|appointment| derive::present(&appointment, self.client.locale()))
    }

    /// Agendamentos de hoje, calculados pelo backend.
    pub async fn today(&self) -> AppResult<Vec<Appointment>> {
        self.client.get_json("/appointments/today/").await
    }

    /// Agendamentos com pagamento pendente, calculados pelo backend.
    pub async fn unpaid(&self) -> AppResult<Vec<Appointment>> {
        self.client.get_json("/appointments/unpaid/").await
    }

    // =========================================================================
    //  MUTAÇÕES
    // =========================================================================

    pub async fn schedule(&self, dialog: &FormDialog, draft: &AppointmentDraft) -> SubmitOutcome<Appointment> {
        self.appointments.create(dialog, draft).await
    }

    pub async fn reschedule(
        &self,
        dialog: &FormDialog,
        id: EntityId,
        draft: &AppointmentDraft,
    ) -> SubmitOutcome<Appointment> {
        self.appointments.update(dialog, id, draft).await
    }

    /// Troca de status pelo formulário de edição. Qualquer status é aceito;
    /// trocas fora do fluxo usual só geram um aviso no log.
    pub async fn set_status(
        &self,
        dialog: &FormDialog,
        id: EntityId,
        status: AppointmentStatus,
    ) -> SubmitOutcome<Appointment> {
        let Some(current) = self.store().get(id) else {
            let err = AppError::NotFound(format!("/appointments/{}/", id));
            return notify_failure(Err(err), &self.notifier, self.client.locale());
        };

        if !current.status.can_transition_to(&status) {
            tracing::warn!(
                "Agendamento {}: troca de status fora do fluxo ({} -> {})",
                id,
                current.status.as_str(),
                status.as_str()
            );
        }

        let mut draft = AppointmentDraft::from(&current);
        draft.status = current.status.with_kind(status);
        self.appointments.update(dialog, id, &draft).await
    }

    pub async fn remove(&self, id: EntityId) -> SubmitOutcome<EntityId> {
        self.appointments.remove(id).await
    }

    /// Quita o pagamento e recarrega a agenda (o status do agendamento é
    /// recalculado pelo backend).
    pub async fn register_payment(
        &self,
        dialog: &FormDialog,
        payment_id: EntityId,
        form: PaymentForm,
    ) -> SubmitOutcome<Payment> {
        let Some(_guard) = dialog.begin_submit() else {
            return SubmitOutcome::Ignored;
        };

        let result = match form.validate() {
            Ok(()) => {
                let path = format!("/payments/{}/", payment_id);
                self.client.patch_json::<_, Payment>(&path, &form.into_patch()).await
            }
            Err(e) => Err(AppError::from(e)),
        };

        match result {
            Ok(payment) => {
                tracing::info!("✅ Pagamento {} registrado", payment.id);
                if let Err(e) = self.store().invalidate().await {
                    tracing::warn!("Agenda não recarregada após pagamento: {}", e);
                }
                dialog.close();
                self.notifier.success(self.client.locale().translate("success.saved"));
                SubmitOutcome::Done(payment)
            }
            Err(e) => notify_failure(Err(e), &self.notifier, self.client.locale()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::finance::PaymentMethod;
    use crate::services::test_support::client_for;
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn appointment_json(id: i64, status: &str, paid: bool) -> serde_json::Value {
        json!({
            "id": id,
            "start": "2024-03-01T09:00:00",
            "end": "2024-03-01T09:50:00",
            "patient": 3,
            "patient_name": "Maria da Silva",
            "status": status,
            "paid": paid,
            "payment": 40
        })
    }

    #[tokio::test]
    async fn calendar_hides_cancelled_appointments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/appointments/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                appointment_json(5, "Scheduled", false),
                appointment_json(7, "Cancelled", false),
            ])))
            .mount(&server)
            .await;

        let agenda = AgendaService::new(client_for(&server), Notifier::new());
        agenda.load().await.unwrap();

        let events = agenda.calendar();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "5");
        assert_eq!(events[0].title, "Maria da Silva");
    }

    #[tokio::test]
    async fn payment_refreshes_the_agenda() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/appointments/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                appointment_json(5, "AwaitingPayment", false),
            ])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/appointments/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                appointment_json(5, "Confirmed", true),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/payments/40/"))
            .and(body_partial_json(json!({"status": "paid", "method": "pix"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 40, "appointment": 5, "amount": 250.0, "method": "pix", "status": "paid"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new();
        let agenda = AgendaService::new(client_for(&server), notifier.clone());
        agenda.load().await.unwrap();
        assert!(!agenda.store().get(5).unwrap().paid);

        let dialog = FormDialog::new();
        dialog.open();
        let form = PaymentForm { amount: Decimal::new(25000, 2), method: PaymentMethod::Pix };
        let payment = agenda.register_payment(&dialog, 40, form).await.done().unwrap();

        assert!(payment.is_paid());
        assert!(!dialog.is_open());
        let refreshed = agenda.store().get(5).unwrap();
        assert!(refreshed.paid);
        assert_eq!(refreshed.status, AppointmentStatus::Confirmed);
        assert!(!notifier.last().unwrap().is_error());
    }

    #[tokio::test]
    async fn status_change_outside_the_usual_flow_is_still_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/appointments/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                appointment_json(5, "Completed", true),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/appointments/5/"))
            .and(body_partial_json(json!({"status": "Scheduled"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(appointment_json(5, "Scheduled", true)))
            .expect(1)
            .mount(&server)
            .await;

        let agenda = AgendaService::new(client_for(&server), Notifier::new());
        agenda.load().await.unwrap();

        let dialog = FormDialog::new();
        let outcome = agenda.set_status(&dialog, 5, AppointmentStatus::Scheduled).await;
        assert_eq!(outcome.done().unwrap().status, AppointmentStatus::Scheduled);
    }

    #[tokio::test]
    async fn status_change_keeps_the_backend_spelling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/appointments/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                appointment_json(5, "awaiting_payment", false),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/appointments/5/"))
            .and(body_partial_json(json!({"status": "confirmed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(appointment_json(5, "confirmed", false)))
            .expect(1)
            .mount(&server)
            .await;

        let agenda = AgendaService::new(client_for(&server), Notifier::new());
        agenda.load().await.unwrap();

        let dialog = FormDialog::new();
        let outcome = agenda.set_status(&dialog, 5, AppointmentStatus::Confirmed).await;
        let saved = outcome.done().unwrap();
        assert_eq!(saved.status, AppointmentStatus::Confirmed);
        assert_eq!(saved.status.wire(), "confirmed");
    }

    #[tokio::test]
    async fn invalid_payment_never_reaches_the_server() {
        let server = MockServer::start().await;
        let notifier = Notifier::new();
        let agenda = AgendaService::new(client_for(&server), notifier.clone());

        let dialog = FormDialog::new();
        dialog.open();
        let form = PaymentForm { amount: Decimal::ZERO, method: PaymentMethod::Cash };
        let outcome = agenda.register_payment(&dialog, 40, form).await;

        assert!(outcome.notification().is_some());
        assert!(dialog.is_open());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
