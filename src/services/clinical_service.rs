// src/services/clinical_service.rs

use validator::Validate;

use crate::{
    api::{ApiClient, EntityId},
    common::{
        error::{AppError, AppResult},
        notify::Notifier,
    },
    models::clinical::{Anamnesis, AnamnesisDraft, AnamnesisView, Certificate, Evolution, Prescription},
    services::{RestMutations, rest_mutations},
    sync::{FormDialog, ReconcileMode, SubmitOutcome, mutation::notify_failure},
};

/// Prontuário de um paciente: anamnese, evoluções, receitas e atestados.
#[derive(Clone)]
pub struct ClinicalService {
    client: ApiClient,
    notifier: Notifier,
}

impl ClinicalService {
    pub fn new(client: ApiClient, notifier: Notifier) -> Self {
        Self { client, notifier }
    }

    fn anamnesis_path(patient: EntityId) -> String {
        format!("/patients/{}/anamnesis/", patient)
    }

    // =========================================================================
    //  ANAMNESE
    // =========================================================================

    /// 404 significa "ainda não preenchida": abre o formulário em modo criação.
    pub async fn anamnesis(&self, patient: EntityId) -> AppResult<AnamnesisView> {
        let found: Option<Anamnesis> = self.client.get_optional(&Self::anamnesis_path(patient)).await?;
        Ok(match found {
            Some(record) => AnamnesisView::Edit(record),
            None => {
                tracing::debug!("Paciente {} sem anamnese, abrindo em modo criação", patient);
                AnamnesisView::Create(AnamnesisDraft::default())
            }
        })
    }

    /// POST no modo criação, PUT no modo edição. O resultado é o novo modo da tela.
    pub async fn save_anamnesis(
        &self,
        dialog: &FormDialog,
        patient: EntityId,
        view: &AnamnesisView,
        draft: &AnamnesisDraft,
    ) -> SubmitOutcome<AnamnesisView> {
        let Some(_guard) = dialog.begin_submit() else {
            return SubmitOutcome::Ignored;
        };

        let path = Self::anamnesis_path(patient);
        let result: AppResult<Anamnesis> = match draft.validate() {
            Err(e) => Err(AppError::from(e)),
            Ok(()) if view.is_create() => self.client.post_json(&path, draft).await,
            Ok(()) => self.client.put_json(&path, draft).await,
        };

        match result {
            Ok(record) => {
                tracing::info!("✅ Anamnese do paciente {} salva", patient);
                dialog.close();
                self.notifier.success(self.client.locale().translate("success.saved"));
                SubmitOutcome::Done(AnamnesisView::Edit(record))
            }
            Err(e) => notify_failure(Err(e), &self.notifier, self.client.locale()),
        }
    }

    // =========================================================================
    //  REGISTROS ACUMULATIVOS
    // =========================================================================

    // Só se acrescenta: o registro novo entra direto no cache
    fn nested<T: crate::api::Entity>(&self, patient: EntityId, kind: &str) -> RestMutations<T> {
        rest_mutations(&self.client, &self.notifier, format!("patients/{}/{}", patient, kind))
            .with_mode(ReconcileMode::Patch)
    }

    pub fn evolutions(&self, patient: EntityId) -> RestMutations<Evolution> {
        self.nested(patient, "evolutions")
    }

    pub fn prescriptions(&self, patient: EntityId) -> RestMutations<Prescription> {
        self.nested(patient, "prescriptions")
    }

    pub fn certificates(&self, patient: EntityId) -> RestMutations<Certificate> {
        self.nested(patient, "certificates")
    }
}
