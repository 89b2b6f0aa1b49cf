// src/services/document_service.rs

use reqwest::multipart::{Form, Part};
use validator::Validate;

use crate::{
    api::{ApiClient, EntityId},
    common::{
        error::{AppError, AppResult},
        notify::Notifier,
    },
    models::clinical::{Attachment, AttachmentUpload},
    sync::{FormDialog, SubmitOutcome, mutation::notify_failure},
};

// PDFs são gerados pelo backend; aqui só baixamos e anexamos arquivos.
#[derive(Clone)]
pub struct DocumentService {
    client: ApiClient,
    notifier: Notifier,
}

impl DocumentService {
    pub fn new(client: ApiClient, notifier: Notifier) -> Self {
        Self { client, notifier }
    }

    pub async fn prescription_pdf(&self, prescription: EntityId) -> AppResult<Vec<u8>> {
        self.client
            .get_bytes(&format!("/prescriptions/{}/pdf/", prescription))
            .await
    }

    pub async fn certificate_pdf(&self, certificate: EntityId) -> AppResult<Vec<u8>> {
        self.client
            .get_bytes(&format!("/certificates/{}/pdf/", certificate))
            .await
    }

    pub async fn attachments(&self, patient: EntityId) -> AppResult<Vec<Attachment>> {
        self.client
            .get_json(&format!("/patients/{}/attachments/", patient))
            .await
    }

    /// Envia o arquivo como multipart (`file` + `description`).
    pub async fn upload_attachment(
        &self,
        dialog: &FormDialog,
        patient: EntityId,
        upload: AttachmentUpload,
    ) -> SubmitOutcome<Attachment> {
        let Some(_guard) = dialog.begin_submit() else {
            return SubmitOutcome::Ignored;
        };

        match self.send_upload(patient, upload).await {
            Ok(attachment) => {
                tracing::info!("✅ Anexo '{}' enviado para o paciente {}", attachment.file_name, patient);
                dialog.close();
                self.notifier.success(self.client.locale().translate("success.saved"));
                SubmitOutcome::Done(attachment)
            }
            Err(e) => notify_failure(Err(e), &self.notifier, self.client.locale()),
        }
    }

    async fn send_upload(&self, patient: EntityId, upload: AttachmentUpload) -> AppResult<Attachment> {
        upload.validate()?;

        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|_| AppError::Config(format!("Tipo de arquivo inválido: {}", content_type)))?;
        }

        let mut form = Form::new().part("file", part);
        if let Some(description) = upload.description {
            form = form.text("description", description);
        }

        self.client
            .post_multipart(&format!("/patients/{}/attachments/", patient), form)
            .await
    }
}
