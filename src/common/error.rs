// src/common/error.rs

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::common::{
    i18n::Locale,
    notify::{Notification, NotificationLevel},
};

/// Erros de campo devolvidos pelo backend: campo -> mensagens.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // Validação local do formulário (antes de enviar)
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação feita pelo backend (400/422 com campo -> mensagens)
    #[error("Campos inválidos: {0:?}")]
    FieldErrors(FieldErrors),

    #[error("Token inválido ou ausente")]
    Unauthorized,

    #[error("Acesso negado: {0:?}")]
    Forbidden(Option<String>),

    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    #[error("Erro do servidor ({status}): {message:?}")]
    Server { status: u16, message: Option<String> },

    #[error("Erro de rede: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL inválida: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Erro de WebSocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Canal de chat encerrado")]
    ChannelClosed,

    #[error("Configuração inválida: {0}")]
    Config(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Constrói o erro a partir de uma resposta não-2xx do backend.
    ///
    /// O corpo costuma ser `{"detail": "..."}`, `{"error": "..."}` ou um mapa
    /// campo -> lista de mensagens. Corpo que não é JSON (ex: página HTML de erro)
    /// nunca vira mensagem para o usuário.
    pub fn from_response(status: u16, path: &str, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let message = parsed.as_ref().and_then(detail_message);

        match status {
            401 => AppError::Unauthorized,
            403 => AppError::Forbidden(message),
            404 => AppError::NotFound(message.unwrap_or_else(|| path.to_string())),
            400 | 422 => {
                let fields = parsed.as_ref().map(field_errors).unwrap_or_default();
                if message.is_none() && !fields.is_empty() {
                    AppError::FieldErrors(fields)
                } else {
                    AppError::Server { status, message }
                }
            }
            _ => AppError::Server { status, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }

    /// Mensagem vinda do servidor (ou da validação local), se houver.
    pub fn server_message(&self) -> Option<String> {
        match self {
            AppError::Server { message, .. } => message.clone(),
            AppError::Forbidden(message) => message.clone(),
            AppError::FieldErrors(fields) => join_field_errors(fields),
            AppError::ValidationError(errors) => {
                let mut fields = FieldErrors::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    fields.insert(field.to_string(), messages);
                }
                join_field_errors(&fields)
            }
            _ => None,
        }
    }

    fn generic_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::FieldErrors(_) => "error.validation",
            AppError::Unauthorized => "error.unauthorized",
            AppError::Forbidden(_) => "error.forbidden",
            AppError::NotFound(_) => "error.not_found",
            AppError::Network(_) | AppError::WebSocket(_) => "error.network",
            AppError::ChannelClosed => "error.channel_closed",
            _ => "error.generic",
        }
    }

    /// Converte o erro na notificação transitória mostrada ao usuário.
    /// Nunca devolve mensagem vazia.
    pub fn to_notification(&self, locale: Locale) -> Notification {
        if !matches!(self, AppError::ValidationError(_) | AppError::FieldErrors(_)) {
            tracing::error!("Erro na chamada: {}", self);
        }

        let message = self
            .server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| locale.translate(self.generic_key()));

        Notification::new(NotificationLevel::Error, message)
    }
}

fn detail_message(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn field_errors(value: &Value) -> FieldErrors {
    let mut fields = FieldErrors::new();
    let Some(obj) = value.as_object() else {
        return fields;
    };

    for (field, raw) in obj {
        let messages: Vec<String> = match raw {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => continue,
        };
        if !messages.is_empty() {
            fields.insert(field.clone(), messages);
        }
    }
    fields
}

fn join_field_errors(fields: &FieldErrors) -> Option<String> {
    let parts: Vec<String> = fields
        .iter()
        .map(|(field, messages)| {
            if field == "non_field_errors" {
                messages.join(" ")
            } else {
                format!("{}: {}", field, messages.join(" "))
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
