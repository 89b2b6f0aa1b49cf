// src/config.rs

use std::{env, sync::Arc, time::Duration};

use url::Url;

use crate::{
    api::ApiClient,
    common::{
        error::{AppError, AppResult},
        i18n::Locale,
        notify::Notifier,
    },
    services::{
        agenda_service::AgendaService, auth::AuthService, catalog_service::CatalogService,
        chat_service::ChatService, clinical_service::ClinicalService,
        dashboard_service::DashboardService, document_service::DocumentService,
        finance_service::FinanceService, patient_service::PatientService,
        user_service::UserService,
    },
    session::SessionContext,
};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RECONNECT_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub ws_base_url: Url,
    pub request_timeout: Duration,
    pub locale: Locale,
    pub chat_reconnect_delay: Duration,
}

impl AppConfig {
    /// Lê o `.env` (se existir) e as variáveis de ambiente.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let ws_base_url = match lookup("WS_BASE_URL") {
            Some(raw) => Url::parse(&raw)?,
            None => ws_base_from_api(&Url::parse(&api_base_url)?)?,
        };

        let request_timeout = Duration::from_secs(parse_number(
            "REQUEST_TIMEOUT_SECS",
            lookup("REQUEST_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?);
        let chat_reconnect_delay = Duration::from_millis(parse_number(
            "CHAT_RECONNECT_MS",
            lookup("CHAT_RECONNECT_MS"),
            DEFAULT_RECONNECT_MS,
        )?);

        // Mesma sintaxe do cabeçalho Accept-Language (ex: "en-US,pt;q=0.5")
        let locale = lookup("CLINICA_LANG")
            .map(|raw| Locale::resolve(&raw))
            .unwrap_or_default();

        Ok(Self { api_base_url, ws_base_url, request_timeout, locale, chat_reconnect_delay })
    }
}

// Zero não é aceito: um timeout ou espera nula quebra toda chamada.
fn parse_number(key: &str, raw: Option<String>, default: u64) -> AppResult<u64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(format!("{} deve ser maior que zero", key))),
        Ok(value) => Ok(value),
        Err(_) => Err(AppError::Config(format!("{} deve ser um número inteiro, veio '{}'", key, raw))),
    }
}

// http://host:8000/api -> ws://host:8000
fn ws_base_from_api(api: &Url) -> AppResult<Url> {
    let scheme = match api.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let host = api
        .host_str()
        .ok_or_else(|| AppError::Config(format!("URL da API sem host: {}", api)))?;
    let raw = match api.port() {
        Some(port) => format!("{}://{}:{}/", scheme, host, port),
        None => format!("{}://{}/", scheme, host),
    };
    Ok(Url::parse(&raw)?)
}

// =============================================================================
//  ESTADO DA APLICAÇÃO
// =============================================================================

/// Grafo de dependências do app: sessão, cliente HTTP, notificações e os
/// serviços de longa duração. Os serviços de tela são criados a cada abertura.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: SessionContext,
    pub client: ApiClient,
    pub notifier: Notifier,
    pub auth_service: AuthService,
    pub dashboard_service: DashboardService,
    pub chat_service: ChatService,
}

impl AppState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let session = SessionContext::new();
        let client = ApiClient::new(
            &config.api_base_url,
            config.request_timeout,
            session.clone(),
            config.locale,
        )?;
        let notifier = Notifier::new();

        // --- Monta o gráfico de dependências ---
        let auth_service = AuthService::new(client.clone());
        let dashboard_service = DashboardService::new(client.clone());
        let chat_service = ChatService::new(
            config.ws_base_url.clone(),
            session.clone(),
            config.chat_reconnect_delay,
        );

        Ok(Self {
            config: Arc::new(config),
            session,
            client,
            notifier,
            auth_service,
            dashboard_service,
            chat_service,
        })
    }

    pub fn agenda(&self) -> AgendaService {
        AgendaService::new(self.client.clone(), self.notifier.clone())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(&self.client, &self.notifier)
    }

    /// A tela de pacientes reaproveita os planos já carregados pelo catálogo.
    pub fn patients(&self, catalog: &CatalogService) -> PatientService {
        PatientService::new(self.client.clone(), self.notifier.clone(), catalog.plans_store())
    }

    pub fn clinical(&self) -> ClinicalService {
        ClinicalService::new(self.client.clone(), self.notifier.clone())
    }

    pub fn documents(&self) -> DocumentService {
        DocumentService::new(self.client.clone(), self.notifier.clone())
    }

    pub fn finance(&self) -> FinanceService {
        FinanceService::new(&self.client, &self.notifier)
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.client.clone(), self.notifier.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.ws_base_url.as_str(), "ws://localhost:8000/");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.locale, Locale::Pt);
    }

    #[test]
    fn websocket_base_follows_the_api_scheme() {
        let config = config_from(&[
            ("API_BASE_URL", "https://clinica.example.com/api"),
            ("CLINICA_LANG", "en-US,en;q=0.9"),
            ("CHAT_RECONNECT_MS", "500"),
        ])
        .unwrap();
        assert_eq!(config.ws_base_url.as_str(), "wss://clinica.example.com/");
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.chat_reconnect_delay, Duration::from_millis(500));
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let err = config_from(&[("REQUEST_TIMEOUT_SECS", "dez")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn zero_durations_are_rejected() {
        for key in ["REQUEST_TIMEOUT_SECS", "CHAT_RECONNECT_MS"] {
            let err = config_from(&[(key, "0")]).unwrap_err();
            assert!(matches!(err, AppError::Config(ref msg) if msg.contains(key)));
        }
        let config = config_from(&[("REQUEST_TIMEOUT_SECS", " 30 ")]).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn state_assembles_from_config() {
        let state = AppState::new(config_from(&[]).unwrap()).unwrap();
        assert_eq!(state.client.base_url().as_str(), "http://localhost:8000/api/");
        assert!(!state.session.is_authenticated());
    }
}
