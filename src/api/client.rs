// src/api/client.rs

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, header};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    common::{
        error::{AppError, AppResult},
        i18n::Locale,
    },
    session::SessionContext,
};

/// Cliente HTTP autenticado da API da clínica.
///
/// Toda requisição leva `Authorization: Token <valor>` quando há sessão e o
/// `Accept-Language` do idioma configurado. Um 401 expira a sessão.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
    locale: Locale,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: SessionContext,
        locale: Locale,
    ) -> AppResult<Self> {
        // Url::join descarta o último segmento se a base não terminar em '/'
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "A URL da API deve usar http ou https, veio: {}",
                base_url.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        tracing::info!("Cliente da API configurado para {}", base_url);

        Ok(Self { http, base_url, session, locale })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> AppResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let url = self.url(path)?;
        let mut builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT_LANGUAGE, self.locale.header_value());

        if let Some(token) = self.session.token().await {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        Ok(builder)
    }

    // Converte respostas não-2xx no AppError correspondente
    async fn check(&self, method: &Method, path: &str, response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            tracing::debug!("{} {} -> {}", method, path, status);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = AppError::from_response(status.as_u16(), path, &body);

        if err.is_auth_failure() {
            self.session.expire().await;
        } else if !err.is_not_found() {
            tracing::warn!("{} {} -> {}: {}", method, path, status, err);
        }
        Err(err)
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> AppResult<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!("🔥 Falha de rede em {} {}: {}", method, path, e);
            AppError::Network(e)
        })?;
        self.check(&method, path, response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let builder = self.request(Method::GET, path).await?;
        let response = self.send(Method::GET, path, builder).await?;
        Ok(response.json().await?)
    }

    /// GET em que a ausência (404) é um estado válido, não um erro.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> AppResult<Option<T>> {
        match self.get_json(path).await {
            Ok(value) => Ok(Some(value)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_bytes(&self, path: &str) -> AppResult<Vec<u8>> {
        let builder = self.request(Method::GET, path).await?;
        let response = self.send(Method::GET, path, builder).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path).await?.json(body);
        let response = self.send(method, path, builder).await?;
        Ok(response.json().await?)
    }

    /// POST sem corpo de resposta relevante (ex: logout).
    pub async fn post_empty(&self, path: &str) -> AppResult<()> {
        let builder = self.request(Method::POST, path).await?;
        self.send(Method::POST, path, builder).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        let builder = self.request(Method::DELETE, path).await?;
        self.send(Method::DELETE, path, builder).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> AppResult<T> {
        let builder = self.request(Method::POST, path).await?.multipart(form);
        let response = self.send(Method::POST, path, builder).await?;
        Ok(response.json().await?)
    }
}
