//! HTTP client for a Supabase-compatible managed backend.
//!
//! - auth: `/auth/v1/user`, `/auth/v1/authorize`, `/auth/v1/logout`
//! - storage: `/storage/v1/object/{bucket}/{key}`, public objects under
//!   `/storage/v1/object/public/{bucket}/{key}`
//! - database: PostgREST under `/rest/v1/{table}`, rows matched with `id=eq.{id}`

use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use smol_str::SmolStr;
use url::Url;

use crate::backend::{AuthProvider, Database, ObjectStore};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::types::User;

#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    config: BackendConfig,
    /// Access token of the signed-in user, once the OAuth redirect has completed.
    access_token: Option<SmolStr>,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<SmolStr>) -> Self {
        self.set_access_token(token);
        self
    }

    /// Install the token handed back by the OAuth redirect.
    pub fn set_access_token(&mut self, token: impl Into<SmolStr>) {
        self.access_token = Some(token.into());
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.as_str().trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(self.config.anon_key.as_str());
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    fn rows(&self, table: &str) -> String {
        self.endpoint(&format!("rest/v1/{}", table))
    }

    fn id_filter(id: &str) -> String {
        format!("eq.{}", id)
    }
}

/// Error body shape shared by the auth, storage and PostgREST services.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });
    tracing::debug!(status = status.as_u16(), %message, "backend error response");
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl AuthProvider for RestBackend {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let response = self
            .authorized(self.client.get(self.endpoint("auth/v1/user")))
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("access token rejected, treating as signed out");
            return Ok(None);
        }
        let user = decode(check(response).await?).await?;
        Ok(Some(user))
    }

    fn authorize_url(&self, provider: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.endpoint("auth/v1/authorize")).map_err(|e| {
            BackendError::Unavailable {
                message: format!("invalid backend url: {}", e),
            }
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("provider", provider);
            if let Some(redirect) = &self.config.oauth.redirect_to {
                query.append_pair("redirect_to", redirect.as_str());
            }
        }
        Ok(url)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.access_token.is_none() {
            return Ok(());
        }
        let response = self
            .authorized(self.client.post(self.endpoint("auth/v1/logout")))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

impl ObjectStore for RestBackend {
    async fn upload<'a>(
        &'a self,
        key: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("storage/v1/object/{}/{}", self.config.bucket, key));
        tracing::debug!(%key, content_type, bytes = data.len(), "uploading object");
        let response = self
            .authorized(self.client.post(url))
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.endpoint(&format!(
            "storage/v1/object/public/{}/{}",
            self.config.bucket, key
        ))
    }
}

impl Database for RestBackend {
    async fn insert<'a, R>(&'a self, table: &'a str, record: &'a R) -> Result<(), BackendError>
    where
        R: Serialize + Sync,
    {
        let response = self
            .authorized(self.client.post(self.rows(table)))
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn select<'a, R>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
    ) -> Result<Vec<R>, BackendError>
    where
        R: DeserializeOwned + Send + 'a,
    {
        let response = self
            .authorized(self.client.get(self.rows(table)))
            .query(&[("select", columns.join(","))])
            .send()
            .await?;
        decode(check(response).await?).await
    }

    async fn select_by_id<'a, R>(
        &'a self,
        table: &'a str,
        id: &'a str,
    ) -> Result<Option<R>, BackendError>
    where
        R: DeserializeOwned + Send + 'a,
    {
        let response = self
            .authorized(self.client.get(self.rows(table)))
            .query(&[("select", "*".to_string()), ("id", Self::id_filter(id))])
            .send()
            .await?;
        let rows: Vec<R> = decode(check(response).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn update<'a, P>(
        &'a self,
        table: &'a str,
        patch: &'a P,
        id: &'a str,
    ) -> Result<(), BackendError>
    where
        P: Serialize + Sync,
    {
        let response = self
            .authorized(self.client.patch(self.rows(table)))
            .query(&[("id", Self::id_filter(id))])
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> Result<(), BackendError> {
        let response = self
            .authorized(self.client.delete(self.rows(table)))
            .query(&[("id", Self::id_filter(id))])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
