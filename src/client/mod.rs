//! Authenticated REST transport for the AnnoMarket.com API
//!
//! [`RestClient`] resolves resource URLs against a base URL, attaches the
//! caller's API credentials to every request, decodes JSON responses into
//! typed records and turns failed responses into [`ClientError`]s:
//! - JSON request bodies and JSON response decoding
//! - Error-body decoding (structured vs. unstructured failures)
//! - Redirect resolution for time-limited download URLs
//!
//! There is no automatic retry. A failed request is reported to the caller
//! straight away.

use bytes::Bytes;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{redirect, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;

pub mod error;
pub mod resource;
pub mod transfer;

pub use error::{decode_error_response, ClientError, ClientResult};
pub use resource::{Remote, Resource};

const JSON_CONTENT: &str = "application/json";
const USER_AGENT: &str = concat!("annomarket-rust/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the AnnoMarket.com REST API
///
/// One instance is typically shared (via [`Arc`]) by every resource facade
/// created from it.
pub struct RestClient {
    http: Client,
    no_redirect: Client,
    transfer: Client,
    base_url: Url,
    api_key_id: String,
    api_password: String,
}

impl RestClient {
    /// Create a client from connection settings
    ///
    /// # Errors
    /// Returns `InvalidArgument` if credentials are missing or the base URL
    /// does not parse.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            ClientError::InvalidArgument(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let no_redirect = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;
        // Bulk transfers may run far longer than any single API call, so
        // only connecting and each read are bounded.
        let transfer = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            no_redirect,
            transfer,
            base_url,
            api_key_id: config.api_key_id.clone(),
            api_password: config.api_password.clone(),
        })
    }

    /// Create a client wrapped in [`Arc`] for sharing between facades
    pub fn shared(config: &ClientConfig) -> ClientResult<Arc<Self>> {
        Self::new(config).map(Arc::new)
    }

    /// Base URL that relative resource URLs resolve against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a relative or absolute resource URL
    pub fn resolve(&self, url: &str) -> ClientResult<Url> {
        self.base_url
            .join(url)
            .map_err(|e| ClientError::InvalidArgument(format!("invalid URL '{url}': {e}")))
    }

    /// GET a resource and decode its JSON body
    pub async fn get<T>(&self, url: &str) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(Method::GET, url, None::<&()>, None).await?;
        decode_json(response).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<T, B>(&self, url: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::POST, url, Some(body), None).await?;
        decode_json(response).await
    }

    /// PUT a JSON body and decode the JSON response
    pub async fn put<T, B>(&self, url: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::PUT, url, Some(body), None).await?;
        decode_json(response).await
    }

    /// POST a JSON body where only the status of the reply matters
    pub async fn post_and_discard<B>(&self, url: &str, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, Some(body), None).await?;
        Ok(())
    }

    /// DELETE a resource
    pub async fn delete(&self, url: &str) -> ClientResult<()> {
        self.send(Method::DELETE, url, None::<&()>, None).await?;
        Ok(())
    }

    /// Issue a request and return the raw response body
    ///
    /// Used for response formats that are not plain JSON, selected through
    /// the `Accept` header.
    pub async fn request_for_stream<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        accept: &str,
    ) -> ClientResult<Bytes>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send(method, url, body, Some(accept)).await?;
        Ok(response.bytes().await?)
    }

    /// Resolve the redirect target of a "download" URL without following it
    ///
    /// The returned URL is time-limited and should be used immediately. Each
    /// call asks the server for a fresh one.
    ///
    /// # Errors
    /// Non-2xx/3xx replies are decoded like any other failure. A success
    /// without a `Location` header yields `MissingRedirect`.
    pub async fn get_redirect(&self, url: &str) -> ClientResult<Url> {
        let target = self.resolve(url)?;
        debug!("Resolving redirect for {}", target);

        let response = self
            .authorized(self.no_redirect.get(target.clone()))
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| ClientError::MissingRedirect(target.to_string()))?;
            return target.join(location).map_err(|e| {
                ClientError::ParseError(format!("invalid redirect location '{location}': {e}"))
            });
        }

        check_status(response).await?;
        Err(ClientError::MissingRedirect(target.to_string()))
    }

    async fn send<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        accept: Option<&str>,
    ) -> ClientResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let target = self.resolve(url)?;
        debug!("Making {} request to: {}", method, target);

        let mut builder = self
            .authorized(self.http.request(method, target))
            .header(ACCEPT, accept.unwrap_or(JSON_CONTENT));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;
        check_status(response).await
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.api_key_id, Some(&self.api_password))
    }

    /// Unauthenticated client for time-limited upload/download URLs
    ///
    /// Has no limit on the total duration of a request.
    pub(crate) fn plain_http(&self) -> &Client {
        &self.transfer
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key_id", &self.api_key_id)
            .finish_non_exhaustive()
    }
}

/// Pass 2xx responses through, decode everything else as an error
pub(crate) async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    // A body that cannot be read is treated like an empty one.
    let body = response.bytes().await.unwrap_or_default();
    warn!("Request to {} failed with status {}", url, status);
    Err(decode_error_response(status, &body))
}

async fn decode_json<T>(response: Response) -> ClientResult<T>
where
    T: DeserializeOwned,
{
    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::NetworkError(e.to_string()))?;
    serde_json::from_slice(&body)
        .map_err(|e| ClientError::ParseError(format!("Failed to deserialize response: {e}")))
}
