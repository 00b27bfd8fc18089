//! `ApiClient` and the per-request builder that applies both hooks.

use std::sync::Arc;

use docqa_protocol::{Codec, ErrorBody, JsonCodec};
use parking_lot::RwLock;
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{
    ClientConfig, Credential, Guard, InvalidationHook, TransportError,
};

type HookSlot = Arc<RwLock<Option<Arc<dyn InvalidationHook>>>>;

/// HTTP client for the backend API with the shared decoration rule.
///
/// Cloning is cheap and every clone shares the same connection pool,
/// [`Credential`], and invalidation hook.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    credential: Credential,
    hook: HookSlot,
    codec: JsonCodec,
}

impl ApiClient {
    /// Builds a client from `config` with an empty credential.
    ///
    /// # Errors
    /// - [`TransportError::InvalidUrl`] if `base_url` doesn't parse
    /// - [`TransportError::Build`] if the TLS backend can't initialize
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let base = parse_base(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(TransportError::Build)?;

        tracing::debug!(base = %base, "api client ready");

        Ok(Self {
            http,
            base,
            credential: Credential::new(),
            hook: Arc::new(RwLock::new(None)),
            codec: JsonCodec,
        })
    }

    /// The decoration rule shared by every clone of this client.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Registers the receiver of `401` rejections, replacing any previous
    /// one.
    pub fn set_invalidation_hook(&self, hook: Arc<dyn InvalidationHook>) {
        *self.hook.write() = Some(hook);
    }

    pub fn clear_invalidation_hook(&self) {
        *self.hook.write() = None;
    }

    /// Resolves an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base.join(path.trim_start_matches('/')).map_err(|source| {
            TransportError::InvalidUrl {
                url: path.to_string(),
                source,
            }
        })
    }

    /// Starts a request to `path` (relative to the base URL).
    pub fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<ApiRequest, TransportError> {
        let url = self.endpoint(path)?;
        Ok(ApiRequest {
            client: self.clone(),
            builder: self.http.request(method.clone(), url.clone()),
            method,
            url,
            guard: Guard::Session,
            bearer: None,
        })
    }

    pub fn get(&self, path: &str) -> Result<ApiRequest, TransportError> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> Result<ApiRequest, TransportError> {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> Result<ApiRequest, TransportError> {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> Result<ApiRequest, TransportError> {
        self.request(Method::DELETE, path)
    }

    /// Runs the inbound hook for a rejected credential.
    fn notify_unauthorized(&self, rejected: Option<&str>) {
        // Clone out of the slot so the hook can re-enter the client.
        let hook = self.hook.read().clone();
        match hook {
            Some(hook) => hook.on_unauthorized(rejected),
            None => tracing::debug!("401 received with no invalidation hook"),
        }
    }
}

/// A single request being assembled.
///
/// Nothing touches the network until [`decode`](Self::decode) or
/// [`execute`](Self::execute) is awaited; the bearer token is read at
/// that moment, not when the builder was created.
pub struct ApiRequest {
    client: ApiClient,
    builder: reqwest::RequestBuilder,
    method: Method,
    url: Url,
    guard: Guard,
    bearer: Option<String>,
}

impl ApiRequest {
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    /// URL-encoded form body.
    pub fn form<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.builder = self.builder.form(body);
        self
    }

    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.builder = self.builder.multipart(form);
        self
    }

    /// Marks the request [`Guard::Exempt`]: a `401` is returned to the
    /// caller without invalidating the session.
    pub fn exempt(mut self) -> Self {
        self.guard = Guard::Exempt;
        self
    }

    /// Sends `token` instead of the shared credential for this request
    /// only. Used to verify a token before it is installed.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Sends the request and decodes a JSON body.
    pub async fn decode<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        let codec = self.client.codec;
        let response = self.dispatch().await?;
        let bytes = response.bytes().await.map_err(TransportError::Request)?;
        Ok(codec.decode(&bytes)?)
    }

    /// Sends the request and discards the body (e.g. `204 No Content`).
    pub async fn execute(self) -> Result<(), TransportError> {
        self.dispatch().await.map(drop)
    }

    async fn dispatch(self) -> Result<reqwest::Response, TransportError> {
        let Self {
            client,
            mut builder,
            method,
            url,
            guard,
            bearer,
        } = self;

        // Outbound hook: read the rule at the last possible moment.
        let token = bearer.or_else(|| client.credential.current());
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(%method, path = url.path(), error = %e, "request failed");
            TransportError::Request(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%method, path = url.path(), status = status.as_u16(), "request ok");
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let detail = client
            .codec
            .decode::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.message());

        tracing::debug!(
            %method,
            path = url.path(),
            status = status.as_u16(),
            detail = detail.as_deref().unwrap_or(""),
            "request rejected"
        );

        if status == StatusCode::UNAUTHORIZED {
            // Inbound hook: invalidate before the caller can react.
            if guard == Guard::Session {
                client.notify_unauthorized(token.as_deref());
            }
            return Err(TransportError::Unauthorized { detail });
        }

        Err(TransportError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

/// Parses the base URL, forcing a trailing slash so that `Url::join`
/// appends endpoint paths instead of replacing the last segment.
fn parse_base(raw: &str) -> Result<Url, TransportError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|source| TransportError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
