//! `DocQaClient` builder and handle.
//!
//! This is the entry point for an application talking to the docqa
//! backend. It ties together all the layers: protocol → transport →
//! session → resource APIs.

use std::time::Duration;

use docqa_session::{
    FileTokenStore, Navigator, NoopNavigator, Route, SessionConfig,
    SessionManager, SessionStatus, TokenStore,
};
use docqa_transport::{ApiClient, ClientConfig};

use crate::{DocQaError, DocumentApi, QueryApi};

/// Builder for configuring a [`DocQaClient`].
///
/// # Example
///
/// ```rust,ignore
/// use docqa::prelude::*;
///
/// let client = DocQaClient::builder()
///     .config(ClientConfig::from_env())
///     .navigator(|route| println!("go to {route:?}"))
///     .build()?;
/// client.initialize().await;
/// ```
pub struct DocQaClientBuilder {
    config: ClientConfig,
    session_config: SessionConfig,
    store: Option<Box<dyn TokenStore>>,
    navigator: Option<Box<dyn Navigator>>,
}

impl DocQaClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            session_config: SessionConfig::default(),
            store: None,
            navigator: None,
        }
    }

    /// Replaces the whole HTTP configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API root, e.g. `http://localhost:8000/api/v1`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Where the token is persisted. Defaults to a [`FileTokenStore`] at
    /// its default location.
    pub fn token_store(mut self, store: impl TokenStore) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Receives redirect signals. Defaults to ignoring them.
    pub fn navigator(mut self, navigator: impl Navigator) -> Self {
        self.navigator = Some(Box::new(navigator));
        self
    }

    /// Builds the client. The session starts `Uninitialized`; call
    /// [`DocQaClient::initialize`] next.
    pub fn build(self) -> Result<DocQaClient, DocQaError> {
        let api = ApiClient::new(&self.config)?;

        let store = match self.store {
            Some(store) => store,
            None => Box::new(FileTokenStore::at_default_location()?),
        };

        let session = match self.navigator {
            Some(navigator) => SessionManager::new(
                api,
                store,
                move |route: Route| navigator.navigate(route),
                self.session_config,
            ),
            None => SessionManager::new(
                api,
                store,
                NoopNavigator,
                self.session_config,
            ),
        };

        tracing::debug!(base = %self.config.base_url, "docqa client built");
        Ok(DocQaClient { session })
    }
}

impl Default for DocQaClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured client: the session plus the resource APIs that ride on
/// its decorated pipeline.
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct DocQaClient {
    session: SessionManager,
}

impl DocQaClient {
    /// Creates a new builder.
    pub fn builder() -> DocQaClientBuilder {
        DocQaClientBuilder::new()
    }

    /// Restores the persisted session. See
    /// [`SessionManager::initialize`].
    pub async fn initialize(&self) -> SessionStatus {
        self.session.initialize().await
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn documents(&self) -> DocumentApi {
        DocumentApi::new(self.session.client().clone())
    }

    pub fn queries(&self) -> QueryApi {
        QueryApi::new(self.session.client().clone())
    }
}
