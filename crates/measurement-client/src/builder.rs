use crate::{ClientError, ClientResult, MeasurementClient};
use measurement_config_and_utils::Config;
use measurement_outbox::{
    AlwaysOnline, BackgroundRequester, ConnectivityProbe, HttpTransport, HttpTransportConfig,
    RetryPolicy, Transport,
};
use measurement_persistence::{MemoryStore, StateStore};
use measurement_protocol::{Environment, MeasurementUriBuilder, SystemEnvironment};
use measurement_session::{random_selector, SessionManager};
use std::sync::Arc;
use tracing::{info, warn};

type Selector = Box<dyn FnOnce() -> f64 + Send>;

/// Assembles a [`MeasurementClient`] from a [`Config`] and host capabilities.
///
/// Anything not supplied falls back to a default: an HTTP transport built
/// from the config, an always-online probe, the POSIX locale environment, an
/// in-memory store, and a uniform random sampling draw.
pub struct ClientBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    connectivity: Option<Arc<dyn ConnectivityProbe>>,
    environment: Option<Arc<dyn Environment>>,
    store: Option<Arc<dyn StateStore>>,
    selector: Option<Selector>,
    retry_policy: Option<RetryPolicy>,
}

impl ClientBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
            connectivity: None,
            environment: None,
            store: None,
            selector: None,
            retry_policy: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn connectivity(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.connectivity = Some(probe);
        self
    }

    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sampling draw in `[0, 100)`, used only when a new visitor is created.
    pub fn selector(mut self, selector: impl FnOnce() -> f64 + Send + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry_policy = Some(retry);
        self
    }

    /// Validate the config, restore or create session state, and wire the
    /// collaborators together. Does not start delivery.
    pub fn build(self) -> ClientResult<MeasurementClient> {
        let config = self.config;
        config.validate()?;
        if config.property_id.trim().is_empty() {
            return Err(ClientError::MissingPropertyId);
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let session = match store.load_session_state()? {
            Some(state) => SessionManager::restore(state, config.session_timeout()),
            None => {
                let selector = self.selector.unwrap_or_else(|| Box::new(random_selector));
                let session =
                    SessionManager::with_selector(config.sample_rate, config.session_timeout(), selector);
                if let Err(err) = store.save_session_state(&session.get_state()) {
                    warn!(error = %err, "Failed to save new visitor state");
                }
                session
            }
        };

        let environment = self
            .environment
            .unwrap_or_else(|| Arc::new(SystemEnvironment::new()));
        let uri_builder =
            MeasurementUriBuilder::new(config.endpoint()?, config.property_id.clone(), environment)?
                .with_app(config.app_name.clone(), config.app_version.clone())
                .with_anonymize_ip(config.anonymize_ip);

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(HttpTransportConfig {
                timeout: config.request_timeout(),
                user_agent: config.user_agent.clone(),
            })?),
        };

        let requester = BackgroundRequester::builder(transport)
            .connectivity(
                self.connectivity
                    .unwrap_or_else(|| Arc::new(AlwaysOnline)),
            )
            .retry_policy(self.retry_policy.unwrap_or_default())
            .build();

        info!(
            property_id = %config.property_id,
            visitor_id = %session.visitor().id(),
            session_number = session.session().number(),
            visitor_status = ?session.visitor_status(),
            "Measurement client initialized"
        );

        Ok(MeasurementClient::from_parts(
            config,
            session,
            uri_builder,
            requester,
            store,
        ))
    }
}
