use crate::completion::{ChatCompletionClient, CompletionClient};
use crate::config::Config;
use crate::host::BridgeHost;
use crate::notify::{EventSink, Notifier, WebhookSink};
use crate::orchestrator::TurnOrchestrator;
use crate::session::{CallConfig, CallSession};
use crate::storage::{JsonFileStore, KeyValueStore};
use anyhow::Result;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single voice call served by this process
    pub call: Arc<CallSession>,

    pub orchestrator: Arc<TurnOrchestrator>,

    /// Host capabilities fed by the browser client
    pub bridge: BridgeHost,

    pub store: Arc<dyn KeyValueStore>,

    pub notifier: Arc<Notifier>,
}

impl AppState {
    /// Wire the journal together from explicit parts
    pub fn new(
        call_config: CallConfig,
        completion: Arc<dyn CompletionClient>,
        store: Arc<dyn KeyValueStore>,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        let notifier = Arc::new(Notifier::new(sink, Arc::clone(&store)));
        let orchestrator = Arc::new(TurnOrchestrator::new(
            completion,
            Arc::clone(&notifier),
            Arc::clone(&store),
        ));
        let bridge = BridgeHost::new();
        let call = Arc::new(CallSession::new(
            call_config,
            Arc::new(bridge.clone()),
            Arc::clone(&orchestrator),
            Arc::clone(&notifier),
        ));

        Self {
            call,
            orchestrator,
            bridge,
            store,
            notifier,
        }
    }

    /// Build the production state from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(JsonFileStore::open(config.storage.resolved_path()?)?);

        let sink: Option<Arc<dyn EventSink>> = match &config.webhook.url {
            Some(url) => Some(Arc::new(WebhookSink::new(url.clone())?)),
            None => None,
        };

        let completion: Arc<dyn CompletionClient> =
            Arc::new(ChatCompletionClient::from_config(&config.completion));

        Ok(Self::new(
            CallConfig::new(config.speech.clone()),
            completion,
            store,
            sink,
        ))
    }
}
