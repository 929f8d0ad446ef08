//! Application orchestration.
//!
//! [`App`] wires the injected collaborators together: it validates the
//! configuration, hydrates the channel directory, loads discovered handler
//! definitions into a registry, and then drives the dispatcher from a stream
//! of gateway events while the job runner ticks in the background.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use braze_core::{
    BoxedClient, ChannelDirectory, ChatClient, Dispatcher, DirectoryStore, GatewayEvent,
    HandlerRegistry, JobRunner, TokenPolicy,
};

use crate::config::BrazeConfig;
use crate::discovery::HandlerSource;
use crate::error::{RuntimeError, RuntimeResult};
use crate::store::JsonFileStore;

/// The assembled Braze application.
///
/// Constructed through [`App::builder`]; construction fails with
/// [`RuntimeError::MissingToken`] before any connection attempt when the
/// configuration carries no token.
pub struct App {
    config: BrazeConfig,
    client: BoxedClient,
    directory: Arc<ChannelDirectory>,
    source: Box<dyn HandlerSource + Send>,
    registry: Option<Arc<HandlerRegistry>>,
    dispatcher: Option<Arc<Dispatcher>>,
}

impl App {
    /// Creates an application builder.
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// Returns the configured gateway token, for the transport collaborator.
    pub fn token(&self) -> &str {
        self.config.token.as_deref().unwrap_or_default()
    }

    /// Returns the shared channel directory.
    pub fn directory(&self) -> &Arc<ChannelDirectory> {
        &self.directory
    }

    /// Returns the dispatcher, once [`load`](Self::load) has run.
    pub fn dispatcher(&self) -> Option<&Arc<Dispatcher>> {
        self.dispatcher.as_ref()
    }

    /// Hydrates the directory and loads the handler registry.
    ///
    /// Each registered name is logged. Loading zero definitions is a valid
    /// no-op. Idempotent: a second call does nothing.
    pub async fn load(&mut self) -> RuntimeResult<(Arc<HandlerRegistry>, Arc<Dispatcher>)> {
        if let (Some(registry), Some(dispatcher)) = (&self.registry, &self.dispatcher) {
            return Ok((Arc::clone(registry), Arc::clone(dispatcher)));
        }

        self.directory.hydrate().await;

        let definitions = self.source.definitions();
        let registry = Arc::new(HandlerRegistry::load(
            definitions,
            Arc::clone(&self.client),
            Arc::clone(&self.directory),
            |name| info!(name, "registered handler"),
        )?);
        info!(
            commands = registry.command_count(),
            jobs = registry.job_count(),
            "handlers loaded"
        );

        let policy = match self.config.dispatch.max_command_length {
            Some(max) => TokenPolicy::Bounded(max),
            None => TokenPolicy::Sentinel,
        };
        let mut dispatcher = Dispatcher::new(
            Arc::clone(&self.client),
            Arc::clone(&self.directory),
            Arc::clone(&registry),
        )
        .with_policy(policy);
        if let Some(token) = &self.config.dispatch.list_command {
            dispatcher = dispatcher.with_list_command(token);
        }

        let dispatcher = Arc::new(dispatcher);
        self.registry = Some(Arc::clone(&registry));
        self.dispatcher = Some(Arc::clone(&dispatcher));
        Ok((registry, dispatcher))
    }

    /// Runs the event loop until the stream closes or ctrl-c arrives.
    ///
    /// Starts every registered job exactly once, routes each received
    /// gateway event through the dispatcher, and shuts the job runner down
    /// on exit.
    pub async fn run(mut self, mut events: mpsc::Receiver<GatewayEvent>) -> RuntimeResult<()> {
        let (registry, dispatcher) = self.load().await?;

        let runner = JobRunner::from_registry(&registry);
        let handles = runner.start_all();
        info!(jobs = runner.job_count(), "braze runtime started");

        loop {
            tokio::select! {
                maybe = events.recv() => match maybe {
                    Some(event) => dispatcher.handle(event).await,
                    None => {
                        info!("gateway event stream closed");
                        break;
                    }
                },
                _ = signal::ctrl_c() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        runner.shutdown();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "job loop ended abnormally");
            }
        }
        Ok(())
    }
}

/// Builder for [`App`].
#[derive(Default)]
pub struct AppBuilder {
    config: Option<BrazeConfig>,
    client: Option<BoxedClient>,
    source: Option<Box<dyn HandlerSource + Send>>,
    store: Option<Arc<dyn DirectoryStore>>,
}

impl AppBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: BrazeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the connected gateway client.
    pub fn client(mut self, client: impl ChatClient + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Sets a shared gateway client.
    pub fn boxed_client(mut self, client: BoxedClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the handler discovery source.
    pub fn source(mut self, source: impl HandlerSource + Send + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Overrides the directory store. Defaults to a [`JsonFileStore`] over
    /// `directory.file` when that is configured, otherwise in-memory only.
    pub fn store(mut self, store: Arc<dyn DirectoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validates the configuration and assembles the application.
    pub fn build(self) -> RuntimeResult<App> {
        let config = self.config.unwrap_or_default();
        if config.token.as_deref().is_none_or(str::is_empty) {
            return Err(RuntimeError::MissingToken);
        }
        let client = self.client.ok_or_else(|| {
            RuntimeError::Gateway(braze_core::GatewayError::Other(
                "no gateway client provided".into(),
            ))
        })?;

        let store = self.store.or_else(|| {
            config
                .directory
                .file
                .as_ref()
                .map(|path| Arc::new(JsonFileStore::new(path)) as Arc<dyn DirectoryStore>)
        });
        let directory = Arc::new(match store {
            Some(store) => ChannelDirectory::with_store(store),
            None => ChannelDirectory::new(),
        });

        let source = self
            .source
            .unwrap_or_else(|| Box::new(crate::discovery::StaticSource::new(Vec::new())));

        Ok(App {
            config,
            client,
            directory,
            source,
            registry: None,
            dispatcher: None,
        })
    }
}
