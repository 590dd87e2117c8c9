//! The lifecycle controller.
//!
//! [`CourierRuntime`] owns the process-wide [`BotContext`] and runs the
//! startup sequence exactly once, in this order:
//!
//! 1. validate the configuration
//! 2. load command and component units into the registry
//! 3. build the context and start command sync in the background
//! 4. attach the router
//! 5. connect the gateway, mark the client ready and set the presence
//!
//! It then dispatches every inbound interaction on its own task until the
//! event stream closes or shutdown is requested.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use courier_runtime::{ChannelGateway, CourierRuntime};
//!
//! let runtime = CourierRuntime::builder()
//!     .config_file("courier.toml")
//!     .build()?
//!     .actions(actions)
//!     .gateway(gateway);
//!
//! // Until Ctrl+C or SIGTERM
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, ConfigLoader, CourierConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::gateway::Gateway;
use crate::rest::RestRegistrar;
use crate::sync::{CommandRegistrar, RegistrationScope, SyncOutcome, spawn_sync};
use courier_framework::{
    ActionTable, BotContext, DispatchOutcome, HandlerLoader, HandlerUnit, Registry, Router,
    RouterMessages,
};

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The gateway closed the event stream.
    StreamClosed,
    /// Shutdown was requested.
    Shutdown,
}

/// How long a shutdown waits for in-flight interactions before aborting them.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened during a run.
#[derive(Debug)]
pub struct RunReport {
    pub stop: StopReason,
    /// Interactions received from the gateway.
    pub dispatched: usize,
    /// Interactions whose handling ended in [`DispatchOutcome::Failed`]
    /// or was aborted at shutdown.
    pub failed: usize,
    /// `None` if the sync was still running at shutdown and was cancelled.
    pub sync: Option<SyncOutcome>,
}

/// The Courier runtime.
pub struct CourierRuntime {
    config: CourierConfig,
    actions: ActionTable,
    units: Vec<HandlerUnit>,
    registrar: Option<Arc<dyn CommandRegistrar>>,
    gateway: Option<Arc<dyn Gateway>>,
    messages: RouterMessages,
    shutdown: CancellationToken,
    drain_timeout: Duration,
}

impl CourierRuntime {
    /// Creates a runtime from an already loaded configuration.
    pub fn new(config: CourierConfig) -> Self {
        Self {
            config,
            actions: ActionTable::new(),
            units: Vec::new(),
            registrar: None,
            gateway: None,
            messages: RouterMessages::default(),
            shutdown: CancellationToken::new(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Creates a builder that loads the configuration first.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// Sets the actions that handler manifests refer to.
    pub fn actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    /// Adds a unit defined in code. Applied after the manifest directories,
    /// so it replaces a manifest unit with the same identity.
    pub fn unit(mut self, unit: impl Into<HandlerUnit>) -> Self {
        self.units.push(unit.into());
        self
    }

    /// Sets the command registrar. Defaults to a [`RestRegistrar`] built
    /// from the configuration.
    pub fn registrar(mut self, registrar: Arc<dyn CommandRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    /// Sets the gateway. Required.
    pub fn gateway(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Replaces the messages the router sends on misses and failures.
    pub fn messages(mut self, messages: RouterMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Bounds how long a shutdown waits for in-flight interactions.
    /// Defaults to [`DEFAULT_DRAIN_TIMEOUT`].
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// A token that stops the event loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the startup sequence up to, but not including, the gateway
    /// connection.
    ///
    /// Command sync is spawned here, so this must be called from within a
    /// Tokio runtime.
    pub fn prepare(self) -> RuntimeResult<PreparedRuntime> {
        validate_config(&self.config)?;

        let gateway = self
            .gateway
            .ok_or(RuntimeError::MissingComponent("gateway"))?;
        let application_id = self
            .config
            .bot
            .application_id
            .clone()
            .ok_or_else(|| ConfigError::missing_field("bot.application_id (CLIENT_ID)"))?;
        let guild_id = self.config.bot.guild_id.clone();

        let registrar = match self.registrar {
            Some(registrar) => registrar,
            None => Arc::new(RestRegistrar::from_config(&self.config)?),
        };

        let registry = load_registry(&self.config, &self.actions, self.units);
        let (commands, components) = registry.counts();
        info!(
            commands,
            components,
            skipped = registry.warnings().len(),
            "Handlers loaded"
        );

        let batch = registry.registration_batch();
        let ctx = Arc::new(
            BotContext::new(application_id, Arc::new(registry)).with_guild(guild_id.clone()),
        );

        let scope = RegistrationScope::from_guild(guild_id.as_deref());
        let sync = spawn_sync(registrar, batch, scope);

        let router = Router::new(Arc::clone(&ctx)).with_messages(self.messages);
        debug!("Router attached");

        Ok(PreparedRuntime {
            config: self.config,
            ctx,
            router,
            gateway,
            sync,
            shutdown: self.shutdown,
            drain_timeout: self.drain_timeout,
        })
    }

    /// Runs until the event stream closes or Ctrl+C / SIGTERM is received.
    pub async fn run(self) -> RuntimeResult<RunReport> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until the event stream closes or `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> RuntimeResult<RunReport>
    where
        F: Future<Output = ()>,
    {
        self.prepare()?.run_until(shutdown).await
    }
}

impl std::fmt::Debug for CourierRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierRuntime")
            .field("actions", &self.actions)
            .field("units", &self.units.len())
            .field("registrar", &self.registrar.is_some())
            .field("gateway", &self.gateway.is_some())
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

fn load_registry(config: &CourierConfig, actions: &ActionTable, units: Vec<HandlerUnit>) -> Registry {
    let loader = HandlerLoader::new(actions);
    let mut builder = Registry::builder()
        .extend(loader.load_commands(&config.handlers.commands_dir))
        .extend(loader.load_components(&config.handlers.components_dir));
    for unit in units {
        builder.add(unit);
    }
    builder.build()
}

// =============================================================================
// PreparedRuntime
// =============================================================================

/// A runtime whose registry is loaded and whose sync is under way.
pub struct PreparedRuntime {
    config: CourierConfig,
    ctx: Arc<BotContext>,
    router: Router,
    gateway: Arc<dyn Gateway>,
    sync: JoinHandle<SyncOutcome>,
    shutdown: CancellationToken,
    drain_timeout: Duration,
}

impl PreparedRuntime {
    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn registry(&self) -> &Registry {
        self.ctx.registry()
    }

    /// Connects the gateway and dispatches events until the stream closes
    /// or `shutdown` completes.
    ///
    /// A gateway error on connect, such as rejected credentials, is returned
    /// and ends the run.
    pub async fn run_until<F>(self, shutdown: F) -> RuntimeResult<RunReport>
    where
        F: Future<Output = ()>,
    {
        let token = self
            .config
            .bot
            .auth_token
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("bot.auth_token (TOKEN)"))?;

        let session = match self.gateway.connect(token).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Failed to connect to the gateway");
                self.sync.abort();
                return Err(e.into());
            }
        };

        self.ctx.mark_ready(session.ready);

        if let Some(activity) = self.config.bot.presence.activity() {
            match self.gateway.set_presence(&activity).await {
                Ok(()) => info!(activity = %activity, "Presence set"),
                Err(e) => warn!(error = %e, "Failed to set presence"),
            }
        }

        let mut events = session.events;
        let mut in_flight = JoinSet::new();
        let mut dispatched = 0;
        let mut failed = 0;

        info!("Courier is now running");

        tokio::pin!(shutdown);
        let stop = loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break StopReason::Shutdown,
                () = self.shutdown.cancelled() => break StopReason::Shutdown,
                event = events.recv() => match event {
                    Some(interaction) => {
                        dispatched += 1;
                        let router = self.router.clone();
                        in_flight.spawn(async move { router.dispatch(interaction).await });
                        while let Some(done) = in_flight.try_join_next() {
                            failed += count_failure(done);
                        }
                    }
                    None => break StopReason::StreamClosed,
                },
            }
        };

        match stop {
            StopReason::StreamClosed => info!("Gateway event stream closed"),
            StopReason::Shutdown => info!("Shutting down"),
        }
        self.ctx.mark_disconnected();

        if !in_flight.is_empty() {
            debug!(count = in_flight.len(), "Waiting for in-flight interactions");
        }
        let drain = async {
            while let Some(done) = in_flight.join_next().await {
                failed += count_failure(done);
            }
        };
        // Only an explicit shutdown bounds the drain.
        let drained = match stop {
            StopReason::StreamClosed => {
                drain.await;
                true
            }
            StopReason::Shutdown => tokio::time::timeout(self.drain_timeout, drain)
                .await
                .is_ok(),
        };
        if !drained {
            let aborted = in_flight.len();
            warn!(
                count = aborted,
                timeout_ms = self.drain_timeout.as_millis() as u64,
                "In-flight interactions did not finish in time, aborting"
            );
            in_flight.shutdown().await;
            failed += aborted;
        }

        // A stream that closed on its own leaves time for the sync to finish;
        // an explicit shutdown does not wait for it.
        let sync = if stop == StopReason::Shutdown && !self.sync.is_finished() {
            warn!("Command sync still running at shutdown, cancelling");
            self.sync.abort();
            None
        } else {
            match self.sync.await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!(error = %e, "Command sync task failed");
                    None
                }
            }
        };

        info!(dispatched, failed, "Runtime stopped");
        Ok(RunReport {
            stop,
            dispatched,
            failed,
            sync,
        })
    }
}

impl std::fmt::Debug for PreparedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRuntime")
            .field("context", &self.ctx)
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

fn count_failure(done: Result<DispatchOutcome, tokio::task::JoinError>) -> usize {
    match done {
        Ok(DispatchOutcome::Failed) => 1,
        Ok(_) => 0,
        Err(e) => {
            error!(error = %e, "Dispatch task aborted");
            1
        }
    }
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
///
/// If no signal handler can be installed this never returns, and the
/// runtime stops only when the event stream closes.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c() => {}
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Loads the configuration, then creates a [`CourierRuntime`].
///
/// ```rust,ignore
/// let runtime = CourierRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
#[derive(Debug)]
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder that searches the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Loads this file instead of searching.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Ignores environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration given in code over the loaded one.
    pub fn merge(mut self, config: CourierConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<CourierRuntime> {
        let config = self.config_loader.load()?;
        Ok(CourierRuntime::new(config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
