//! The Herald runtime.
//!
//! [`HeraldRuntime`] owns a configuration, the platform client and a staged
//! [`Registry`]. Everything is registered up front; [`HeraldRuntime::run`]
//! then seals the registry, builds the [`Dispatcher`] and processes an event
//! stream, one task per event, until the stream ends or shutdown is requested.
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder(client)
//!     .config_file("herald.toml")
//!     .build()?;
//!
//! runtime.register_module(Arc::new(Moderation::default()))?;
//! runtime.run_until_signal(gateway.events()).await?;
//! ```

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use futures::{FutureExt, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use herald_core::{BoxedClient, InboundEvent};
use herald_framework::{
    ArgumentConverter, Check, Command, DispatchOutcome, Dispatcher, ErrorChannel, ErrorReport,
    ErrorSubscriber, Module, Prefix, Registry, RegistryResult, SlashCommand,
};

use crate::config::{ConfigLoader, HeraldConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Counters over every event the runtime has accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub received: u64,
    pub executed: u64,
    pub ignored: u64,
    pub failed: u64,
    /// Dispatches aborted by a panic outside the handler.
    pub panicked: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    executed: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: &DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Executed { .. } => &self.executed,
            DispatchOutcome::Ignored(_) => &self.ignored,
            DispatchOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RuntimeStats {
        RuntimeStats {
            received: self.received.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Runs command dispatch over a stream of platform events.
pub struct HeraldRuntime {
    config: HeraldConfig,
    client: BoxedClient,
    prefix: Prefix,
    errors: ErrorChannel,
    /// `None` once the registry has been sealed.
    staging: Mutex<Option<Registry>>,
    dispatcher: OnceLock<Dispatcher>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    logger: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
    counters: Arc<Counters>,
}

impl HeraldRuntime {
    /// Creates a builder that loads configuration from the usual locations.
    pub fn builder(client: BoxedClient) -> RuntimeBuilder {
        RuntimeBuilder::new(client)
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Initializes logging from `config.logging` unless a subscriber is
    /// already installed.
    pub fn from_config(config: HeraldConfig, client: BoxedClient) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        Self::assemble(config, client, None)
    }

    fn assemble(
        config: HeraldConfig,
        client: BoxedClient,
        prefix: Option<Prefix>,
    ) -> RuntimeResult<Self> {
        validate_config(&config)?;

        let mut registry = Registry::new();
        if config.dispatch.builtin_converters {
            registry.register_converter(ArgumentConverter::number())?;
        }

        let prefix = prefix.unwrap_or_else(|| Prefix::from(config.dispatch.prefix.as_str()));
        let errors = if config.runtime.unbounded_error_channel {
            ErrorChannel::unbounded()
        } else {
            ErrorChannel::new(config.runtime.error_channel_capacity)
        };

        info!(
            bot = client.self_id(),
            prefix = ?prefix,
            owners = config.dispatch.owners.len(),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            client,
            prefix,
            errors,
            staging: Mutex::new(Some(registry)),
            dispatcher: OnceLock::new(),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            logger: Mutex::new(None),
            counters: Arc::default(),
        })
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    /// The channel every dispatch failure is published on.
    ///
    /// Subscribe before [`run`](Self::run) to see every report.
    pub fn error_channel(&self) -> &ErrorChannel {
        &self.errors
    }

    pub fn subscribe_errors(&self) -> ErrorSubscriber {
        self.errors.subscribe()
    }

    pub fn register_command(&self, command: Command) -> RuntimeResult<()> {
        self.stage(|registry| registry.register_command(command))
    }

    pub fn register_slash_command(&self, command: SlashCommand) -> RuntimeResult<()> {
        self.stage(|registry| registry.register_slash_command(command))
    }

    pub fn register_converter(&self, converter: ArgumentConverter) -> RuntimeResult<()> {
        self.stage(|registry| registry.register_converter(converter))
    }

    pub fn register_check(&self, command: &str, check: Check) -> RuntimeResult<()> {
        self.stage(|registry| registry.register_check(command, check))
    }

    pub fn register_module(&self, module: Arc<dyn Module>) -> RuntimeResult<()> {
        self.stage(|registry| registry.register_module(module))
    }

    fn stage<T>(&self, f: impl FnOnce(&mut Registry) -> RegistryResult<T>) -> RuntimeResult<T> {
        let mut staging = self.staging.lock();
        let registry = staging.as_mut().ok_or(RuntimeError::AlreadyStarted)?;
        Ok(f(registry)?)
    }

    /// Returns the dispatcher once the runtime has started.
    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        self.dispatcher.get()
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher.get().is_some() && !self.shutdown.is_cancelled()
    }

    pub fn stats(&self) -> RuntimeStats {
        self.counters.snapshot()
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Requests shutdown. In-flight dispatches still run to completion.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Seals the registry and builds the dispatcher.
    ///
    /// Must be called from within a Tokio runtime when error logging is
    /// enabled. Fails with [`RuntimeError::AlreadyStarted`] on a second call.
    pub fn start(&self) -> RuntimeResult<Dispatcher> {
        let registry = self
            .staging
            .lock()
            .take()
            .ok_or(RuntimeError::AlreadyStarted)?;

        let dispatch = &self.config.dispatch;
        let dispatcher = Dispatcher::builder(Arc::new(registry), Arc::clone(&self.client))
            .prefix(self.prefix.clone())
            .owners(dispatch.owners.iter().cloned())
            .allow_self(dispatch.allow_self)
            .allow_bots(dispatch.allow_bots)
            .error_channel(self.errors.clone())
            .build();

        if self.config.runtime.log_errors {
            self.spawn_error_logger();
        }

        let registry = dispatcher.text().registry();
        info!(
            commands = registry.commands().count(),
            slash_commands = registry.slash_commands().count(),
            converters = registry.converters().count(),
            modules = registry.modules().count(),
            "Runtime started"
        );

        let _ = self.dispatcher.set(dispatcher.clone());
        Ok(dispatcher)
    }

    /// Dispatches every event from `events` until the stream ends or
    /// shutdown is requested, then waits for in-flight dispatches.
    pub async fn run<S>(&self, events: S) -> RuntimeResult<()>
    where
        S: Stream<Item = InboundEvent>,
    {
        let dispatcher = self.start()?;
        let mut events = std::pin::pin!(events);

        info!("Herald runtime is now dispatching events");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, no longer accepting events");
                    break;
                }
                next = events.next() => match next {
                    Some(event) => self.spawn_dispatch(&dispatcher, event),
                    None => {
                        debug!("Event stream ended");
                        break;
                    }
                },
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        self.stop_error_logger().await;
        self.shutdown.cancel();

        let stats = self.stats();
        info!(
            received = stats.received,
            executed = stats.executed,
            ignored = stats.ignored,
            failed = stats.failed,
            panicked = stats.panicked,
            "Runtime stopped"
        );

        Ok(())
    }

    /// Like [`run`](Self::run), also stopping on Ctrl+C or SIGTERM.
    pub async fn run_until_signal<S>(&self, events: S) -> RuntimeResult<()>
    where
        S: Stream<Item = InboundEvent>,
    {
        let token = self.shutdown.clone();
        let signals = tokio::spawn(async move {
            wait_for_shutdown().await;
            token.cancel();
        });

        let result = self.run(events).await;
        signals.abort();
        result
    }

    fn spawn_dispatch(&self, dispatcher: &Dispatcher, event: InboundEvent) {
        let dispatcher = dispatcher.clone();
        let counters = Arc::clone(&self.counters);
        counters.received.fetch_add(1, Ordering::Relaxed);

        self.tracker.spawn(async move {
            match AssertUnwindSafe(dispatcher.dispatch(event))
                .catch_unwind()
                .await
            {
                Ok(outcome) => counters.record(&outcome),
                Err(_) => {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    error!("Dispatch panicked outside the command handler");
                }
            }
        });
    }

    fn spawn_error_logger(&self) {
        let mut subscriber = self.errors.subscribe();
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    report = subscriber.recv() => match report {
                        Some(report) => log_report(&report),
                        None => break,
                    },
                    _ = token.cancelled() => break,
                }
            }
        });

        *self.logger.lock() = Some((handle, stop));
    }

    async fn stop_error_logger(&self) {
        let logger = self.logger.lock().take();
        if let Some((handle, stop)) = logger {
            stop.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "Error logger task failed");
            }
        }
    }
}

fn log_report(report: &ErrorReport) {
    let kind = report.kind();
    let command = report.command_name().unwrap_or("-");
    if kind.is_user_facing() {
        info!(%kind, command, error = %report.error, "Command rejected");
    } else {
        error!(%kind, command, error = %report.error, "Command failed");
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                if signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, shutting down");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}

impl std::fmt::Debug for HeraldRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeraldRuntime")
            .field("config", &self.config)
            .field("prefix", &self.prefix)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`HeraldRuntime`].
#[must_use]
pub struct RuntimeBuilder {
    client: BoxedClient,
    config_loader: ConfigLoader,
    config: Option<HeraldConfig>,
    prefix: Option<Prefix>,
    init_logging: bool,
}

impl RuntimeBuilder {
    pub fn new(client: BoxedClient) -> Self {
        Self {
            client,
            config_loader: ConfigLoader::new(),
            config: None,
            prefix: None,
            init_logging: true,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration below files and environment variables.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses this configuration as-is, skipping files and environment.
    pub fn config(mut self, config: HeraldConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the configured prefix, e.g. with a per-guild
    /// [`Prefix::dynamic`] resolver.
    pub fn prefix(mut self, prefix: impl Into<Prefix>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Whether to install a tracing subscriber from the logging config
    /// (default: true).
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    pub fn build(self) -> RuntimeResult<HeraldRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        if self.init_logging {
            logging::init_from_config(&config.logging);
        }
        HeraldRuntime::assemble(config, self.client, self.prefix)
    }
}
