//! The dispatch core: command loop, event loop and their handling tasks.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use domain::{Command, CommandStream, Event, EventConsumer, Table};
use futures_util::{FutureExt, StreamExt};
use repository::Repository;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::config::BusConfig;
use crate::error::{BusError, Result};
use crate::lifecycle::Shutdown;
use crate::limit::ConcurrencyLimit;
use crate::registry::{Component, Registry};

/// Command type handled by the tables of repository `R`.
pub type CommandOf<R> = <<R as Repository>::Table as Table>::Command;

/// Event type emitted by the tables of repository `R`.
pub type EventOf<R> = <<R as Repository>::Table as Table>::Event;

/// Collects the repository, configuration and components of a bus.
///
/// Components can only be registered here, before the bus exists, so the
/// consumer list is fixed for the whole run.
pub struct BusBuilder<R: Repository> {
    repository: Arc<R>,
    config: BusConfig,
    registry: Registry<CommandOf<R>, EventOf<R>>,
}

impl<R: Repository> BusBuilder<R> {
    /// Creates a builder around the given repository.
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            config: BusConfig::default(),
            registry: Registry::new(),
        }
    }

    /// Replaces the default configuration.
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a component by the capabilities it declares.
    pub fn register(mut self, component: impl Component<CommandOf<R>, EventOf<R>>) -> Self {
        self.registry.register(component.capabilities());
        self
    }

    /// Allocates the inboxes and returns a bus ready to start.
    pub fn build(self) -> Bus<R> {
        let (command_tx, command_rx) = mpsc::channel(self.config.command_inbox_capacity.max(1));
        let (event_tx, event_rx) = mpsc::channel(self.config.event_inbox_capacity.max(1));

        tracing::debug!(
            consumers = self.registry.consumers.len(),
            sources = self.registry.sources.len(),
            config = ?self.config,
            "bus built"
        );

        Bus {
            repository: self.repository,
            config: self.config,
            registry: self.registry,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }
}

/// A built, not yet started bus.
///
/// [`Bus::start`] consumes it, so a bus runs at most once.
pub struct Bus<R: Repository> {
    repository: Arc<R>,
    config: BusConfig,
    registry: Registry<CommandOf<R>, EventOf<R>>,
    command_tx: mpsc::Sender<CommandOf<R>>,
    command_rx: mpsc::Receiver<CommandOf<R>>,
    event_tx: mpsc::Sender<EventOf<R>>,
    event_rx: mpsc::Receiver<EventOf<R>>,
}

impl<R: Repository> Bus<R> {
    /// Shorthand for [`BusBuilder::new`].
    pub fn builder(repository: R) -> BusBuilder<R> {
        BusBuilder::new(repository)
    }

    /// Returns the configuration the bus will start with.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Returns the number of registered event consumers.
    pub fn consumer_count(&self) -> usize {
        self.registry.consumers.len()
    }

    /// Returns the number of registered command sources.
    pub fn source_count(&self) -> usize {
        self.registry.sources.len()
    }

    /// Launches the command loop, the event loop and one forwarding task per
    /// registered command source.
    ///
    /// The loops run until `shutdown` is triggered, either by the owner or
    /// by the bus itself after a fatal error.
    pub fn start(self, shutdown: Shutdown) -> BusHandle {
        let Bus {
            repository,
            config,
            registry,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        } = self;

        let supervisor = Arc::new(Supervisor::new(shutdown.clone()));
        let dispatcher = Arc::new(Dispatcher {
            repository,
            consumers: registry.consumers.into(),
            events: event_tx,
            supervisor: Arc::clone(&supervisor),
        });

        for source in registry.sources {
            tokio::spawn(forward_commands(
                source.commands(),
                command_tx.clone(),
                shutdown.clone(),
            ));
        }
        // The inbox closes once every forwarder is done.
        drop(command_tx);

        let command_loop = tokio::spawn(run_command_loop(
            Arc::clone(&dispatcher),
            command_rx,
            ConcurrencyLimit::new(config.max_concurrent_commands),
            shutdown.clone(),
        ));
        let event_loop = tokio::spawn(run_event_loop(
            dispatcher,
            event_rx,
            ConcurrencyLimit::new(config.max_concurrent_events),
            shutdown.clone(),
        ));

        tracing::info!("bus started");

        BusHandle {
            shutdown,
            supervisor,
            command_loop,
            event_loop,
        }
    }
}

/// Handle to a running bus.
pub struct BusHandle {
    shutdown: Shutdown,
    supervisor: Arc<Supervisor>,
    command_loop: JoinHandle<()>,
    event_loop: JoinHandle<()>,
}

impl BusHandle {
    /// Stops both loops from accepting further commands and events.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Returns a clone of the bus lifecycle signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Returns true while both loops are alive.
    pub fn is_running(&self) -> bool {
        !self.command_loop.is_finished() && !self.event_loop.is_finished()
    }

    /// Waits for both loops to exit.
    ///
    /// Returns the first fatal error recorded by a handling task (a failed
    /// load or save, or a panic in a table or consumer), or `Ok` after an
    /// orderly shutdown.
    pub async fn wait(self) -> Result<()> {
        let (commands, events) = tokio::join!(self.command_loop, self.event_loop);

        if let Some(err) = self.supervisor.take_error().await {
            return Err(err);
        }
        commands.map_err(|e| BusError::TaskPanicked(format!("command loop: {e}")))?;
        events.map_err(|e| BusError::TaskPanicked(format!("event loop: {e}")))?;

        tracing::info!("bus stopped");
        Ok(())
    }
}

/// Records the first fatal error and stops the bus.
struct Supervisor {
    shutdown: Shutdown,
    error: Mutex<Option<BusError>>,
}

impl Supervisor {
    fn new(shutdown: Shutdown) -> Self {
        Self {
            shutdown,
            error: Mutex::new(None),
        }
    }

    async fn fail(&self, err: BusError) {
        tracing::error!(error = %err, "fatal bus error, stopping");
        metrics::counter!("bus_fatal_errors_total").increment(1);

        let mut slot = self.error.lock().await;
        if slot.is_none() {
            *slot = Some(err);
        }
        drop(slot);

        self.shutdown.trigger();
    }

    async fn take_error(&self) -> Option<BusError> {
        self.error.lock().await.take()
    }

    /// Runs one handling task, turning a panic into a fatal error.
    async fn guard(&self, task: &'static str, work: impl Future<Output = ()>) {
        let Err(panic) = AssertUnwindSafe(work).catch_unwind().await else {
            return;
        };
        let err = BusError::TaskPanicked(format!("{task}: {}", panic_message(&*panic)));
        drop(panic);
        self.fail(err).await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// State shared by every handling task.
struct Dispatcher<R: Repository> {
    repository: Arc<R>,
    consumers: Arc<[Arc<dyn EventConsumer<EventOf<R>>>]>,
    events: mpsc::Sender<EventOf<R>>,
    supervisor: Arc<Supervisor>,
}

impl<R: Repository> Dispatcher<R> {
    /// Loads the target table, lets it handle the command and forwards the
    /// resulting events in order.
    #[tracing::instrument(skip_all, fields(table = %command.table_id()))]
    async fn handle_command(self: Arc<Self>, command: CommandOf<R>) {
        let started = Instant::now();
        let table_id = command.table_id().clone();

        let mut table = match self.repository.load(&table_id).await {
            Ok(table) => table,
            Err(source) => {
                self.supervisor
                    .fail(BusError::Load {
                        table: table_id,
                        source,
                    })
                    .await;
                return;
            }
        };

        let events = table.handle_command(&command).await;
        tracing::debug!(events = events.len(), "command handled");

        for event in events {
            if self.events.send(event).await.is_err() {
                tracing::debug!("event inbox closed, dropping remaining events");
                break;
            }
        }

        metrics::histogram!("bus_command_duration_seconds")
            .record(started.elapsed().as_secs_f64());
    }

    /// Persists a table snapshot if the event carries one, then notifies
    /// every consumer in registration order.
    #[tracing::instrument(skip_all, fields(event_type = event.event_type()))]
    async fn handle_event(self: Arc<Self>, event: EventOf<R>) {
        if let Some(update) = event.as_table_updated() {
            if let Err(source) = self.repository.save(update).await {
                self.supervisor
                    .fail(BusError::Save {
                        table: update.table_id.clone(),
                        source,
                    })
                    .await;
                return;
            }
            metrics::counter!("bus_table_saves_total").increment(1);
        }

        for consumer in self.consumers.iter() {
            consumer.handle_event(&event).await;
        }
    }
}

#[tracing::instrument(skip_all)]
async fn run_command_loop<R: Repository>(
    dispatcher: Arc<Dispatcher<R>>,
    mut inbox: mpsc::Receiver<CommandOf<R>>,
    limit: ConcurrencyLimit,
    shutdown: Shutdown,
) {
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            received = inbox.recv() => {
                let Some(command) = received else {
                    tracing::debug!("all command sources finished");
                    shutdown.cancelled().await;
                    break;
                };
                tracing::debug!(
                    table = %command.table_id(),
                    command = ?command,
                    "command received"
                );
                metrics::counter!("bus_commands_total", "group" => command.group().to_string())
                    .increment(1);

                let permit = tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break,
                    permit = limit.acquire() => permit,
                };
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move {
                    let supervisor = Arc::clone(&dispatcher.supervisor);
                    supervisor
                        .guard("command task", dispatcher.handle_command(command))
                        .await;
                    drop(permit);
                });
            }
        }
    }
    tracing::debug!("command loop stopped");
}

#[tracing::instrument(skip_all)]
async fn run_event_loop<R: Repository>(
    dispatcher: Arc<Dispatcher<R>>,
    mut inbox: mpsc::Receiver<EventOf<R>>,
    limit: ConcurrencyLimit,
    shutdown: Shutdown,
) {
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            received = inbox.recv() => {
                let Some(event) = received else {
                    shutdown.cancelled().await;
                    break;
                };
                tracing::debug!(event_type = event.event_type(), "event received");
                metrics::counter!("bus_events_total", "event_type" => event.event_type())
                    .increment(1);

                let permit = tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break,
                    permit = limit.acquire() => permit,
                };
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move {
                    let supervisor = Arc::clone(&dispatcher.supervisor);
                    supervisor
                        .guard("event task", dispatcher.handle_event(event))
                        .await;
                    drop(permit);
                });
            }
        }
    }
    tracing::debug!("event loop stopped");
}

/// Drains one command source into the command inbox.
async fn forward_commands<C>(
    mut commands: CommandStream<C>,
    inbox: mpsc::Sender<C>,
    shutdown: Shutdown,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            next = commands.next() => next,
        };
        let Some(command) = next else {
            tracing::debug!("command source exhausted");
            break;
        };
        let sent = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            sent = inbox.send(command) => sent,
        };
        if sent.is_err() {
            tracing::debug!("command inbox closed, stopping forwarder");
            break;
        }
    }
}
