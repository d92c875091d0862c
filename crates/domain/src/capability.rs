//! Capabilities a component can offer to the bus.
//!
//! A component may consume events, produce commands, or both. Each
//! capability is a separate trait so they can be implemented independently.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use tokio::sync::mpsc;

/// A stream of commands supplied by a [`CommandSource`].
pub type CommandStream<C> = Pin<Box<dyn Stream<Item = C> + Send>>;

/// Reacts to every event dispatched through the bus.
///
/// Consumers are called inline from the event's handling task, after any
/// persistence step, in registration order. A consumer that never returns
/// stalls that event's pipeline.
#[async_trait]
pub trait EventConsumer<E>: Send + Sync {
    /// Handles a single event.
    async fn handle_event(&self, event: &E);
}

/// Supplies commands to the bus asynchronously.
///
/// The bus drains the returned stream into its command inbox until the
/// stream ends.
pub trait CommandSource<C>: Send + 'static {
    /// Turns the source into its command stream.
    fn commands(self: Box<Self>) -> CommandStream<C>;
}

/// Creates an unbounded channel-backed command source.
///
/// The sender half can be cloned and handed to any producer; the source
/// half is registered with the bus. The stream ends once every sender has
/// been dropped.
pub fn channel<C: Send + 'static>() -> (CommandSender<C>, ChannelSource<C>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, ChannelSource { rx })
}

/// Producer half of [`channel`].
#[derive(Debug)]
pub struct CommandSender<C> {
    tx: mpsc::UnboundedSender<C>,
}

impl<C> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C> CommandSender<C> {
    /// Queues a command for the bus.
    ///
    /// Fails, handing the command back, once the source has been dropped.
    pub fn send(&self, command: C) -> Result<(), mpsc::error::SendError<C>> {
        self.tx.send(command)
    }

    /// Returns true if the receiving source is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of [`channel`], registered with the bus as a command source.
#[derive(Debug)]
pub struct ChannelSource<C> {
    rx: mpsc::UnboundedReceiver<C>,
}

impl<C: Send + 'static> CommandSource<C> for ChannelSource<C> {
    fn commands(self: Box<Self>) -> CommandStream<C> {
        Box::pin(futures_util::stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|command| (command, rx))
        }))
    }
}

/// Adapts any stream of commands into a [`CommandSource`].
pub struct StreamSource<S> {
    stream: S,
}

impl<S> StreamSource<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<C, S> CommandSource<C> for StreamSource<S>
where
    S: Stream<Item = C> + Send + 'static,
{
    fn commands(self: Box<Self>) -> CommandStream<C> {
        Box::pin(self.stream)
    }
}
