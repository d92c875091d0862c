//! Capability-based component registration.

use std::sync::Arc;

use domain::{CommandSource, EventConsumer};

/// The capabilities one component offers to the bus.
///
/// A component can be an event consumer, a command source, both, or
/// neither. The set is resolved when the component is registered, before
/// the bus starts.
pub struct Capabilities<C, E> {
    pub(crate) consumer: Option<Arc<dyn EventConsumer<E>>>,
    pub(crate) source: Option<Box<dyn CommandSource<C>>>,
}

impl<C, E> Capabilities<C, E> {
    /// Creates an empty capability set.
    pub fn new() -> Self {
        Self {
            consumer: None,
            source: None,
        }
    }

    /// Adds the event consumer capability.
    pub fn consumer(mut self, consumer: Arc<dyn EventConsumer<E>>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Adds the command source capability.
    pub fn source(mut self, source: impl CommandSource<C>) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns true if the set includes an event consumer.
    pub fn is_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    /// Returns true if the set includes a command source.
    pub fn is_source(&self) -> bool {
        self.source.is_some()
    }
}

impl<C, E> Default for Capabilities<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that can be registered with the bus.
///
/// Implementors declare which capabilities they provide.
pub trait Component<C, E> {
    /// Consumes the component into its capability set.
    fn capabilities(self) -> Capabilities<C, E>;
}

impl<C, E> Component<C, E> for Capabilities<C, E> {
    fn capabilities(self) -> Capabilities<C, E> {
        self
    }
}

/// Components collected before start.
pub(crate) struct Registry<C, E> {
    pub(crate) consumers: Vec<Arc<dyn EventConsumer<E>>>,
    pub(crate) sources: Vec<Box<dyn CommandSource<C>>>,
}

impl<C, E> Registry<C, E> {
    pub(crate) fn new() -> Self {
        Self {
            consumers: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub(crate) fn register(&mut self, capabilities: Capabilities<C, E>) {
        if let Some(consumer) = capabilities.consumer {
            self.consumers.push(consumer);
        }
        if let Some(source) = capabilities.source {
            self.sources.push(source);
        }
    }
}
