//! Change-notification hooks layered beside the core types.
//!
//! Purely observational: convergence never depends on who is listening.
//! The core types report mutations through their returned booleans; this
//! module gives callers a small fan-out to turn those reports into
//! callbacks.

/// What a local mutation did to an element's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The element became visible.
    Inserted,
    /// The element stayed visible but its state advanced (e.g. a newer
    /// add timestamp or an extra add tag).
    Updated,
    /// The element became invisible.
    Removed,
}

/// Receives change notifications.
///
/// Implemented for any `FnMut(Change, &T)` closure.
pub trait Sink<T> {
    /// Called once per reported mutation.
    fn notify(&mut self, change: Change, element: &T);
}

impl<T, F: FnMut(Change, &T)> Sink<T> for F {
    fn notify(&mut self, change: Change, element: &T) {
        self(change, element);
    }
}

/// Fans one change report out to every subscribed sink.
///
/// # Example
///
/// ```
/// use lattice_kit::events::{Change, Notifier};
/// use lattice_kit::prelude::*;
///
/// let mut set = GSet::new();
/// let mut notifier = Notifier::new();
/// let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
///
/// let sink = std::rc::Rc::clone(&seen);
/// notifier.subscribe(move |change: Change, element: &&'static str| {
///     sink.borrow_mut().push((change, *element));
/// });
///
/// if set.insert("x") {
///     notifier.emit(Change::Inserted, &"x");
/// }
/// assert_eq!(*seen.borrow(), vec![(Change::Inserted, "x")]);
/// ```
pub struct Notifier<T> {
    sinks: Vec<Box<dyn Sink<T>>>,
}

impl<T> Notifier<T> {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Subscribe a sink to every future change report.
    pub fn subscribe(&mut self, sink: impl Sink<T> + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Report one change to every subscriber.
    pub fn emit(&mut self, change: Change, element: &T) {
        for sink in &mut self.sinks {
            sink.notify(change, element);
        }
    }

    /// The number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}
