//! The channel set connecting a [`LazySequence`] to its [`ValueSource`].
//!
//! Three channels make up the set:
//!
//! - `demand`, a rendezvous channel. A successful send means "the consumer wants exactly one more
//!   value", and it can only complete while the producer is waiting for it.
//! - `values`, a channel with room for a single value. The producer dropping its sender means no
//!   more values will ever arrive.
//! - `cancel`, on which nothing is ever sent. The consumer dropping its sender disconnects it,
//!   which the producer observes while it is blocked handing off a value.
//!
//! Closing a side means dropping its end, so each side can close only once.
//!
//! [`LazySequence`]: crate::LazySequence
//! [`ValueSource`]: crate::ValueSource

use std::convert::Infallible;

use crossbeam_channel::{select, Receiver, Sender, TryRecvError};

/// Creates a connected pair of channel ends.
pub(crate) fn pair<T>() -> (ConsumerEnd<T>, ProducerEnd<T>) {
    let (demand_tx, demand_rx) = crossbeam_channel::bounded(0);
    let (values_tx, values_rx) = crossbeam_channel::bounded(1);
    let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(0);
    (
        ConsumerEnd {
            demand: demand_tx,
            values: values_rx,
            _cancel: cancel_tx,
        },
        ProducerEnd {
            demand: demand_rx,
            values: values_tx,
            cancel: cancel_rx,
        },
    )
}

pub(crate) struct ConsumerEnd<T> {
    demand: Sender<()>,
    values: Receiver<T>,
    /// Only held so that dropping it disconnects the producer's `cancel` receiver.
    _cancel: Sender<Infallible>,
}

impl<T> ConsumerEnd<T> {
    /// Obtains the next value from the producer, blocking until it is handed off.
    ///
    /// Returns [`None`] once the producer has closed its end and every buffered value has been
    /// received.
    pub(crate) fn request(&self) -> Option<T> {
        select! {
            // A value may already be waiting, in which case no demand needs to be signaled.
            recv(self.values) -> value => value.ok(),
            // If the send failed, the producer is gone and this drains whatever it left behind.
            send(self.demand, ()) -> _ => self.values.recv().ok(),
        }
    }
}

pub(crate) struct ProducerEnd<T> {
    demand: Receiver<()>,
    values: Sender<T>,
    cancel: Receiver<Infallible>,
}

impl<T> ProducerEnd<T> {
    /// Blocks until the consumer signals demand.
    ///
    /// Returns `false` if the consumer has closed its end instead.
    pub(crate) fn wait_for_demand(&self) -> bool {
        select! {
            recv(self.demand) -> signal => signal.is_ok(),
            recv(self.cancel) -> _ => false,
        }
    }

    /// Hands `value` to the consumer, racing the send against cancellation.
    ///
    /// Must only be called after [`ProducerEnd::wait_for_demand`] returned `true`.
    pub(crate) fn hand_off(&self, value: T) -> bool {
        select! {
            send(self.values, value) -> res => res.is_ok(),
            recv(self.cancel) -> _ => false,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(self.cancel.try_recv(), Err(TryRecvError::Disconnected))
    }
}
