use crate::channel::ProducerEnd;

/// The producing half of a [`LazySequence`].
///
/// A [`ValueSource`] hands values to its [`LazySequence`] one at a time, and only when the
/// sequence asks for one. It is obtained from [`LazySequence::source`] (or [`sequence`]) and is
/// typically moved to a separate thread that generates the values.
///
/// Dropping the [`ValueSource`] (or calling [`ValueSource::close`]) tells the [`LazySequence`] that
/// no more values will follow. Once the values already handed off have been consumed,
/// [`LazySequence::advance`] will return `false`.
///
/// [`LazySequence`]: crate::LazySequence
/// [`LazySequence::source`]: crate::LazySequence::source
/// [`LazySequence::advance`]: crate::LazySequence::advance
/// [`sequence`]: crate::sequence
pub struct ValueSource<T> {
    end: ProducerEnd<T>,
    /// Set when [`ValueSource::await_demand`] has accepted a demand that no value was yielded for
    /// yet.
    demanded: bool,
}

impl<T> ValueSource<T> {
    pub(crate) fn new(end: ProducerEnd<T>) -> Self {
        Self {
            end,
            demanded: false,
        }
    }

    /// Blocks until the [`LazySequence`] asks for the next value.
    ///
    /// Returns `true` when a value has been requested, and `false` if the [`LazySequence`] has
    /// been closed. In the latter case, the producer should stop and drop or close the
    /// [`ValueSource`].
    ///
    /// Calling this method is optional, since [`ValueSource::yield_value`] waits for demand on its
    /// own. It is useful for producers that want to defer expensive work until a value is actually
    /// needed. The demand accepted here is answered by the next [`ValueSource::yield_value`] call,
    /// so calling [`ValueSource::await_demand`] multiple times without yielding does not request
    /// more values.
    ///
    /// [`LazySequence`]: crate::LazySequence
    pub fn await_demand(&mut self) -> bool {
        if !self.demanded {
            self.demanded = self.end.wait_for_demand();
        }
        self.demanded
    }

    /// Hands a single value to the [`LazySequence`].
    ///
    /// This blocks until the [`LazySequence`] requests a value (unless a request was already
    /// accepted by [`ValueSource::await_demand`]), so the producer can never get ahead of the
    /// consumer.
    ///
    /// Returns `true` once the value has been handed off. Returns `false` if the [`LazySequence`]
    /// was closed before or during the handoff, in which case `value` is dropped and the producer
    /// should stop generating values.
    ///
    /// [`LazySequence`]: crate::LazySequence
    #[must_use = "a `false` return value means that the consumer is gone and production should stop"]
    pub fn yield_value(&mut self, value: T) -> bool {
        if !self.await_demand() {
            return false;
        }
        self.demanded = false;
        self.end.hand_off(value)
    }

    /// Yields every item of `values` in order, stopping early if the [`LazySequence`] is closed.
    ///
    /// Items are pulled from the iterator one at a time, after the corresponding value has been
    /// requested, so a lazy iterator is only advanced as far as the consumer needs.
    ///
    /// Returns `true` if all items were handed off, including when the [`LazySequence`] is closed
    /// right after receiving the last one.
    ///
    /// [`LazySequence`]: crate::LazySequence
    pub fn yield_all<I: IntoIterator<Item = T>>(&mut self, values: I) -> bool {
        let mut values = values.into_iter();
        loop {
            if !self.await_demand() {
                // Nothing was lost if the consumer only went away after the last item.
                return values.next().is_none();
            }
            match values.next() {
                Some(value) => {
                    if !self.yield_value(value) {
                        return false;
                    }
                }
                None => return true,
            }
        }
    }

    /// Returns whether the [`LazySequence`] has been closed.
    ///
    /// This does not block. Producers that do a lot of work per value can use it to bail out
    /// early; the blocking methods report cancellation on their own.
    ///
    /// [`LazySequence`]: crate::LazySequence
    pub fn is_cancelled(&self) -> bool {
        self.end.is_cancelled()
    }

    /// Closes the [`ValueSource`], signaling that no more values will be produced.
    ///
    /// This is equivalent to dropping it.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };

    use crate::{
        sequence,
        test::{assert_stays_blocked, eventually},
        LazySequence,
    };

    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn source_is_send() {
        assert_send::<ValueSource<u8>>();
    }

    #[test]
    fn cancelled_after_sequence_closes() {
        let (seq, mut source) = sequence::<u32>(false);
        assert!(!source.is_cancelled());

        seq.close();
        assert!(source.is_cancelled());
        assert!(!source.await_demand());
        assert!(!source.yield_value(1));
        // Closing after cancellation is fine.
        source.close();
    }

    #[test]
    fn blocked_yield_is_cancelled() {
        let (seq, mut source) = sequence::<u32>(false);
        let producer = thread::spawn(move || {
            let delivered = source.yield_value(1);
            source.close();
            delivered
        });

        assert_stays_blocked(&producer);
        seq.close();
        eventually(|| producer.is_finished());
        assert!(!producer.join().unwrap());
    }

    #[test]
    fn await_demand_then_yield_answers_one_request() {
        let (mut seq, mut source) = sequence(false);
        let yielded = Arc::new(AtomicUsize::new(0));
        let yielded2 = yielded.clone();
        let producer = thread::spawn(move || {
            assert!(source.await_demand());
            // Already demanded, must not wait for a second request.
            assert!(source.await_demand());
            assert!(source.yield_value("first"));
            yielded2.fetch_add(1, Ordering::SeqCst);
            // Nobody asked for this one yet.
            assert!(source.yield_value("second"));
            yielded2.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(seq.try_advance_value(), Some(&"first"));
        eventually(|| yielded.load(Ordering::SeqCst) == 1);
        assert_stays_blocked(&producer);
        assert_eq!(yielded.load(Ordering::SeqCst), 1);

        assert_eq!(seq.try_advance_value(), Some(&"second"));
        producer.join().unwrap();
        assert!(!seq.advance());
    }

    #[test]
    fn yield_all_pulls_lazily() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let pulled2 = pulled.clone();
        let mut seq = LazySequence::new(false);
        let mut source = seq.source();
        let producer = thread::spawn(move || {
            let values = (0..).inspect(move |_| {
                pulled2.fetch_add(1, Ordering::SeqCst);
            });
            source.yield_all(values)
        });

        assert_stays_blocked(&producer);
        assert_eq!(pulled.load(Ordering::SeqCst), 0);

        assert_eq!(seq.try_advance_value(), Some(&0));
        assert_eq!(seq.try_advance_value(), Some(&1));
        assert_eq!(seq.try_advance_value(), Some(&2));
        assert_stays_blocked(&producer);
        assert_eq!(pulled.load(Ordering::SeqCst), 3);

        seq.close();
        assert!(!producer.join().unwrap());
    }

    #[test]
    fn yield_all_reports_completion() {
        let (mut seq, mut source) = sequence(false);
        let producer = thread::spawn(move || source.yield_all(["a", "b"]));

        assert_eq!(seq.try_advance_value(), Some(&"a"));
        assert_eq!(seq.try_advance_value(), Some(&"b"));
        // The producer only finds out that it is done once the next value is requested.
        assert!(!seq.advance());
        assert!(producer.join().unwrap());
    }

    #[test]
    fn yield_all_completes_when_consumer_closes_after_last_item() {
        let (mut seq, mut source) = sequence(false);
        let producer = thread::spawn(move || source.yield_all(["a", "b"]));

        assert_eq!(seq.try_advance_value(), Some(&"a"));
        assert_eq!(seq.try_advance_value(), Some(&"b"));
        seq.close();
        assert!(producer.join().unwrap());
    }

    #[test]
    fn yield_all_reports_early_close() {
        let (mut seq, mut source) = sequence(false);
        let producer = thread::spawn(move || source.yield_all(["a", "b", "c"]));

        assert_eq!(seq.try_advance_value(), Some(&"a"));
        seq.close();
        assert!(!producer.join().unwrap());
    }
}
