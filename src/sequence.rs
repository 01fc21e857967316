use std::{
    fmt,
    panic::resume_unwind,
    thread::{self, JoinHandle},
};

use crate::{
    channel::{self, ConsumerEnd},
    SequenceBuilder, ValueSource,
};

/// The value most recently made visible by [`LazySequence::advance`].
enum Current<T> {
    Absent,
    /// Index into the replay cache.
    Cached(usize),
    /// A value that was not persisted.
    Live(T),
}

/// The consuming half of a lazily produced sequence of `T`s.
///
/// A [`LazySequence`] requests values from its paired [`ValueSource`] one at a time, when
/// [`LazySequence::advance`] is called. The producer is blocked in between, so it never runs ahead
/// of the consumer by more than the value currently being handed off.
///
/// If the sequence is created with persistence enabled, every value received from the
/// [`ValueSource`] is also stored in the sequence. [`LazySequence::reset_position`] rewinds the
/// sequence to the first stored value, and subsequent calls to [`LazySequence::advance`] replay the
/// stored values before requesting new ones.
///
/// Dropping the [`LazySequence`] (or calling [`LazySequence::close`]) makes any pending and future
/// attempt of the [`ValueSource`] to hand off a value fail, which tells the producer to stop. If
/// the producer runs on a thread owned by the sequence (see [`SequenceBuilder::spawn`]), that
/// thread is also joined, and its panic (if any) is propagated to the thread closing the sequence.
pub struct LazySequence<T> {
    end: Option<ConsumerEnd<T>>,
    /// The paired [`ValueSource`], until [`LazySequence::source`] hands it out.
    source: Option<ValueSource<T>>,
    producer: Option<JoinHandle<()>>,
    persist: bool,
    cache: Vec<T>,
    /// Index of the next cached value to replay. Equal to `cache.len()` at the live edge.
    cursor: usize,
    current: Current<T>,
}

impl<T> Drop for LazySequence<T> {
    fn drop(&mut self) {
        // Disconnect the channels first, so that a blocked producer can exit.
        drop(self.end.take());
        drop(self.source.take());

        if let Some(handle) = self.producer.take() {
            log::trace!(
                "closing sequence, waiting for producer '{}'",
                handle.thread().name().unwrap_or("<unnamed>")
            );
            if let Err(payload) = handle.join() {
                if !thread::panicking() {
                    resume_unwind(payload);
                }
            }
        }
    }
}

impl LazySequence<()> {
    /// Returns a builder that can be used to configure a [`LazySequence`] and spawn its producer.
    #[inline]
    pub fn builder() -> SequenceBuilder {
        SequenceBuilder::new()
    }
}

impl<T> LazySequence<T> {
    /// Creates a [`LazySequence`] along with its (not yet claimed) [`ValueSource`].
    ///
    /// If `persist` is `true`, every value received will be kept, allowing it to be replayed after
    /// calling [`LazySequence::reset_position`].
    ///
    /// The [`ValueSource`] has to be taken out with [`LazySequence::source`] and handed to the
    /// code that produces the values before the sequence can be advanced.
    pub fn new(persist: bool) -> Self {
        let (end, producer_end) = channel::pair();
        Self {
            end: Some(end),
            source: Some(ValueSource::new(producer_end)),
            producer: None,
            persist,
            cache: Vec::new(),
            cursor: 0,
            current: Current::Absent,
        }
    }

    pub(crate) fn attach_producer(&mut self, handle: JoinHandle<()>) {
        self.producer = Some(handle);
    }

    /// Returns the [`ValueSource`] paired with this sequence.
    ///
    /// # Panics
    ///
    /// Each [`LazySequence`] has exactly one [`ValueSource`], so this method panics when called a
    /// second time.
    pub fn source(&mut self) -> ValueSource<T> {
        match self.source.take() {
            Some(source) => source,
            None => panic!("the `ValueSource` of this `LazySequence` has already been taken"),
        }
    }

    /// Returns whether this sequence stores the values it receives.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    /// Returns the values stored so far, in the order they were produced.
    ///
    /// This is always empty if persistence is disabled.
    #[inline]
    pub fn cached(&self) -> &[T] {
        &self.cache
    }

    /// Moves to the next value of the sequence.
    ///
    /// If the position was rewound with [`LazySequence::reset_position`] and a stored value is
    /// available, it becomes the current value without involving the producer. Otherwise, a value
    /// is requested from the [`ValueSource`], blocking until it is handed off.
    ///
    /// Returns `true` if a value became current (it can then be retrieved with
    /// [`LazySequence::value`]), and `false` when the [`ValueSource`] has been closed and all
    /// of its values were consumed.
    ///
    /// # Panics
    ///
    /// Panics if a value has to be requested while the [`ValueSource`] was never taken out of this
    /// sequence, since nothing could ever produce it.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.cache.len() {
            self.current = Current::Cached(self.cursor);
            self.cursor += 1;
            return true;
        }

        assert!(
            self.source.is_none(),
            "`LazySequence::advance` would block forever: the `ValueSource` was never taken"
        );

        match self.end.as_ref().unwrap().request() {
            Some(value) => {
                if self.persist {
                    self.cache.push(value);
                    self.cursor = self.cache.len();
                    self.current = Current::Cached(self.cursor - 1);
                } else {
                    self.current = Current::Live(value);
                }
                true
            }
            None => {
                self.current = Current::Absent;
                false
            }
        }
    }

    /// Returns a reference to the current value.
    ///
    /// Returns [`None`] before the first successful call to [`LazySequence::advance`], and after
    /// a call to it has failed.
    pub fn value(&self) -> Option<&T> {
        match &self.current {
            Current::Absent => None,
            Current::Cached(index) => Some(&self.cache[*index]),
            Current::Live(value) => Some(value),
        }
    }

    /// Advances the sequence and returns the new current value.
    ///
    /// This combines [`LazySequence::advance`] and [`LazySequence::value`], and returns [`None`]
    /// when the sequence is exhausted.
    pub fn try_advance_value(&mut self) -> Option<&T> {
        if self.advance() {
            self.value()
        } else {
            None
        }
    }

    /// Rewinds the sequence to its first stored value.
    ///
    /// The following calls to [`LazySequence::advance`] will replay the stored values, oldest
    /// first, and continue requesting new values from the producer when they run out.
    ///
    /// Without persistence nothing is stored, so this has no effect.
    pub fn reset_position(&mut self) {
        self.cursor = 0;
    }

    /// Closes the sequence, telling the producer to stop.
    ///
    /// This is equivalent to dropping the [`LazySequence`].
    pub fn close(self) {}
}

/// Iterating over a [`LazySequence`] advances it, yielding clones of the values.
///
/// The iterator ends when the sequence is exhausted. Since iteration goes through
/// [`LazySequence::advance`], it also picks up after a call to [`LazySequence::reset_position`].
impl<T: Clone> Iterator for LazySequence<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.try_advance_value().cloned()
    }
}

impl<T: fmt::Debug> fmt::Debug for LazySequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySequence")
            .field("persist", &self.persist)
            .field("cached", &self.cache)
            .field("current", &self.value())
            .finish_non_exhaustive()
    }
}
