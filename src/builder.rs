use std::{io, thread};

use crate::{drop::defer, LazySequence, ValueSource};

/// A builder object that can be used to configure a [`LazySequence`] and spawn its producer.
///
/// Created by [`LazySequence::builder`].
#[derive(Clone, Default)]
pub struct SequenceBuilder {
    name: Option<String>,
    persist: bool,
}

impl SequenceBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the producer thread.
    pub fn name<N: Into<String>>(self, name: N) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets whether the [`LazySequence`] stores the values it receives, so that they can be
    /// replayed after [`LazySequence::reset_position`].
    ///
    /// By default, values are not stored.
    #[inline]
    pub fn persist(self, persist: bool) -> Self {
        Self { persist, ..self }
    }

    /// Creates a [`LazySequence`] whose values are produced by `producer` on a new thread.
    ///
    /// `producer` is passed the [`ValueSource`] of the sequence. It should stop producing values
    /// once [`ValueSource::yield_value`] returns `false`. The [`ValueSource`] is closed when
    /// `producer` returns, ending the sequence.
    ///
    /// The thread is owned by the returned [`LazySequence`]: closing or dropping the sequence
    /// cancels the producer and joins the thread, forwarding its panic if it panicked. Because of
    /// that, `producer` must not block on anything but the [`ValueSource`], or closing the sequence
    /// might block too.
    pub fn spawn<T, F>(self, producer: F) -> io::Result<LazySequence<T>>
    where
        T: Send + 'static,
        F: FnOnce(ValueSource<T>) + Send + 'static,
    {
        let mut seq = LazySequence::new(self.persist);
        let source = seq.source();

        let mut builder = thread::Builder::new();
        if let Some(name) = self.name.clone() {
            builder = builder.name(name);
        }
        let handle = builder.spawn(move || {
            let _guard;
            if let Some(name) = self.name {
                log::trace!("producer '{name}' starting");
                _guard = defer(move || log::trace!("producer '{name}' exiting"));
            }
            producer(source);
        })?;

        seq.attach_producer(handle);
        Ok(seq)
    }
}
