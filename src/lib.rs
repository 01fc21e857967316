//! Demand-driven lazy sequences, produced on another thread.
//!
//! (if you want to run a generator without threads, look for a coroutine library instead; if you
//! want many values produced in advance, a plain bounded channel will do)
//!
//! # Overview
//!
//! A [`LazySequence`] is the consuming half of a sequence of values, and a [`ValueSource`] is the
//! producing half. The producer typically runs on its own thread and hands values over one at a
//! time. Unlike with a channel, it cannot run ahead: every call to [`ValueSource::yield_value`]
//! blocks until the consumer asks for a value by calling [`LazySequence::advance`]. Expensive
//! values are therefore only ever computed when they are actually needed.
//!
//! Both halves close when they are dropped:
//!
//! - When the [`ValueSource`] is closed, the [`LazySequence`] is *exhausted*.
//!   [`LazySequence::advance`] will return `false` from then on.
//! - When the [`LazySequence`] is closed, the producer is *cancelled*. Any blocked or future call
//!   to [`ValueSource::yield_value`] or [`ValueSource::await_demand`] returns `false`, telling the
//!   producer to stop.
//!
//! A [`LazySequence`] can optionally *persist* the values it receives. After a call to
//! [`LazySequence::reset_position`], it will replay the stored values from the beginning, and then
//! go on to request new values from the producer.
//!
//! # Usage
//!
//! The simplest way to get started is [`LazySequence::builder`], which spawns the producer on a
//! thread owned by the sequence. Closing or dropping the sequence will cancel the producer and
//! join its thread:
//!
//! ```
//! use lazyseq::LazySequence;
//!
//! let mut numbers = LazySequence::builder()
//!     .name("numbers")
//!     .persist(true)
//!     .spawn(|mut source| {
//!         for i in 0..10 {
//!             if !source.yield_value(i) {
//!                 // The sequence was closed early.
//!                 return;
//!             }
//!         }
//!     })
//!     .unwrap();
//!
//! let mut first = Vec::new();
//! while numbers.advance() {
//!     first.push(*numbers.value().unwrap());
//! }
//! assert_eq!(first, (0..10).collect::<Vec<_>>());
//!
//! // Replay the stored values. The producer has already finished.
//! numbers.reset_position();
//! let second: Vec<_> = numbers.by_ref().collect();
//! assert_eq!(first, second);
//! assert!(!numbers.advance());
//! ```
//!
//! The [`ValueSource`] can also be handed to a thread managed by the caller:
//!
//! ```
//! use std::thread;
//! use lazyseq::sequence;
//!
//! let (mut words, mut source) = sequence(false);
//! let producer = thread::spawn(move || {
//!     for word in "the quick brown fox".split(' ') {
//!         if !source.yield_value(word.to_uppercase()) {
//!             break;
//!         }
//!     }
//! });
//!
//! assert_eq!(words.try_advance_value().map(String::as_str), Some("THE"));
//! assert_eq!(words.try_advance_value().map(String::as_str), Some("QUICK"));
//!
//! // Stop early. The producer is blocked in `yield_value`, which will now return `false`.
//! words.close();
//! producer.join().unwrap();
//! ```

mod builder;
mod channel;
mod drop;
mod sequence;
mod source;

pub use builder::SequenceBuilder;
pub use sequence::LazySequence;
pub use source::ValueSource;

/// Creates a connected pair of [`LazySequence`] and [`ValueSource`].
///
/// If `persist` is `true`, the sequence stores every value it receives so that they can be
/// replayed after [`LazySequence::reset_position`].
pub fn sequence<T>(persist: bool) -> (LazySequence<T>, ValueSource<T>) {
    let mut seq = LazySequence::new(persist);
    let source = seq.source();
    (seq, source)
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

    use super::*;

    #[test]
    fn full_replay_of_ten_values() {
        let yielded = Arc::new(AtomicUsize::new(0));
        let yielded2 = yielded.clone();
        let mut seq = LazySequence::builder()
            .persist(true)
            .spawn(move |mut source| {
                for i in 0..10 {
                    if !source.yield_value(i) {
                        return;
                    }
                    yielded2.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        let mut live = Vec::new();
        for _ in 0..10 {
            assert!(seq.advance());
            live.push(*seq.value().unwrap());
        }
        assert_eq!(live, (0..10).collect::<Vec<_>>());

        seq.reset_position();
        let mut replayed = Vec::new();
        for _ in 0..10 {
            assert!(seq.advance());
            replayed.push(*seq.value().unwrap());
        }
        assert_eq!(replayed, live);

        assert!(!seq.advance());
        assert_eq!(seq.value(), None);
        assert_eq!(yielded.load(Ordering::SeqCst), 10);
        seq.close();
    }

    #[test]
    fn manual_pairing() {
        let (mut seq, mut source) = sequence(false);
        let producer = thread::spawn(move || {
            let delivered = source.yield_all(["a", "b", "c"]);
            source.close();
            delivered
        });

        assert_eq!(seq.by_ref().collect::<String>(), "abc");
        assert!(producer.join().unwrap());
        assert!(!seq.advance());
    }

    #[test]
    fn early_exit_from_consumer_loop() {
        let mut seq = LazySequence::builder()
            .spawn(|mut source| {
                let mut n = 1u32;
                while source.yield_value(n) {
                    n = n.wrapping_mul(3);
                }
            })
            .unwrap();

        let mut seen = Vec::new();
        while let Some(&n) = seq.try_advance_value() {
            if n > 100 {
                break;
            }
            seen.push(n);
        }
        assert_eq!(seen, [1, 3, 9, 27, 81]);
        // Dropping `seq` cancels the producer and joins its thread.
    }
}
