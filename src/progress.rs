//! Progress events emitted by the meta-solvers as they escalate through
//! engines, carried over a bounded SPSC channel (spec §4.H).
//!
//! Producers never block on a slow or absent consumer: an event that
//! doesn't fit in the channel's buffer is dropped rather than stalling the
//! search, the same posture the teacher's worker loop takes toward its
//! result channel (`flume::bounded` plus a non-blocking send).

use flume::{Receiver, Sender, TrySendError};

use crate::types::{EngineKind, SolverStats};

/// One step of a meta-solver's progress, emitted as it tries engines,
/// finds a solution, or gives up on the current candidate.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A meta-solver is about to try `engine` against the current position.
    EngineStarted { engine: EngineKind },
    /// `engine` finished without a solution; `stats` is whatever it
    /// collected before giving up.
    EngineFailed { engine: EngineKind, stats: SolverStats },
    /// `engine` produced a verified solution of `move_count` moves.
    EngineSucceeded { engine: EngineKind, move_count: u32 },
    /// The meta-solver is out of engines or out of time.
    Exhausted,
}

/// The producing half, held by a meta-solver. Cheap to clone; every clone
/// writes to the same bounded channel.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<ProgressEvent>,
}

impl ProgressSender {
    /// Send `event`, dropping it silently if the channel is full or the
    /// receiving end has gone away. A meta-solver must never slow down or
    /// fail because nobody is watching.
    pub fn send(&self, event: ProgressEvent) {
        match self.tx.try_send(event) {
            Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// The consuming half, typically polled by a caller that wants to render a
/// progress bar or log spans.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: Receiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Drain every event currently buffered without blocking.
    pub fn drain(&self) -> Vec<ProgressEvent> {
        self.rx.try_iter().collect()
    }

    /// Block until the next event arrives, or `None` once every sender has
    /// been dropped.
    pub fn recv(&self) -> Option<ProgressEvent> {
        self.rx.recv().ok()
    }
}

/// A bounded channel pair sized for a handful of in-flight events — a
/// meta-solver emits at most one event per engine transition, so a small
/// buffer is enough to never block a producer that outruns its consumer.
pub fn channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = flume::bounded(capacity.max(1));
    (ProgressSender { tx }, ProgressReceiver { rx })
}

/// A no-op sender for callers that don't want progress events at all —
/// every send is dropped immediately since nothing ever reads the channel.
pub fn sink() -> ProgressSender {
    let (tx, _rx) = flume::bounded(0);
    ProgressSender { tx }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_round_trip_through_the_channel() {
        let (tx, rx) = channel(4);
        tx.send(ProgressEvent::EngineStarted { engine: EngineKind::Dfs });
        tx.send(ProgressEvent::Exhausted);
        let drained = rx.drain();
        assert_eq!(drained.len(), 2);
    }

    #[test]
    fn send_never_blocks_when_the_buffer_is_full() {
        let (tx, _rx) = channel(1);
        tx.send(ProgressEvent::Exhausted);
        // Buffer now full; this must not panic or block.
        tx.send(ProgressEvent::Exhausted);
    }

    #[test]
    fn sink_silently_drops_every_event() {
        let tx = sink();
        tx.send(ProgressEvent::Exhausted);
    }

    #[test]
    fn send_after_receiver_dropped_is_a_silent_no_op() {
        let (tx, rx) = channel(1);
        drop(rx);
        tx.send(ProgressEvent::Exhausted);
    }
}
