//! Serves recorded authority exchanges back in order.

use std::collections::VecDeque;

use super::format::{Cassette, Exchange};

/// Replays the exchanges of one cassette sequentially.
#[derive(Debug)]
pub struct CassetteReplayer {
    name: String,
    remaining: VecDeque<Exchange>,
    served: usize,
}

impl CassetteReplayer {
    /// Create a replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        Self { name: cassette.name.clone(), remaining: cassette.exchanges.iter().cloned().collect(), served: 0 }
    }

    /// Number of exchanges not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Return the next recorded exchange for a request carrying `candidate`.
    ///
    /// A candidate that differs from the recorded one is logged, not rejected:
    /// random candidates are redrawn on every run.
    ///
    /// # Panics
    ///
    /// Panics if every recorded exchange has already been served.
    pub fn next_exchange(&mut self, candidate: Option<u32>) -> Exchange {
        let Some(exchange) = self.remaining.pop_front() else {
            panic!(
                "Cassette {name:?} exhausted: all {served} exchanges have been served, \
                 but another request arrived with candidate {candidate:?}",
                name = self.name,
                served = self.served,
            );
        };
        self.served += 1;

        if exchange.candidate != candidate {
            tracing::warn!(
                seq = exchange.seq,
                recorded = ?exchange.candidate,
                requested = ?candidate,
                "replayed candidate differs from recording"
            );
        }
        exchange
    }
}
