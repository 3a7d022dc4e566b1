// =============================================================================
// Trade Dispatcher — fan-out of live trades to registered observers
// =============================================================================
//
// Each observer owns an unbounded queue drained by a dedicated task, so a
// slow observer never delays the feed or any other observer, and each
// observer sees trades in the order they reached the dispatcher. The cost is
// unbounded buffering behind a pathologically slow observer; callers accept
// that in exchange for feed liveness.
// =============================================================================

use std::panic::AssertUnwindSafe;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::Trade;

/// Fans incoming trades out to every registered observer.
///
/// The registry is owned by the instance; independent dispatchers do not
/// share state.
pub struct TradeDispatcher {
    senders: Mutex<Vec<mpsc::UnboundedSender<Trade>>>,
}

impl TradeDispatcher {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer that will be invoked once per dispatched trade.
    ///
    /// Spawns the observer's worker task, so this must be called from within
    /// a Tokio runtime. May be called at any time, including while trades are
    /// in flight; the observer only sees trades dispatched after
    /// registration. Identical observers are not deduplicated.
    ///
    /// A panic inside the observer is caught and logged; it does not stop
    /// delivery of later trades to this observer or of any trade to others.
    pub fn register<F>(&self, observer: F)
    where
        F: Fn(Trade) + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Trade>();

        tokio::spawn(async move {
            while let Some(trade) = rx.recv().await {
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| observer(trade)));
                if result.is_err() {
                    warn!("trade observer panicked; dropping that invocation");
                }
            }
            debug!("trade observer queue closed");
        });

        self.senders.lock().push(tx);
    }

    /// Forward one trade to every currently registered observer.
    ///
    /// Never blocks: the trade is cloned onto each observer's queue and this
    /// returns immediately, regardless of how far behind any observer is.
    pub fn dispatch(&self, trade: &Trade) {
        let senders = self.senders.lock();
        for tx in senders.iter() {
            // Fails only if the worker task is gone; nothing to do then.
            let _ = tx.send(trade.clone());
        }
    }

    /// Number of observers registered so far.
    pub fn observer_count(&self) -> usize {
        self.senders.lock().len()
    }
}

impl Default for TradeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
