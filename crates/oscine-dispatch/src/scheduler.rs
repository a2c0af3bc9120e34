//! Deferred bundle scheduling
//!
//! A bundle whose timetag lies in the future is parked on a tokio timer
//! and delivered when due. Each deferred bundle gets its own timer task;
//! ordering across independently scheduled bundles follows their timetags
//! only, while delivery order inside one bundle stays insertion order.
//!
//! Shutdown flips a watch signal rather than a plain flag: every pending
//! task observes it inside its select and reports its own cancellation, so
//! a scheduled bundle is either delivered or explicitly logged as
//! cancelled — never silently dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, warn};

use oscine_core::OscBundle;

use crate::dispatcher::{DispatchCore, DispatchReport};

pub(crate) struct BundleScheduler {
    /// Raw timetag per pending entry, for shutdown reporting.
    pending: DashMap<u64, u64>,
    next_id: AtomicU64,
    cancel_tx: watch::Sender<bool>,
}

impl BundleScheduler {
    pub(crate) fn new() -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            cancel_tx,
        }
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Park `bundle` until its timetag is due, then deliver its contents.
    pub(crate) fn schedule(&self, core: Arc<DispatchCore>, bundle: OscBundle) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let timetag = bundle.timetag();
        let delay = timetag.until_due();
        self.pending.insert(id, timetag.to_raw());

        let mut cancel_rx = self.cancel_tx.subscribe();
        debug!(id, delay_ms = delay.as_millis() as u64, "bundle deferred");

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    core.scheduler.pending.remove(&id);
                    let mut report = DispatchReport::default();
                    core.deliver_contents(&core, &bundle, &mut report);
                    debug!(
                        id,
                        delivered = report.delivered,
                        failures = report.failures.len(),
                        "deferred bundle delivered"
                    );
                }
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                    core.scheduler.pending.remove(&id);
                    warn!(
                        id,
                        timetag = bundle.timetag().to_raw(),
                        messages = bundle.packets().len(),
                        "scheduled bundle cancelled by shutdown"
                    );
                }
            }
        });
    }

    /// Cancel every pending entry and refuse new ones. Returns how many
    /// entries were still waiting.
    pub(crate) fn shutdown(&self) -> usize {
        let cancelled = self.pending.len();
        let _ = self.cancel_tx.send(true);
        cancelled
    }
}
