//! Packet dispatcher
//!
//! Walks decoded packets, matches each contained message against every
//! registered pattern, and invokes the matching listeners in registration
//! order. Bundles are walked recursively; each message is delivered with
//! its *effective* timetag — the arrival time for a top-level message, or
//! the enclosing bundle's timetag for a nested one.
//!
//! By default bundle timetags are ignored and everything is delivered
//! immediately. That matches what OSC applications have historically
//! relied on, so the strict scheduling behavior is an explicit opt-in
//! ([`DispatcherConfig::honor_timetags`]), not a changed default.

use std::sync::Arc;

use oscine_core::{OscBundle, OscMessage, OscPacket, Result, TimeTag};
use tracing::{debug, warn};

use crate::registry::{ListenerId, ListenerRegistry};
use crate::scheduler::BundleScheduler;

/// A recipient of dispatched messages.
///
/// A failed invocation never prevents delivery to the remaining listeners
/// for the same message; the error is reported in the [`DispatchReport`].
pub trait MessageListener: Send + Sync {
    fn message_received(&self, time: TimeTag, message: &OscMessage) -> anyhow::Result<()>;
}

impl<F> MessageListener for F
where
    F: Fn(TimeTag, &OscMessage) -> anyhow::Result<()> + Send + Sync,
{
    fn message_received(&self, time: TimeTag, message: &OscMessage) -> anyhow::Result<()> {
        self(time, message)
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Honor bundle timetags: a bundle whose timetag lies in the future is
    /// handed to a timer and delivered when due, instead of immediately.
    ///
    /// Off by default for compatibility with how OSC libraries have always
    /// behaved. Turning it on requires a tokio runtime, since deferred
    /// bundles are driven by timer tasks.
    pub honor_timetags: bool,
}

/// One listener invocation that returned an error.
#[derive(Debug)]
pub struct ListenerFailure {
    /// Pattern the failing listener was registered under.
    pub pattern: String,
    /// Address of the message being delivered.
    pub address: String,
    pub error: anyhow::Error,
}

/// Outcome of one `dispatch` call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Successful listener invocations.
    pub delivered: usize,
    /// Bundles handed to the timer for later delivery.
    pub deferred: usize,
    /// Listener invocations that returned an error.
    pub failures: Vec<ListenerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub(crate) struct DispatchCore {
    pub(crate) registry: ListenerRegistry,
    pub(crate) scheduler: BundleScheduler,
    honor_timetags: bool,
}

/// Routes packets to listeners registered under address patterns.
pub struct PacketDispatcher {
    core: Arc<DispatchCore>,
}

impl PacketDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            core: Arc::new(DispatchCore {
                registry: ListenerRegistry::new(),
                scheduler: BundleScheduler::new(),
                honor_timetags: config.honor_timetags,
            }),
        }
    }

    /// Register `listener` under an address pattern. Fails with
    /// `InvalidPattern` if the pattern does not compile.
    pub fn add_listener<L>(&self, pattern: &str, listener: L) -> Result<ListenerId>
    where
        L: MessageListener + 'static,
    {
        self.core.registry.add(pattern, Arc::new(listener))
    }

    /// Remove one registration. No-op if absent.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.core.registry.remove(id)
    }

    /// Remove every registration under `pattern`.
    pub fn remove_pattern(&self, pattern: &str) -> usize {
        self.core.registry.remove_pattern(pattern)
    }

    /// Drop all registrations.
    pub fn clear_listeners(&self) {
        self.core.registry.clear()
    }

    pub fn listener_count(&self) -> usize {
        self.core.registry.len()
    }

    /// Deliver a packet to all matching listeners.
    ///
    /// `arrival` is the timetag passed to listeners for a top-level
    /// message; messages inside bundles receive their bundle's timetag
    /// instead. The packet tree is never mutated.
    pub fn dispatch(&self, packet: &OscPacket, arrival: TimeTag) -> DispatchReport {
        let mut report = DispatchReport::default();
        match packet {
            OscPacket::Message(msg) => self.core.fan_out(msg, arrival, &mut report),
            OscPacket::Bundle(bundle) => self.core.handle_bundle(&self.core, bundle, &mut report),
        }
        report
    }

    /// Cancel pending deferred bundles and refuse new deferrals.
    ///
    /// Returns how many scheduled bundles were cancelled; each one is also
    /// reported through the log, so nothing disappears silently. Immediate
    /// dispatch keeps working after shutdown.
    pub fn shutdown(&self) -> usize {
        self.core.scheduler.shutdown()
    }

    /// Deferred bundles currently waiting on the timer.
    pub fn pending_deferred(&self) -> usize {
        self.core.scheduler.pending_count()
    }
}

impl Default for PacketDispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl DispatchCore {
    fn handle_bundle(&self, core: &Arc<DispatchCore>, bundle: &OscBundle, report: &mut DispatchReport) {
        if !self.honor_timetags || bundle.timetag().is_due() {
            self.deliver_contents(core, bundle, report);
            return;
        }
        if self.scheduler.is_shut_down() {
            warn!(
                timetag = bundle.timetag().to_raw(),
                "scheduler shut down, delivering future bundle immediately"
            );
            self.deliver_contents(core, bundle, report);
            return;
        }
        self.scheduler.schedule(Arc::clone(core), bundle.clone());
        report.deferred += 1;
    }

    /// Deliver a bundle's sub-packets in insertion order. Direct message
    /// children take the bundle's timetag; nested bundles carry their own.
    pub(crate) fn deliver_contents(
        &self,
        core: &Arc<DispatchCore>,
        bundle: &OscBundle,
        report: &mut DispatchReport,
    ) {
        for packet in bundle.packets() {
            match packet {
                OscPacket::Message(msg) => self.fan_out(msg, bundle.timetag(), report),
                OscPacket::Bundle(inner) => self.handle_bundle(core, inner, report),
            }
        }
    }

    fn fan_out(&self, message: &OscMessage, time: TimeTag, report: &mut DispatchReport) {
        let snapshot = self.registry.snapshot();
        for entry in snapshot.iter() {
            if !entry.pattern.matches(message.address()) {
                continue;
            }
            match entry.listener.message_received(time, message) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(
                        pattern = entry.pattern.as_str(),
                        address = message.address(),
                        %error,
                        "listener failed"
                    );
                    report.failures.push(ListenerFailure {
                        pattern: entry.pattern.as_str().to_string(),
                        address: message.address().to_string(),
                        error,
                    });
                }
            }
        }
        debug!(
            address = message.address(),
            delivered = report.delivered,
            "message dispatched"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oscine_core::OscArg;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn msg(address: &str) -> OscPacket {
        OscPacket::Message(OscMessage::bare(address).unwrap())
    }

    #[test]
    fn test_literal_delivery() {
        let dispatcher = PacketDispatcher::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        dispatcher
            .add_listener("/ping", move |_time, _msg: &OscMessage| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let report = dispatcher.dispatch(&msg("/ping"), TimeTag::Immediate);
        assert_eq!(report.delivered, 1);
        assert!(report.is_clean());

        let report = dispatcher.dispatch(&msg("/pong"), TimeTag::Immediate);
        assert_eq!(report.delivered, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arguments_reach_listener() {
        let dispatcher = PacketDispatcher::default();
        dispatcher
            .add_listener("/freq", |_time, message: &OscMessage| {
                assert_eq!(message.args(), &[OscArg::Float32(440.0)]);
                Ok(())
            })
            .unwrap();

        let packet = OscPacket::Message(
            OscMessage::new("/freq", vec![OscArg::Float32(440.0)]).unwrap(),
        );
        let report = dispatcher.dispatch(&packet, TimeTag::Immediate);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn test_bad_pattern_rejected_at_registration() {
        let dispatcher = PacketDispatcher::default();
        let result = dispatcher.add_listener("/oops/{a", |_t, _m: &OscMessage| Ok(()));
        assert!(result.is_err());
        assert_eq!(dispatcher.listener_count(), 0);
    }
}
