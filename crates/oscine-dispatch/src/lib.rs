//! Oscine Dispatch
//!
//! Routes decoded OSC packets to interested listeners by matching address
//! patterns, walking bundles recursively and honoring (or, by default,
//! ignoring) bundle timetags.
//!
//! The historical OSC-library behavior of delivering every bundle
//! immediately regardless of its timetag is preserved as the default;
//! strict timetag scheduling is an explicit opt-in via
//! [`DispatcherConfig::honor_timetags`].

pub mod dispatcher;
pub mod registry;
pub mod scheduler;

pub use dispatcher::{
    DispatchReport, DispatcherConfig, ListenerFailure, MessageListener, PacketDispatcher,
};
pub use registry::{ListenerId, ListenerRegistry};
