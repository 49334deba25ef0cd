//! Log sinks for hosts embedding the engine.
//!
//! The engine itself only talks to the [`log`](::log) facade. Hosts that want to drain engine
//! records on their own thread (a console, a test harness) can install the [`ChannelLogger`].
mod channel;

pub use channel::{ChannelLogger, LogMessage, init};
