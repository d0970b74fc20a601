//! Transport Adapter (spec §4, component 1).
//!
//! The SFU itself is out of scope; this crate provides only the in-process
//! `ChannelTransport` test double. Real deployments implement
//! `copilot_core::traits::Transport` against an actual SFU client outside
//! this workspace.

pub mod channel_transport;
pub mod speech;

pub use channel_transport::{ChannelTransport, ChannelTransportHandle};
pub use speech::{EchoStt, EchoTts};
