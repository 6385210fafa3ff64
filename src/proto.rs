use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::packet::Packet;

/// Ingress callback a transport invokes for every packet it receives.
/// The repeater copies the packet; the transport keeps ownership of its
/// own buffer.
pub type RxCallback = Box<dyn Fn(&Packet) + Send + Sync>;

/// Coarse transport classification, used for logging and routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Unknown,
    /// Local radio modem.
    Modem,
    /// Remote tunneling peer.
    Network,
    /// Audio codec bridge.
    Audio,
}

/// A DMR transport attached to the repeater.
///
/// Implementations run their own receive machinery (threads, sockets,
/// serial ports) and call the registered callback from any thread.
/// `transmit` must not mutate the caller's packet and may fail without
/// affecting other transports.
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> TransportKind;

    /// Install the repeater's ingress callback. Returns false when the
    /// transport already has one (at most one is accepted).
    fn register_rx(&self, callback: RxCallback) -> bool;

    fn transmit(&self, packet: &Packet) -> Result<()>;
}

/// Router verdict for one (packet, candidate sink) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAction {
    Permit,
    Reject,
}

/// User routing policy, called once per candidate sink with the source
/// and sink transports and a mutable copy of the packet. The router may
/// rewrite addressing before the packet is forwarded. A repeater built
/// without a router permits everything.
pub type Router =
    Arc<dyn Fn(&dyn Transport, &dyn Transport, &mut Packet) -> RouteAction + Send + Sync>;
