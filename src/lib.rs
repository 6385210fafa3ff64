pub mod bits;
pub mod error;
pub mod fec;
pub mod framing;
pub mod packet;
pub mod proto;
pub mod repeater;

pub use error::{DmrError, Result};
pub use framing::{Emb, FullLc, Lcss, SyncPattern};
pub use packet::{DataType, Flco, Packet, PacketMeta, Ts};
pub use proto::{RouteAction, Router, RxCallback, Transport, TransportKind};
pub use repeater::{Repeater, TimeslotSnapshot, VOICE_CALL_TIMEOUT};
