//! Server synchronisation: wire protocol, Socket.IO transport and the
//! controller that applies inbound events to the model.

mod controller;
pub mod protocol;
/// Socket.IO transport.
pub mod socket;

pub use controller::{
    ConnectionState, PendingIntent, PendingState, SyncController, TransportEvent,
};
pub use protocol::{Inbound, Intent, Outbound, ProtocolError};
