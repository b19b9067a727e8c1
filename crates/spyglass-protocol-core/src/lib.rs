pub mod adapter;
pub mod channel;
pub mod codec;
pub mod connection;
pub mod framing;
pub mod state;

pub use adapter::*;
pub use channel::*;
pub use codec::*;
pub use connection::{ConnectionContext, ProtocolInfo};
pub use framing::{FramedConnection, FrameReader, FrameWriter};
pub use state::*;
