use crate::connection::ConnectionContext;
use bytes::BytesMut;
use spyglass_types::{ProtocolVersion, Transport};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no translation attached to this channel")]
    NotConnected,
    #[error("option {option} is not supported on {transport:?} transport")]
    UnsupportedOption {
        option: &'static str,
        transport: Transport,
    },
}

/// A handler in a channel's processing chain. Serverbound frames flow
/// through handlers in insertion order, clientbound frames in reverse.
pub trait ChannelHandler: Send + Sync {
    fn name(&self) -> &str;

    fn on_serverbound(&self, frame: &mut BytesMut) -> anyhow::Result<()>;

    fn on_clientbound(&self, frame: &mut BytesMut) -> anyhow::Result<()>;
}

/// Session setup parameters for datagram transports, applied before any
/// data flows.
#[derive(Debug, Clone)]
pub struct DatagramOptions {
    pub protocol_revision: u32,
    pub connect_timeout: Duration,
    pub session_timeout: Duration,
    pub session_id: u64,
}

/// Per-channel metadata sidecar. Each field is written at most once
/// during connection setup and is immutable afterwards, so the per-frame
/// read path takes no locks.
#[derive(Default)]
pub struct ChannelAttributes {
    target_override: OnceLock<ProtocolVersion>,
    translation: OnceLock<Arc<ConnectionContext>>,
}

impl ChannelAttributes {
    /// Store the per-connection target-version override. Write-once.
    pub fn set_target_override(&self, version: ProtocolVersion) {
        let _ = self.target_override.set(version);
    }

    pub fn target_override(&self) -> Option<&ProtocolVersion> {
        self.target_override.get()
    }

    /// Attach the translation connection object. Write-once.
    pub fn attach_translation(&self, connection: Arc<ConnectionContext>) {
        let _ = self.translation.set(connection);
    }

    pub fn translation(&self) -> Option<&Arc<ConnectionContext>> {
        self.translation.get()
    }

    pub fn is_empty(&self) -> bool {
        self.target_override.get().is_none() && self.translation.get().is_none()
    }
}

/// A transport channel: the attribute sidecar, an ordered handler chain,
/// and transport-level options. The channel itself moves no bytes; the
/// owning connection drives frames through `handle_serverbound` /
/// `handle_clientbound`.
pub struct TransportChannel {
    transport: Transport,
    attributes: ChannelAttributes,
    datagram_options: Option<DatagramOptions>,
    handlers: Vec<Box<dyn ChannelHandler>>,
}

impl TransportChannel {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            attributes: ChannelAttributes::default(),
            datagram_options: None,
            handlers: Vec::new(),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn attributes(&self) -> &ChannelAttributes {
        &self.attributes
    }

    /// Apply datagram session options. Fails on a stream channel; the
    /// caller must abort connection establishment on failure.
    pub fn set_datagram_options(&mut self, options: DatagramOptions) -> Result<(), ChannelError> {
        if self.transport != Transport::Datagram {
            return Err(ChannelError::UnsupportedOption {
                option: "datagram_session",
                transport: self.transport,
            });
        }
        self.datagram_options = Some(options);
        Ok(())
    }

    pub fn datagram_options(&self) -> Option<&DatagramOptions> {
        self.datagram_options.as_ref()
    }

    pub fn append_handler(&mut self, handler: Box<dyn ChannelHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run a serverbound frame through the handler chain in order.
    pub fn handle_serverbound(&self, frame: &mut BytesMut) -> anyhow::Result<()> {
        for handler in &self.handlers {
            handler.on_serverbound(frame)?;
        }
        Ok(())
    }

    /// Run a clientbound frame through the handler chain in reverse.
    pub fn handle_clientbound(&self, frame: &mut BytesMut) -> anyhow::Result<()> {
        for handler in self.handlers.iter().rev() {
            handler.on_clientbound(frame)?;
        }
        Ok(())
    }

    /// The translation connection attached to this channel, if a live
    /// translated connection is established.
    pub fn translation(&self) -> Result<Arc<ConnectionContext>, ChannelError> {
        self.attributes
            .translation()
            .cloned()
            .ok_or(ChannelError::NotConnected)
    }
}
