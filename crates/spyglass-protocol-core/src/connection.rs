use crate::adapter::ProtocolPipeline;
use crate::state::ConnectionState;
use spyglass_types::ProtocolVersion;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Protocol-level state of one connection. Version and identity fields
/// start absent and are set at most once during the handshake.
#[derive(Debug, Clone)]
pub struct ProtocolInfo {
    pub state: ConnectionState,
    pub client_version: Option<ProtocolVersion>,
    pub server_version: Option<ProtocolVersion>,
    pub username: Option<String>,
    pub uuid: Option<Uuid>,
}

impl Default for ProtocolInfo {
    fn default() -> Self {
        Self {
            state: ConnectionState::Handshake,
            client_version: None,
            server_version: None,
            username: None,
            uuid: None,
        }
    }
}

/// The translation-side connection object: the attached adapter pipeline
/// plus the handshake-mutable protocol info.
///
/// Created exactly once per connection attempt. Channel-bound contexts
/// live as long as their channel; dummy contexts have no backing
/// transport and are dropped by their creator.
pub struct ConnectionContext {
    channel_bound: bool,
    pipeline: ProtocolPipeline,
    info: RwLock<ProtocolInfo>,
}

impl ConnectionContext {
    pub fn new(channel_bound: bool) -> Self {
        Self {
            channel_bound,
            pipeline: ProtocolPipeline::new(),
            info: RwLock::new(ProtocolInfo::default()),
        }
    }

    /// Install the resolved pipeline. Called once during setup, before
    /// the context is shared.
    pub fn set_pipeline(&mut self, pipeline: ProtocolPipeline) {
        self.pipeline = pipeline;
    }

    pub fn pipeline(&self) -> &ProtocolPipeline {
        &self.pipeline
    }

    pub fn is_channel_bound(&self) -> bool {
        self.channel_bound
    }

    pub fn info(&self) -> RwLockReadGuard<'_, ProtocolInfo> {
        self.info.read().unwrap()
    }

    pub fn info_mut(&self) -> RwLockWriteGuard<'_, ProtocolInfo> {
        self.info.write().unwrap()
    }
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("channel_bound", &self.channel_bound)
            .field("pipeline", &self.pipeline)
            .field("info", &*self.info())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_is_in_handshake() {
        let ctx = ConnectionContext::new(false);
        let info = ctx.info();
        assert_eq!(info.state, ConnectionState::Handshake);
        assert!(info.client_version.is_none());
        assert!(info.server_version.is_none());
        assert!(info.username.is_none());
        assert!(info.uuid.is_none());
        assert!(ctx.pipeline().is_empty());
    }

    #[test]
    fn test_info_mutation_during_handshake() {
        let ctx = ConnectionContext::new(true);
        {
            let mut info = ctx.info_mut();
            info.state = ConnectionState::Login;
            info.username = Some("steve".into());
        }
        let info = ctx.info();
        assert_eq!(info.state, ConnectionState::Login);
        assert_eq!(info.username.as_deref(), Some("steve"));
    }
}
