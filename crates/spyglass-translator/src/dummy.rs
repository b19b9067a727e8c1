use crate::resolver::{resolve_pipeline, ResolveError};
use spyglass_protocol_core::{AdapterGraph, ConnectionContext, ConnectionState};
use spyglass_types::{ProtocolVersion, UserIdentity};
use std::sync::Arc;

/// Supplies the current user identity, when a session exists.
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<UserIdentity>;
}

/// Identity provider for headless hosts with no user session.
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_identity(&self) -> Option<UserIdentity> {
        None
    }
}

/// Build a fully-initialized connection context with no backing
/// transport, for packet emulation and previews.
///
/// The context always comes out in `Play` state with both protocol
/// versions set. Identity fields are filled only if the provider yields
/// a current identity at call time; callers must not rely on them.
pub fn create_dummy_connection(
    graph: &AdapterGraph,
    client_version: &ProtocolVersion,
    server_version: &ProtocolVersion,
    identity: &dyn IdentityProvider,
) -> Result<Arc<ConnectionContext>, ResolveError> {
    let mut connection = ConnectionContext::new(false);
    let pipeline = resolve_pipeline(graph, client_version, server_version, &connection)?;
    connection.set_pipeline(pipeline);

    {
        let mut info = connection.info_mut();
        info.state = ConnectionState::Play;
        info.client_version = Some(client_version.clone());
        info.server_version = Some(server_version.clone());
        if let Some(user) = identity.current_identity() {
            info.username = Some(user.name);
            info.uuid = Some(user.uuid);
        }
    }

    Ok(Arc::new(connection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spyglass_protocol_core::{AdapterGraphBuilder, PacketAdapter};
    use uuid::Uuid;

    struct NoopAdapter;

    impl PacketAdapter for NoopAdapter {
        fn init(&self, _connection: &ConnectionContext) {}
    }

    struct FixedIdentity(UserIdentity);

    impl IdentityProvider for FixedIdentity {
        fn current_identity(&self) -> Option<UserIdentity> {
            Some(self.0.clone())
        }
    }

    fn v(id: i32) -> ProtocolVersion {
        ProtocolVersion::stream(format!("v{id}"), id)
    }

    fn graph() -> AdapterGraph {
        let mut builder = AdapterGraphBuilder::new();
        builder.register(v(767), v(765), Arc::new(NoopAdapter));
        builder.build()
    }

    #[test]
    fn test_dummy_is_in_play_with_versions_set() {
        let connection =
            create_dummy_connection(&graph(), &v(767), &v(765), &NoIdentity).unwrap();
        assert!(!connection.is_channel_bound());
        assert_eq!(connection.pipeline().len(), 1);

        let info = connection.info();
        assert_eq!(info.state, ConnectionState::Play);
        assert_eq!(info.client_version.as_ref().unwrap().id, 767);
        assert_eq!(info.server_version.as_ref().unwrap().id, 765);
    }

    #[test]
    fn test_equal_versions_give_empty_pipeline() {
        let connection =
            create_dummy_connection(&graph(), &v(767), &v(767), &NoIdentity).unwrap();
        assert!(connection.pipeline().is_empty());
        assert_eq!(connection.info().state, ConnectionState::Play);
    }

    #[test]
    fn test_identity_absent_without_session() {
        let connection =
            create_dummy_connection(&graph(), &v(767), &v(765), &NoIdentity).unwrap();
        let info = connection.info();
        assert!(info.username.is_none());
        assert!(info.uuid.is_none());
    }

    #[test]
    fn test_identity_present_with_session() {
        let uuid = Uuid::new_v4();
        let provider = FixedIdentity(UserIdentity {
            name: "alex".into(),
            uuid,
        });
        let connection = create_dummy_connection(&graph(), &v(767), &v(765), &provider).unwrap();
        let info = connection.info();
        assert_eq!(info.username.as_deref(), Some("alex"));
        assert_eq!(info.uuid, Some(uuid));
    }

    #[test]
    fn test_unreachable_versions_fail() {
        assert!(create_dummy_connection(&graph(), &v(765), &v(767), &NoIdentity).is_err());
    }
}
