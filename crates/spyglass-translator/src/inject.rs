use crate::config::TranslatorConfig;
use crate::resolver::resolve_pipeline;
use bytes::BytesMut;
use spyglass_protocol_core::{
    AdapterGraph, ChannelHandler, ConnectionContext, DatagramOptions, TransportChannel,
};
use spyglass_types::{ProtocolVersion, Transport};
use std::sync::Arc;
use tracing::debug;

/// Wires the translation pipeline into a live transport channel.
///
/// Runs exactly once per connection, at channel-activation time, before
/// any protocol bytes are exchanged. Connections targeting the native
/// version pay no cost: nothing is stored and nothing is appended.
pub struct PipelineInjector {
    native: ProtocolVersion,
    graph: Arc<AdapterGraph>,
    config: TranslatorConfig,
}

impl PipelineInjector {
    pub fn new(
        native: ProtocolVersion,
        graph: Arc<AdapterGraph>,
        config: TranslatorConfig,
    ) -> Self {
        Self {
            native,
            graph,
            config,
        }
    }

    /// Install translation for a connection whose per-connection target
    /// is `target`. Returns the attached connection context, or `None`
    /// on the native fast path.
    ///
    /// Any failure (no adapter path, transport option rejected) must
    /// abort connection establishment; a partial pipeline is never left
    /// behind on a channel that proceeds.
    pub fn inject(
        &self,
        channel: &mut TransportChannel,
        target: &ProtocolVersion,
    ) -> anyhow::Result<Option<Arc<ConnectionContext>>> {
        if *target == self.native {
            return Ok(None);
        }

        channel.attributes().set_target_override(target.clone());

        if target.transport == Transport::Datagram {
            let datagram = &self.config.datagram;
            channel.set_datagram_options(DatagramOptions {
                protocol_revision: datagram.protocol_revision,
                connect_timeout: datagram.connect_timeout(),
                session_timeout: datagram.session_timeout(),
                session_id: rand::random(),
            })?;
        }

        let mut connection = ConnectionContext::new(true);
        let pipeline = resolve_pipeline(&self.graph, &self.native, target, &connection)?;
        connection.set_pipeline(pipeline);
        let connection = Arc::new(connection);

        channel.attributes().attach_translation(connection.clone());
        channel.append_handler(Box::new(TranslationHandler {
            connection: connection.clone(),
        }));

        debug!(
            "Installed translation pipeline {:?} for target {}",
            connection.pipeline(),
            target
        );
        Ok(Some(connection))
    }
}

/// The channel handler that runs every frame through the connection's
/// adapter pipeline: serverbound frames in resolved order, clientbound
/// frames through the inverse chain.
struct TranslationHandler {
    connection: Arc<ConnectionContext>,
}

impl ChannelHandler for TranslationHandler {
    fn name(&self) -> &str {
        "translation"
    }

    fn on_serverbound(&self, frame: &mut BytesMut) -> anyhow::Result<()> {
        for step in self.connection.pipeline().steps() {
            step.adapter.transform_serverbound(frame)?;
        }
        Ok(())
    }

    fn on_clientbound(&self, frame: &mut BytesMut) -> anyhow::Result<()> {
        for step in self.connection.pipeline().steps().iter().rev() {
            step.adapter.transform_clientbound(frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve_path, ResolveError};
    use spyglass_protocol_core::{AdapterGraphBuilder, PacketAdapter};

    struct TagAdapter(u8);

    impl PacketAdapter for TagAdapter {
        fn init(&self, _connection: &ConnectionContext) {}

        fn transform_serverbound(&self, frame: &mut BytesMut) -> anyhow::Result<()> {
            frame.extend_from_slice(&[self.0]);
            Ok(())
        }

        fn transform_clientbound(&self, frame: &mut BytesMut) -> anyhow::Result<()> {
            frame.extend_from_slice(&[self.0 | 0x80]);
            Ok(())
        }
    }

    fn v(id: i32) -> ProtocolVersion {
        ProtocolVersion::stream(format!("v{id}"), id)
    }

    fn injector() -> PipelineInjector {
        // native 767, chain 767 -> 765 -> 340
        let mut builder = AdapterGraphBuilder::new();
        builder.register_primary(v(767), v(765), Arc::new(TagAdapter(1)));
        builder.register_primary(v(765), v(340), Arc::new(TagAdapter(2)));
        PipelineInjector::new(v(767), Arc::new(builder.build()), TranslatorConfig::default())
    }

    #[test]
    fn test_native_target_touches_nothing() {
        let injector = injector();
        let mut channel = TransportChannel::new(Transport::Stream);

        let attached = injector.inject(&mut channel, &v(767)).unwrap();
        assert!(attached.is_none());
        assert!(channel.attributes().is_empty());
        assert_eq!(channel.handler_count(), 0);
        assert!(channel.translation().is_err());
    }

    #[test]
    fn test_injected_pipeline_matches_resolved_path() {
        let mut builder = AdapterGraphBuilder::new();
        builder.register_primary(v(767), v(765), Arc::new(TagAdapter(1)));
        builder.register_primary(v(765), v(340), Arc::new(TagAdapter(2)));
        let graph = Arc::new(builder.build());
        let injector =
            PipelineInjector::new(v(767), graph.clone(), TranslatorConfig::default());
        let mut channel = TransportChannel::new(Transport::Stream);

        let connection = injector.inject(&mut channel, &v(340)).unwrap().unwrap();

        let expected: Vec<(i32, i32)> = resolve_path(&graph, &v(767), &v(340))
            .unwrap()
            .iter()
            .map(|s| (s.from.id, s.to.id))
            .collect();
        let hops: Vec<(i32, i32)> = connection
            .pipeline()
            .steps()
            .iter()
            .map(|s| (s.from.id, s.to.id))
            .collect();
        assert_eq!(hops, expected);
        assert_eq!(hops, vec![(767, 765), (765, 340)]);

        assert_eq!(channel.attributes().target_override().unwrap().id, 340);
        assert!(Arc::ptr_eq(&channel.translation().unwrap(), &connection));
        assert_eq!(channel.handler_count(), 1);
    }

    #[test]
    fn test_frames_flow_through_pipeline_in_order() {
        let injector = injector();
        let mut channel = TransportChannel::new(Transport::Stream);
        injector.inject(&mut channel, &v(340)).unwrap();

        let mut frame = BytesMut::new();
        channel.handle_serverbound(&mut frame).unwrap();
        assert_eq!(&frame[..], &[1, 2]);

        let mut frame = BytesMut::new();
        channel.handle_clientbound(&mut frame).unwrap();
        assert_eq!(&frame[..], &[0x82, 0x81]);
    }

    #[test]
    fn test_no_path_aborts_injection() {
        let injector = injector();
        let mut channel = TransportChannel::new(Transport::Stream);

        let err = injector.inject(&mut channel, &v(999)).unwrap_err();
        assert!(err.downcast_ref::<ResolveError>().is_some());
        assert_eq!(channel.handler_count(), 0);
    }

    #[test]
    fn test_datagram_target_applies_session_options() {
        let mut builder = AdapterGraphBuilder::new();
        let bedrock = ProtocolVersion::datagram("bedrock", 685);
        builder.register(v(767), bedrock.clone(), Arc::new(TagAdapter(9)));
        let injector =
            PipelineInjector::new(v(767), Arc::new(builder.build()), TranslatorConfig::default());

        let mut channel = TransportChannel::new(Transport::Datagram);
        injector.inject(&mut channel, &bedrock).unwrap();

        let options = channel.datagram_options().unwrap();
        assert_eq!(options.protocol_revision, 11);
        assert_eq!(options.connect_timeout, std::time::Duration::from_secs(4));
        assert_eq!(options.session_timeout, std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_datagram_target_on_stream_channel_fails() {
        let mut builder = AdapterGraphBuilder::new();
        let bedrock = ProtocolVersion::datagram("bedrock", 685);
        builder.register(v(767), bedrock.clone(), Arc::new(TagAdapter(9)));
        let injector =
            PipelineInjector::new(v(767), Arc::new(builder.build()), TranslatorConfig::default());

        let mut channel = TransportChannel::new(Transport::Stream);
        assert!(injector.inject(&mut channel, &bedrock).is_err());
        assert_eq!(channel.handler_count(), 0);
    }
}
