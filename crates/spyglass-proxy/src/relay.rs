use spyglass_protocol_core::{
    FrameReader, FrameWriter, FramedConnection, TransportChannel,
};
use spyglass_translator::PipelineInjector;
use spyglass_types::{ProtocolVersion, Transport};
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::debug;

/// Handle one proxied connection: inject translation at activation, dial
/// the upstream server, then pump frames both ways through the channel's
/// handler chain until either side closes.
pub async fn handle_connection(
    client: TcpStream,
    upstream_addr: String,
    injector: Arc<PipelineInjector>,
    target: ProtocolVersion,
) -> anyhow::Result<()> {
    let mut channel = TransportChannel::new(Transport::Stream);
    match injector.inject(&mut channel, &target)? {
        Some(connection) => debug!("Translating via {:?}", connection.pipeline()),
        None => debug!("Native target {}, passing frames through untouched", target),
    }
    let channel = Arc::new(channel);

    let upstream = TcpStream::connect(&upstream_addr).await?;
    let (client_reader, client_writer) = FramedConnection::new(client).into_split();
    let (upstream_reader, upstream_writer) = FramedConnection::new(upstream).into_split();

    tokio::select! {
        result = pump_serverbound(client_reader, upstream_writer, channel.clone()) => result,
        result = pump_clientbound(upstream_reader, client_writer, channel) => result,
    }
}

async fn pump_serverbound(
    mut reader: FrameReader,
    mut writer: FrameWriter,
    channel: Arc<TransportChannel>,
) -> anyhow::Result<()> {
    loop {
        let mut frame = reader.read_frame().await?;
        channel.handle_serverbound(&mut frame)?;
        writer.write_frame(&frame).await?;
    }
}

async fn pump_clientbound(
    mut reader: FrameReader,
    mut writer: FrameWriter,
    channel: Arc<TransportChannel>,
) -> anyhow::Result<()> {
    loop {
        let mut frame = reader.read_frame().await?;
        channel.handle_clientbound(&mut frame)?;
        writer.write_frame(&frame).await?;
    }
}
