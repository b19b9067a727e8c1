mod config;
mod relay;

use config::ProxyConfig;
use spyglass_translator::{
    CommandRegistry, PipelineInjector, PlatformBootstrap, TranslatorConfig, VersionCommandHandler,
    VersionState,
};
use spyglass_types::VersionRegistry;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting spyglass proxy...");

    let config = ProxyConfig::load(Path::new("config/proxy.toml"))?;
    info!(
        "Config loaded: bind={}:{}, upstream={}",
        config.bind, config.port, config.upstream
    );

    let registry = Arc::new(VersionRegistry::well_known());
    let state = Arc::new(VersionState::new(registry.clone()));
    state.on_change(|old, new| info!("Target version changed: {} -> {}", old, new));
    if let Some(name) = &config.target_version {
        match registry.by_name(name) {
            Some(version) => state.set_target(Some(version.clone())),
            None => warn!("Configured target_version {} is not a known version", name),
        }
    }

    // Platform modules supplying adapters would be added here; with none
    // registered, only native-version connections can be served.
    let mut commands = CommandRegistry::new();
    let handler = Arc::new(VersionCommandHandler::new(state.clone()));
    let bootstrap_task = PlatformBootstrap::new(&config.storage_dir)
        .on_post_load(|graph| info!("Adapter registry ready ({} edges)", graph.edge_count()))
        .launch(&mut commands, handler);
    let graph = bootstrap_task.ready().await?;

    let translator_config =
        TranslatorConfig::load(&Path::new(&config.storage_dir).join("translator.toml"))?;
    let injector = Arc::new(PipelineInjector::new(
        state.native().clone(),
        graph,
        translator_config,
    ));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                let upstream = config.upstream.clone();
                let injector = injector.clone();
                let target = state.target();
                tokio::spawn(async move {
                    if let Err(e) =
                        relay::handle_connection(socket, upstream, injector, target).await
                    {
                        info!("Connection {} ended: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
