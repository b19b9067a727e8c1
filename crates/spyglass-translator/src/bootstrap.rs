use crate::command::{CommandDispatcher, ConsoleCommandHandler};
use spyglass_protocol_core::{AdapterGraph, AdapterGraphBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to prepare storage directory: {0}")]
    Storage(#[source] std::io::Error),
    #[error("platform module {module} failed to load: {source}")]
    ModuleLoad {
        module: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("bootstrap task ended before signaling completion")]
    TaskFailed,
}

/// A platform module contributes adapter edges to the version graph
/// during bootstrap. Modules may keep caches under the storage
/// directory; the file formats are their own.
pub trait PlatformModule: Send + Sync {
    fn name(&self) -> &str;

    fn register(&self, graph: &mut AdapterGraphBuilder, storage_dir: &Path) -> anyhow::Result<()>;
}

type PostLoadListener = Box<dyn Fn(&AdapterGraph) + Send + Sync>;

/// One-time asynchronous platform initializer.
///
/// `launch` registers the console command entry points synchronously,
/// then loads every platform module on a background task. The adapter
/// graph must not be touched until the returned task signals readiness;
/// awaiting it is the happens-before barrier for all graph readers.
pub struct PlatformBootstrap {
    storage_dir: PathBuf,
    modules: Vec<Box<dyn PlatformModule>>,
    post_load: Vec<PostLoadListener>,
}

impl PlatformBootstrap {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            modules: Vec::new(),
            post_load: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: Box<dyn PlatformModule>) -> Self {
        self.modules.push(module);
        self
    }

    /// Register a listener fired once, after all modules have loaded and
    /// before the completion signal resolves.
    pub fn on_post_load(mut self, listener: impl Fn(&AdapterGraph) + Send + Sync + 'static) -> Self {
        self.post_load.push(Box::new(listener));
        self
    }

    pub fn launch(
        self,
        commands: &mut dyn CommandDispatcher,
        handler: Arc<dyn ConsoleCommandHandler>,
    ) -> BootstrapTask {
        commands.register("spyglass", handler.clone());
        commands.register("protocol", handler);

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(self.load());
        });
        BootstrapTask { ready: rx }
    }

    fn load(self) -> Result<Arc<AdapterGraph>, BootstrapError> {
        std::fs::create_dir_all(&self.storage_dir).map_err(BootstrapError::Storage)?;

        let mut builder = AdapterGraphBuilder::new();
        for module in &self.modules {
            debug!("Loading platform module {}", module.name());
            module
                .register(&mut builder, &self.storage_dir)
                .map_err(|source| BootstrapError::ModuleLoad {
                    module: module.name().to_string(),
                    source,
                })?;
        }

        let graph = Arc::new(builder.build());
        info!(
            "Loaded {} platform modules ({} adapter edges)",
            self.modules.len(),
            graph.edge_count()
        );

        for listener in &self.post_load {
            listener(&graph);
        }
        Ok(graph)
    }
}

/// Completion signal of a launched bootstrap.
pub struct BootstrapTask {
    ready: oneshot::Receiver<Result<Arc<AdapterGraph>, BootstrapError>>,
}

impl BootstrapTask {
    /// Wait for the registry load to finish. Failure means the system
    /// never becomes ready; there is no degraded mode.
    pub async fn ready(self) -> Result<Arc<AdapterGraph>, BootstrapError> {
        self.ready.await.unwrap_or(Err(BootstrapError::TaskFailed))
    }
}
