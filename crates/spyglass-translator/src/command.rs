use crate::version_state::VersionState;
use std::collections::HashMap;
use std::sync::Arc;

/// The entry point a console command delegates to. Argument grammar and
/// suggestion ranking live behind this trait, outside this crate.
pub trait ConsoleCommandHandler: Send + Sync {
    /// Execute with the raw argument string; returns a feedback line.
    fn execute(&self, args: &str) -> anyhow::Result<String>;

    /// Complete a partial argument string.
    fn suggest(&self, partial: &str) -> Vec<String>;
}

/// Where command entry points get registered. Hosts with their own
/// command tree implement this; `CommandRegistry` is the in-process
/// fallback.
pub trait CommandDispatcher {
    fn register(&mut self, name: &str, handler: Arc<dyn ConsoleCommandHandler>);
}

/// A plain name -> handler command table with first-word dispatch.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn ConsoleCommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch a full command line to the matching handler.
    pub fn dispatch(&self, line: &str) -> anyhow::Result<String> {
        let line = line.trim();
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        match self.handlers.get(name) {
            Some(handler) => handler.execute(args),
            None => Err(anyhow::anyhow!("Unknown command: {}", name)),
        }
    }
}

impl CommandDispatcher for CommandRegistry {
    fn register(&mut self, name: &str, handler: Arc<dyn ConsoleCommandHandler>) {
        self.handlers.insert(name.to_string(), handler);
    }
}

/// Built-in handler: no arguments prints the current target, a version
/// name selects it. Suggestions are the known version names, newest
/// first.
pub struct VersionCommandHandler {
    state: Arc<VersionState>,
}

impl VersionCommandHandler {
    pub fn new(state: Arc<VersionState>) -> Self {
        Self { state }
    }
}

impl ConsoleCommandHandler for VersionCommandHandler {
    fn execute(&self, args: &str) -> anyhow::Result<String> {
        if args.is_empty() {
            return Ok(format!(
                "Target version is {} (native {})",
                self.state.target(),
                self.state.native()
            ));
        }

        match self.state.registry().by_name(args) {
            Some(version) => {
                let version = version.clone();
                self.state.set_target(Some(version.clone()));
                Ok(format!("Target version set to {}", version))
            }
            None => Err(anyhow::anyhow!("Unknown version: {}", args)),
        }
    }

    fn suggest(&self, partial: &str) -> Vec<String> {
        self.state
            .registry()
            .versions()
            .iter()
            .filter(|v| v.name.starts_with(partial))
            .map(|v| v.name.clone())
            .collect()
    }
}
