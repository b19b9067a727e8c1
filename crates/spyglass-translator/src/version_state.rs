use spyglass_types::{ProtocolVersion, VersionRegistry};
use std::sync::{Arc, Mutex, RwLock};
use tracing::warn;

type ChangeListener = Box<dyn Fn(&ProtocolVersion, &ProtocolVersion) + Send + Sync>;

/// Process-wide holder of the selected target version.
///
/// The native version is fixed at construction. The target defaults to
/// native and only changes through `set_target`, which notifies change
/// listeners synchronously on the calling thread, in registration order,
/// after the swap has committed.
pub struct VersionState {
    registry: Arc<VersionRegistry>,
    target: RwLock<ProtocolVersion>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl VersionState {
    pub fn new(registry: Arc<VersionRegistry>) -> Self {
        let target = registry.native().clone();
        Self {
            registry,
            target: RwLock::new(target),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn native(&self) -> &ProtocolVersion {
        self.registry.native()
    }

    /// The currently selected target version. Never fails.
    pub fn target(&self) -> ProtocolVersion {
        self.target.read().unwrap().clone()
    }

    /// Register a change listener. Listeners run on whichever thread
    /// commits the change; they must not call back into `set_target`.
    pub fn on_change(
        &self,
        listener: impl Fn(&ProtocolVersion, &ProtocolVersion) + Send + Sync + 'static,
    ) {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Select a new target version.
    ///
    /// `None` (no selection) is ignored. Unregistered versions are
    /// ignored with a warning so the target always stays a registered
    /// version. Re-selecting the current target is a no-op and fires no
    /// notification.
    pub fn set_target(&self, version: Option<ProtocolVersion>) {
        let Some(new_version) = version else {
            return;
        };
        if !self.registry.contains(&new_version) {
            warn!("Ignoring unknown target version {}", new_version);
            return;
        }

        let old_version = {
            let mut target = self.target.write().unwrap();
            if *target == new_version {
                return;
            }
            std::mem::replace(&mut *target, new_version.clone())
        };

        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            listener(&old_version, &new_version);
        }
    }
}
