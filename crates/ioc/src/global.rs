//! Process-wide default container.
//!
//! Created lazily on first [`container`] call from whatever introspector and
//! config were configured before that point. [`clear`] empties the current
//! default and drops the reference; the next [`container`] call builds a
//! fresh one from the same introspector.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::info;

use crate::container::Container;
use crate::container_config::ContainerConfig;
use crate::introspection::{TypeCatalog, TypeIntrospector};

#[derive(Default)]
struct GlobalSlot {
    introspector: Option<Arc<dyn TypeIntrospector>>,
    config: Option<ContainerConfig>,
    container: Option<Arc<Container>>,
}

static GLOBAL: Lazy<Mutex<GlobalSlot>> = Lazy::new(|| Mutex::new(GlobalSlot::default()));

/// Set the introspector and config used when the default container is next
/// created. Does not touch an already created container.
pub fn configure(introspector: Arc<dyn TypeIntrospector>, config: ContainerConfig) {
    let mut slot = GLOBAL.lock();
    slot.introspector = Some(introspector);
    slot.config = Some(config);
}

pub fn set_introspector(introspector: Arc<dyn TypeIntrospector>) {
    GLOBAL.lock().introspector = Some(introspector);
}

/// Replace the default container with `container`.
pub fn install(container: Arc<Container>) {
    info!("🌐 Installing '{}' as the default container", container.name());
    GLOBAL.lock().container = Some(container);
}

/// The default container, created on first access.
pub fn container() -> Arc<Container> {
    let mut slot = GLOBAL.lock();
    if let Some(existing) = &slot.container {
        return Arc::clone(existing);
    }

    let introspector = slot
        .introspector
        .clone()
        .unwrap_or_else(|| TypeCatalog::empty().into_shared());
    let config = slot.config.clone().unwrap_or_default();
    let created = Arc::new(Container::with_config(introspector, config));
    slot.container = Some(Arc::clone(&created));
    created
}

pub fn is_initialized() -> bool {
    GLOBAL.lock().container.is_some()
}

/// Clear the default container and forget it. Handles obtained earlier keep
/// pointing at the now empty container.
pub fn clear() {
    let taken = GLOBAL.lock().container.take();
    if let Some(container) = taken {
        container.clear();
        info!("🌐 Default container '{}' released", container.name());
    }
}
