use std::sync::{Arc, Mutex};

/// Navigator
///
/// The seam through which the API client asks for a client-side navigation
/// (for example back to the login page after a 401). The gateway does not
/// navigate anything itself; whoever owns the navigator turns the recorded
/// target into a redirect.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

pub type NavigatorState = Arc<dyn Navigator>;

/// NavigationSlot
///
/// Per-request navigator. Records every requested target in order; handlers
/// read the first one back with [`NavigationSlot::target`] and answer with a
/// redirect to it.
#[derive(Debug, Default)]
pub struct NavigationSlot {
    targets: Mutex<Vec<String>>,
}

impl NavigationSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The first navigation requested, if any.
    pub fn target(&self) -> Option<String> {
        self.lock().first().cloned()
    }

    /// Every navigation requested so far.
    pub fn targets(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // A poisoned slot still holds valid strings.
        self.targets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for NavigationSlot {
    fn navigate(&self, target: &str) {
        tracing::debug!(navigate_to = target, "client navigation requested");
        self.lock().push(target.to_string());
    }
}
