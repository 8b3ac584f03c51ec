//! Service container for dependency injection
//!
//! Wires settings, the shared validator and the edit lock, and opens
//! sessions with them.

use std::sync::Arc;

use tracing::debug;

use crate::application::{Session, SessionOptions};
use crate::config::Settings;
use crate::domain::{ConfigTree, PathValidator};
use crate::infrastructure::traits::{EditLock, InProcessEditLock};

/// Container holding the process-wide collaborators of every session.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Validator shared read-only by all sessions
    pub validator: Arc<PathValidator>,

    /// Cross-session exclusion hook
    pub lock: Arc<dyn EditLock>,
}

impl ServiceContainer {
    /// Create a container whose sessions exclude each other in-process.
    pub fn new(settings: Settings, validator: PathValidator) -> Self {
        Self::with_deps(
            settings,
            Arc::new(validator),
            Arc::new(InProcessEditLock::default()),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        validator: Arc<PathValidator>,
        lock: Arc<dyn EditLock>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            validator,
            lock,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        self.settings.session_options()
    }

    /// Opens a session over `tree` for `user`, or the configured user.
    pub fn open_session(&self, tree: ConfigTree, user: Option<&str>) -> Session {
        let user = user.unwrap_or(self.settings.user.as_str());
        debug!(user, "opening session");
        Session::new(tree, Arc::clone(&self.validator), user)
            .with_options(self.session_options())
            .with_lock(Arc::clone(&self.lock))
    }
}
