use std::sync::Arc;

use crate::config::Settings;
use crate::notification::{NotificationManager, NotifyError};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub manager: Arc<NotificationManager>,
}

impl AppState {
    /// Build the state and its notification manager on the current runtime
    pub fn new(settings: Settings) -> Result<Self, NotifyError> {
        let manager = Arc::new(NotificationManager::new(&settings.notifications)?);
        Ok(Self::with_manager(settings, manager))
    }

    pub fn with_manager(settings: Settings, manager: Arc<NotificationManager>) -> Self {
        Self {
            settings: Arc::new(settings),
            manager,
        }
    }
}
