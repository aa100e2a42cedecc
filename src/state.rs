use crate::gateway::{Gateway, GatewayError};
use crate::models::{DirectoryEntry, ShiftRecord};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Local copies of the remote collections. Replaced by every re-fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardCache {
    pub shifts: Vec<ShiftRecord>,
    pub directory: Vec<DirectoryEntry>,
    pub roster_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub cache: Arc<Mutex<BoardCache>>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            cache: Arc::new(Mutex::new(BoardCache::default())),
        }
    }

    pub async fn snapshot(&self) -> BoardCache {
        self.cache.lock().await.clone()
    }

    // The lock is taken only after the gateway call returns.
    pub async fn refresh_shifts(&self) -> Result<(), GatewayError> {
        let shifts = self.gateway.read_shifts().await?;
        let mut cache = self.cache.lock().await;
        if shifts.is_empty() {
            cache.roster_date = None;
        }
        cache.shifts = shifts;
        Ok(())
    }

    pub async fn refresh_directory(&self) -> Result<(), GatewayError> {
        let directory = self.gateway.read_directory().await?;
        self.cache.lock().await.directory = directory;
        Ok(())
    }

    pub async fn refresh_all(&self) -> Result<(), GatewayError> {
        self.refresh_shifts().await?;
        self.refresh_directory().await
    }

    /// Flips a cached shift's check mark without waiting for the remote.
    pub async fn patch_check(&self, name: &str, checked: bool) -> bool {
        let mut cache = self.cache.lock().await;
        match cache.shifts.iter_mut().find(|shift| shift.name == name) {
            Some(shift) => {
                shift.checked = checked;
                true
            }
            None => false,
        }
    }
}
