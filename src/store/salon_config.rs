use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context;
use tokio::sync::Mutex;

use super::{write_atomically, StoreError};
use crate::models::SalonConfig;

/// Running salon configuration plus the file it is written back to when the
/// admin overrides part of it.
pub struct SalonConfigStore {
    path: PathBuf,
    current: RwLock<Arc<SalonConfig>>,
    write_lock: Mutex<()>,
}

impl SalonConfigStore {
    pub fn new(path: impl AsRef<Path>, config: SalonConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            current: RwLock::new(Arc::new(config)),
            write_lock: Mutex::new(()),
        }
    }

    /// Falls back to the sample salon when the file does not exist. A file
    /// that exists but does not validate is an error.
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = match tokio::fs::read_to_string(path).await {
            Ok(contents) => SalonConfig::from_json(&contents)
                .with_context(|| format!("invalid salon config in {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "salon config not found, using sample salon");
                SalonConfig::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        Ok(Self::new(path, config))
    }

    pub fn snapshot(&self) -> Arc<SalonConfig> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shallow merge: every top-level key of `fragment` replaces the running
    /// value wholesale. The result is validated and persisted before it
    /// becomes visible to new messages.
    pub async fn merge(&self, fragment: serde_json::Value) -> Result<Arc<SalonConfig>, StoreError> {
        let serde_json::Value::Object(fields) = fragment else {
            return Err(StoreError::InvalidConfig(
                "config update must be a JSON object".to_string(),
            ));
        };

        let _guard = self.write_lock.lock().await;

        let mut merged = serde_json::to_value(self.snapshot().as_ref())?;
        if let serde_json::Value::Object(ref mut target) = merged {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }

        let config: SalonConfig = serde_json::from_value(merged)
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config
            .validate()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;

        write_atomically(&self.path, &serde_json::to_vec_pretty(&config)?).await?;

        let config = Arc::new(config);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = config.clone();
        tracing::info!(path = %self.path.display(), "salon config updated");
        Ok(config)
    }
}
