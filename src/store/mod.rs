pub mod appointments;
pub mod conversations;
pub mod salon_config;

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::io::AsyncWriteExt;

use crate::models::{Appointment, ConversationState};

pub use appointments::{InMemoryAppointmentStore, JsonFileAppointmentStore};
pub use conversations::InMemoryConversationStore;
pub use salon_config::SalonConfigStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Ordered, append-only list of confirmed appointments.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Appointment>, StoreError>;

    /// Must only return `Ok` once the appointment is durably recorded.
    async fn append(&self, appointment: Appointment) -> Result<(), StoreError>;
}

/// Per-sender dialogue state, keyed by the sender's messaging address.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, sender: &str) -> Result<Option<ConversationState>, StoreError>;
    async fn put(&self, sender: &str, state: ConversationState) -> Result<(), StoreError>;
    async fn delete(&self, sender: &str) -> Result<(), StoreError>;
    /// Drops conversations whose last activity is before `cutoff`.
    async fn expire_idle(&self, cutoff: NaiveDateTime) -> Result<usize, StoreError>;
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Writes to a sibling temp file, flushes it to disk and renames it over
/// `path`.
pub(crate) async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

pub(crate) async fn move_aside(path: &Path) -> anyhow::Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push(".corrupt");
    tokio::fs::rename(path, &target)
        .await
        .with_context(|| format!("failed to move {} aside", path.display()))
}
