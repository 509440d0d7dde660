use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{move_aside, write_atomically, AppointmentStore, StoreError};
use crate::models::Appointment;

/// Appointments persisted as one pretty-printed JSON array.
pub struct JsonFileAppointmentStore {
    path: PathBuf,
    appointments: Mutex<Vec<Appointment>>,
}

impl JsonFileAppointmentStore {
    /// Never fails: a missing file is an empty store, and an unreadable one is
    /// moved aside so the next append cannot overwrite it.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let appointments = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<Vec<Appointment>>(&contents) {
                Ok(list) => {
                    tracing::info!(path = %path.display(), count = list.len(), "loaded appointments");
                    list
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt appointment file, starting empty");
                    if let Err(e) = move_aside(&path).await {
                        tracing::error!(error = %e, "failed to preserve corrupt appointment file");
                    }
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no appointment file yet, starting empty");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable appointment file, starting empty");
                if let Err(e) = move_aside(&path).await {
                    tracing::error!(error = %e, "failed to preserve unreadable appointment file");
                }
                Vec::new()
            }
        };

        Self {
            path,
            appointments: Mutex::new(appointments),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AppointmentStore for JsonFileAppointmentStore {
    async fn load_all(&self) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.appointments.lock().await.clone())
    }

    async fn append(&self, appointment: Appointment) -> Result<(), StoreError> {
        let mut current = self.appointments.lock().await;

        let mut next = current.clone();
        next.push(appointment);
        let json = serde_json::to_vec_pretty(&next)?;
        write_atomically(&self.path, &json).await?;

        *current = next;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: Mutex<Vec<Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Mutex::new(appointments),
        }
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn load_all(&self) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.appointments.lock().await.clone())
    }

    async fn append(&self, appointment: Appointment) -> Result<(), StoreError> {
        self.appointments.lock().await.push(appointment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Service, StaffRef};
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn appointment(id: i64, phone: &str, staff: &str) -> Appointment {
        Appointment {
            id,
            phone: phone.to_string(),
            date_formatted: "16/06/2031".to_string(),
            time: "10:30".to_string(),
            iso_date_time: dt("2031-06-16 10:30"),
            service: Service {
                name: "Tinte".to_string(),
                price: 35.5,
                duration_minutes: 90,
            },
            staff: StaffRef {
                name: staff.to_string(),
            },
            created_at: dt("2031-06-01 09:15"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAppointmentStore::open(dir.path().join("appointments.json")).await;
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reload_reconstructs_same_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");

        let store = JsonFileAppointmentStore::open(&path).await;
        let written = vec![
            appointment(3, "111", "María"),
            appointment(1, "222", "Indiferente"),
            appointment(2, "333", "Carlos"),
        ];
        for a in &written {
            store.append(a.clone()).await.unwrap();
        }

        let reopened = JsonFileAppointmentStore::open(&path).await;
        assert_eq!(reopened.load_all().await.unwrap(), written);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty_and_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileAppointmentStore::open(&path).await;
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(dir.path().join("appointments.json.corrupt").exists());

        store.append(appointment(1, "111", "María")).await.unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_utf8_file_is_preserved_before_next_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        std::fs::write(&path, b"[\xff\xfe old]").unwrap();

        let store = JsonFileAppointmentStore::open(&path).await;
        assert!(store.load_all().await.unwrap().is_empty());

        store.append(appointment(1, "111", "María")).await.unwrap();

        let preserved = std::fs::read(dir.path().join("appointments.json.corrupt")).unwrap();
        assert_eq!(preserved, b"[\xff\xfe old]");
        let reopened = JsonFileAppointmentStore::open(&path).await;
        assert_eq!(reopened.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("appointments.json");

        let store = JsonFileAppointmentStore::open(&path).await;
        let result = store.append(appointment(1, "111", "María")).await;
        assert!(result.is_err());
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        let store = std::sync::Arc::new(JsonFileAppointmentStore::open(&path).await);

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(appointment(i, &format!("sender-{i}"), "María"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reopened = JsonFileAppointmentStore::open(&path).await;
        assert_eq!(reopened.load_all().await.unwrap().len(), 10);
    }
}
