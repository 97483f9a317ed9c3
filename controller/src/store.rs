use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use sleepfade_common::{RuntimeConfig, TimerState, WeeklySchedule};

/// JSON files under the data directory. Missing files read as defaults.
#[derive(Clone)]
pub struct AppStore {
    runtime_path: Arc<PathBuf>,
    schedule_path: Arc<PathBuf>,
    timer_state_path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl AppStore {
    pub fn new() -> Self {
        let data_dir = std::env::var("SLEEPFADE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.sleepfade"));
        Self::in_dir(data_dir)
    }

    pub fn in_dir(data_dir: PathBuf) -> Self {
        Self {
            runtime_path: Arc::new(data_dir.join("runtime.json")),
            schedule_path: Arc::new(data_dir.join("schedule.json")),
            timer_state_path: Arc::new(data_dir.join("timer_state.json")),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        Ok(self.read(&self.runtime_path).await?.unwrap_or_default())
    }

    pub async fn save_runtime_config(&self, runtime: &RuntimeConfig) -> anyhow::Result<()> {
        self.write(&self.runtime_path, runtime).await
    }

    pub async fn load_schedule(&self) -> anyhow::Result<Option<WeeklySchedule>> {
        self.read(&self.schedule_path).await
    }

    /// `None` deletes the stored schedule.
    pub async fn save_schedule(&self, schedule: Option<&WeeklySchedule>) -> anyhow::Result<()> {
        match schedule {
            Some(schedule) => self.write(&self.schedule_path, schedule).await,
            None => {
                let _guard = self.lock.lock().await;
                match tokio::fs::remove_file(self.schedule_path.as_ref()).await {
                    Ok(()) => Ok(()),
                    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    pub async fn load_timer_state(&self) -> anyhow::Result<TimerState> {
        Ok(self.read(&self.timer_state_path).await?.unwrap_or_default())
    }

    pub async fn save_timer_state(&self, state: &TimerState) -> anyhow::Result<()> {
        self.write(&self.timer_state_path, state).await
    }

    async fn read<T: DeserializeOwned>(&self, path: &PathBuf) -> anyhow::Result<Option<T>> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice::<T>(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write<T: Serialize>(&self, path: &PathBuf, value: &T) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(path, payload).await?;
        Ok(())
    }
}
