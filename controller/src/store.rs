use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use trv_common::{MemoryStatsStore, RuntimeConfig};

/// JSON files under `$TRV_DATA_DIR` (default `./.trv`).
#[derive(Clone)]
pub struct AppStore {
    runtime_path: Arc<PathBuf>,
    stats_path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl AppStore {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("TRV_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.trv"));
        Self::new(data_dir)
    }

    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            runtime_path: Arc::new(data_dir.join("runtime.json")),
            stats_path: Arc::new(data_dir.join("stats.json")),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        self.load_or_default(&self.runtime_path).await
    }

    pub async fn save_runtime_config(&self, runtime: &RuntimeConfig) -> anyhow::Result<()> {
        self.save(&self.runtime_path, runtime).await
    }

    pub async fn load_stats(&self) -> anyhow::Result<MemoryStatsStore> {
        self.load_or_default(&self.stats_path).await
    }

    pub async fn save_stats(&self, stats: &MemoryStatsStore) -> anyhow::Result<()> {
        self.save(&self.stats_path, stats).await
    }

    async fn load_or_default<T: DeserializeOwned + Default>(
        &self,
        path: &PathBuf,
    ) -> anyhow::Result<T> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(path).await {
            Ok(raw) => Ok(serde_json::from_slice::<T>(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(T::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save<T: Serialize>(&self, path: &PathBuf, value: &T) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(path, payload).await?;
        Ok(())
    }
}
