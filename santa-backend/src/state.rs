use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use santa_core::Game;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{CredentialVerifier, StaticPassword};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub(crate) games: Arc<RwLock<HashMap<String, Game>>>,
    pub(crate) verifier: Arc<dyn CredentialVerifier>,
    pub(crate) public_base_url: Arc<str>,
    persist_path: Option<PathBuf>,
    persist_lock: Arc<Mutex<()>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl AppState {
    /// In-memory state; ignores `config.persist_path`.
    pub fn new(config: &Config) -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            verifier: Arc::new(StaticPassword::new(config.admin_password.clone())),
            public_base_url: Arc::from(config.public_base_url.as_str()),
            persist_path: None,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Builds state from config, reloading the snapshot file when one is configured.
    ///
    /// An unreadable snapshot is moved aside before anything can overwrite it.
    /// If it cannot be moved, the state runs in memory only.
    pub async fn from_config(config: &Config) -> Self {
        let mut state = Self::new(config);
        let Some(path) = &config.persist_path else {
            return state;
        };

        match load_snapshot(path).await {
            Ok(saved) => {
                *state.games.write().await = saved;
                state.persist_path = Some(path.clone());
            }
            Err(err) => {
                warn!("unreadable snapshot {}: {err}", path.display());
                let aside = sibling(path, &format!(".corrupt-{}", Uuid::new_v4()));
                match tokio::fs::rename(path, &aside).await {
                    Ok(()) => {
                        warn!("moved unreadable snapshot to {}", aside.display());
                        state.persist_path = Some(path.clone());
                    }
                    Err(err) => error!(
                        "could not move {} aside, persistence disabled: {err}",
                        path.display()
                    ),
                }
            }
        }
        state
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Writes every game to the snapshot file. Failures are logged and swallowed.
    pub(crate) async fn persist(&self) {
        let Some(path) = &self.persist_path else {
            return;
        };

        // Snapshot under the persist lock so file writes land in mutation order.
        let _guard = self.persist_lock.lock().await;
        let snapshot = {
            let games = self.games.read().await;
            games.clone()
        };

        if let Err(err) = write_snapshot(path, &snapshot).await {
            error!("persist error writing {}: {err}", path.display());
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum SnapshotError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Writes next to `path` and renames over it, so a cut-off write never
/// replaces the last good snapshot.
async fn write_snapshot(path: &Path, games: &HashMap<String, Game>) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec_pretty(games)?;
    let tmp = sibling(path, ".tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn load_snapshot(path: &Path) -> Result<HashMap<String, Game>, SnapshotError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no snapshot at {}, starting empty", path.display());
            return Ok(HashMap::new());
        }
        Err(err) => return Err(err.into()),
    };

    let games: HashMap<String, Game> = serde_json::from_slice(&bytes)?;
    info!("loaded {} games from {}", games.len(), path.display());
    Ok(games)
}
