use crate::error::ProfileError;
use crate::model::{LangTag, Profile, Settings};
use async_trait::async_trait;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Persistence collaborator for the settings record. Last write wins,
/// no transactional guarantees.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    async fn load(&self) -> Result<Option<Settings>, ProfileError>;
    async fn save(&self, settings: &Settings) -> Result<(), ProfileError>;
}

/// Stores the settings record as a JSON file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileBackend { path: path.into() }
    }
}

#[async_trait]
impl SettingsBackend for JsonFileBackend {
    async fn load(&self) -> Result<Option<Settings>, ProfileError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, settings: &Settings) -> Result<(), ProfileError> {
        let bytes = serde_json::to_vec_pretty(settings)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// Keeps the settings record in memory only. Useful for tests and for
/// embedders that manage persistence themselves.
#[derive(Default)]
pub struct MemoryBackend {
    stored: RwLock<Option<Settings>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        MemoryBackend {
            stored: RwLock::new(Some(settings)),
        }
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<Settings>, ProfileError> {
        Ok(self.stored.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), ProfileError> {
        *self.stored.write().await = Some(settings.clone());
        Ok(())
    }
}

/// Holds the current user's dietary profile and language preference.
///
/// The pipeline reads a snapshot at submission time; edits made while
/// a run is in flight never reach that run.
pub struct ProfileStore {
    backend: Box<dyn SettingsBackend>,
    current: RwLock<Settings>,
}

impl ProfileStore {
    /// Open the store, reading the persisted record when one exists.
    pub async fn open(backend: Box<dyn SettingsBackend>) -> Result<Self, ProfileError> {
        let current = match backend.load().await? {
            Some(settings) => {
                debug!(
                    "Settings loaded: diet is {}",
                    settings
                        .profile
                        .as_ref()
                        .map(|p| p.diet.as_str())
                        .unwrap_or("None")
                );
                settings
            }
            None => {
                debug!("No stored settings, starting from defaults");
                Settings::default()
            }
        };

        Ok(ProfileStore {
            backend,
            current: RwLock::new(current),
        })
    }

    /// In-memory store seeded with the given settings; nothing is
    /// persisted anywhere.
    pub fn in_memory(settings: Settings) -> Self {
        ProfileStore {
            backend: Box::new(MemoryBackend::new()),
            current: RwLock::new(settings),
        }
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.current.read().await.profile.clone()
    }

    pub async fn languages(&self) -> (LangTag, LangTag) {
        let current = self.current.read().await;
        (
            current.source_language.clone(),
            current.target_language.clone(),
        )
    }

    /// Copy of the full record, taken by the pipeline at submission.
    pub async fn snapshot(&self) -> Settings {
        self.current.read().await.clone()
    }

    pub async fn put_profile(&self, profile: Profile) -> Result<(), ProfileError> {
        let mut current = self.current.write().await;
        current.profile = Some(profile);
        self.persist(&current).await
    }

    pub async fn put_languages(
        &self,
        source: LangTag,
        target: LangTag,
    ) -> Result<(), ProfileError> {
        let mut current = self.current.write().await;
        current.source_language = source;
        current.target_language = target;
        self.persist(&current).await
    }

    async fn persist(&self, settings: &Settings) -> Result<(), ProfileError> {
        if let Err(e) = self.backend.save(settings).await {
            warn!("Failed to persist settings: {}", e);
            return Err(e);
        }
        Ok(())
    }
}
