use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Credential file name in the data directory
const CREDENTIAL_FILE: &str = "credential.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Credential storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Stored credential is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Credential storage unavailable: {0}")]
    Unavailable(String),
}

/// Bearer token plus the id of the employee it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub user_id: String,
    pub saved_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            saved_at: Utc::now(),
        }
    }
}

/// On-disk shape. Fields are optional so a half-written or hand-edited file
/// reads as "no credential" rather than an error.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredential {
    token: Option<String>,
    user_id: Option<String>,
    saved_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    fn into_credential(self) -> Option<Credential> {
        match (self.token, self.user_id) {
            (Some(token), Some(user_id)) if !token.is_empty() && !user_id.is_empty() => {
                Some(Credential {
                    token,
                    user_id,
                    saved_at: self.saved_at.unwrap_or_else(Utc::now),
                })
            }
            _ => None,
        }
    }
}

impl From<&Credential> for StoredCredential {
    fn from(c: &Credential) -> Self {
        Self {
            token: Some(c.token.clone()),
            user_id: Some(c.user_id.clone()),
            saved_at: Some(c.saved_at),
        }
    }
}

/// Persistence for the session credential.
///
/// `save` replaces both values or neither. `load` returns `Ok(None)` when
/// nothing usable is stored. `clear` is idempotent.
pub trait CredentialStore: Send + Sync {
    fn save(&self, credential: &Credential) -> Result<(), StorageError>;
    fn load(&self) -> Result<Option<Credential>, StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Credential persisted as JSON in the application data directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn credential_path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE)
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{}.tmp", CREDENTIAL_FILE))
    }

    pub fn path(&self) -> PathBuf {
        self.credential_path()
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, credential: &Credential) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(&StoredCredential::from(credential))?;

        // Write aside then rename so readers never see a partial pair
        let tmp = self.temp_path();
        if let Err(e) = std::fs::write(&tmp, contents)
            .and_then(|_| std::fs::rename(&tmp, self.credential_path()))
        {
            let _ = remove_if_exists(&tmp);
            return Err(e.into());
        }
        debug!(path = %self.credential_path().display(), "Credential saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>, StorageError> {
        let path = self.credential_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredCredential = serde_json::from_str(&contents)?;
        let credential = stored.into_credential();
        if credential.is_none() {
            warn!(path = %path.display(), "Ignoring partial credential");
        }
        Ok(credential)
    }

    fn clear(&self) -> Result<(), StorageError> {
        remove_if_exists(&self.credential_path())?;
        remove_if_exists(&self.temp_path())?;
        debug!("Credential cleared");
        Ok(())
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Credential>>, StorageError> {
        self.slot
            .lock()
            .map_err(|_| StorageError::Unavailable("credential slot poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credential: &Credential) -> Result<(), StorageError> {
        *self.lock()? = Some(credential.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.lock()? = None;
        Ok(())
    }
}
