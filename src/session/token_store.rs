use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, TmsError};

/// Persistent home of the session credential.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token. Blank content counts as absent.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the persisted token.
    fn store(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Removing an absent token is a no-op.
    fn clear(&self) -> Result<()>;
}

/// Token kept in a single file, written atomically with 0600 permissions.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| TmsError::TokenStore {
            reason: format!("read {}: {e}", self.path.display()),
        })?;
        let token = contents.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }

    fn store(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| TmsError::TokenStore {
                reason: format!("mkdir {}: {e}", parent.display()),
            })?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            set_file_permissions_0600(&tmp_path);
            file.write_all(token.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            TmsError::TokenStore {
                reason: format!("write {}: {e}", self.path.display()),
            }
        })
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TmsError::TokenStore {
                reason: format!("delete {}: {e}", self.path.display()),
            }),
        }
    }
}

/// Process-local token storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone().filter(|t| !t.trim().is_empty()))
    }

    fn store(&self, token: &str) -> Result<()> {
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

/// Set file permissions to 0600 (owner read/write only).
#[cfg(unix)]
fn set_file_permissions_0600(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o600);
    let _ = fs::set_permissions(path, perms);
}

#[cfg(not(unix))]
fn set_file_permissions_0600(_path: &Path) {
    // No-op on non-Unix platforms
}
