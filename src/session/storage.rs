// Persisted credential storage
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// The only durable artifact of a session: one `{token}` entry.
pub trait TokenStorage: Send + Sync {
    fn load_token(&self) -> Result<Option<String>>;
    fn save_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenEntry {
    token: String,
}

/// JSON file holding `{"token": "..."}`, used by the CLI.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load_token(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        let entry: TokenEntry = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session file {}", self.path.display()))?;
        let token = entry.token.trim().to_string();
        Ok(if token.is_empty() { None } else { Some(token) })
    }

    fn save_token(&self, token: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        let body = serde_json::to_string(&TokenEntry {
            token: token.to_string(),
        })?;
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Failed to open session file {}", self.path.display()))?;

        // mode() only applies on creation; tighten a file left over from an older run
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(body.as_bytes())
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file {}", self.path.display())),
        }
    }
}
