//! Session-scoped storage for the encoded secret password.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::encoding::Credential;

/// Fixed storage key for the cached password. Only one password survives per session.
pub const PASSWORD_KEY: &str = "__KEY__";

const APP_NAME: &str = "whisper";

/// String key/value storage that lives for one session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store, dropped with the process.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: BTreeMap<String, String>,
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON file, so `fetch` and a later `destroy` share a session.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<cache dir>/whisper/session.json`
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(cache_dir()?.join(APP_NAME).join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if values.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)
                    .with_context(|| format!("failed to remove {}", self.path.display()))?;
            }
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        let mut file = private_file(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{content}")
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl SessionStore for FileSession {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.write(&values)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.write(&values)?;
        }
        Ok(())
    }
}

/// Truncate or create `path`, readable only by the owner from the first byte.
fn private_file(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);
    let file = options.open(path)?;

    // mode only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

/// The encoded password cache, one entry under [`PASSWORD_KEY`].
pub struct PasswordCache<S> {
    store: S,
}

impl<S: SessionStore> PasswordCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&mut self, credential: &Credential) -> Result<()> {
        self.store.set(PASSWORD_KEY, credential.encoded())
    }

    pub fn load(&self) -> Result<Option<Credential>> {
        Ok(self
            .store
            .get(PASSWORD_KEY)?
            .filter(|v| !v.is_empty())
            .map(Credential::from_encoded))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(PASSWORD_KEY)
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("WHISPER_CACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(dir) = std::env::var("XDG_CACHE_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".cache"))
}
