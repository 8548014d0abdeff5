use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FlagStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid flag file: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed presence flags for local UI state.
pub trait FlagStore: Send {
    fn contains(&self, key: &str) -> bool;

    fn set(&mut self, key: &str, present: bool) -> Result<(), FlagStoreError>;

    /// Set many keys at once; stores that persist can write once.
    fn set_many(&mut self, keys: &[String], present: bool) -> Result<(), FlagStoreError> {
        for key in keys {
            self.set(key, present)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    flags: BTreeSet<String>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FlagStore for MemoryFlagStore {
    fn contains(&self, key: &str) -> bool {
        self.flags.contains(key)
    }

    fn set(&mut self, key: &str, present: bool) -> Result<(), FlagStoreError> {
        if present {
            self.flags.insert(key.to_string());
        } else {
            self.flags.remove(key);
        }
        Ok(())
    }
}

/// Flags kept in a JSON array on disk, rewritten on every change.
#[derive(Debug)]
pub struct JsonFlagStore {
    path: PathBuf,
    flags: MemoryFlagStore,
}

impl JsonFlagStore {
    /// Open a flag file; a missing file is an empty set.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FlagStoreError> {
        let path = path.into();
        let flags = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str::<BTreeSet<String>>(&text)?
        } else {
            BTreeSet::new()
        };
        Ok(Self {
            path,
            flags: MemoryFlagStore { flags },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), FlagStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.flags.flags)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl FlagStore for JsonFlagStore {
    fn contains(&self, key: &str) -> bool {
        self.flags.contains(key)
    }

    fn set(&mut self, key: &str, present: bool) -> Result<(), FlagStoreError> {
        if self.flags.contains(key) == present {
            return Ok(());
        }
        self.flags.set(key, present)?;
        self.save()
    }

    fn set_many(&mut self, keys: &[String], present: bool) -> Result<(), FlagStoreError> {
        self.flags.set_many(keys, present)?;
        self.save()
    }
}
