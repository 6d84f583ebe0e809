use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::OutputFormat;
use crate::models::{Catalog, ProjectProfile};
use crate::tailoring::TailoredCatalog;

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads and writes catalog, profile and snapshot files, guarding each file
/// with an advisory lock file so concurrent edits of one snapshot serialize.
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
    format: OutputFormat,
}

impl Storage {
    /// Creates a new Storage instance; `.json` files are read and written as
    /// JSON, anything else as YAML
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let format = match file_path.extension().and_then(|e| e.to_str()) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Yaml,
        };
        let mut lock_name = file_path.as_os_str().to_owned();
        lock_name.push(".lock");
        Self {
            file_path,
            lock_file_path: PathBuf::from(lock_name),
            format,
        }
    }

    /// Creates a Storage that writes `format`. Every later load picks the
    /// format from the extension, so a format the extension contradicts is
    /// rejected instead of leaving an unreadable file behind.
    pub fn with_format<P: AsRef<Path>>(file_path: P, format: OutputFormat) -> Result<Self> {
        let storage = Self::new(file_path);
        if storage.format != format {
            let extension = match format {
                OutputFormat::Json => ".json",
                OutputFormat::Yaml => ".yaml",
            };
            anyhow::bail!(
                "Cannot write {} to {:?}: the file would be read back as {}; use a {} extension",
                format,
                storage.file_path,
                storage.format,
                extension
            );
        }
        Ok(storage)
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Polls `try_lock` until it succeeds or the timeout expires
    fn wait_for_lock<F>(&self, lock_file: &File, try_lock: F) -> Result<()>
    where
        F: Fn(&File) -> std::io::Result<()>,
    {
        let start = std::time::Instant::now();
        loop {
            match try_lock(lock_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another process may be editing: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Acquire an exclusive lock for writing
    /// Returns the lock file handle which must be held during the operation
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_exclusive(f))?;

        // Lock holder info, for debugging stale locks
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        Ok(lock_file)
    }

    /// Acquire a shared lock for reading, if a lock file exists
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, |f| FileExt::try_lock_shared(f))?;
        Ok(Some(lock_file))
    }

    fn read_unlocked<T: DeserializeOwned>(&self) -> Result<T> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        match self.format {
            OutputFormat::Yaml => serde_yaml::from_reader(reader)
                .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path)),
            OutputFormat::Json => serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse JSON from {:?}", self.file_path)),
        }
    }

    fn write_unlocked<T: Serialize>(&self, value: &T) -> Result<()> {
        let content = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        };
        fs::write(&self.file_path, content)
            .with_context(|| format!("Failed to write file: {:?}", self.file_path))
    }

    /// Loads a value from the file under a shared lock
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        let _lock = self.acquire_read_lock()?;
        self.read_unlocked()
    }

    /// Saves a value to the file under an exclusive lock
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let _lock = self.acquire_write_lock()?;
        self.write_unlocked(value)
        // Lock is released when _lock is dropped
    }

    /// Reloads the file, applies `update_fn` and saves, all under one
    /// exclusive lock. Nothing is written if `update_fn` fails.
    pub fn update_atomically<T, R, F>(&self, update_fn: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let _lock = self.acquire_write_lock()?;

        let mut value: T = self.read_unlocked()?;
        let result = update_fn(&mut value)?;
        self.write_unlocked(&value)?;

        Ok(result)
    }
}

/// Loads a master catalog and rejects structural violations
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let catalog: Catalog = Storage::new(&path).load()?;
    catalog
        .validate()
        .with_context(|| format!("Invalid catalog in {:?}", path.as_ref()))?;
    Ok(catalog)
}

/// Loads a project profile (phases, selection vector, screening tags)
pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<ProjectProfile> {
    Storage::new(path).load()
}

/// Loads a tailored snapshot
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<TailoredCatalog> {
    Storage::new(path).load()
}
