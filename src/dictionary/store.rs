//! Shared dictionary handle with a single exclusive writer.
//!
//! Readers take cheap `Arc` snapshots. A writer works on a private draft and
//! [`DictionaryWriter::commit`] runs the whole critical section:
//!
//! 1. Re-read the on-disk version; abort if it moved since the writer began.
//! 2. Back up the current file (byte-for-byte) into the backup directory.
//! 3. Write the new file to a temp path and rename it over the old one.
//! 4. Publish the new snapshot to readers.
//!
//! A failure at any step leaves the on-disk dictionary and the published
//! snapshot untouched.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use chrono::Utc;
use log::{debug, info, warn};

use super::model::{Dictionary, DictionaryEntry, TermRecord};
use super::DictionaryError;

/// Upper bound on `-n` suffixes tried when a backup name is already taken.
const MAX_BACKUP_SUFFIX: u32 = 100;

// ---------------------------------------------------------------------------
// CommitOutcome
// ---------------------------------------------------------------------------

/// What a successful commit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub previous_version: u32,
    pub version: u32,
    /// Backup of the pre-commit file.
    pub backup_path: PathBuf,
    pub entry_count: usize,
}

// ---------------------------------------------------------------------------
// DictionaryStore
// ---------------------------------------------------------------------------

/// Process-wide dictionary handle.
#[derive(Debug)]
pub struct DictionaryStore {
    path: PathBuf,
    backup_dir: PathBuf,
    current: RwLock<Arc<Dictionary>>,
    writer: Mutex<()>,
}

impl DictionaryStore {
    /// Open the dictionary at `path`.
    ///
    /// A missing file yields an empty dictionary at version 0; the file is
    /// created by the first commit. A file that is not UTF-8, or whose
    /// entries fail validation, is refused rather than repaired.
    pub fn open(
        path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
    ) -> Result<Self, DictionaryError> {
        let path = path.into();
        let dictionary = if path.exists() {
            let bytes = fs::read(&path).map_err(io_error(&path))?;
            let text = String::from_utf8(bytes).map_err(|e| DictionaryError::Encoding {
                path: path.clone(),
                source: e.utf8_error(),
            })?;
            let dictionary = Dictionary::from_json_str(&text)?;
            info!(
                "Loaded dictionary v{} ({} entries) from {}",
                dictionary.version(),
                dictionary.entry_count(),
                path.display()
            );
            dictionary
        } else {
            info!("No dictionary at {}; starting empty", path.display());
            Dictionary::new()
        };

        Ok(Self::with_dictionary(path, backup_dir, dictionary))
    }

    /// Wrap an already-built dictionary (nothing is read from disk).
    pub fn with_dictionary(
        path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        dictionary: Dictionary,
    ) -> Self {
        Self {
            path: path.into(),
            backup_dir: backup_dir.into(),
            current: RwLock::new(Arc::new(dictionary)),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// The currently published dictionary. Later commits never mutate it.
    pub fn snapshot(&self) -> Arc<Dictionary> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn version(&self) -> u32 {
        self.snapshot().version()
    }

    /// Enter the exclusive write scope.
    ///
    /// # Errors
    ///
    /// [`DictionaryError::WriteConflict`] when another writer is active.
    pub fn begin_write(&self) -> Result<DictionaryWriter<'_>, DictionaryError> {
        let guard = match self.writer.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                warn!("Dictionary write rejected: another writer is active");
                return Err(DictionaryError::WriteConflict(
                    "another writer is already active".into(),
                ));
            }
            // A writer that panicked never published anything; the lock is
            // still usable.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let base = self.snapshot();
        let draft = (*base).clone();
        debug!("Dictionary writer opened at v{}", base.version());
        Ok(DictionaryWriter {
            store: self,
            _guard: guard,
            base,
            draft,
        })
    }

    /// Manual edit (last write wins), committed immediately with backup.
    pub fn upsert_manual(&self, entry: DictionaryEntry) -> Result<CommitOutcome, DictionaryError> {
        let mut writer = self.begin_write()?;
        let previous: Option<TermRecord> = writer.draft_mut().upsert(entry.clone())?;
        if let Some(previous) = previous {
            info!(
                "Manual edit {} {:?}: {:?} → {:?}",
                entry.category, entry.incorrect, previous.correct, entry.correct
            );
        }
        writer.commit()
    }

    /// Backup files for this dictionary, oldest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, DictionaryError> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}.v", self.file_stem());
        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)
            .map_err(io_error(&self.backup_dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
            })
            .collect();
        backups.sort_by_key(|p| fs::metadata(p).and_then(|m| m.modified()).ok());
        Ok(backups)
    }

    fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dictionary")
            .to_string()
    }

    fn publish(&self, dictionary: Dictionary) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(dictionary);
    }
}

// ---------------------------------------------------------------------------
// DictionaryWriter
// ---------------------------------------------------------------------------

/// Exclusive write scope. Dropping it without committing discards the draft.
pub struct DictionaryWriter<'a> {
    store: &'a DictionaryStore,
    _guard: MutexGuard<'a, ()>,
    base: Arc<Dictionary>,
    draft: Dictionary,
}

impl<'a> DictionaryWriter<'a> {
    /// Snapshot the writer started from.
    pub fn base(&self) -> &Dictionary {
        &self.base
    }

    pub fn draft(&self) -> &Dictionary {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Dictionary {
        &mut self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != *self.base
    }

    /// Back up, persist and publish the draft as version `base + 1`.
    ///
    /// # Errors
    ///
    /// - [`DictionaryError::WriteConflict`] if the file on disk no longer has
    ///   the base version.
    /// - [`DictionaryError::BackupFailed`] if the backup cannot be written;
    ///   the dictionary file is left alone.
    /// - [`DictionaryError::Io`] for failures writing the new file.
    pub fn commit(self) -> Result<CommitOutcome, DictionaryError> {
        let store = self.store;
        let previous_version = self.base.version();

        // 1. Version check against the file.
        let on_disk = if store.path.exists() {
            Some(fs::read(&store.path).map_err(io_error(&store.path))?)
        } else {
            None
        };
        let disk_version = match &on_disk {
            Some(bytes) => Dictionary::version_of_json(bytes)?,
            None => 0,
        };
        if disk_version != previous_version {
            warn!(
                "Dictionary changed on disk (v{} → v{}); commit aborted",
                previous_version, disk_version
            );
            return Err(DictionaryError::WriteConflict(format!(
                "{} is at v{disk_version}, writer started from v{previous_version}",
                store.path.display()
            )));
        }

        // 2. Backup of the pre-commit state.
        let backup_bytes = match on_disk {
            Some(bytes) => bytes,
            None => self.base.to_json_pretty()?.into_bytes(),
        };
        let backup_path = write_backup(store, previous_version, &backup_bytes)?;

        // 3. Atomic replace.
        let mut next = self.draft;
        let version = previous_version + 1;
        next.set_version(version, Utc::now());
        let json = next.to_json_pretty()?;
        replace_file(&store.path, json.as_bytes())?;

        // 4. Publish.
        let entry_count = next.entry_count();
        store.publish(next);
        info!(
            "Dictionary committed v{} → v{} ({} entries, backup {})",
            previous_version,
            version,
            entry_count,
            backup_path.display()
        );

        Ok(CommitOutcome {
            previous_version,
            version,
            backup_path,
            entry_count,
        })
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DictionaryError + '_ {
    move |source| DictionaryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `bytes` to `{stem}.v{version}.{timestamp}.json`, never overwriting
/// an existing backup.
fn write_backup(
    store: &DictionaryStore,
    version: u32,
    bytes: &[u8],
) -> Result<PathBuf, DictionaryError> {
    let backup_failed = |path: &Path, source| DictionaryError::BackupFailed {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(&store.backup_dir).map_err(|e| backup_failed(&store.backup_dir, e))?;

    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
    let stem = format!("{}.v{}.{}", store.file_stem(), version, stamp);

    for n in 0..=MAX_BACKUP_SUFFIX {
        let name = if n == 0 {
            format!("{stem}.json")
        } else {
            format!("{stem}-{n}.json")
        };
        let path = store.backup_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)
                    .and_then(|_| file.sync_all())
                    .map_err(|e| backup_failed(&path, e))?;
                debug!("Dictionary backup written to {}", path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(backup_failed(&path, e)),
        }
    }

    let path = store.backup_dir.join(format!("{stem}.json"));
    Err(backup_failed(
        &path,
        std::io::Error::new(ErrorKind::AlreadyExists, "no free backup name"),
    ))
}

/// Write to a sibling temp file, then rename over `path`.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), DictionaryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    {
        let mut file = fs::File::create(&tmp).map_err(io_error(&tmp))?;
        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .map_err(io_error(&tmp))?;
    }
    fs::rename(&tmp, path).map_err(io_error(path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
