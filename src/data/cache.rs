use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::{self, LoadError};
use super::model::Table;

// ---------------------------------------------------------------------------
// Cache key: which file, and which version of it
// ---------------------------------------------------------------------------

/// Identifies one parsed version of a source file. A file edited on disk gets
/// a new modification time and therefore a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

// ---------------------------------------------------------------------------
// Seams: where tables come from, and where parsed tables are kept
// ---------------------------------------------------------------------------

/// Something that can produce raw tables for a path.
pub trait TableSource {
    /// Cheap identity of the current content behind `path`.
    fn fingerprint(&self, path: &Path) -> Result<CacheKey, LoadError>;

    /// Parse the content behind `path`.
    fn read(&self, path: &Path) -> Result<Table, LoadError>;
}

/// Storage for parsed tables.
pub trait TableCache {
    fn lookup(&self, key: &CacheKey) -> Option<Arc<Table>>;
    fn store(&mut self, key: CacheKey, table: Arc<Table>);
}

/// Reads tables from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl TableSource for FileSource {
    fn fingerprint(&self, path: &Path) -> Result<CacheKey, LoadError> {
        let meta = std::fs::metadata(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(CacheKey {
            path: path.to_path_buf(),
            modified: meta.modified().ok(),
        })
    }

    fn read(&self, path: &Path) -> Result<Table, LoadError> {
        loader::load_file(path)
    }
}

/// In-memory cache. Only the latest version of each path is kept.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<PathBuf, (CacheKey, Arc<Table>)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl TableCache for MemoryCache {
    fn lookup(&self, key: &CacheKey) -> Option<Arc<Table>> {
        self.entries
            .get(&key.path)
            .filter(|(stored, _)| stored == key)
            .map(|(_, table)| Arc::clone(table))
    }

    fn store(&mut self, key: CacheKey, table: Arc<Table>) {
        self.entries.insert(key.path.clone(), (key, table));
    }
}

// ---------------------------------------------------------------------------
// Cached loader
// ---------------------------------------------------------------------------

/// Result of a load: always a table (empty on failure) plus the error, if any.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: Arc<Table>,
    pub error: Option<Arc<LoadError>>,
}

impl LoadOutcome {
    fn failed(error: LoadError) -> Self {
        LoadOutcome {
            table: Arc::new(Table::empty()),
            error: Some(Arc::new(error)),
        }
    }
}

/// Loads raw tables through a [`TableSource`], memoising them in a
/// [`TableCache`] so repeated loads of an unchanged file parse it only once.
pub struct CachedLoader<S, C> {
    source: S,
    cache: C,
}

impl CachedLoader<FileSource, MemoryCache> {
    /// Filesystem source with an in-memory cache.
    pub fn from_files() -> Self {
        CachedLoader::new(FileSource, MemoryCache::new())
    }
}

impl<S: TableSource, C: TableCache> CachedLoader<S, C> {
    pub fn new(source: S, cache: C) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Load `path`. Never fails: a missing or unreadable file is logged and
    /// reported in the outcome alongside an empty table.
    pub fn load(&mut self, path: &Path) -> LoadOutcome {
        let key = match self.source.fingerprint(path) {
            Ok(key) => key,
            Err(e) => {
                log::error!("{e}");
                return LoadOutcome::failed(e);
            }
        };

        if let Some(table) = self.cache.lookup(&key) {
            log::debug!("cache hit for {}", path.display());
            return LoadOutcome { table, error: None };
        }

        match self.source.read(path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows with columns {:?}",
                    table.len(),
                    table.column_names().collect::<Vec<_>>()
                );
                let table = Arc::new(table);
                self.cache.store(key, Arc::clone(&table));
                LoadOutcome { table, error: None }
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                LoadOutcome::failed(e)
            }
        }
    }
}
