use std::env;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

/// Environment variable that overrides the cache root.
pub const CACHE_ENV_VAR: &str = "ASCLEPIUS_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Asset not found: {0}")]
    AssetMissing(String),
    #[error("Error copying asset '{name}': {source}")]
    Copy {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Hash mismatch for '{name}': expected {expected}, got {actual}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

/// A read-only store of artifacts bundled with the application.
pub trait AssetStore {
    /// Opens the named asset for reading.
    ///
    /// Returns an error of kind `NotFound` when the asset does not exist.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>>;
}

/// Serves assets from a bundle directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for DirAssetStore {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        if !is_plain_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid asset name '{}'", name),
            ));
        }
        let file = File::open(self.root.join(name))?;
        Ok(Box::new(file))
    }
}

/// Asset names are logical names, never paths.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

/// Local cache holding one regular file per artifact name.
#[derive(Debug, Clone)]
pub struct ModelCache {
    cache_root: PathBuf,
}

impl ModelCache {
    /// Creates a new ModelCache in the default cache directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_cache_dir())
    }

    /// Returns the default cache directory path
    pub fn default_cache_dir() -> PathBuf {
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path);
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("asclepius");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("asclepius");
        }

        env::temp_dir().join("asclepius")
    }

    pub fn new<P: AsRef<Path>>(cache_root: P) -> io::Result<Self> {
        let cache_root = cache_root.as_ref().to_path_buf();
        fs::create_dir_all(&cache_root)?;
        Ok(Self { cache_root })
    }

    pub fn root(&self) -> &Path {
        &self.cache_root
    }

    pub fn cached_path(&self, name: &str) -> PathBuf {
        self.cache_root.join(name)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        let path = self.cached_path(name);
        log::debug!("Checking cache for '{}': {:?} (exists: {})", name, path, path.is_file());
        path.is_file()
    }

    /// Makes sure `name` is present in the cache and returns its path.
    ///
    /// The asset is copied only when the cached file is missing, or when
    /// `expected_sha256` is given and the cached file does not match it.
    pub fn ensure_cached(
        &self,
        assets: &dyn AssetStore,
        name: &str,
        expected_sha256: Option<&str>,
    ) -> Result<PathBuf, CacheError> {
        let path = self.cached_path(name);

        if path.is_file() {
            match expected_sha256 {
                None => {
                    log::debug!("Using cached artifact {:?}", path);
                    return Ok(path);
                }
                Some(expected) => {
                    if Self::verify_file(&path, expected)? {
                        log::debug!("Cached artifact {:?} verified", path);
                        return Ok(path);
                    }
                    log::warn!("Cached artifact {:?} failed verification, copying again", path);
                }
            }
        }

        self.copy_from_assets(assets, name, &path, expected_sha256)?;
        Ok(path)
    }

    /// Streams the asset into a temporary file next to `dest` and renames it
    /// into place once every byte is on disk and the hash, if any, matches.
    /// On any failure nothing is written to `dest`; the temporary file is
    /// removed when it is dropped.
    fn copy_from_assets(
        &self,
        assets: &dyn AssetStore,
        name: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<(), CacheError> {
        log::info!("Copying asset '{}' to {:?}", name, dest);

        let mut source = assets.open(name).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CacheError::AssetMissing(name.to_string())
            } else {
                CacheError::Copy {
                    name: name.to_string(),
                    source: e,
                }
            }
        })?;

        let copy_err = |source: io::Error| CacheError::Copy {
            name: name.to_string(),
            source,
        };

        let mut staging = NamedTempFile::new_in(&self.cache_root).map_err(copy_err)?;
        let bytes = io::copy(&mut source, &mut staging).map_err(copy_err)?;
        staging.as_file().sync_all().map_err(copy_err)?;
        drop(source);

        if let Some(expected) = expected_sha256 {
            let actual = Self::file_sha256(staging.path())?;
            if !actual.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", name, expected, actual);
                return Err(CacheError::HashMismatch {
                    name: name.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        staging.persist(dest).map_err(|e| copy_err(e.error))?;
        log::info!("Copied {} bytes for '{}'", bytes, name);
        Ok(())
    }

    pub fn verify_file(path: &Path, expected_hash: &str) -> Result<bool, CacheError> {
        let hash = Self::file_sha256(path)?;
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    fn file_sha256(path: &Path) -> Result<String, CacheError> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Removes a cached artifact. Missing files are not an error.
    pub fn remove(&self, name: &str) -> Result<(), CacheError> {
        let path = self.cached_path(name);
        if path.exists() {
            log::info!("Removing cached artifact {:?}", path);
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
