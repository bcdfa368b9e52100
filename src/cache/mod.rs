//! Read-through cache for file contents, parsed JSON and tree walks
//!
//! Checks inspect heavily overlapping sets of files (every manifest check
//! reads `package.json`, every content check samples the same sources), so
//! the runner owns one [`ScanCache`] per scan and hands it to every check.
//!
//! Entries are keyed by path and validated by content hash:
//!
//! ```text
//! read(path)
//!   ├─ entry younger than TTL ─────────────► serve from memory
//!   └─ entry stale or missing ─► read disk ─► xxh3(bytes)
//!                                   ├─ same hash ► refresh timestamp, keep parsed JSON
//!                                   └─ new hash  ► replace entry, drop parsed JSON
//! ```
//!
//! A disabled cache (see [`ScanCache::disabled`]) stores nothing and always
//! hits the disk.

pub mod traits;

pub use traits::CacheLayer;

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

/// Default time an entry is trusted before it is revalidated against disk
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Files larger than this are treated as unreadable for content checks
pub const MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

/// Hard cap on the number of paths a single walk collects
pub const MAX_WALK_FILES: usize = 100_000;

/// Number of leading bytes sniffed for NUL when classifying binary files
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// Directories never descended into: dependency caches, VCS metadata, build output
pub const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    ".next",
    ".nuxt",
    ".cache",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "vendor",
    "bower_components",
    ".turbo",
    ".idea",
    ".vscode",
];

#[derive(Clone)]
struct CachedFile {
    hash: u64,
    /// `None` for binary or oversized files
    content: Option<Arc<String>>,
    checked_at: Instant,
}

#[derive(Clone)]
struct CachedJson {
    hash: u64,
    value: Arc<serde_json::Value>,
}

/// Snapshot of cache occupancy and effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub files: usize,
    pub json_documents: usize,
    pub walks: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Thread-safe, content-hash-validated read-through cache
pub struct ScanCache {
    enabled: bool,
    ttl: Duration,
    contents: DashMap<PathBuf, CachedFile>,
    json: DashMap<PathBuf, CachedJson>,
    walks: DashMap<PathBuf, Arc<Vec<PathBuf>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            enabled: true,
            ttl,
            contents: DashMap::new(),
            json: DashMap::new(),
            walks: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::with_ttl(Duration::ZERO)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Read a text file, serving from memory when the entry is still valid
    pub fn read(&self, path: &Path) -> Option<Arc<String>> {
        self.lookup(path).and_then(|(_, content)| content)
    }

    /// Parse a JSON file, memoized by the hash of the text it was parsed from
    pub fn read_json(&self, path: &Path) -> Option<Arc<serde_json::Value>> {
        let (hash, content) = self.lookup(path)?;
        let content = content?;

        if let Some(cached) = self.json.get(path) {
            if cached.hash == hash {
                return Some(Arc::clone(&cached.value));
            }
        }

        let value = match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(v) => Arc::new(v),
            Err(e) => {
                debug!("Unparsable JSON in {}: {}", path.display(), e);
                return None;
            }
        };
        if self.enabled {
            self.json.insert(
                path.to_path_buf(),
                CachedJson {
                    hash,
                    value: Arc::clone(&value),
                },
            );
        }
        Some(value)
    }

    /// Peek at a cached entry without touching the disk
    pub fn get(&self, path: &Path) -> Option<Arc<String>> {
        self.contents.get(path).and_then(|e| e.content.clone())
    }

    /// Seed the cache with known content for `path`
    pub fn set(&self, path: &Path, content: impl Into<String>) {
        if !self.enabled {
            return;
        }
        let content: String = content.into();
        let hash = xxh3_64(content.as_bytes());
        self.store(path, hash, Some(Arc::new(content)));
    }

    /// Drop every entry for `path`
    pub fn invalidate(&self, path: &Path) {
        self.contents.remove(path);
        self.json.remove(path);
    }

    /// Drop every entry whose content hashed to `hash`
    pub fn invalidate_by_hash(&self, hash: u64) {
        self.contents.retain(|_, entry| entry.hash != hash);
        self.json.retain(|_, entry| entry.hash != hash);
    }

    /// Content hash used for validation
    pub fn content_hash(content: &[u8]) -> u64 {
        xxh3_64(content)
    }

    /// Recursively list every file under `root`, relative to `root`, sorted.
    ///
    /// Noise directories ([`SKIPPED_DIRS`]) and `.gitignore`d paths are skipped.
    /// The result is memoized per root for the lifetime of the cache.
    pub fn walk(&self, root: &Path) -> Arc<Vec<PathBuf>> {
        if self.enabled {
            if let Some(files) = self.walks.get(root) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Arc::clone(&files);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let files = Arc::new(walk_tree(root));
        if self.enabled {
            self.walks.insert(root.to_path_buf(), Arc::clone(&files));
        }
        files
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            files: self.contents.len(),
            json_documents: self.json.len(),
            walks: self.walks.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Returns `(hash, content)` for `path`, revalidating stale entries
    fn lookup(&self, path: &Path) -> Option<(u64, Option<Arc<String>>)> {
        if self.enabled {
            if let Some(entry) = self.contents.get(path) {
                if entry.checked_at.elapsed() < self.ttl {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some((entry.hash, entry.content.clone()));
                }
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let bytes = match read_bounded(path) {
            Some(bytes) => bytes,
            None => {
                self.invalidate(path);
                return None;
            }
        };
        let hash = xxh3_64(&bytes);

        if self.enabled {
            if let Some(mut entry) = self.contents.get_mut(path) {
                if entry.hash == hash {
                    entry.checked_at = Instant::now();
                    return Some((hash, entry.content.clone()));
                }
            }
        }

        let content = decode_text(bytes).map(Arc::new);
        if self.enabled {
            self.store(path, hash, content.clone());
        }
        Some((hash, content))
    }

    fn store(&self, path: &Path, hash: u64, content: Option<Arc<String>>) {
        let previous = self.contents.insert(
            path.to_path_buf(),
            CachedFile {
                hash,
                content,
                checked_at: Instant::now(),
            },
        );
        if previous.is_some_and(|p| p.hash != hash) {
            self.json.remove(path);
        }
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheLayer for ScanCache {
    fn name(&self) -> &str {
        "scan-cache"
    }

    fn is_populated(&self) -> bool {
        !self.contents.is_empty() || !self.walks.is_empty()
    }

    fn invalidate_files(&self, changed_files: &[&Path]) {
        for path in changed_files {
            self.invalidate(path);
        }
        // Any walk may have gained or lost one of these files
        if !changed_files.is_empty() {
            self.walks.clear();
        }
    }

    fn invalidate_all(&self) {
        self.contents.clear();
        self.json.clear();
        self.walks.clear();
    }
}

fn read_bounded(path: &Path) -> Option<Vec<u8>> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    if metadata.len() > MAX_FILE_BYTES {
        debug!("Skipping oversized file {} ({} bytes)", path.display(), metadata.len());
        return None;
    }
    std::fs::read(path).ok()
}

/// Binary files (NUL in the first few KiB) decode to `None`
fn decode_text(bytes: Vec<u8>) -> Option<String> {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if memchr::memchr(0, sniff).is_some() {
        return None;
    }
    match String::from_utf8(bytes) {
        Ok(s) => Some(s),
        Err(e) => Some(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

fn is_skipped_dir(name: &str) -> bool {
    SKIPPED_DIRS.contains(&name)
}

fn walk_tree(root: &Path) -> Vec<PathBuf> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false) // .github, .env and friends matter here
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .parents(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            !(is_dir && entry.depth() > 0 && is_skipped_dir(&entry.file_name().to_string_lossy()))
        });

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Walk error under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if files.len() >= MAX_WALK_FILES {
            warn!(
                "Stopping walk of {} after {} files",
                root.display(),
                MAX_WALK_FILES
            );
            break;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.push(rel);
    }
    files.sort();
    files
}
