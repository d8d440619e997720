//! # File I/O Module
//!
//! Memorial file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent concurrent edits on shared drives
//! - **Version validation**: Refuse files written by a newer schema
//!
//! ## File Format
//!
//! Memorials are saved as `.mdt` files containing JSON. Lock files use the
//! `.mdt.lock` extension with metadata about who holds the lock. Dimensioning
//! policies can be kept in standalone JSON files and loaded with
//! [`load_policy`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use memorial_core::file_io::{save_memorial, load_memorial, FileLock};
//! use memorial_core::memorial::Memorial;
//! use std::path::Path;
//!
//! let memorial = Memorial::new("Projeto Campo Forte");
//! let path = Path::new("projeto.mdt");
//!
//! let lock = FileLock::acquire(path, "engenharia@campoforte.com.br").unwrap();
//! save_memorial(&memorial, path).unwrap();
//! drop(lock);
//!
//! let loaded = load_memorial(path).unwrap();
//! assert_eq!(loaded.meta.title, "Projeto Campo Forte");
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::memorial::{Memorial, SCHEMA_VERSION};
use crate::policy::DimensioningPolicy;

/// Extension of memorial files
pub const MEMORIAL_EXTENSION: &str = "mdt";

/// Lock file metadata stored in .mdt.lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Combines an OS-level lock (fs2) with a `.lock` file whose metadata tells
/// other users who is editing.
pub struct FileLock {
    memorial_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a memorial file.
    ///
    /// Fails with `CalcError::FileLocked` while another live process holds it.
    /// Stale locks (dead process, or older than 24 h) are taken over.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(CalcError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                tracing::warn!(
                    path = %path.display(),
                    holder = %existing.user_id,
                    "taking over stale lock"
                );
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;
        lock_file
            .sync_all()
            .map_err(|e| CalcError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "lock acquired");

        Ok(FileLock {
            memorial_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        read_lock_info(&lock_path)
            .ok()
            .filter(|info| !is_lock_stale(info))
    }

    pub fn memorial_path(&self) -> &Path {
        &self.memorial_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // OS lock goes with _lock_file
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(memorial_path: &Path) -> PathBuf {
    let mut lock_path = memorial_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_to_string(path: &Path, operation: &str) -> CalcResult<String> {
    let mut file = File::open(path)
        .map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    Ok(serde_json::from_str(&contents)?)
}

/// A lock is stale when its process is gone (same machine) or it is older than 24 hours.
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    (Utc::now() - info.locked_at).num_hours() > 24
}

/// Save a memorial with atomic write semantics.
///
/// Serializes to `<path>.tmp`, syncs it to disk and renames it over `path`.
pub fn save_memorial(memorial: &Memorial, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(memorial)?;
    let tmp_path = path.with_extension(format!("{}.tmp", MEMORIAL_EXTENSION));

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .sync_all()
        .map_err(|e| CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::info!(path = %path.display(), pages = memorial.pages.len(), "memorial saved");
    Ok(())
}

/// Write a new memorial file.
///
/// Takes the file lock first, so a memorial another user holds open is never
/// replaced.
///
/// # Arguments
///
/// * `memorial` - Document to write
/// * `path` - Target `.mdt` path
/// * `overwrite` - Replace an existing file instead of refusing
/// * `user_id` - Recorded in the lock file while writing
///
/// # Returns
///
/// * `Ok(())` - File written atomically
/// * `Err(CalcError::FileLocked)` - Another live process holds the lock
/// * `Err(CalcError::FileError)` - The file exists and `overwrite` is false
pub fn create_memorial(
    memorial: &Memorial,
    path: &Path,
    overwrite: bool,
    user_id: impl Into<String>,
) -> CalcResult<()> {
    let _lock = FileLock::acquire(path, user_id)?;
    if path.exists() && !overwrite {
        return Err(CalcError::file_error(
            "create",
            path.display().to_string(),
            "File already exists",
        ));
    }
    save_memorial(memorial, path)
}

/// Load a memorial, validating its schema version and policy.
pub fn load_memorial(path: &Path) -> CalcResult<Memorial> {
    let contents = read_to_string(path, "read")?;

    let memorial: Memorial = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&memorial.meta.version)?;
    memorial.settings.policy.validate()?;

    tracing::info!(path = %path.display(), title = %memorial.meta.title, "memorial loaded");
    Ok(memorial)
}

/// Load a memorial and report whether another user holds its lock.
pub fn load_memorial_with_lock_check(path: &Path) -> CalcResult<(Memorial, Option<LockInfo>)> {
    let memorial = load_memorial(path)?;
    let lock_info = FileLock::check(path);
    Ok((memorial, lock_info))
}

/// Load a dimensioning policy from JSON. Missing fields take their defaults.
pub fn load_policy(path: &Path) -> CalcResult<DimensioningPolicy> {
    let contents = read_to_string(path, "read policy")?;
    let policy: DimensioningPolicy = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid policy in {}: {}", path.display(), e),
    })?;
    policy.validate()?;
    Ok(policy)
}

/// Major versions must match; in 0.x a newer minor is refused.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memorial::{BlockKind, ComparisonData};
    use std::env::temp_dir;

    fn temp_memorial_path(name: &str) -> PathBuf {
        temp_dir().join(format!("memorial_test_{}_{}.mdt", name, std::process::id()))
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/obras/projeto.mdt"));
        assert_eq!(lock_path, Path::new("/obras/projeto.mdt.lock"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("eng@example.com");
        assert_eq!(info.user_id, "eng@example.com");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_memorial_path("roundtrip");

        let mut memorial = Memorial::new("Projeto Teste");
        memorial
            .add_block(BlockKind::Comparison(ComparisonData::projecting(12.5)), None)
            .unwrap();
        save_memorial(&memorial, &path).unwrap();

        let loaded = load_memorial(&path).unwrap();
        assert_eq!(loaded.meta.title, "Projeto Teste");
        assert_eq!(loaded.pages, memorial.pages);
        assert_eq!(loaded.summary(), memorial.summary());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_memorial_path("atomic");
        let tmp_path = path.with_extension("mdt.tmp");

        save_memorial(&Memorial::new("T"), &path).unwrap();
        assert!(!tmp_path.exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let path = temp_memorial_path("invalid");
        fs::write(&path, "{ not json").unwrap();
        let err = load_memorial(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_memorial(Path::new("/nonexistent/dir/x.mdt")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let path = temp_memorial_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "eng@example.com").unwrap();
        assert_eq!(lock.info.user_id, "eng@example.com");
        assert_eq!(lock.memorial_path(), path.as_path());

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let path = temp_memorial_path("create_existing");
        create_memorial(&Memorial::new("Original"), &path, false, "eng@example.com").unwrap();

        let err = create_memorial(&Memorial::new("Novo"), &path, false, "eng@example.com").unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert_eq!(load_memorial(&path).unwrap().meta.title, "Original");

        create_memorial(&Memorial::new("Novo"), &path, true, "eng@example.com").unwrap();
        assert_eq!(load_memorial(&path).unwrap().meta.title, "Novo");
        assert!(!lock_path_for(&path).exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_create_respects_held_lock() {
        let path = temp_memorial_path("create_locked");
        save_memorial(&Memorial::new("Em edição"), &path).unwrap();

        let held = FileLock::acquire(&path, "other@example.com").unwrap();
        let err = create_memorial(&Memorial::new("Novo"), &path, true, "eng@example.com").unwrap_err();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        drop(held);

        assert_eq!(load_memorial(&path).unwrap().meta.title, "Em edição");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_memorial_path("lock_check");
        save_memorial(&Memorial::new("T"), &path).unwrap();

        let (loaded, lock_info) = load_memorial_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.title, "T");
        assert!(lock_info.is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_policy_partial_and_invalid() {
        let path = temp_dir().join(format!("memorial_policy_{}.json", std::process::id()));

        fs::write(&path, r#"{ "cable_ampacity_margin": 1.25 }"#).unwrap();
        let policy = load_policy(&path).unwrap();
        assert_eq!(policy.cable_ampacity_margin, 1.25);
        assert_eq!(policy.main_breaker_margin, 1.25);

        fs::write(&path, r#"{ "contactor_margin": -1.0 }"#).unwrap();
        assert_eq!(load_policy(&path).unwrap_err().error_code(), "INVALID_INPUT");

        let _ = fs::remove_file(&path);
    }
}
