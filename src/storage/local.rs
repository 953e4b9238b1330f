//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── Sample Clip.mp4            # Stored artifact
//! ├── Sample Clip-3f2a9c1b.mp4   # Same title, disambiguated
//! └── .scratch/                  # In-flight downloads (default location)
//!     └── {uuid}/                # One directory per retrieval
//! ```
//!
//! The directory listing is the only record of which artifacts exist.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs::{File, OpenOptions};

use crate::error::{AppError, Result};
use crate::models::{MediaMetadata, StoredArtifact};
use crate::services::namer::{self, SafeFilename};

/// Reservation attempts before giving up on a free name.
const MAX_RESERVE_ATTEMPTS: usize = 16;

/// An opened artifact ready to stream.
#[derive(Debug)]
pub struct ArtifactHandle {
    pub name: String,
    pub file: File,
    pub size_bytes: u64,
}

/// A stored artifact as seen in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub name: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl LocalStorage {
    /// Open storage rooted at `root_dir`, creating both directories if absent.
    ///
    /// The root is canonicalized so later containment checks compare real
    /// paths.
    pub async fn open(root_dir: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        let scratch_dir = scratch_dir.into();

        tokio::fs::create_dir_all(&root_dir)
            .await
            .map_err(|e| AppError::storage(format!("creating storage root {root_dir:?}"), e))?;
        tokio::fs::create_dir_all(&scratch_dir)
            .await
            .map_err(|e| AppError::storage(format!("creating scratch dir {scratch_dir:?}"), e))?;

        let root_dir = tokio::fs::canonicalize(&root_dir).await?;
        let scratch_dir = tokio::fs::canonicalize(&scratch_dir).await?;

        log::info!("Storage root: {}", root_dir.display());
        Ok(Self {
            root_dir,
            scratch_dir,
        })
    }

    /// Canonical storage root.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Canonical scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Create a private scratch directory for one retrieval.
    pub async fn create_scratch_dir(&self) -> Result<PathBuf> {
        let dir = self.scratch_dir.join(uuid::Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir(&dir)
            .await
            .map_err(|e| AppError::storage("creating scratch directory", e))?;
        Ok(dir)
    }

    /// Remove a scratch directory and whatever is left in it.
    ///
    /// Failures are logged, never returned.
    pub async fn remove_scratch_dir(&self, dir: &Path) {
        if !dir.starts_with(&self.scratch_dir) || dir == self.scratch_dir {
            log::warn!("Refusing to remove {:?}: not a scratch subdirectory", dir);
            return;
        }
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to clean up scratch dir {:?}: {}", dir, e),
        }
    }

    /// Move a downloaded scratch file into the root under a safe, unused name.
    pub async fn persist(&self, scratch_file: &Path, metadata: &MediaMetadata) -> Result<StoredArtifact> {
        let (name, dest) = self.reserve(&namer::resolve_name(metadata)).await?;

        if let Err(e) = move_file(scratch_file, &dest).await {
            if let Err(cleanup) = tokio::fs::remove_file(&dest).await {
                log::warn!("Failed to remove placeholder {:?}: {}", dest, cleanup);
            }
            if let Err(cleanup) = tokio::fs::remove_file(scratch_file).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove scratch file {:?}: {}", scratch_file, cleanup);
                }
            }
            return Err(AppError::storage(format!("moving '{name}' into storage"), e));
        }

        let size_bytes = tokio::fs::metadata(&dest)
            .await
            .map_err(|e| AppError::storage(format!("reading size of '{name}'"), e))?
            .len();

        Ok(StoredArtifact {
            relative_path: name.file_name(),
            size_bytes,
        })
    }

    /// Claim a free name by creating an empty placeholder exclusively.
    async fn reserve(&self, base: &SafeFilename) -> Result<(SafeFilename, PathBuf)> {
        for attempt in 0..MAX_RESERVE_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                base.with_disambiguator(&namer::new_disambiguator())
            };
            let path = self.root_dir.join(candidate.file_name());

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(_) => {
                    if attempt > 0 {
                        log::debug!("'{}' taken, using '{}'", base, candidate);
                    }
                    return Ok((candidate, path));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AppError::storage(format!("reserving '{candidate}'"), e));
                }
            }
        }

        Err(AppError::storage(
            format!("reserving a name for '{base}'"),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("no free name after {MAX_RESERVE_ATTEMPTS} attempts"),
            ),
        ))
    }

    /// Resolve a requested artifact name to a real path inside the root.
    ///
    /// The name is checked before any filesystem access; symlinks are
    /// followed and must still land inside the root.
    pub async fn resolve(&self, requested: &str) -> Result<PathBuf> {
        if !namer::is_safe_reference(requested) {
            return Err(AppError::invalid_reference(requested));
        }

        let candidate = self.root_dir.join(requested);
        let canonical = match tokio::fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(requested));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        if !canonical.starts_with(&self.root_dir) || canonical.starts_with(&self.scratch_dir) {
            log::warn!("Rejected '{}': resolves outside the storage root", requested);
            return Err(AppError::invalid_reference(requested));
        }

        let is_file = tokio::fs::metadata(&canonical)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(AppError::not_found(requested));
        }

        Ok(canonical)
    }

    /// Open a stored artifact for streaming.
    pub async fn open_artifact(&self, requested: &str) -> Result<ArtifactHandle> {
        let path = self.resolve(requested).await?;
        let file = File::open(&path).await?;
        let size_bytes = file.metadata().await?.len();
        Ok(ArtifactHandle {
            name: requested.to_string(),
            file,
            size_bytes,
        })
    }

    /// List stored artifacts, newest first.
    pub async fn list(&self) -> Result<Vec<ArtifactEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(ArtifactEntry {
                name,
                size_bytes: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }
}

/// Rename, falling back to copy+remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
        Err(e) => Err(e),
    }
}
