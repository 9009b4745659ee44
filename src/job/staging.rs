//! # Job Staging
//!
//! A prepared raster may be parked somewhere while its job is in flight,
//! for example as a PNG snapshot on disk. Whatever is staged must be gone
//! when the job ends, however it ends.
//!
//! [`StagingGuard`] ties the release to scope: it stages on creation and
//! releases in `Drop`, so an early `?` return or a panic still cleans up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use uuid::Uuid;

use crate::render::MonoRaster;

/// Somewhere to park a raster for the duration of one job.
pub trait Staging {
    /// Stage the raster for the current job.
    fn stage(&mut self, raster: &MonoRaster) -> io::Result<()>;

    /// Drop whatever the current job staged. Called once per staged job.
    fn release(&mut self) -> io::Result<()>;
}

impl<S: Staging + ?Sized> Staging for &mut S {
    fn stage(&mut self, raster: &MonoRaster) -> io::Result<()> {
        (**self).stage(raster)
    }

    fn release(&mut self) -> io::Result<()> {
        (**self).release()
    }
}

/// Stages nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStaging;

impl Staging for NoStaging {
    fn stage(&mut self, _raster: &MonoRaster) -> io::Result<()> {
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes the raster as `hotprint-<uuid>.png` in a directory and deletes it
/// on release.
#[derive(Debug)]
pub struct PngStaging {
    dir: PathBuf,
    current: Option<PathBuf>,
}

impl PngStaging {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    /// Stage under the system temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file staged for the running job, if any.
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

impl Staging for PngStaging {
    fn stage(&mut self, raster: &MonoRaster) -> io::Result<()> {
        let path = self.dir.join(format!("hotprint-{}.png", Uuid::new_v4()));
        // Record first so a half-written file is still released
        self.current = Some(path.clone());
        raster.to_gray_image().save(&path).map_err(io::Error::other)?;
        debug!("Staged raster at {}", path.display());
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        let Some(path) = self.current.take() else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed staged raster {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Releases its staging area when dropped.
pub struct StagingGuard<'a, S: Staging + ?Sized> {
    staging: &'a mut S,
}

impl<'a, S: Staging + ?Sized> StagingGuard<'a, S> {
    /// Stage `raster` and arm the guard.
    ///
    /// If staging fails, whatever was partially staged is released before
    /// the error is returned.
    pub fn arm(staging: &'a mut S, raster: &MonoRaster) -> io::Result<Self> {
        let mut guard = Self { staging };
        guard.staging.stage(raster)?;
        Ok(guard)
    }
}

impl<S: Staging + ?Sized> Drop for StagingGuard<'_, S> {
    fn drop(&mut self) {
        // Best effort: a cleanup failure must not hide the job's own result
        if let Err(e) = self.staging.release() {
            warn!("Failed to release staged raster: {}", e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        staged: usize,
        released: usize,
        fail_stage: bool,
        fail_release: bool,
    }

    impl Staging for Counting {
        fn stage(&mut self, _raster: &MonoRaster) -> io::Result<()> {
            self.staged += 1;
            if self.fail_stage {
                return Err(io::Error::other("disk full"));
            }
            Ok(())
        }

        fn release(&mut self) -> io::Result<()> {
            self.released += 1;
            if self.fail_release {
                return Err(io::Error::other("busy"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_guard_releases_once_on_drop() {
        let mut staging = Counting::default();
        {
            let _guard = StagingGuard::arm(&mut staging, &MonoRaster::blank(8, 1)).unwrap();
        }
        assert_eq!(staging.staged, 1);
        assert_eq!(staging.released, 1);
    }

    #[test]
    fn test_guard_releases_after_failed_stage() {
        let mut staging = Counting {
            fail_stage: true,
            ..Counting::default()
        };
        let result = StagingGuard::arm(&mut staging, &MonoRaster::blank(8, 1));
        assert!(result.is_err());
        drop(result);
        assert_eq!(staging.released, 1);
    }

    #[test]
    fn test_release_failure_is_swallowed() {
        let mut staging = Counting {
            fail_release: true,
            ..Counting::default()
        };
        {
            let _guard = StagingGuard::arm(&mut staging, &MonoRaster::blank(8, 1)).unwrap();
        }
        assert_eq!(staging.released, 1);
    }

    #[test]
    fn test_png_staging_writes_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut staging = PngStaging::new(dir.path());
        let raster = MonoRaster::from_fn(16, 4, |x, _| x < 8);

        staging.stage(&raster).unwrap();
        let path = staging.current().unwrap().to_path_buf();
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));

        let snapshot = image::open(&path).unwrap().to_luma8();
        assert_eq!(snapshot.dimensions(), (16, 4));
        assert_eq!(snapshot.get_pixel(0, 0).0[0], 0);
        assert_eq!(snapshot.get_pixel(15, 0).0[0], 255);

        staging.release().unwrap();
        assert!(!path.exists());
        assert!(staging.current().is_none());
    }

    #[test]
    fn test_png_staging_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut staging = PngStaging::new(dir.path());
        staging.release().unwrap();

        staging.stage(&MonoRaster::blank(8, 1)).unwrap();
        let path = staging.current().unwrap().to_path_buf();
        fs::remove_file(&path).unwrap();
        staging.release().unwrap();
    }

    #[test]
    fn test_png_staging_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut staging = PngStaging::new(dir.path().join("gone"));
        let result = StagingGuard::arm(&mut staging, &MonoRaster::blank(8, 1));
        assert!(result.is_err());
        drop(result);
        assert!(staging.current().is_none());
    }

    #[test]
    fn test_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut staging = PngStaging::new(dir.path());
        staging.stage(&MonoRaster::blank(8, 1)).unwrap();
        let first = staging.current().unwrap().to_path_buf();
        staging.release().unwrap();
        staging.stage(&MonoRaster::blank(8, 1)).unwrap();
        let second = staging.current().unwrap().to_path_buf();
        staging.release().unwrap();
        assert_ne!(first, second);
    }
}
