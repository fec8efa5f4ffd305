use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::{Result, TmsError};

const STAGING_PREFIX: &str = ".tms-export-";
const STAGING_SUFFIX: &str = ".part";
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    released: AtomicUsize,
}

/// Directory exported documents are saved into.
///
/// Bytes are first written to a staging file that only lives as long as its
/// [`StagedDownload`] handle; the handle is released whether the save
/// succeeds or not.
#[derive(Debug, Clone)]
pub struct DownloadArea {
    dir: PathBuf,
    counters: Arc<Counters>,
}

impl DownloadArea {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staging handles currently alive.
    pub fn live_references(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Staging handles released since this area was created.
    pub fn released_references(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Write `bytes` to a fresh staging file.
    pub fn stage(&self, bytes: &[u8]) -> Result<StagedDownload> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;

        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(StagedDownload {
            file: Some(file),
            counters: self.counters.clone(),
        })
    }

    /// Stage `bytes` and save them as `filename`, never overwriting an
    /// existing file.
    pub fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        let staged = self.stage(bytes)?;
        staged.persist(&self.dir, filename)
    }
}

/// A staging file. Dropping it without persisting deletes the file.
#[derive(Debug)]
pub struct StagedDownload {
    file: Option<NamedTempFile>,
    counters: Arc<Counters>,
}

impl StagedDownload {
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    /// Move the staged bytes to `dir/filename`, picking `name (n).ext` if
    /// the name is taken.
    pub fn persist(mut self, dir: &Path, filename: &str) -> Result<PathBuf> {
        let mut file = self.file.take().ok_or_else(|| TmsError::Export {
            reason: "staging file already released".into(),
        })?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let target = dir.join(numbered_name(filename, attempt));
            match file.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    file = e.file;
                }
                Err(e) => {
                    return Err(TmsError::Export {
                        reason: format!("could not save {}: {}", target.display(), e.error),
                    });
                }
            }
        }

        Err(TmsError::Export {
            reason: format!("no free file name for {filename} in {}", dir.display()),
        })
    }
}

impl Drop for StagedDownload {
    fn drop(&mut self) {
        // A file still held here was never persisted; NamedTempFile removes it.
        drop(self.file.take());
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// `report.md`, `report (1).md`, `report (2).md`, ...
fn numbered_name(filename: &str, n: usize) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &filename[..dot], &filename[dot..]),
        _ => format!("{filename} ({n})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_names_keep_extension() {
        assert_eq!(numbered_name("plan.md", 0), "plan.md");
        assert_eq!(numbered_name("plan.md", 2), "plan (2).md");
        assert_eq!(numbered_name("README", 1), "README (1)");
        assert_eq!(numbered_name(".hidden", 1), ".hidden (1)");
    }

    #[test]
    fn dropped_stage_leaves_no_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let area = DownloadArea::new(tmp.path().to_path_buf());

        let staged = area.stage(b"partial").unwrap();
        let path = staged.path().unwrap().to_path_buf();
        assert!(path.exists());
        assert_eq!(area.live_references(), 1);

        drop(staged);
        assert!(!path.exists());
        assert_eq!(area.live_references(), 0);
        assert_eq!(area.released_references(), 1);
    }

    #[test]
    fn save_never_overwrites() {
        let tmp = tempfile::TempDir::new().unwrap();
        let area = DownloadArea::new(tmp.path().to_path_buf());

        let first = area.save(b"one", "plan.md").unwrap();
        let second = area.save(b"two", "plan.md").unwrap();

        assert_eq!(first, tmp.path().join("plan.md"));
        assert_eq!(second, tmp.path().join("plan (1).md"));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }
}
