use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;

use crate::dataset::Dataset;
use crate::error::KimQueryError;

pub const CACHE_FILE: &str = "cache.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Loaded,
    Missing,
    Corrupt,
}

/// Result of reading the cache file. Loading never fails; an unusable
/// file yields an empty dataset and a status that forces a refresh.
#[derive(Debug)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub status: CacheStatus,
    pub error: Option<KimQueryError>,
}

impl LoadOutcome {
    pub fn needs_refresh(&self) -> bool {
        self.status != CacheStatus::Loaded
    }
}

pub struct CacheStore;

impl CacheStore {
    pub fn default_path() -> Result<Utf8PathBuf, KimQueryError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir()
                        .join(".cache")
                        .join("kimquery")
                        .join(CACHE_FILE),
                )
                .ok()
            })
            .ok_or_else(|| {
                KimQueryError::Filesystem("unable to resolve cache directory".to_string())
            })
    }

    pub fn load(path: &Utf8Path) -> LoadOutcome {
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) => {
                let status = if err.kind() == io::ErrorKind::NotFound {
                    CacheStatus::Missing
                } else {
                    CacheStatus::Corrupt
                };
                return Self::unusable(path, status, err.to_string());
            }
        };
        match serde_json::from_str::<Dataset>(&content) {
            Ok(dataset) => LoadOutcome {
                dataset,
                status: CacheStatus::Loaded,
                error: None,
            },
            Err(err) => Self::unusable(path, CacheStatus::Corrupt, err.to_string()),
        }
    }

    fn unusable(path: &Utf8Path, status: CacheStatus, reason: String) -> LoadOutcome {
        LoadOutcome {
            dataset: Dataset::new(),
            status,
            error: Some(KimQueryError::CacheLoad {
                path: path.to_string(),
                reason,
            }),
        }
    }

    /// Writes the dataset as pretty-printed JSON through a temporary file
    /// in the same directory, then renames it over `path`.
    pub fn save(path: &Utf8Path, dataset: &Dataset) -> Result<(), KimQueryError> {
        let content = serde_json::to_vec_pretty(dataset).map_err(|err| persist_error(path, err))?;
        write_atomic(path, &content).map_err(|err| persist_error(path, err))
    }
}

/// Replaces `path` with `content` without leaving a truncated file behind.
pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())?;
    let mut temp = Builder::new()
        .prefix(".kimquery")
        .suffix(".tmp")
        .tempfile_in(parent.as_std_path())?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path.as_std_path()).map_err(|err| err.error)?;
    Ok(())
}

fn persist_error(path: &Utf8Path, err: impl ToString) -> KimQueryError {
    KimQueryError::CachePersist {
        path: path.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_file_forces_refresh() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("absent.json")).unwrap();
        let outcome = CacheStore::load(&path);
        assert_eq!(outcome.status, CacheStatus::Missing);
        assert!(outcome.needs_refresh());
        assert!(outcome.dataset.is_empty());
        assert_matches!(outcome.error, Some(KimQueryError::CacheLoad { .. }));
    }

    #[test]
    fn save_creates_parent_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let path =
            Utf8PathBuf::from_path_buf(temp.path().join("nested").join(CACHE_FILE)).unwrap();
        CacheStore::save(&path, &Dataset::new()).unwrap();
        assert_eq!(fs::read_to_string(path.as_std_path()).unwrap(), "{}");
    }
}
