//! Fingerprinted result storage
//!
//! Layout under the results directory:
//! - `<game>/fingerprint.json`: hardware the live groups were measured on
//! - `<game>/<fingerprint>/<resolution>/run_NNN.json`: one file per run
//! - `<game>/archive/<YYYYmmdd_HHMMSS>_<fingerprint>/`: superseded data, same shape
//!
//! The store has no internal synchronization. Callers that may race on one game take
//! [`BenchmarkStorage::try_lock_game`] around check -> archive -> save.

mod aggregate;
mod codec;
mod lock;
mod records;
mod resolution;

pub use aggregate::{aggregate_runs, AggregateRecord};
pub use codec::compress_frametimes;
pub use lock::GameLock;
pub use records::{FingerprintRecord, RunRecord};
pub use resolution::{normalize_resolution, short_label, CANONICAL_RESOLUTIONS};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analysis::{MetricsRecord, RATING_CONTRACT_VERSION};
use crate::error::{BenchResult, BenchmarkError};
use crate::hardware::HardwareInfo;

const FINGERPRINT_FILE: &str = "fingerprint.json";
const ARCHIVE_DIR: &str = "archive";
const LOCK_FILE: &str = ".lock";

/// Runs per resolution, each list ordered by run number.
pub type ResolutionGroups = BTreeMap<String, Vec<RunRecord>>;

/// Contents of one archive location
#[derive(Debug, Clone)]
pub struct ArchivedData {
    pub location: PathBuf,
    pub fingerprint: Option<FingerprintRecord>,
    /// Fingerprint directory name -> resolution groups
    pub groups: BTreeMap<String, ResolutionGroups>,
}

/// Benchmark result store rooted at one results directory
pub struct BenchmarkStorage {
    base_dir: PathBuf,
}

impl BenchmarkStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> BenchResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|err| {
            BenchmarkError::io(format!("creating {}", base_dir.display()), err)
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Fingerprint record last saved for `game`.
    pub fn saved_fingerprint(&self, game: &str) -> BenchResult<Option<FingerprintRecord>> {
        let path = self.game_dir(game)?.join(FINGERPRINT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// True when `fingerprint` matches the saved one, or nothing is saved yet.
    pub fn check_fingerprint(&self, game: &str, fingerprint: &str) -> BenchResult<bool> {
        Ok(self
            .saved_fingerprint(game)?
            .map_or(true, |saved| saved.fingerprint == fingerprint))
    }

    /// Move every live group of `game` (and its fingerprint record) into a new archive.
    ///
    /// Returns the archive location, or `None` when there was nothing to archive.
    pub fn archive_old_data(&self, game: &str) -> BenchResult<Option<PathBuf>> {
        let game_dir = self.game_dir(game)?;
        let group_dirs = live_group_dirs(&game_dir)?;
        if group_dirs.is_empty() {
            return Ok(None);
        }

        let old_fingerprint = self
            .saved_fingerprint(game)?
            .map(|record| record.fingerprint)
            .unwrap_or_else(|| "unknown".to_string());
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let archive_root = game_dir.join(ARCHIVE_DIR);
        let mut location = archive_root.join(format!("{stamp}_{old_fingerprint}"));
        let mut suffix = 2;
        while location.exists() {
            location = archive_root.join(format!("{stamp}_{old_fingerprint}_{suffix}"));
            suffix += 1;
        }
        fs::create_dir_all(&location)
            .map_err(|err| BenchmarkError::io(format!("creating {}", location.display()), err))?;

        for dir in &group_dirs {
            let Some(name) = dir.file_name() else { continue };
            fs::rename(dir, location.join(name)).map_err(|err| {
                BenchmarkError::io(format!("archiving {}", dir.display()), err)
            })?;
        }
        let fingerprint_path = game_dir.join(FINGERPRINT_FILE);
        if fingerprint_path.exists() {
            fs::rename(&fingerprint_path, location.join(FINGERPRINT_FILE)).map_err(|err| {
                BenchmarkError::io(format!("archiving {}", fingerprint_path.display()), err)
            })?;
        }

        info!(
            game,
            groups = group_dirs.len(),
            "Archived benchmark data to {}",
            location.display()
        );
        Ok(Some(location))
    }

    pub fn save_fingerprint(
        &self,
        game: &str,
        fingerprint: &str,
        hardware: &HardwareInfo,
    ) -> BenchResult<()> {
        let game_dir = self.game_dir(game)?;
        fs::create_dir_all(&game_dir)
            .map_err(|err| BenchmarkError::io(format!("creating {}", game_dir.display()), err))?;

        let record = FingerprintRecord {
            fingerprint: fingerprint.to_string(),
            hardware: hardware.normalized(),
            saved_at: Some(Utc::now()),
        };
        write_json_atomic(&game_dir.join(FINGERPRINT_FILE), &record)
    }

    /// Append a run to the group (game, saved fingerprint, normalized resolution).
    pub fn save_run(
        &self,
        game: &str,
        resolution: &str,
        metrics: &MetricsRecord,
        frametimes: Option<&[f64]>,
    ) -> BenchResult<RunRecord> {
        let fingerprint = self
            .saved_fingerprint(game)?
            .ok_or_else(|| BenchmarkError::MissingFingerprint {
                game: game.to_string(),
            })?
            .fingerprint;
        let resolution = normalize_resolution(resolution);
        let group_dir = self
            .game_dir(game)?
            .join(path_component(&fingerprint, "fingerprint")?)
            .join(path_component(&resolution, "resolution")?);
        fs::create_dir_all(&group_dir)
            .map_err(|err| BenchmarkError::io(format!("creating {}", group_dir.display()), err))?;

        let frametimes_compressed = match frametimes {
            Some(frametimes) if !frametimes.is_empty() => Some(
                compress_frametimes(frametimes)
                    .map_err(|err| BenchmarkError::io("compressing frametimes", err))?,
            ),
            _ => None,
        };

        let run_number = next_run_number(&group_dir)?;
        let record = RunRecord {
            run_number,
            timestamp: Utc::now(),
            metrics: metrics.clone(),
            rating_contract: RATING_CONTRACT_VERSION,
            frametimes_compressed,
            frametimes: Vec::new(),
        };
        write_json_atomic(&group_dir.join(run_file_name(run_number)), &record)?;

        debug!(game, resolution = %resolution, run_number, "Saved run");
        Ok(record)
    }

    /// Live groups of `game` under its saved fingerprint.
    pub fn get_all_resolutions(&self, game: &str) -> BenchResult<ResolutionGroups> {
        let Some(saved) = self.saved_fingerprint(game)? else {
            return Ok(BTreeMap::new());
        };
        let fingerprint_dir = self
            .game_dir(game)?
            .join(path_component(&saved.fingerprint, "fingerprint")?);
        load_resolution_groups(&fingerprint_dir)
    }

    pub fn aggregate_runs(runs: &[RunRecord]) -> Option<AggregateRecord> {
        aggregate_runs(runs)
    }

    /// Games with any stored data, sorted.
    pub fn get_all_games(&self) -> BenchResult<Vec<String>> {
        let mut games: Vec<String> = subdirectories(&self.base_dir)?
            .into_iter()
            .filter_map(|dir| dir.file_name()?.to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        games.sort();
        Ok(games)
    }

    /// Archive locations of `game`, oldest first.
    pub fn list_archives(&self, game: &str) -> BenchResult<Vec<PathBuf>> {
        let archive_root = self.game_dir(game)?.join(ARCHIVE_DIR);
        let mut archives = subdirectories(&archive_root)?;
        archives.sort();
        Ok(archives)
    }

    pub fn load_archive(&self, location: &Path) -> BenchResult<ArchivedData> {
        let fingerprint_path = location.join(FINGERPRINT_FILE);
        let fingerprint = if fingerprint_path.exists() {
            Some(read_json(&fingerprint_path)?)
        } else {
            None
        };

        let mut groups = BTreeMap::new();
        for dir in subdirectories(location)? {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let resolutions = load_resolution_groups(&dir)?;
            if !resolutions.is_empty() {
                groups.insert(name.to_string(), resolutions);
            }
        }

        Ok(ArchivedData {
            location: location.to_path_buf(),
            fingerprint,
            groups,
        })
    }

    /// Per-game writer lock; `Ok(None)` while another process holds it.
    pub fn try_lock_game(&self, game: &str) -> BenchResult<Option<GameLock>> {
        let game_dir = self.game_dir(game)?;
        fs::create_dir_all(&game_dir)
            .map_err(|err| BenchmarkError::io(format!("creating {}", game_dir.display()), err))?;
        let lock_path = game_dir.join(LOCK_FILE);
        GameLock::try_acquire(&lock_path).map_err(|err| {
            BenchmarkError::io(format!("acquiring lock {}", lock_path.display()), err)
        })
    }

    fn game_dir(&self, game: &str) -> BenchResult<PathBuf> {
        Ok(self.base_dir.join(path_component(game.trim(), "game id")?))
    }
}

/// Reject identifiers that would escape their directory.
fn path_component<'a>(value: &'a str, what: &str) -> BenchResult<&'a str> {
    let invalid = value.is_empty()
        || value == "."
        || value.contains("..")
        || value.contains(['/', '\\', '\0']);
    if invalid {
        return Err(BenchmarkError::io(
            format!("invalid {what} '{value}'"),
            io::Error::new(ErrorKind::InvalidInput, "not usable as a directory name"),
        ));
    }
    Ok(value)
}

fn run_file_name(run_number: u32) -> String {
    format!("run_{run_number:03}.json")
}

fn run_number_from_file_name(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("run_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn next_run_number(group_dir: &Path) -> BenchResult<u32> {
    let highest = run_files(group_dir)?
        .iter()
        .filter_map(|path| run_number_from_file_name(path))
        .max()
        .unwrap_or(0);
    Ok(highest + 1)
}

fn run_files(group_dir: &Path) -> BenchResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(group_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(BenchmarkError::io(
                format!("listing {}", group_dir.display()),
                err,
            ))
        }
    };
    Ok(entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && run_number_from_file_name(path).is_some())
        .collect())
}

fn load_resolution_groups(fingerprint_dir: &Path) -> BenchResult<ResolutionGroups> {
    let mut groups = BTreeMap::new();
    for resolution_dir in subdirectories(fingerprint_dir)? {
        let Some(resolution) = resolution_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let mut runs = run_files(&resolution_dir)?
            .iter()
            .map(|path| read_json::<RunRecord>(path))
            .collect::<BenchResult<Vec<_>>>()?;
        if runs.is_empty() {
            continue;
        }
        runs.sort_by_key(|run| run.run_number);
        groups.insert(resolution.to_string(), runs);
    }
    Ok(groups)
}

/// Non-empty fingerprint directories of a game (everything but the archive).
fn live_group_dirs(game_dir: &Path) -> BenchResult<Vec<PathBuf>> {
    Ok(subdirectories(game_dir)?
        .into_iter()
        .filter(|dir| dir.file_name().is_some_and(|name| name != ARCHIVE_DIR))
        .filter(|dir| {
            fs::read_dir(dir)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false)
        })
        .collect())
}

fn subdirectories(dir: &Path) -> BenchResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(BenchmarkError::io(format!("listing {}", dir.display()), err)),
    };
    Ok(entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> BenchResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|err| BenchmarkError::io(format!("reading {}", path.display()), err))?;
    serde_json::from_str(&content).map_err(|source| BenchmarkError::StorageFormat {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to a sibling temp file, then rename over the target.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> BenchResult<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| BenchmarkError::StorageFormat {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("record.json");
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let write = || -> io::Result<()> {
        let mut file = open_private_file_overwrite(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    };
    write().map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        BenchmarkError::io(format!("writing {}", path.display()), err)
    })
}

pub(crate) fn open_private_file_new(path: &Path) -> io::Result<fs::File> {
    open_private_file(path, true, false)
}

fn open_private_file_overwrite(path: &Path) -> io::Result<fs::File> {
    open_private_file(path, false, true)
}

fn open_private_file(path: &Path, create_new: bool, truncate: bool) -> io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true);
    }
    if truncate {
        options.truncate(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}
