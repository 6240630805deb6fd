//! The on-disk modification-time cache backing `up-to-date` (§10.6). Deliberately plain text and
//! dependency-free: the teacher's own stack has no serialization crate, and pulling one in just
//! for a one-line-per-file cache would widen the dependency surface for no real benefit.
//!
//! Format: one line per cached file, tab-separated `path\tmodified_secs\tsize_bytes`. A file is
//! considered unchanged iff both its modification time and size match the cached record exactly.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::Context as _;

/// The directory `up-to-date` reads and writes its cache file in, relative to the working
/// directory it's invoked from.
const CACHE_DIRECTORY: &str = ".ccbranch-cache";

const CACHE_FILE: &str = "up-to-date.cache";

/// One cached file record: the modification time (seconds since the Unix epoch) and size last
/// observed for a given path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Record {
	modified_secs: u64,
	size: u64,
}

/// The loaded cache: a path-keyed map of the records from the last successful `up-to-date` run.
#[derive(Debug, Default)]
pub struct Cache {
	records: HashMap<PathBuf, Record>,
}

impl Cache {
	/// Loads the cache from `.ccbranch-cache/up-to-date.cache` under `directory`. A missing cache
	/// file is not an error -- it simply means every file is reported stale on first run.
	///
	/// # Errors
	/// Returns an error if the cache file exists but cannot be read.
	pub fn load(directory: &Path) -> anyhow::Result<Self> {
		let path = directory.join(CACHE_DIRECTORY).join(CACHE_FILE);
		if !path.exists() {
			return Ok(Self::default());
		}
		let text = std::fs::read_to_string(&path).with_context(|| format!("while reading cache file {}", path.display()))?;
		let mut records = HashMap::new();
		for line in text.lines() {
			let mut fields = line.split('\t');
			let (Some(path), Some(modified_secs), Some(size)) = (fields.next(), fields.next(), fields.next()) else {
				continue;
			};
			let (Ok(modified_secs), Ok(size)) = (modified_secs.parse(), size.parse()) else {
				continue;
			};
			records.insert(PathBuf::from(path), Record { modified_secs, size });
		}
		Ok(Self { records })
	}

	/// Writes the current records back to the cache file under `directory`, creating the cache
	/// directory if needed.
	///
	/// # Errors
	/// Returns an error if the cache directory or file cannot be written.
	pub fn save(&self, directory: &Path) -> anyhow::Result<()> {
		let directory = directory.join(CACHE_DIRECTORY);
		std::fs::create_dir_all(&directory).with_context(|| format!("while creating cache directory {}", directory.display()))?;
		let mut text = String::new();
		for (path, record) in &self.records {
			let _ = writeln!(text, "{}\t{}\t{}", path.display(), record.modified_secs, record.size);
		}
		std::fs::write(directory.join(CACHE_FILE), text).with_context(|| format!("while writing cache file {}", directory.join(CACHE_FILE).display()))
	}

	/// Returns whether `path` is unchanged since the cached record, comparing modification time
	/// and size. A file with no cached record is always stale.
	#[must_use]
	pub fn is_up_to_date(&self, path: &Path) -> bool {
		let Some(current) = current_record(path) else {
			return false;
		};
		self.records.get(path) == Some(&current)
	}

	/// Records `path`'s current modification time and size, for the next run's comparison.
	pub fn record(&mut self, path: &Path) {
		if let Some(current) = current_record(path) {
			self.records.insert(path.to_path_buf(), current);
		}
	}
}

fn current_record(path: &Path) -> Option<Record> {
	let metadata = std::fs::metadata(path).ok()?;
	let modified_secs = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?.as_secs();
	Some(Record { modified_secs, size: metadata.len() })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_with_no_cached_record_is_stale() {
		let directory = std::env::temp_dir().join("ccbranch-cache-test-missing");
		let _ = std::fs::remove_dir_all(&directory);
		std::fs::create_dir_all(&directory).expect("create temp dir");
		let file = directory.join("a.c");
		std::fs::write(&file, "int x;\n").expect("write source file");

		let cache = Cache::load(&directory).expect("missing cache file is not an error");
		assert!(!cache.is_up_to_date(&file));
	}

	#[test]
	fn recorded_file_is_up_to_date_until_its_size_changes() {
		let directory = std::env::temp_dir().join("ccbranch-cache-test-roundtrip");
		let _ = std::fs::remove_dir_all(&directory);
		std::fs::create_dir_all(&directory).expect("create temp dir");
		let file = directory.join("a.c");
		std::fs::write(&file, "int x;\n").expect("write source file");

		let mut cache = Cache::default();
		cache.record(&file);
		assert!(cache.is_up_to_date(&file));

		std::fs::write(&file, "int x;\nint y;\n").expect("rewrite source file with different size");
		assert!(!cache.is_up_to_date(&file));
	}

	#[test]
	fn saved_cache_round_trips_through_load() {
		let directory = std::env::temp_dir().join("ccbranch-cache-test-persist");
		let _ = std::fs::remove_dir_all(&directory);
		std::fs::create_dir_all(&directory).expect("create temp dir");
		let file = directory.join("a.c");
		std::fs::write(&file, "int x;\n").expect("write source file");

		let mut cache = Cache::default();
		cache.record(&file);
		cache.save(&directory).expect("save cache");

		let reloaded = Cache::load(&directory).expect("load saved cache");
		assert!(reloaded.is_up_to_date(&file));
	}
}
