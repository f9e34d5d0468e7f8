//! Data file discovery and selection
//!
//! Storey & Hummer primary outputs are named `r{Z}{case}{cutoff}.d.gz`, for
//! example `r1b0050.d.gz`: a single charge digit, the recombination case
//! letter and a 4-digit cutoff code. Discovery re-scans the data directory on
//! every call, so selection can be re-run with different filters.

use crate::constants::{DATA_FILE_SUFFIX, DEFAULT_Z_BOUNDS};
use crate::error::{Result, Sh95Error};
use crate::models::RecombinationCase;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use walkdir::WalkDir;

/// Restrictions applied when selecting data files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFilter {
    pub rec_case: Option<RecombinationCase>,
    /// Inclusive charge range
    pub z_bounds: (u32, u32),
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            rec_case: None,
            z_bounds: DEFAULT_Z_BOUNDS,
        }
    }
}

/// Fields encoded in a data file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFileName {
    pub charge: u32,
    pub case_letter: char,
    pub cutoff_code: u32,
}

impl FromStr for DataFileName {
    type Err = Sh95Error;

    fn from_str(name: &str) -> Result<Self> {
        let reject = |reason: &str| Sh95Error::FileSelection {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if !name.ends_with(DATA_FILE_SUFFIX) {
            return Err(reject("missing .d.gz suffix"));
        }

        let bytes = name.as_bytes();
        if bytes.first() != Some(&b'r') {
            return Err(reject("name does not start with 'r'"));
        }
        let charge = match bytes.get(1) {
            Some(c) if c.is_ascii_digit() => u32::from(c - b'0'),
            _ => return Err(reject("second character is not a charge digit")),
        };
        let case_letter = match bytes.get(2) {
            Some(c) if c.is_ascii_alphabetic() => char::from(*c),
            _ => return Err(reject("third character is not a case letter")),
        };
        let cutoff_code = match bytes.get(3..7) {
            Some(code) if code.iter().all(u8::is_ascii_digit) => code
                .iter()
                .fold(0, |acc, d| acc * 10 + u32::from(d - b'0')),
            _ => return Err(reject("characters 4-7 are not a 4-digit cutoff code")),
        };

        Ok(Self {
            charge,
            case_letter,
            cutoff_code,
        })
    }
}

impl FileFilter {
    /// Check a parsed file name against the case and charge restrictions
    pub fn check(&self, name: &str, parsed: &DataFileName) -> Result<()> {
        if let Some(rec_case) = self.rec_case {
            if !parsed.case_letter.eq_ignore_ascii_case(&rec_case.letter()) {
                return Err(Sh95Error::FileSelection {
                    name: name.to_string(),
                    reason: format!("case '{}' does not match {}", parsed.case_letter, rec_case),
                });
            }
        }

        let (low, high) = self.z_bounds;
        if parsed.charge < low || parsed.charge > high {
            return Err(Sh95Error::FileSelection {
                name: name.to_string(),
                reason: format!("charge {} outside [{}, {}]", parsed.charge, low, high),
            });
        }

        Ok(())
    }
}

/// Strictly validate a data file, raising `FileSelection` on failure
pub fn check_data_file(path: &Path, filter: &FileFilter) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Sh95Error::FileSelection {
            name: path.display().to_string(),
            reason: "path has no UTF-8 file name".to_string(),
        })?;

    if !path.is_file() {
        return Err(Sh95Error::FileSelection {
            name: name.to_string(),
            reason: "file does not exist".to_string(),
        });
    }

    let parsed: DataFileName = name.parse()?;
    filter.check(name, &parsed)
}

/// Whether a file name follows the naming convention and passes the filter
pub fn is_valid_file_name(name: &str, filter: &FileFilter) -> bool {
    name.parse::<DataFileName>()
        .and_then(|parsed| filter.check(name, &parsed))
        .is_ok()
}

/// Whether a path is an existing, selectable data file
pub fn is_valid_data_file(path: &Path, filter: &FileFilter) -> bool {
    check_data_file(path, filter).is_ok()
}

/// Read a gzipped ASCII data file into lines, terminators stripped
pub fn read_gz_lines(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(GzDecoder::new(File::open(path)?));
    let mut lines = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Sh95Error::from(e).at_line(index + 1))?;
        lines.push(line.trim_end_matches('\r').to_string());
    }
    Ok(lines)
}

/// File discovery over one data directory
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    data_dir: PathBuf,
    filter: FileFilter,
}

impl FileDiscovery {
    pub fn new(data_dir: PathBuf, filter: FileFilter) -> Self {
        Self { data_dir, filter }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Same directory, different restrictions
    pub fn with_filter(&self, filter: FileFilter) -> Self {
        Self {
            data_dir: self.data_dir.clone(),
            filter,
        }
    }

    /// Selectable data files directly inside the directory, sorted by name
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.data_dir.is_dir() {
            return Err(Sh95Error::DatasetNotFound {
                path: self.data_dir.clone(),
            });
        }

        debug!("Searching for data files in: {}", self.data_dir.display());

        let mut files = Vec::new();
        let mut skipped = 0;
        for entry in WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if is_valid_data_file(entry.path(), &self.filter) {
                files.push(entry.into_path());
            } else {
                skipped += 1;
            }
        }

        debug!("Found {} data files ({} entries skipped)", files.len(), skipped);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_directory(temp_dir: &TempDir) -> PathBuf {
        let data_dir = temp_dir.path().join("data");
        fs::create_dir_all(data_dir.join("r2b0050.d.gz")).unwrap();
        for name in [
            "r1b0050.d.gz",
            "r1a0050.d.gz",
            "r3b0100.d.gz",
            "readme.txt",
            "r1b0050.d",
            "e1b0050.d.gz",
        ] {
            fs::write(data_dir.join(name), "test data").unwrap();
        }
        data_dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_file_name_selection() {
        let filter = FileFilter::default();
        assert!(is_valid_file_name("r1b0050.d.gz", &filter));
        assert!(!is_valid_file_name("readme.txt", &filter));

        let high_charge = FileFilter {
            z_bounds: (2, 100),
            ..FileFilter::default()
        };
        assert!(!is_valid_file_name("r1b0050.d.gz", &high_charge));
    }

    #[test]
    fn test_malformed_names() {
        let filter = FileFilter::default();
        for name in ["r1b0050.d", "rxb0050.d.gz", "r11b050.d.gz", "r1b00x0.d.gz", "r1b.d.gz", ""] {
            assert!(!is_valid_file_name(name, &filter), "{} accepted", name);
        }
    }

    #[test]
    fn test_case_filter_is_case_insensitive() {
        let case_b = FileFilter {
            rec_case: Some(RecombinationCase::B),
            ..FileFilter::default()
        };
        assert!(is_valid_file_name("r1b0050.d.gz", &case_b));
        assert!(is_valid_file_name("r1B0050.d.gz", &case_b));
        assert!(!is_valid_file_name("r1a0050.d.gz", &case_b));
    }

    #[test]
    fn test_parsed_file_name_fields() {
        let parsed: DataFileName = "r8a1000.d.gz".parse().unwrap();
        assert_eq!(parsed.charge, 8);
        assert_eq!(parsed.case_letter, 'a');
        assert_eq!(parsed.cutoff_code, 1000);
    }

    #[test]
    fn test_check_data_file_requires_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("r1b0050.d.gz");

        let err = check_data_file(&missing, &FileFilter::default()).unwrap_err();
        assert!(matches!(err, Sh95Error::FileSelection { .. }));
        assert!(!is_valid_data_file(&missing, &FileFilter::default()));
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let discovery = FileDiscovery::new(create_test_directory(&temp_dir), FileFilter::default());

        let files = discovery.discover().unwrap();
        assert_eq!(names(&files), vec!["r1a0050.d.gz", "r1b0050.d.gz", "r3b0100.d.gz"]);
    }

    #[test]
    fn test_discover_is_restartable_with_new_filter() {
        let temp_dir = TempDir::new().unwrap();
        let discovery = FileDiscovery::new(create_test_directory(&temp_dir), FileFilter::default());

        assert_eq!(discovery.discover().unwrap().len(), 3);
        assert_eq!(discovery.discover().unwrap().len(), 3);

        let restricted = discovery.with_filter(FileFilter {
            rec_case: Some(RecombinationCase::B),
            z_bounds: (1, 2),
        });
        assert_eq!(names(&restricted.discover().unwrap()), vec!["r1b0050.d.gz"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let discovery = FileDiscovery::new(temp_dir.path().join("absent"), FileFilter::default());

        assert!(matches!(
            discovery.discover(),
            Err(Sh95Error::DatasetNotFound { .. })
        ));
    }

    #[test]
    fn test_read_gz_lines() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("r1b0050.d.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b" TITLE\r\n Z= 1 CASE= B 50\n").unwrap();
        encoder.finish().unwrap();

        let lines = read_gz_lines(&path).unwrap();
        assert_eq!(lines, vec![" TITLE", " Z= 1 CASE= B 50"]);
    }

    #[test]
    fn test_read_gz_lines_reports_bad_line() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("r1b0050.d.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b" TITLE\n Z= 1 \xff\xfe\n").unwrap();
        encoder.finish().unwrap();

        let err = read_gz_lines(&path).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(matches!(err.root_cause(), Sh95Error::Io(_)));
    }
}
