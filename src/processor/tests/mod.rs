//! Integration tests for the processor module
//!
//! Tests the complete ingestion pipeline against gzipped data files written
//! into temporary directories.


use crate::decoder::encode_float;
use flate2::{Compression, write::GzEncoder};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Gzip `lines` into `dir/name`
pub fn write_data_file(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    for line in lines {
        writeln!(encoder, "{}", line).unwrap();
    }
    encoder.finish().unwrap();
    path
}

/// Block header line in the dataset's `KEY= value` style
pub fn block_header(marker: char, n_u: u32, z: u32, case: char, dens: f64, temp: f64) -> String {
    format!(
        " {}_NU= {} Z= {} CASE= {} NE= {} TE= {}",
        marker,
        n_u,
        z,
        case,
        encode_float(dens),
        encode_float(temp)
    )
}

/// Fixed-width data line holding the given (lower level, value) records
pub fn data_line(records: &[(u32, f64)]) -> String {
    let mut line = String::from(" ");
    for (n_l, val) in records {
        line.push_str(&format!("{:>3} {}", n_l, encode_float(*val)));
    }
    line
}

/// A small but complete data file for charge `z` and case `case`
///
/// Emissivity: n_u=3 (n_l 1, 2) and n_u=2 (n_l 1). Recombination: n_u=3
/// (n_l 1). Departure: n_u=2 (n_l 1). No opacity blocks.
pub fn sample_file_lines(z: u32, case: char) -> Vec<String> {
    let case = case.to_ascii_uppercase();
    vec![
        " STOREY & HUMMER HYDROGENIC RECOMBINATION".to_string(),
        format!(" Z= {} CASE= {} 50", z, case),
        block_header('E', 3, z, case, 1e2, 1e4),
        data_line(&[(1, 2.5e-25), (2, 1.5e-25)]),
        block_header('E', 2, z, case, 1e2, 1e4),
        data_line(&[(1, 7.0e-25)]),
        block_header('R', 3, z, case, 1e2, 1e4),
        data_line(&[(1, 3.0e-14)]),
        block_header('B', 2, z, case, 1e2, 1e4),
        data_line(&[(1, 1.05)]),
        " BNS".to_string(),
        " ZZ END OF DATA".to_string(),
    ]
}

/// Data directory holding `r{z}{case}0050.d.gz` for each `(z, case)`
pub fn create_data_dir(root: &Path, files: &[(u32, char)]) -> PathBuf {
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    for &(z, case) in files {
        write_data_file(
            &data_dir,
            &format!("r{}{}0050.d.gz", z, case),
            &sample_file_lines(z, case),
        );
    }
    fs::write(data_dir.join("README"), "not a data file").unwrap();
    data_dir
}
