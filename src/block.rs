//! Data block parsing.
//!
//! A block is a header line followed by fixed-width data lines. Each data
//! line drops its first character and is then read as consecutive 13-char
//! records (`{3-char lower level}{separator}{9-char value}`) until fewer than
//! 13 characters remain.

use crate::constants::{DATA_LINE_OFFSET, LEVEL_WIDTH, RECORD_WIDTH, VALUE_OFFSET};
use crate::decoder::{decode_float, decode_int};
use crate::error::{Result, Sh95Error};
use crate::header::parse_block_header;
use crate::models::DataBlock;
use tracing::debug;

/// Split a data line into its complete fixed-width records
fn records(line: &str) -> Result<impl Iterator<Item = &str>> {
    if !line.is_ascii() {
        return Err(Sh95Error::format(line, "data line contains non-ASCII characters"));
    }

    let body = line.get(DATA_LINE_OFFSET..).unwrap_or("");
    Ok(body
        .as_bytes()
        .chunks_exact(RECORD_WIDTH)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default()))
}

/// Decode every record of one data line into the parallel level/value vectors
fn decode_line(line: &str, levels: &mut Vec<u32>, values: &mut Vec<f64>) -> Result<()> {
    for record in records(line)? {
        levels.push(decode_int(&record[..LEVEL_WIDTH])?);
        values.push(decode_float(&record[VALUE_OFFSET..])?);
    }
    Ok(())
}

/// Parse a block whose header sits at 1-based line `first_line` of its file
pub(crate) fn parse_block_at(lines: &[String], first_line: usize) -> Result<DataBlock> {
    let (header_line, data_lines) = lines
        .split_first()
        .ok_or_else(|| Sh95Error::structural("data block has no header line").at_line(first_line))?;

    let header = parse_block_header(header_line).map_err(|e| e.at_line(first_line))?;

    let mut lower_levels = Vec::new();
    let mut values = Vec::new();
    for (offset, line) in data_lines.iter().enumerate() {
        decode_line(line, &mut lower_levels, &mut values)
            .map_err(|e| e.at_line(first_line + offset + 1))?;
    }

    if lower_levels.len() != values.len() {
        return Err(Sh95Error::structural(format!(
            "{} lower levels but {} values (n_u={})",
            lower_levels.len(),
            values.len(),
            header.upper_level
        ))
        .at_line(first_line));
    }
    if values.is_empty() {
        return Err(Sh95Error::structural(format!(
            "block {}_NU={} holds no values",
            header.data_kind.marker(),
            header.upper_level
        ))
        .at_line(first_line));
    }

    let block = DataBlock {
        density: header.density,
        temperature: header.temperature,
        charge: header.charge,
        upper_level: header.upper_level,
        rec_case: header.rec_case,
        data_kind: header.data_kind,
        lower_levels,
        values,
    };
    debug!("Parsed {}", block);

    Ok(block)
}

impl DataBlock {
    /// Parse a block from its header line and the data lines that follow it
    pub fn from_lines(lines: &[String]) -> Result<DataBlock> {
        parse_block_at(lines, 1)
    }
}
