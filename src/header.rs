//! Header parsing for data blocks and per-file physical states.
//!
//! Block headers are whitespace-separated `KEY=value` tokens such as
//! `E_NU= 4 Z= 1 CASE= B NE= 1.000E+02 TE= 1.000E+04`. The state header is
//! the second line of each file and carries the charge, recombination case
//! and an optional principal quantum number cutoff.

use crate::constants::{CASE_KEY, CHARGE_KEY, DENSITY_KEY, TEMPERATURE_KEY};
use crate::decoder::decode_int;
use crate::error::{Result, Sh95Error};
use crate::models::{DataKind, RecombinationCase};
use std::collections::BTreeMap;
use tracing::debug;

/// Parsed data block header
#[derive(Debug, Clone, PartialEq)]
pub struct BlockHeader {
    pub density: f64,
    pub temperature: f64,
    pub charge: u32,
    pub rec_case: RecombinationCase,
    pub data_kind: DataKind,
    pub upper_level: u32,
}

/// Parsed per-file state header
#[derive(Debug, Clone, PartialEq)]
pub struct StateHeader {
    pub charge: u32,
    pub rec_case: RecombinationCase,
    pub n_cutoff: Option<u32>,
}

/// Split a header line into key/value pairs
///
/// A token ending in `=` takes the following token as its value, so
/// `Z= 1` and `Z=1` are equivalent. Tokens without `=` become keys with an
/// empty value.
fn tokenize(line: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut tokens = line.split_whitespace().peekable();

    while let Some(token) = tokens.next() {
        match token.split_once('=') {
            Some((key, "")) => {
                let value = match tokens.peek() {
                    Some(next) if !next.contains('=') => tokens.next().unwrap_or_default(),
                    _ => "",
                };
                pairs.push((key.to_string(), value.to_string()));
            }
            Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
            None => pairs.push((token.to_string(), String::new())),
        }
    }

    pairs
}

/// Builder collecting the required keys of a block header
struct BlockHeaderBuilder<'a> {
    line: &'a str,
    fields: BTreeMap<String, String>,
}

impl<'a> BlockHeaderBuilder<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            fields: tokenize(line).into_iter().collect(),
        }
    }

    fn take(&mut self, key: &str) -> Result<String> {
        self.fields
            .remove(key)
            .ok_or_else(|| Sh95Error::header(self.line.trim(), format!("missing {}", key)))
    }

    fn take_float(&mut self, key: &str) -> Result<f64> {
        let raw = self.take(key)?;
        raw.parse::<f64>()
            .map_err(|e| Sh95Error::format(raw.as_str(), format!("invalid {} ({})", key, e)))
    }

    fn build(mut self) -> Result<BlockHeader> {
        let density = self.take_float(DENSITY_KEY)?;
        let temperature = self.take_float(TEMPERATURE_KEY)?;
        let charge = decode_int(&self.take(CHARGE_KEY)?)?;

        let case_raw = self.take(CASE_KEY)?;
        let rec_case = case_raw.parse::<RecombinationCase>().map_err(|_| {
            Sh95Error::header(
                self.line.trim(),
                format!("unknown recombination case '{}'", case_raw),
            )
        })?;

        // Whatever remains identifies the data kind and upper level
        if self.fields.len() != 1 {
            let remaining: Vec<&str> = self.fields.keys().map(String::as_str).collect();
            return Err(Sh95Error::header(
                self.line.trim(),
                format!(
                    "expected exactly one data kind key, found {:?}",
                    remaining
                ),
            ));
        }
        let Some((key, value)) = self.fields.pop_first() else {
            return Err(Sh95Error::header(self.line.trim(), "missing data kind key"));
        };

        let (marker, suffix) = key.split_once('_').unwrap_or((key.as_str(), ""));
        let data_kind = DataKind::from_marker(marker).ok_or_else(|| {
            Sh95Error::header(
                self.line.trim(),
                format!("unknown data kind marker '{}'", marker),
            )
        })?;

        let level_raw = if value.is_empty() { suffix } else { value.as_str() };
        let upper_level = decode_int(level_raw).map_err(|_| {
            Sh95Error::header(
                self.line.trim(),
                format!("invalid upper level '{}' in key '{}'", level_raw, key),
            )
        })?;

        if charge == 0 || upper_level == 0 {
            return Err(Sh95Error::header(
                self.line.trim(),
                "charge and upper level must be at least 1",
            ));
        }

        Ok(BlockHeader {
            density,
            temperature,
            charge,
            rec_case,
            data_kind,
            upper_level,
        })
    }
}

/// Parse the header line opening a data block
pub fn parse_block_header(line: &str) -> Result<BlockHeader> {
    let header = BlockHeaderBuilder::new(line).build()?;
    debug!(
        "Parsed block header: kind={}, n_u={}, z={}, case={}",
        header.data_kind, header.upper_level, header.charge, header.rec_case
    );
    Ok(header)
}

/// Parse the per-file state header
///
/// Token 1 is the charge, token 3 the recombination case and token 4, when
/// present and numeric, the principal quantum number cutoff.
pub fn parse_state_header(line: &str) -> Result<StateHeader> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let charge_raw = tokens
        .get(1)
        .ok_or_else(|| Sh95Error::header(line.trim(), "missing charge"))?;
    let charge = decode_int(charge_raw)?;

    let case_raw = tokens
        .get(3)
        .ok_or_else(|| Sh95Error::header(line.trim(), "missing recombination case"))?;
    let rec_case = case_raw.parse::<RecombinationCase>().map_err(|_| {
        Sh95Error::header(
            line.trim(),
            format!("unknown recombination case '{}'", case_raw),
        )
    })?;

    let n_cutoff = tokens.get(4).and_then(|raw| decode_int(raw).ok());

    Ok(StateHeader {
        charge,
        rec_case,
        n_cutoff,
    })
}
