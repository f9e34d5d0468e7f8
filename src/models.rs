//! Core data structures for recombination data processing.
//!
//! Defines data kinds, recombination cases, parsed data blocks and physical
//! states, the flat row persisted per transition, and processing statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Sh95Error;

/// Physical quantity tabulated by a data block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Emissivity,
    RecombinationCoefficient,
    OpacityFactor,
    DepartureCoefficient,
}

impl DataKind {
    pub const ALL: [DataKind; 4] = [
        DataKind::Emissivity,
        DataKind::RecombinationCoefficient,
        DataKind::OpacityFactor,
        DataKind::DepartureCoefficient,
    ];

    /// Marker character opening a block header of this kind
    pub fn marker(&self) -> char {
        match self {
            DataKind::Emissivity => 'E',
            DataKind::RecombinationCoefficient => 'R',
            DataKind::OpacityFactor => 'A',
            DataKind::DepartureCoefficient => 'B',
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "E" => Some(DataKind::Emissivity),
            "R" => Some(DataKind::RecombinationCoefficient),
            "A" => Some(DataKind::OpacityFactor),
            "B" => Some(DataKind::DepartureCoefficient),
            _ => None,
        }
    }

    /// Name of the persisted table holding this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            DataKind::Emissivity => "emi",
            DataKind::RecombinationCoefficient => "rec",
            DataKind::OpacityFactor => "opa",
            DataKind::DepartureCoefficient => "dep",
        }
    }

    /// Whether rows of this kind carry a transition wavelength
    pub fn has_wavelength(&self) -> bool {
        matches!(self, DataKind::Emissivity)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for DataKind {
    type Err = Sh95Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emi" | "emissivity" => Ok(DataKind::Emissivity),
            "rec" | "recombination" | "recombination-coefficient" => {
                Ok(DataKind::RecombinationCoefficient)
            }
            "opa" | "opacity" | "opacity-factor" => Ok(DataKind::OpacityFactor),
            "dep" | "departure" | "departure-coefficient" => Ok(DataKind::DepartureCoefficient),
            other => Err(Sh95Error::configuration(format!(
                "unknown data kind '{}', expected one of emi, rec, opa, dep",
                other
            ))),
        }
    }
}

/// Spectroscopic recombination case
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecombinationCase {
    A,
    B,
}

impl RecombinationCase {
    pub fn letter(&self) -> char {
        match self {
            RecombinationCase::A => 'A',
            RecombinationCase::B => 'B',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(RecombinationCase::A),
            'B' => Some(RecombinationCase::B),
            _ => None,
        }
    }
}

impl fmt::Display for RecombinationCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for RecombinationCase {
    type Err = Sh95Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => RecombinationCase::from_letter(letter).ok_or_else(|| {
                Sh95Error::configuration(format!("unknown recombination case '{}'", s))
            }),
            _ => Err(Sh95Error::configuration(format!(
                "unknown recombination case '{}'",
                s
            ))),
        }
    }
}

/// One table of values for a single density/temperature/charge/upper-level tuple
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub density: f64,
    pub temperature: f64,
    pub charge: u32,
    pub upper_level: u32,
    pub rec_case: RecombinationCase,
    pub data_kind: DataKind,
    /// Lower levels in line-encounter order, parallel to `values`
    pub lower_levels: Vec<u32>,
    pub values: Vec<f64>,
}

impl DataBlock {
    /// Key used when ordering blocks for display or deduplication
    pub fn sorting_key(&self) -> (DataKind, RecombinationCase, u32, u32, f64, f64) {
        (
            self.data_kind,
            self.rec_case,
            self.charge,
            self.upper_level,
            self.temperature,
            self.density,
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (lower level, value) pairs in encounter order
    pub fn pairs(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.lower_levels
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

impl fmt::Display for DataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataBlock {}_NU={}, Z={}, TE={:e}, NE={:e}, CASE={} ({} values)",
            self.data_kind.marker(),
            self.upper_level,
            self.charge,
            self.temperature,
            self.density,
            self.rec_case,
            self.len()
        )
    }
}

/// Context shared by all blocks of one data kind parsed from one file
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalState {
    pub rec_case: RecombinationCase,
    pub charge: u32,
    pub n_cutoff: Option<u32>,
    pub data_kind: DataKind,
    pub data_blocks: Vec<DataBlock>,
    /// Set when the file ended while a block was still being collected
    pub dropped_trailing_group: bool,
}

impl PhysicalState {
    pub fn new(
        rec_case: RecombinationCase,
        charge: u32,
        n_cutoff: Option<u32>,
        data_kind: DataKind,
    ) -> Self {
        Self {
            rec_case,
            charge,
            n_cutoff,
            data_kind,
            data_blocks: Vec::new(),
            dropped_trailing_group: false,
        }
    }

    /// Total number of (lower level, value) pairs across all blocks
    pub fn value_count(&self) -> usize {
        self.data_blocks.iter().map(DataBlock::len).sum()
    }

    /// Index values by (temperature, density) then (upper, lower) level
    pub fn value_index(&self) -> ValueIndex {
        let mut index = ValueIndex::default();
        for block in &self.data_blocks {
            let conditions = index
                .entries
                .entry((block.temperature.to_bits(), block.density.to_bits()))
                .or_default();
            for (lower, value) in block.pairs() {
                conditions.insert((block.upper_level, lower), value);
            }
        }
        index
    }
}

/// Lookup of a physical state's values by conditions and transition
#[derive(Debug, Clone, Default)]
pub struct ValueIndex {
    entries: BTreeMap<(u64, u64), BTreeMap<(u32, u32), f64>>,
}

impl ValueIndex {
    /// Value for the transition `upper -> lower` at temperature/density
    pub fn get(&self, temperature: f64, density: f64, upper: u32, lower: u32) -> Option<f64> {
        self.entries
            .get(&(temperature.to_bits(), density.to_bits()))
            .and_then(|transitions| transitions.get(&(upper, lower)))
            .copied()
    }

    /// Distinct (temperature, density) pairs present
    pub fn conditions(&self) -> Vec<(f64, f64)> {
        self.entries
            .keys()
            .map(|(t, d)| (f64::from_bits(*t), f64::from_bits(*d)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The unit of persistence: one transition value under one set of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    /// Transition wavelength, emissivities only
    pub wave: Option<f64>,
    pub rec_case: RecombinationCase,
    pub z: u32,
    pub n_u: u32,
    pub n_l: u32,
    pub temp: f64,
    pub dens: f64,
    pub val: f64,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub rows_per_kind: BTreeMap<DataKind, usize>,
    pub rows_written: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn total_rows(&self) -> usize {
        self.rows_per_kind.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(temp: f64, dens: f64) -> DataBlock {
        DataBlock {
            density: dens,
            temperature: temp,
            charge: 1,
            upper_level: 4,
            rec_case: RecombinationCase::B,
            data_kind: DataKind::Emissivity,
            lower_levels: vec![2, 3],
            values: vec![0.5, 0.25],
        }
    }

    #[test]
    fn test_data_kind_markers() {
        for kind in DataKind::ALL {
            let marker = kind.marker().to_string();
            assert_eq!(DataKind::from_marker(&marker), Some(kind));
        }
        assert_eq!(DataKind::from_marker("X"), None);
        assert_eq!(DataKind::from_marker("e"), None);
    }

    #[test]
    fn test_data_kind_from_str() {
        assert_eq!("emi".parse::<DataKind>().unwrap(), DataKind::Emissivity);
        assert_eq!(
            "Departure".parse::<DataKind>().unwrap(),
            DataKind::DepartureCoefficient
        );
        assert!("foo".parse::<DataKind>().is_err());
    }

    #[test]
    fn test_recombination_case_parsing() {
        assert_eq!("a".parse::<RecombinationCase>().unwrap(), RecombinationCase::A);
        assert_eq!(" B ".parse::<RecombinationCase>().unwrap(), RecombinationCase::B);
        assert!("C".parse::<RecombinationCase>().is_err());
        assert!("AB".parse::<RecombinationCase>().is_err());
    }

    #[test]
    fn test_sorting_key_orders_by_kind_first() {
        let mut emi = block(1e4, 1e2);
        emi.upper_level = 9;
        let mut dep = block(1e4, 1e2);
        dep.data_kind = DataKind::DepartureCoefficient;
        dep.upper_level = 2;

        assert!(emi.sorting_key() < dep.sorting_key());
    }

    #[test]
    fn test_value_index_lookup() {
        let mut state = PhysicalState::new(RecombinationCase::B, 1, Some(50), DataKind::Emissivity);
        state.data_blocks.push(block(1e4, 1e2));
        state.data_blocks.push(block(2e4, 1e2));

        let index = state.value_index();
        assert_eq!(index.len(), 4);
        assert_eq!(index.conditions().len(), 2);
        assert_eq!(index.get(1e4, 1e2, 4, 3), Some(0.25));
        assert_eq!(index.get(1e4, 1e2, 3, 4), None);
        assert_eq!(index.get(5e3, 1e2, 4, 2), None);
        assert_eq!(state.value_count(), 4);
    }

    #[test]
    fn test_block_display() {
        let text = block(1e4, 1e2).to_string();
        assert!(text.contains("E_NU=4"));
        assert!(text.contains("CASE=B"));
    }
}
