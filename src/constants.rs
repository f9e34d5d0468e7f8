//! Layout constants for the Storey & Hummer (1995) data files
//!
//! Field widths, marker characters and naming rules are specific to the
//! VI/64 distribution and are not meant to be configurable.

// =============================================================================
// Fixed-width data lines
// =============================================================================

/// Leading line-type/continuation character discarded from every data line
pub const DATA_LINE_OFFSET: usize = 1;

/// One record: 3-char lower level, 1-char separator, 9-char value
pub const RECORD_WIDTH: usize = 13;

/// Width of the lower-level index at the start of a record
pub const LEVEL_WIDTH: usize = 3;

/// Offset of the value field within a record
pub const VALUE_OFFSET: usize = LEVEL_WIDTH + 1;

/// Characters at the end of a float token that hold the exponent
pub const EXPONENT_WIDTH: usize = 4;

// =============================================================================
// Headers
// =============================================================================

/// Index of the per-file state header line
pub const STATE_HEADER_LINE: usize = 1;

/// Index of the first line scanned for data blocks
pub const FIRST_SCAN_LINE: usize = 2;

/// Reserved marker that never opens a data block
pub const RESERVED_MARKER: &str = "BNS";

pub const DENSITY_KEY: &str = "NE";
pub const TEMPERATURE_KEY: &str = "TE";
pub const CHARGE_KEY: &str = "Z";
pub const CASE_KEY: &str = "CASE";

// =============================================================================
// File naming
// =============================================================================

/// Suffix of every primary output file (`r{Z}{case}{cutoff}.d.gz`)
pub const DATA_FILE_SUFFIX: &str = ".d.gz";

/// Default inclusive bounds on the nuclear charge
pub const DEFAULT_Z_BOUNDS: (u32, u32) = (1, 100);

// =============================================================================
// Physics
// =============================================================================

/// Rydberg constant for hydrogen in inverse Angstrom
pub const RYDBERG_H: f64 = 1.09678e-3;

// =============================================================================
// Persistence
// =============================================================================

/// Columns of every persisted table, in storage order
pub const TABLE_COLUMNS: &[&str] = &[
    "wave", "rec_case", "z", "n_u", "n_l", "temp", "dens", "val",
];

/// Default database name used when none is given
pub const DEFAULT_DATABASE_NAME: &str = "db";

/// Extension of each persisted table file
pub const TABLE_EXTENSION: &str = "parquet";
