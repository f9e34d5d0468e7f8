//! Physical state parsing.
//!
//! Scans all lines of one file for the blocks of one data kind. Scanning is
//! an explicit two-state machine: `Inactive` until a header with the kind's
//! marker opens a group, `Active` while data lines are collected. The next
//! line starting with a letter closes the group and is re-examined, so it
//! may open the following group. A group still open at end of input is
//! dropped.

use crate::block::parse_block_at;
use crate::constants::{FIRST_SCAN_LINE, RESERVED_MARKER, STATE_HEADER_LINE};
use crate::error::{Result, Sh95Error};
use crate::header::parse_state_header;
use crate::models::{DataBlock, DataKind, PhysicalState};
use tracing::{debug, warn};

/// Scanner state
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Inactive,
    /// Collecting a group whose header is at 0-based line index `start`
    Active { start: usize, lines: Vec<String> },
}

/// Outcome of feeding one line to the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Line ignored, scanner stays inactive
    Stay,
    /// Line is a matching header and opens a group
    Open,
    /// Line belongs to the active group
    Append,
    /// Line terminates the active group and must be re-examined
    Close,
}

/// First non-whitespace character of a line
fn lead_char(line: &str) -> Option<char> {
    line.trim_start().chars().next()
}

/// Whether a line opens a block of the given kind
pub fn opens_group(line: &str, kind: DataKind) -> bool {
    let trimmed = line.trim_start();
    lead_char(trimmed).is_some_and(|c| c.to_ascii_uppercase() == kind.marker())
        && !trimmed.starts_with(RESERVED_MARKER)
}

impl ScanState {
    /// Decide what a line does to this state without consuming it
    pub fn transition(&self, line: &str, kind: DataKind) -> Transition {
        match self {
            ScanState::Inactive if opens_group(line, kind) => Transition::Open,
            ScanState::Inactive => Transition::Stay,
            ScanState::Active { .. } if lead_char(line).is_some_and(char::is_alphabetic) => {
                Transition::Close
            }
            ScanState::Active { .. } => Transition::Append,
        }
    }
}

/// Line scanner collecting the blocks of one data kind
struct BlockScanner {
    kind: DataKind,
    state: ScanState,
    blocks: Vec<DataBlock>,
}

impl BlockScanner {
    fn new(kind: DataKind) -> Self {
        Self {
            kind,
            state: ScanState::Inactive,
            blocks: Vec::new(),
        }
    }

    /// Feed the line at 0-based index `index`
    fn feed(&mut self, index: usize, line: &str) -> Result<()> {
        loop {
            match self.state.transition(line, self.kind) {
                Transition::Stay => return Ok(()),
                Transition::Open => {
                    self.state = ScanState::Active {
                        start: index,
                        lines: vec![line.to_string()],
                    };
                    return Ok(());
                }
                Transition::Append => {
                    if let ScanState::Active { lines, .. } = &mut self.state {
                        lines.push(line.to_string());
                    }
                    return Ok(());
                }
                Transition::Close => {
                    if let ScanState::Active { start, lines } =
                        std::mem::replace(&mut self.state, ScanState::Inactive)
                    {
                        self.blocks.push(parse_block_at(&lines, start + 1)?);
                    }
                    // Re-examine the closing line against the inactive rule
                }
            }
        }
    }

    /// Finish scanning, returning the blocks and whether a group was dropped
    fn finish(self) -> (Vec<DataBlock>, bool) {
        let dropped = match self.state {
            ScanState::Active { start, lines } => {
                warn!(
                    "Dropping unterminated {} block at line {} ({} lines)",
                    self.kind,
                    start + 1,
                    lines.len()
                );
                true
            }
            ScanState::Inactive => false,
        };
        (self.blocks, dropped)
    }
}

impl PhysicalState {
    /// Parse all blocks of `kind` from the complete lines of one file
    pub fn from_lines(lines: &[String], kind: DataKind) -> Result<PhysicalState> {
        let header_line = lines.get(STATE_HEADER_LINE).ok_or_else(|| {
            Sh95Error::structural("file is too short to hold a state header")
                .at_line(STATE_HEADER_LINE + 1)
        })?;
        let header =
            parse_state_header(header_line).map_err(|e| e.at_line(STATE_HEADER_LINE + 1))?;

        let mut scanner = BlockScanner::new(kind);
        for (index, line) in lines.iter().enumerate().skip(FIRST_SCAN_LINE) {
            scanner.feed(index, line)?;
        }
        let (blocks, dropped_trailing_group) = scanner.finish();

        let mut state = PhysicalState::new(header.rec_case, header.charge, header.n_cutoff, kind);
        state.dropped_trailing_group = dropped_trailing_group;
        for block in blocks {
            state.push_block(block)?;
        }

        debug!(
            "Parsed {} {} blocks (z={}, case={}, n_c={:?})",
            state.data_blocks.len(),
            kind,
            state.charge,
            state.rec_case,
            state.n_cutoff
        );

        Ok(state)
    }

    /// Append a block after checking it agrees with the state's context
    pub fn push_block(&mut self, block: DataBlock) -> Result<()> {
        if block.charge != self.charge || block.rec_case != self.rec_case {
            return Err(Sh95Error::structural(format!(
                "block {}_NU={} has z={}, case={} but file header has z={}, case={}",
                block.data_kind.marker(),
                block.upper_level,
                block.charge,
                block.rec_case,
                self.charge,
                self.rec_case
            )));
        }
        if block.data_kind != self.data_kind {
            return Err(Sh95Error::structural(format!(
                "{} block found while parsing {} blocks",
                block.data_kind, self.data_kind
            )));
        }

        self.data_blocks.push(block);
        Ok(())
    }
}
