//! Tab-separated tables read and written by the command-line tool.

mod alignments;
mod manual;
mod report;

use thiserror::Error;

use crate::gateway::GatewayError;

pub use alignments::{normalise_accession, parse_alignment_table, read_alignment_table, TBLASTN_OUTFMT};
pub use manual::{parse_manual_table, read_manual_table};
pub use report::{
    render_annotated_table, render_auto_annotated_table, render_combined_table,
    render_further_annotation_table, render_removed_table, write_annotated_table,
    write_reconciliation_tables,
};

/// Errors raised while reading or writing tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// A row could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// The species of a scaffold could not be determined.
    #[error("species lookup for {accession} failed: {source}")]
    Species {
        /// Scaffold accession.
        accession: String,
        /// Underlying gateway failure.
        #[source]
        source: GatewayError,
    },

    /// Underlying file failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        TableError::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// Parse one tab-separated field.
pub(crate) fn field<T: std::str::FromStr>(
    columns: &[&str],
    index: usize,
    line: usize,
    name: &str,
) -> Result<T, TableError> {
    let raw = columns
        .get(index)
        .ok_or_else(|| TableError::parse(line, format!("missing column {name}")))?;
    raw.trim()
        .parse()
        .map_err(|_| TableError::parse(line, format!("invalid {name} '{raw}'")))
}
