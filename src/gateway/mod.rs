//! Typed interfaces to the external sequence database and homology search
//! tools.
//!
//! The annotation core only talks to [`SequenceDatabase`] and
//! [`HomologySearch`]. Tool-specific text formats stay inside the adapters:
//! [`BlastDbCmd`] and [`BlastSearch`] drive the NCBI BLAST+ executables, while
//! [`InMemorySequenceDb`] and [`ScriptedSearch`] serve tests, benchmarks and
//! offline runs.

mod blast;
mod memory;
mod species;

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::sequence::Strand;

pub use blast::{parse_tabular_hits, BlastDbCmd, BlastSearch};
pub use memory::{InMemorySequenceDb, ScriptedSearch};
pub use species::parse_species_name;

/// Errors surfaced by gateway adapters.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The external executable could not be started.
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        /// Executable name.
        tool: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The external executable exited unsuccessfully.
    #[error("{tool} exited with status {status}: {stderr}")]
    ToolFailed {
        /// Executable name.
        tool: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Output could not be parsed.
    #[error("malformed {tool} output on line {line}: {reason}")]
    Malformed {
        /// Executable or format name.
        tool: String,
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// The accession is not present in the database.
    #[error("unknown accession {0}")]
    UnknownAccession(String),

    /// A database descriptor did not contain a recognisable species name.
    #[error("cannot parse species name from descriptor '{0}'")]
    UnparseableSpecies(String),

    /// Local I/O failure while preparing a query.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Search program of the BLAST family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchProgram {
    /// Protein query against a protein database.
    BlastP,
    /// Translated nucleotide query against a protein database.
    BlastX,
    /// Protein query against a translated nucleotide database.
    TBlastN,
    /// Translated nucleotide query against a translated nucleotide database.
    TBlastX,
}

impl SearchProgram {
    /// Executable name of the program.
    pub fn executable(self) -> &'static str {
        match self {
            SearchProgram::BlastP => "blastp",
            SearchProgram::BlastX => "blastx",
            SearchProgram::TBlastN => "tblastn",
            SearchProgram::TBlastX => "tblastx",
        }
    }
}

impl fmt::Display for SearchProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// A single query sequence handed to a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Identifier written to the FASTA header.
    pub id: String,
    /// Free-text description written after the identifier.
    pub description: String,
    /// Residues or bases.
    pub sequence: Vec<u8>,
}

impl SearchQuery {
    /// Construct a new query.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        sequence: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            sequence: sequence.into(),
        }
    }

    /// Render the query as a single FASTA record.
    pub fn to_fasta(&self) -> String {
        let mut record = format!(">{}", self.id);
        if !self.description.is_empty() {
            record.push(' ');
            record.push_str(&self.description);
        }
        record.push('\n');
        record.push_str(&String::from_utf8_lossy(&self.sequence));
        record.push('\n');
        record
    }
}

/// One row of BLAST tabular output (`-outfmt 6`).
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Query identifier.
    pub query_id: String,
    /// Subject identifier.
    pub subject_id: String,
    /// Percentage of identical matches.
    pub percent_identity: f64,
    /// Alignment length.
    pub alignment_length: u64,
    /// Number of mismatches.
    pub mismatches: u64,
    /// Number of gap openings.
    pub gap_opens: u64,
    /// Start of alignment in query.
    pub query_start: u64,
    /// End of alignment in query.
    pub query_end: u64,
    /// Start of alignment in subject.
    pub subject_start: u64,
    /// End of alignment in subject.
    pub subject_end: u64,
    /// Expect value.
    pub evalue: f64,
    /// Bit score.
    pub bit_score: f64,
}

impl Hit {
    /// Hit carrying only identifiers; alignment statistics are zeroed.
    pub fn ranked(query_id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            subject_id: subject_id.into(),
            percent_identity: 0.0,
            alignment_length: 0,
            mismatches: 0,
            gap_opens: 0,
            query_start: 0,
            query_end: 0,
            subject_start: 0,
            subject_end: 0,
            evalue: 0.0,
            bit_score: 0.0,
        }
    }
}

/// Nucleotide retrieval from a searchable sequence database.
pub trait SequenceDatabase: Send + Sync {
    /// Descriptor line (without `>`) of the accession.
    fn fetch_metadata(&self, accession: &str) -> Result<String, GatewayError>;

    /// Bases of `accession` on `strand`.
    ///
    /// `range` is 1-based and inclusive; `None` fetches the whole scaffold.
    /// Minus-strand ranges are given low-high and return the reverse
    /// complement of that span.
    fn fetch_range(
        &self,
        accession: &str,
        strand: Strand,
        range: Option<(u64, u64)>,
    ) -> Result<Vec<u8>, GatewayError>;
}

/// Ranked homology search against a reference database.
pub trait HomologySearch: Send + Sync {
    /// Hits for `query` in the order reported by the tool (best first).
    fn search(
        &self,
        program: SearchProgram,
        query: &SearchQuery,
        database: &Path,
    ) -> Result<Vec<Hit>, GatewayError>;
}

/// Fetch bases, logging and degrading a gateway failure to an empty sequence.
pub(crate) fn fetch_or_empty<D: SequenceDatabase + ?Sized>(
    db: &D,
    accession: &str,
    strand: Strand,
    range: Option<(u64, u64)>,
) -> Vec<u8> {
    db.fetch_range(accession, strand, range)
        .unwrap_or_else(|err| {
            warn!(accession, %strand, ?range, error = %err, "sequence fetch failed; treating as empty");
            Vec::new()
        })
}

/// Run a search, logging and degrading a gateway failure to "no hits".
pub(crate) fn search_or_empty<S: HomologySearch + ?Sized>(
    search: &S,
    program: SearchProgram,
    query: &SearchQuery,
    database: &Path,
) -> Vec<Hit> {
    search.search(program, query, database).unwrap_or_else(|err| {
        warn!(%program, query = %query.id, error = %err, "homology search failed; treating as no hit");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fasta_rendering_includes_description() {
        let query = SearchQuery::new("NC_1", "Candida albicans", b"ACGT".to_vec());
        assert_eq!(query.to_fasta(), ">NC_1 Candida albicans\nACGT\n");

        let bare = SearchQuery::new("q", "", b"MK".to_vec());
        assert_eq!(bare.to_fasta(), ">q\nMK\n");
    }
}
