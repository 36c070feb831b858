use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use tempfile::NamedTempFile;
use tracing::debug;

use super::{GatewayError, Hit, HomologySearch, SearchProgram, SearchQuery, SequenceDatabase};
use crate::sequence::Strand;

/// Columns of the standard BLAST tabular format.
const TABULAR_COLUMNS: usize = 12;

fn executable(bin_dir: Option<&Path>, name: &str) -> PathBuf {
    match bin_dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

fn run_tool(mut command: Command, tool: &str) -> Result<String, GatewayError> {
    debug!(?command, "running external tool");
    let output = command.output().map_err(|source| GatewayError::Spawn {
        tool: tool.to_string(),
        source,
    })?;
    if !output.status.success() {
        return Err(GatewayError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `blastdbcmd` adapter over a nucleotide BLAST database built with
/// `-parse_seqids`.
#[derive(Debug, Clone)]
pub struct BlastDbCmd {
    database: PathBuf,
    bin_dir: Option<PathBuf>,
}

impl BlastDbCmd {
    /// Adapter for the database at `database` (path prefix, no extension).
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            bin_dir: None,
        }
    }

    /// Look up the executable in `dir` instead of `PATH`.
    pub fn with_bin_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.bin_dir = dir;
        self
    }

    fn command(&self, accession: &str) -> Command {
        let mut command = Command::new(executable(self.bin_dir.as_deref(), "blastdbcmd"));
        command
            .arg("-db")
            .arg(&self.database)
            .arg("-entry")
            .arg(accession);
        command
    }
}

impl SequenceDatabase for BlastDbCmd {
    fn fetch_metadata(&self, accession: &str) -> Result<String, GatewayError> {
        let mut command = self.command(accession);
        command.arg("-outfmt").arg("%a %t");
        let stdout = run_tool(command, "blastdbcmd")?;
        stdout
            .lines()
            .next()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .ok_or_else(|| GatewayError::UnknownAccession(accession.to_string()))
    }

    fn fetch_range(
        &self,
        accession: &str,
        strand: Strand,
        range: Option<(u64, u64)>,
    ) -> Result<Vec<u8>, GatewayError> {
        let mut command = self.command(accession);
        command.arg("-strand").arg(strand.as_str());
        if let Some((start, end)) = range {
            command.arg("-range").arg(format!("{start}-{end}"));
        }
        let stdout = run_tool(command, "blastdbcmd")?;

        // FASTA: one header line, then wrapped sequence lines.
        Ok(stdout
            .lines()
            .skip(1)
            .flat_map(|line| line.trim().bytes())
            .collect())
    }
}

/// Runs BLAST+ search programs with `-outfmt 6` and parses the ranked hits.
#[derive(Debug, Clone)]
pub struct BlastSearch {
    bin_dir: Option<PathBuf>,
    threads: usize,
}

impl BlastSearch {
    /// Search adapter using `threads` BLAST threads per invocation.
    pub fn new(threads: usize) -> Self {
        Self {
            bin_dir: None,
            threads: threads.max(1),
        }
    }

    /// Look up executables in `dir` instead of `PATH`.
    pub fn with_bin_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.bin_dir = dir;
        self
    }
}

impl HomologySearch for BlastSearch {
    fn search(
        &self,
        program: SearchProgram,
        query: &SearchQuery,
        database: &Path,
    ) -> Result<Vec<Hit>, GatewayError> {
        // One file per query keeps concurrent searches independent.
        let mut query_file = NamedTempFile::new()?;
        query_file.write_all(query.to_fasta().as_bytes())?;
        query_file.flush()?;

        let mut command = Command::new(executable(self.bin_dir.as_deref(), program.executable()));
        command
            .arg("-query")
            .arg(query_file.path())
            .arg("-db")
            .arg(database)
            .arg("-outfmt")
            .arg("6")
            .arg("-num_threads")
            .arg(self.threads.to_string());

        let stdout = run_tool(command, program.executable())?;
        parse_tabular_hits(&stdout, program.executable())
    }
}

fn column<T: FromStr>(
    fields: &[&str],
    idx: usize,
    tool: &str,
    line: usize,
) -> Result<T, GatewayError> {
    fields[idx].trim().parse().map_err(|_| GatewayError::Malformed {
        tool: tool.to_string(),
        line,
        reason: format!("column {} has invalid value '{}'", idx + 1, fields[idx]),
    })
}

/// Parse BLAST tabular output (`-outfmt 6`). Comment and blank lines are
/// skipped; extra trailing columns are ignored.
pub fn parse_tabular_hits(text: &str, tool: &str) -> Result<Vec<Hit>, GatewayError> {
    let mut hits = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TABULAR_COLUMNS {
            return Err(GatewayError::Malformed {
                tool: tool.to_string(),
                line: line_no,
                reason: format!(
                    "expected {TABULAR_COLUMNS} columns, found {}",
                    fields.len()
                ),
            });
        }
        hits.push(Hit {
            query_id: fields[0].to_string(),
            subject_id: fields[1].to_string(),
            percent_identity: column(&fields, 2, tool, line_no)?,
            alignment_length: column(&fields, 3, tool, line_no)?,
            mismatches: column(&fields, 4, tool, line_no)?,
            gap_opens: column(&fields, 5, tool, line_no)?,
            query_start: column(&fields, 6, tool, line_no)?,
            query_end: column(&fields, 7, tool, line_no)?,
            subject_start: column(&fields, 8, tool, line_no)?,
            subject_end: column(&fields, 9, tool, line_no)?,
            evalue: column(&fields, 10, tool, line_no)?,
            bit_score: column(&fields, 11, tool, line_no)?,
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "NC_1\tNP_010615.3\t87.5\t120\t15\t0\t1\t360\t5\t124\t1e-50\t210\n\
                          NC_1\tXP_000001.1\t40.0\t80\t48\t2\t10\t250\t30\t110\t2.5e-3\t41.2\n";

    #[test]
    fn parses_ranked_hits() {
        let hits = parse_tabular_hits(OUTPUT, "blastx").expect("valid output");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].subject_id, "NP_010615.3");
        assert_eq!(hits[0].query_end, 360);
        assert!((hits[1].evalue - 2.5e-3).abs() < 1e-12);
    }

    #[test]
    fn empty_output_is_no_hits() {
        assert!(parse_tabular_hits("", "blastp").unwrap().is_empty());
        assert!(parse_tabular_hits("# comment\n\n", "blastp").unwrap().is_empty());
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = parse_tabular_hits("q\ts\t99.0\n", "blastp").unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { line: 1, .. }));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let row = "q\ts\t99\tten\t0\t0\t1\t2\t3\t4\t0.1\t5\n";
        let err = parse_tabular_hits(row, "blastp").unwrap_err();
        assert!(err.to_string().contains("column 4"));
    }
}
