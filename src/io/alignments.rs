use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::{field, TableError};
use crate::annotation::AlignmentRecord;
use crate::gateway::{parse_species_name, SequenceDatabase};

/// `-outfmt` argument producing the alignment table read here.
pub const TBLASTN_OUTFMT: &str = "6 qseqid sseqid pident length mismatch gaps qstart qend sstart send evalue bitscore qseq sseq sframe";

const COLUMNS: usize = 15;

/// Strip a `db|ACCESSION|` wrapper from a subject id.
pub fn normalise_accession(id: &str) -> &str {
    id.split('|')
        .nth(1)
        .filter(|accession| !accession.is_empty())
        .unwrap_or(id)
}

/// Read a `tblastn` table produced with [`TBLASTN_OUTFMT`].
pub fn read_alignment_table<D>(path: impl AsRef<Path>, db: &D) -> Result<Vec<AlignmentRecord>, TableError>
where
    D: SequenceDatabase + ?Sized,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let records = parse_alignment_table(&text, db)?;
    info!(path = %path.display(), records = records.len(), "read alignment table");
    Ok(records)
}

/// Parse a `tblastn` table, resolving each scaffold's species through `db`.
///
/// A scaffold whose species cannot be determined fails the whole table.
pub fn parse_alignment_table<D>(text: &str, db: &D) -> Result<Vec<AlignmentRecord>, TableError>
where
    D: SequenceDatabase + ?Sized,
{
    let mut species: HashMap<String, String> = HashMap::new();
    let mut records = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() || raw.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = raw.split('\t').collect();
        if columns.len() < COLUMNS {
            return Err(TableError::parse(
                line,
                format!("expected {COLUMNS} columns, found {}", columns.len()),
            ));
        }

        let subject_id = normalise_accession(columns[1].trim()).to_string();
        let reading_frame: i8 = field(&columns, 14, line, "sframe")?;
        if reading_frame == 0 || reading_frame.unsigned_abs() > 3 {
            return Err(TableError::parse(line, format!("reading frame {reading_frame} out of range")));
        }

        let species_name = match species.get(&subject_id) {
            Some(name) => name.clone(),
            None => {
                let name = resolve_species(db, &subject_id)?;
                debug!(subject = %subject_id, species = %name, "resolved scaffold species");
                species.insert(subject_id.clone(), name.clone());
                name
            }
        };

        records.push(AlignmentRecord {
            subject_id,
            species_name,
            subject_start: field(&columns, 8, line, "sstart")?,
            subject_end: field(&columns, 9, line, "send")?,
            reading_frame,
            query_start: field(&columns, 6, line, "qstart")?,
            query_end: field(&columns, 7, line, "qend")?,
            alignment_length: field(&columns, 3, line, "length")?,
            mismatch_count: field(&columns, 4, line, "mismatch")?,
            gap_count: field(&columns, 5, line, "gaps")?,
            query_alignment: columns[12].trim().to_string(),
            subject_alignment: columns[13].trim().to_string(),
        });
    }
    Ok(records)
}

fn resolve_species<D>(db: &D, accession: &str) -> Result<String, TableError>
where
    D: SequenceDatabase + ?Sized,
{
    db.fetch_metadata(accession)
        .and_then(|descriptor| parse_species_name(&descriptor))
        .map_err(|source| TableError::Species {
            accession: accession.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemorySequenceDb;
    use test_case::test_case;

    #[test_case("ref|NC_001133.9|", "NC_001133.9" ; "wrapped")]
    #[test_case("JAEOAQ010000001.1", "JAEOAQ010000001.1" ; "bare")]
    #[test_case("gb|", "gb|" ; "empty accession")]
    fn accession_normalisation(raw: &str, expected: &str) {
        assert_eq!(normalise_accession(raw), expected);
    }

    fn db() -> InMemorySequenceDb {
        InMemorySequenceDb::new().with_scaffold("scf1", "Candida albicans SC5314 chromosome 1", b"ACGT".to_vec())
    }

    const ROW: &str = "NP_010615.3\tgnl|scf1|\t45.2\t120\t60\t12\t5\t124\t1000\t1360\t1e-30\t110\tMKV--LLA\tMKVQQLLA\t2";

    #[test]
    fn parses_rows_and_resolves_species() {
        let text = format!("# tblastn\n{ROW}\n\n");
        let records = parse_alignment_table(&text, &db()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.subject_id, "scf1");
        assert_eq!(record.species_name, "Candida albicans");
        assert_eq!((record.subject_start, record.subject_end), (1000, 1360));
        assert_eq!(record.reading_frame, 2);
        assert_eq!(record.gap_count, 12);
        assert_eq!(record.query_alignment, "MKV--LLA");
    }

    #[test]
    fn unknown_species_is_fatal() {
        let text = ROW.replace("gnl|scf1|", "gnl|scf9|");
        assert!(matches!(
            parse_alignment_table(&text, &db()),
            Err(TableError::Species { .. })
        ));
    }

    #[test]
    fn frame_zero_is_rejected() {
        let text = ROW.replace("\t2", "\t0");
        assert!(matches!(
            parse_alignment_table(&text, &db()),
            Err(TableError::Parse { line: 1, .. })
        ));
    }
}
