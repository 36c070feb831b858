use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;

use super::TableError;
use crate::reconcile::{Fragment, ScaffoldFragments, ScaffoldKey};

const QUERY_SPECIES: usize = 0;
const SCAFFOLD_ID: usize = 1;
const SPECIES_NAME: usize = 2;
const SUBJECT_STARTS: usize = 4;
const SUBJECT_STOPS: usize = 5;
const QUERY_STARTS: usize = 6;
const QUERY_STOPS: usize = 7;
const FRAMES: usize = 10;

/// Read the curated multi-alignment table.
pub fn read_manual_table(path: impl AsRef<Path>) -> Result<Vec<ScaffoldFragments>, TableError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let scaffolds = parse_manual_table(&text)?;
    info!(path = %path.display(), scaffolds = scaffolds.len(), "read manual annotation table");
    Ok(scaffolds)
}

fn list<T: std::str::FromStr>(raw: &str, line: usize, name: &str) -> Result<Vec<T>, TableError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .map_err(|_| TableError::parse(line, format!("invalid {name} entry '{item}'")))
        })
        .collect()
}

/// Parse the curated multi-alignment table. The first line is a header.
///
/// Each row lists one scaffold's fragments as `", "`-separated columns that
/// must all have the same length.
pub fn parse_manual_table(text: &str) -> Result<Vec<ScaffoldFragments>, TableError> {
    let mut seen = HashSet::new();
    let mut scaffolds = Vec::new();

    for (idx, raw) in text.lines().enumerate().skip(1) {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let columns: Vec<&str> = raw.split('\t').collect();
        if columns.len() <= FRAMES {
            return Err(TableError::parse(
                line,
                format!("expected at least {} columns, found {}", FRAMES + 1, columns.len()),
            ));
        }

        let subject_starts: Vec<u64> = list(columns[SUBJECT_STARTS], line, "subject start")?;
        let subject_stops: Vec<u64> = list(columns[SUBJECT_STOPS], line, "subject stop")?;
        let query_starts: Vec<u64> = list(columns[QUERY_STARTS], line, "query start")?;
        let query_stops: Vec<u64> = list(columns[QUERY_STOPS], line, "query stop")?;
        let frames: Vec<i8> = list(columns[FRAMES], line, "frame")?;

        let count = subject_starts.len();
        let lengths = [
            subject_stops.len(),
            query_starts.len(),
            query_stops.len(),
            frames.len(),
        ];
        if count == 0 || lengths.iter().any(|&len| len != count) {
            return Err(TableError::parse(
                line,
                "fragment columns differ in length or are empty",
            ));
        }
        if let Some(frame) = frames.iter().find(|f| **f == 0 || f.unsigned_abs() > 3) {
            return Err(TableError::parse(line, format!("reading frame {frame} out of range")));
        }

        let scaffold = ScaffoldFragments {
            query_species: columns[QUERY_SPECIES].trim().to_string(),
            scaffold_id: columns[SCAFFOLD_ID].trim().to_string(),
            species_name: columns[SPECIES_NAME].trim().to_string(),
            fragments: (0..count)
                .map(|i| Fragment {
                    subject_start: subject_starts[i],
                    subject_stop: subject_stops[i],
                    reading_frame: frames[i],
                    query_start: query_starts[i],
                    query_stop: query_stops[i],
                })
                .collect(),
        };
        if !seen.insert(ScaffoldKey::of(&scaffold)) {
            return Err(TableError::parse(
                line,
                format!("scaffold {} listed twice", ScaffoldKey::of(&scaffold)),
            ));
        }
        scaffolds.push(scaffold);
    }
    Ok(scaffolds)
}
