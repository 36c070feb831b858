#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use orfmend::gateway::{Hit, InMemorySequenceDb, ScriptedSearch, SearchProgram};
use orfmend::reconcile::{Fragment, ReferenceContext, ScaffoldFragments};
use orfmend::sequence::reverse_complement;
use orfmend::AlignmentRecord;

pub const QUERY_SPECIES: &str = "Saccharomyces cerevisiae";
pub const REFERENCE_PROTEIN: &str = "NP_010615.3";
pub const SPECIES: &str = "Candida albicans";

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("ORFMEND_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set ORFMEND_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// `len` bases of `fill` with motifs placed at 1-based positions.
pub fn layout(len: usize, fill: u8, motifs: &[(usize, &str)]) -> Vec<u8> {
    let mut seq = vec![fill; len];
    for (pos, motif) in motifs {
        seq[pos - 1..pos - 1 + motif.len()].copy_from_slice(motif.as_bytes());
    }
    seq
}

/// Scaffold whose minus strand reads `antisense` 5'→3'.
pub fn plus_of_antisense(antisense: &[u8]) -> Vec<u8> {
    reverse_complement(antisense)
}

pub fn database(scaffolds: &[(&str, Vec<u8>)]) -> InMemorySequenceDb {
    scaffolds
        .iter()
        .fold(InMemorySequenceDb::new(), |db, (id, plus)| {
            db.with_scaffold(*id, format!("{SPECIES} SC5314 {id}"), plus.clone())
        })
}

pub fn record(subject_id: &str, start: u64, end: u64, frame: i8, query_alignment: &str) -> AlignmentRecord {
    AlignmentRecord {
        subject_id: subject_id.to_string(),
        species_name: SPECIES.to_string(),
        subject_start: start,
        subject_end: end,
        reading_frame: frame,
        query_start: 1,
        query_end: 10,
        alignment_length: start.abs_diff(end) + 1,
        mismatch_count: 0,
        gap_count: query_alignment.bytes().filter(|b| *b == b'-').count() as u64,
        query_alignment: query_alignment.to_string(),
        subject_alignment: query_alignment.replace('-', "A"),
    }
}

pub fn fragment(subject: (u64, u64), query: (u64, u64), frame: i8) -> Fragment {
    Fragment {
        subject_start: subject.0,
        subject_stop: subject.1,
        reading_frame: frame,
        query_start: query.0,
        query_stop: query.1,
    }
}

pub fn scaffold(query_species: &str, scaffold_id: &str, fragments: Vec<Fragment>) -> ScaffoldFragments {
    ScaffoldFragments {
        query_species: query_species.to_string(),
        scaffold_id: scaffold_id.to_string(),
        species_name: SPECIES.to_string(),
        fragments,
    }
}

pub fn reference() -> ReferenceContext {
    ReferenceContext::new(QUERY_SPECIES, REFERENCE_PROTEIN, "sc_prot")
}

/// Search that validates `blastx` queries made only of `A`s and `blastp`
/// queries accepted by `accept_protein`.
pub fn search_accepting(accept_protein: fn(&str) -> bool) -> ScriptedSearch {
    ScriptedSearch::new(move |program, query, _| {
        let valid = match program {
            SearchProgram::BlastX => {
                !query.sequence.is_empty() && query.sequence.iter().all(|b| *b == b'A')
            }
            SearchProgram::BlastP => accept_protein(&String::from_utf8_lossy(&query.sequence)),
            _ => false,
        };
        let subject = if valid { REFERENCE_PROTEIN } else { "XP_000000.1" };
        Ok(vec![Hit::ranked(&query.id, subject)])
    })
}
