use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::TableError;
use crate::annotation::AnnotatedOrf;
use crate::reconcile::{CombinedGene, KeptAlignment, ReconciliationReport, ScaffoldFragments, ScaffoldKey};

const ANNOTATED_HEADER: &str = "subject_id\tspecies_name\tstart\tstop\treading_frame\tsequence";
const FURTHER_HEADER: &str = "query_species\tscaffold_id\tspecies_name\tfragment_count\tsubject_starts\tsubject_stops\tquery_starts\tquery_stops\tsubject_lengths\tstrands\treading_frames";
const AUTO_HEADER: &str = "query_species\tscaffold_id\tspecies_name\tsubject_start\tsubject_stop\treading_frame\tquery_start\tquery_stop";
const COMBINED_HEADER: &str = "query_species\tscaffold_id\tspecies_name\tcombined_start\tcombined_stop\tintron_start\tintron_stop\tdonor_offset\tacceptor_offset\tprotein";
const REMOVED_HEADER: &str = "query_species\tscaffold_id";
const UNRESOLVED_HEADER: &str = "query_species\tscaffold_id\treason";

fn joined<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

/// Render annotated ORFs, one row per subject id in key order.
pub fn render_annotated_table(annotated: &BTreeMap<String, AnnotatedOrf>) -> String {
    let mut out = String::from(ANNOTATED_HEADER);
    out.push('\n');
    for (id, orf) in annotated {
        out.push_str(&format!(
            "{id}\t{}\t{}\t{}\t{}\t{}\n",
            orf.species_name, orf.start, orf.stop, orf.reading_frame, orf.sequence
        ));
    }
    out
}

/// Write [`render_annotated_table`] to `path`.
pub fn write_annotated_table(
    path: impl AsRef<Path>,
    annotated: &BTreeMap<String, AnnotatedOrf>,
) -> Result<(), TableError> {
    fs::write(path, render_annotated_table(annotated))?;
    Ok(())
}

/// Render scaffolds needing review in the manual-table layout, so the file
/// can be curated and read back with [`super::read_manual_table`].
pub fn render_further_annotation_table(scaffolds: &[ScaffoldFragments]) -> String {
    let mut out = String::from(FURTHER_HEADER);
    out.push('\n');
    for scaffold in scaffolds {
        let fragments = &scaffold.fragments;
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            scaffold.query_species,
            scaffold.scaffold_id,
            scaffold.species_name,
            fragments.len(),
            joined(fragments.iter().map(|f| f.subject_start)),
            joined(fragments.iter().map(|f| f.subject_stop)),
            joined(fragments.iter().map(|f| f.query_start)),
            joined(fragments.iter().map(|f| f.query_stop)),
            joined(fragments.iter().map(|f| f.subject_length())),
            joined(fragments.iter().map(|f| f.strand())),
            joined(fragments.iter().map(|f| f.reading_frame)),
        ));
    }
    out
}

/// Render the kept fragment of each auto-annotated scaffold.
pub fn render_auto_annotated_table(kept: &[KeptAlignment]) -> String {
    let mut out = String::from(AUTO_HEADER);
    out.push('\n');
    for row in kept {
        let f = &row.fragment;
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            row.key.query_species,
            row.key.scaffold_id,
            row.species_name,
            f.subject_start,
            f.subject_stop,
            f.reading_frame,
            f.query_start,
            f.query_stop
        ));
    }
    out
}

/// Render spliced genes.
pub fn render_combined_table(combined: &[CombinedGene]) -> String {
    let mut out = String::from(COMBINED_HEADER);
    out.push('\n');
    for row in combined {
        let g = &row.gene;
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            row.key.query_species,
            row.key.scaffold_id,
            g.species_name,
            g.combined_start,
            g.combined_stop,
            g.intron_start,
            g.intron_stop,
            g.donor_offset,
            g.acceptor_offset,
            g.protein
        ));
    }
    out
}

/// Render removed scaffolds.
pub fn render_removed_table(removed: &[ScaffoldKey]) -> String {
    let mut out = String::from(REMOVED_HEADER);
    out.push('\n');
    for key in removed {
        out.push_str(&format!("{}\t{}\n", key.query_species, key.scaffold_id));
    }
    out
}

fn render_unresolved_table(report: &ReconciliationReport) -> String {
    let mut out = String::from(UNRESOLVED_HEADER);
    out.push('\n');
    for row in &report.unresolved {
        let reason = row.reason.replace(['\t', '\n'], " ");
        out.push_str(&format!("{}\t{}\t{reason}\n", row.key.query_species, row.key.scaffold_id));
    }
    out
}

/// Write every reconciliation table into `dir`, returning the written paths.
pub fn write_reconciliation_tables(
    dir: impl AsRef<Path>,
    report: &ReconciliationReport,
) -> Result<Vec<PathBuf>, TableError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let tables = [
        ("further_annotation.tsv", render_further_annotation_table(&report.further_annotation)),
        ("auto_annotated.tsv", render_auto_annotated_table(&report.auto_annotated)),
        ("combined.tsv", render_combined_table(&report.combined)),
        ("removed.tsv", render_removed_table(&report.removed)),
        ("unresolved.tsv", render_unresolved_table(report)),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, body) in tables {
        let path = dir.join(name);
        fs::write(&path, body)?;
        written.push(path);
    }
    info!(dir = %dir.display(), tables = written.len(), "wrote reconciliation tables");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_manual_table;
    use crate::reconcile::Fragment;

    #[test]
    fn further_annotation_table_reads_back() {
        let scaffold = ScaffoldFragments {
            query_species: "Candida verbasci".into(),
            scaffold_id: "scf7".into(),
            species_name: "Pichia kudriavzevii".into(),
            fragments: vec![
                Fragment {
                    subject_start: 900,
                    subject_stop: 700,
                    reading_frame: -1,
                    query_start: 5,
                    query_stop: 70,
                },
                Fragment {
                    subject_start: 1500,
                    subject_stop: 1200,
                    reading_frame: -3,
                    query_start: 60,
                    query_stop: 160,
                },
            ],
        };
        let text = render_further_annotation_table(std::slice::from_ref(&scaffold));
        assert_eq!(parse_manual_table(&text).unwrap(), vec![scaffold]);
    }

    #[test]
    fn reconciliation_tables_land_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReconciliationReport {
            removed: vec![ScaffoldKey::new("Candida verbasci", "scf3")],
            ..ReconciliationReport::default()
        };
        let paths = write_reconciliation_tables(dir.path(), &report).unwrap();
        assert_eq!(paths.len(), 5);
        let removed = fs::read_to_string(dir.path().join("removed.tsv")).unwrap();
        assert_eq!(removed, "query_species\tscaffold_id\nCandida verbasci\tscf3\n");
    }
}
