use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use orfmend::gateway::{BlastDbCmd, BlastSearch};
use orfmend::io::{read_alignment_table, read_manual_table, write_annotated_table, write_reconciliation_tables};
use orfmend::{Annotator, AnnotatorConfig, ReconciliationReport, ReferenceContext};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "orfmend", about = "ORF annotation and multi-alignment reconciliation of tblastn hits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Only log warnings and errors (RUST_LOG overrides).
    #[arg(long, global = true)]
    quiet: bool,

    /// Directory holding the BLAST+ executables.
    #[arg(long, global = true)]
    blast_bin_dir: Option<PathBuf>,

    /// Threads handed to each BLAST search.
    #[arg(long, global = true, default_value_t = 8)]
    search_threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate ORFs around clean tblastn alignments.
    Annotate {
        /// tblastn table written with the `6 qseqid sseqid ... sframe` format.
        alignments: PathBuf,
        /// Nucleotide BLAST database holding the scaffolds.
        #[arg(long)]
        nucl_db: PathBuf,
        /// Annotated ORF table to write.
        #[arg(long)]
        out: PathBuf,
        /// File receiving the ids sent to manual handling, one per line.
        #[arg(long)]
        manual_ids: Option<PathBuf>,
        /// Consecutive query gaps that send an alignment to manual handling.
        #[arg(long, default_value_t = 10)]
        gap_threshold: usize,
    },
    /// Reconcile scaffolds carrying several alignments.
    Reconcile {
        /// Curated multi-alignment table.
        manual: PathBuf,
        /// Nucleotide BLAST database holding the scaffolds.
        #[arg(long)]
        nucl_db: PathBuf,
        /// Reference protein of a query species, as `SPECIES=PROTEIN_ID`.
        #[arg(long = "reference", value_parser = parse_key_value, required = true)]
        references: Vec<(String, String)>,
        /// Protein database of a query species, as `SPECIES=PATH`.
        #[arg(long = "protein-db", value_parser = parse_key_value, required = true)]
        protein_dbs: Vec<(String, String)>,
        /// Directory receiving the outcome tables.
        #[arg(long)]
        out_dir: PathBuf,
        /// Scaffolds reconciled in parallel.
        #[arg(long, default_value_t = 1)]
        workers: usize,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = AnnotatorConfig::default().with_search_threads(cli.search_threads);
    if let Some(dir) = &cli.blast_bin_dir {
        config = config.with_blast_bin_dir(dir);
    }

    match cli.command {
        Commands::Annotate {
            alignments,
            nucl_db,
            out,
            manual_ids,
            gap_threshold,
        } => run_annotate(
            config.with_gap_run_threshold(gap_threshold),
            alignments,
            nucl_db,
            out,
            manual_ids,
        ),
        Commands::Reconcile {
            manual,
            nucl_db,
            references,
            protein_dbs,
            out_dir,
            workers,
        } => run_reconcile(
            config.with_workers(workers),
            manual,
            nucl_db,
            references,
            protein_dbs,
            out_dir,
        ),
    }
}

fn run_annotate(
    config: AnnotatorConfig,
    alignments_path: PathBuf,
    nucl_db: PathBuf,
    out: PathBuf,
    manual_ids: Option<PathBuf>,
) -> Result<()> {
    let db = BlastDbCmd::new(nucl_db).with_bin_dir(config.blast_bin_dir.clone());
    let records = read_alignment_table(&alignments_path, &db).with_context(|| {
        format!("failed to read alignments from {}", alignments_path.display())
    })?;

    let run = Annotator::new(config)
        .annotate(&db, records)
        .context("ORF annotation failed")?;

    write_annotated_table(&out, &run.output.annotated)
        .with_context(|| format!("failed to write {}", out.display()))?;
    if let Some(path) = manual_ids {
        let ids: String = run
            .partition
            .gapped()
            .keys()
            .map(|id| format!("{id}\n"))
            .collect();
        fs::write(&path, ids).with_context(|| format!("failed to write {}", path.display()))?;
    }

    tracing::info!(
        annotated = run.output.annotated.len(),
        demoted = run.output.missing_start.len(),
        manual = run.partition.gapped().len(),
        "annotation written"
    );
    println!(
        "annotated {} ORFs; {} alignments need manual handling ({} without a start codon)",
        run.output.annotated.len(),
        run.partition.gapped().len(),
        run.output.missing_start.len()
    );
    Ok(())
}

fn run_reconcile(
    config: AnnotatorConfig,
    manual_path: PathBuf,
    nucl_db: PathBuf,
    references: Vec<(String, String)>,
    protein_dbs: Vec<(String, String)>,
    out_dir: PathBuf,
) -> Result<()> {
    let protein_dbs: HashMap<String, String> = protein_dbs.into_iter().collect();
    let mut contexts = Vec::with_capacity(references.len());
    for (species, protein_id) in references {
        let Some(protein_db) = protein_dbs.get(&species) else {
            bail!("no --protein-db given for query species '{species}'");
        };
        contexts.push(ReferenceContext::new(species.as_str(), protein_id, protein_db.as_str()));
    }

    let scaffolds = read_manual_table(&manual_path)
        .with_context(|| format!("failed to read {}", manual_path.display()))?;

    let db = BlastDbCmd::new(nucl_db).with_bin_dir(config.blast_bin_dir.clone());
    let search =
        BlastSearch::new(config.search_threads).with_bin_dir(config.blast_bin_dir.clone());
    let report = Annotator::new(config)
        .reconcile(&db, &search, contexts, &scaffolds)
        .context("reconciliation failed")?;

    write_reconciliation_tables(&out_dir, &report)
        .with_context(|| format!("failed to write tables to {}", out_dir.display()))?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &ReconciliationReport) {
    let counts = report.species_counts();
    let sections: [(&str, fn(&orfmend::reconcile::SpeciesCounts) -> usize); 5] = [
        ("need further manual annotation", |c| c.further_annotation),
        ("selected the longer sequence", |c| c.auto_annotated),
        ("combined", |c| c.combined),
        ("removed", |c| c.removed),
        ("unresolved", |c| c.unresolved),
    ];
    for (title, pick) in sections {
        println!("{title}");
        for (species, tally) in &counts {
            let n = pick(tally);
            if n > 0 {
                println!("{species}: {n}");
            }
        }
    }
}
