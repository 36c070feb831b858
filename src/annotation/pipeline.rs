use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{AlignmentRecord, AnnotatedOrf, CodonBoundaryResolver, GapPartition, ResolverError};
use crate::gateway::{fetch_or_empty, SequenceDatabase};
use crate::sequence::Strand;

/// Result of annotating the clean side of a partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Final coding sequences keyed by subject id.
    pub annotated: BTreeMap<String, AnnotatedOrf>,
    /// Subject ids for which no start codon was found.
    pub missing_start: Vec<String>,
}

/// Drives the codon boundary resolver over clean alignments and extracts
/// the final coding sequences.
#[derive(Debug)]
pub struct OrfAnnotationPipeline<'a, D: ?Sized> {
    resolver: CodonBoundaryResolver<'a, D>,
}

impl<'a, D: SequenceDatabase + ?Sized> OrfAnnotationPipeline<'a, D> {
    /// Pipeline reading scaffolds from `db`.
    pub fn new(db: &'a D) -> Self {
        Self {
            resolver: CodonBoundaryResolver::new(db),
        }
    }

    /// Annotate one record; `None` when no start codon was found.
    pub fn annotate_record(
        &self,
        record: &AlignmentRecord,
    ) -> Result<Option<AnnotatedOrf>, ResolverError> {
        let call = self.resolver.resolve(record)?;
        let Some(start) = call.start else {
            return Ok(None);
        };

        let strand = record.strand();
        // Reported order follows the strand: 5' end first.
        let (reported_start, reported_stop, range) = match strand {
            Strand::Plus => {
                let stop = call.stop_three - 1;
                (start, stop, (start, stop))
            }
            Strand::Minus => {
                let upper = start + 2;
                let lower = call.stop_three + 3;
                (upper, lower, (lower, upper))
            }
        };

        let bases = fetch_or_empty(
            self.resolver.database(),
            &record.subject_id,
            strand,
            Some(range),
        );
        Ok(Some(AnnotatedOrf {
            species_name: record.species_name.clone(),
            start: reported_start,
            stop: reported_stop,
            reading_frame: record.reading_frame,
            sequence: String::from_utf8_lossy(&bases).into_owned(),
        }))
    }

    /// Annotate every record in `clean`. Nothing is retried.
    pub fn annotate(
        &self,
        clean: &BTreeMap<String, AlignmentRecord>,
    ) -> Result<PipelineOutput, ResolverError> {
        let mut output = PipelineOutput::default();
        for (id, record) in clean {
            match self.annotate_record(record)? {
                Some(orf) => {
                    output.annotated.insert(id.clone(), orf);
                }
                None => {
                    debug!(subject = %id, "no start codon found");
                    output.missing_start.push(id.clone());
                }
            }
        }
        Ok(output)
    }

    /// Annotate the clean side of `partition` and demote every record
    /// without a start codon to the gapped side.
    pub fn run(&self, partition: &mut GapPartition) -> Result<PipelineOutput, ResolverError> {
        let output = self.annotate(partition.clean())?;
        let demoted = partition.demote(output.missing_start.iter().map(String::as_str));
        info!(
            annotated = output.annotated.len(),
            demoted,
            "ORF annotation finished"
        );
        Ok(output)
    }
}
