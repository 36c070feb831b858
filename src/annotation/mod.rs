//! ORF annotation of single alignments.
//!
//! Raw alignments are split by the [`GapClassifier`]; clean ones go through
//! the [`OrfAnnotationPipeline`], which uses the [`CodonBoundaryResolver`] to
//! find stop and start codons and demotes records without a start codon back
//! to the gapped side.

mod gaps;
mod pipeline;
mod resolver;
mod types;

pub use gaps::{GapClassifier, GapPartition, DEFAULT_GAP_RUN_THRESHOLD};
pub use pipeline::{OrfAnnotationPipeline, PipelineOutput};
pub use resolver::{scan_orf, CodonBoundaryResolver, ResolverError};
pub use types::{AlignmentRecord, AnnotatedOrf, OrfCall};
