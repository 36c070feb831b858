//! Intron splice stitching of two exon fragments.
//!
//! The upstream fragment is cut at its rightmost `GT` donor and the
//! downstream fragment just after its leftmost `AG` acceptor. Candidates that
//! keep the frame are checked by a reciprocal `blastp`; rejected candidates
//! are shrunk to the cut sequences and searched again.

use tracing::debug;

use super::{Fragment, ReconcileError, ReferenceContext, ScaffoldFragments, ScaffoldKey};
use crate::gateway::{
    fetch_or_empty, search_or_empty, HomologySearch, SearchProgram, SearchQuery, SequenceDatabase,
};
use crate::sequence::{find_first, find_last, translate, Strand};

const DONOR: &[u8] = b"GT";
const ACCEPTOR: &[u8] = b"AG";

/// Gene model produced by joining two fragments across an intron.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SplicedGene {
    /// Species owning the scaffold.
    pub species_name: String,
    /// Subject start of the upstream fragment.
    pub combined_start: u64,
    /// Subject stop of the downstream fragment.
    pub combined_stop: u64,
    /// Scaffold coordinate of the `G` of the donor `GT`.
    pub intron_start: u64,
    /// Scaffold coordinate of the `G` of the acceptor `AG`.
    pub intron_stop: u64,
    /// Donor position within the upstream fragment sequence.
    pub donor_offset: usize,
    /// Acceptor position within the downstream fragment sequence.
    pub acceptor_offset: usize,
    /// Joined coding sequence.
    pub coding_sequence: String,
    /// Translation of `coding_sequence`, stops removed.
    pub protein: String,
}

/// Joins two same-strand fragments over a canonical `GT..AG` intron.
#[derive(Debug)]
pub struct IntronSpliceStitcher<'a, D: ?Sized, S: ?Sized> {
    db: &'a D,
    search: &'a S,
}

impl<'a, D, S> IntronSpliceStitcher<'a, D, S>
where
    D: SequenceDatabase + ?Sized,
    S: HomologySearch + ?Sized,
{
    /// Stitcher over the given gateways.
    pub fn new(db: &'a D, search: &'a S) -> Self {
        Self { db, search }
    }

    /// Stitch the two fragments of `scaffold`.
    pub fn stitch(
        &self,
        scaffold: &ScaffoldFragments,
        reference: &ReferenceContext,
    ) -> Result<SplicedGene, ReconcileError> {
        let key = ScaffoldKey::of(scaffold);
        let [a, b] = scaffold.fragments.as_slice() else {
            return Err(ReconcileError::UnsupportedFragmentCount {
                key,
                count: scaffold.fragments.len(),
            });
        };
        if !scaffold.single_strand() {
            return Err(ReconcileError::MixedStrand(key));
        }

        let strand = a.strand();
        let (upstream, downstream) = match strand {
            Strand::Plus if a.subject_start < b.subject_start => (a, b),
            Strand::Plus => (b, a),
            Strand::Minus if a.subject_start > b.subject_start => (a, b),
            Strand::Minus => (b, a),
        };
        let seq1 = fetch_or_empty(self.db, &scaffold.scaffold_id, strand, Some(upstream.subject_span()));
        let seq2 = fetch_or_empty(self.db, &scaffold.scaffold_id, strand, Some(downstream.subject_span()));

        let Some((donor_offset, acceptor_offset, coding)) =
            self.search_junction(scaffold, reference, &seq1, &seq2)
        else {
            return Err(ReconcileError::NoValidCombination(key));
        };

        let (intron_start, intron_stop) =
            intron_bounds(strand, upstream, downstream, donor_offset, acceptor_offset);
        let protein = translate(&coding);
        debug!(
            scaffold = %key,
            intron_start,
            intron_stop,
            protein_length = protein.len(),
            "spliced fragments"
        );
        Ok(SplicedGene {
            species_name: scaffold.species_name.clone(),
            combined_start: upstream.subject_start,
            combined_stop: downstream.subject_stop,
            intron_start,
            intron_stop,
            donor_offset,
            acceptor_offset,
            coding_sequence: String::from_utf8_lossy(&coding).into_owned(),
            protein,
        })
    }

    /// Shrink-and-validate loop. Returns the donor offset in `seq1`, the
    /// acceptor offset in `seq2` and the accepted coding sequence.
    fn search_junction(
        &self,
        scaffold: &ScaffoldFragments,
        reference: &ReferenceContext,
        seq1: &[u8],
        seq2: &[u8],
    ) -> Option<(usize, usize, Vec<u8>)> {
        let mut left = seq1;
        let mut right = seq2;
        // bases trimmed from the front of seq2 so far
        let mut trimmed = 0usize;

        for _ in 0..=seq1.len() + seq2.len() {
            let donor = find_last(left, DONOR)?;
            let acceptor = find_first(right, ACCEPTOR)?;

            let head = &left[..donor];
            let tail = &right[acceptor + ACCEPTOR.len()..];
            let mut candidate = Vec::with_capacity(head.len() + tail.len());
            candidate.extend_from_slice(head);
            candidate.extend_from_slice(tail);

            if candidate.len() % 3 == 0 && self.reciprocal_match(scaffold, reference, &candidate) {
                return Some((donor, trimmed + acceptor, candidate));
            }
            debug!(
                scaffold = %scaffold.scaffold_id,
                donor,
                acceptor = trimmed + acceptor,
                "rejected splice candidate"
            );

            left = head;
            right = tail;
            trimmed += acceptor + ACCEPTOR.len();
        }
        None
    }

    /// Whether the translated candidate hits only the reference protein.
    fn reciprocal_match(
        &self,
        scaffold: &ScaffoldFragments,
        reference: &ReferenceContext,
        coding: &[u8],
    ) -> bool {
        let query = SearchQuery::new(
            scaffold.scaffold_id.as_str(),
            scaffold.species_name.as_str(),
            translate(coding).into_bytes(),
        );
        let hits = search_or_empty(self.search, SearchProgram::BlastP, &query, &reference.protein_db);
        !hits.is_empty()
            && hits
                .iter()
                .all(|hit| hit.subject_id == reference.reference_protein_id)
    }
}

/// Scaffold coordinates of the first and last intron base.
fn intron_bounds(
    strand: Strand,
    upstream: &Fragment,
    downstream: &Fragment,
    donor_offset: usize,
    acceptor_offset: usize,
) -> (u64, u64) {
    let donor = donor_offset as u64;
    // the acceptor's G sits one past its A
    let acceptor = acceptor_offset as u64 + 1;
    match strand {
        Strand::Plus => (
            upstream.subject_span().0 + donor,
            downstream.subject_span().0 + acceptor,
        ),
        Strand::Minus => (
            upstream.subject_span().1 - donor,
            downstream.subject_span().1 - acceptor,
        ),
    }
}
