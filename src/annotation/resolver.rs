//! Codon boundary resolution around a single alignment.
//!
//! The scaffold is addressed through plus-strand numbering on both strands:
//! for minus-strand alignments the antisense bases returned by the database
//! are reversed again so that index `i` holds the (complemented) base at plus
//! coordinate `i + 1`, and every codon is read by reversing its slice.

use thiserror::Error;
use tracing::debug;

use super::{AlignmentRecord, OrfCall};
use crate::gateway::{fetch_or_empty, SequenceDatabase};
use crate::sequence::{is_start_codon, is_stop_codon, Strand};

/// Errors raised by the resolver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolverError {
    /// Reading frame 0 carries no strand.
    #[error("alignment on {0} has reading frame 0")]
    ZeroFrame(String),
}

/// Codon read in 5'→3' order of the scanned strand.
fn read_codon(seq: &[u8], lo: usize, hi: usize, strand: Strand) -> Option<[u8; 3]> {
    let slice = seq.get(lo..hi)?;
    match (strand, slice) {
        (Strand::Plus, &[a, b, c]) => Some([a, b, c]),
        (Strand::Minus, &[a, b, c]) => Some([c, b, a]),
        _ => None,
    }
}

fn stop_at(seq: &[u8], lo: usize, hi: usize, strand: Strand) -> bool {
    read_codon(seq, lo, hi, strand).is_some_and(|codon| is_stop_codon(&codon))
}

fn start_at(seq: &[u8], lo: usize, hi: usize, strand: Strand) -> bool {
    read_codon(seq, lo, hi, strand).is_some_and(|codon| is_start_codon(&codon))
}

/// Upper bound on codon steps for any scan over a scaffold of `len` bases.
fn step_cap(len: usize) -> usize {
    len / 3 + 2
}

/// Scan an oriented scaffold for the ORF around one alignment.
///
/// `scaffold` must be indexed by plus-strand coordinate (see module docs).
/// `subject_start`/`subject_end` are the alignment's 1-based coordinates as
/// reported by the search, so `subject_start > subject_end` on minus.
pub fn scan_orf(
    scaffold: &[u8],
    strand: Strand,
    subject_start: u64,
    subject_end: u64,
    frame_offset: u8,
) -> OrfCall {
    let sstart = subject_start as usize;
    let send = subject_end as usize;
    let sentinel = usize::from(frame_offset);

    let (stop_five, five_prime_edge, stop_three, three_prime_edge, start) = match strand {
        Strand::Plus => {
            let (stop_three, three_edge) = plus_three_prime_stop(scaffold, send);
            let (stop_five, five_edge) = plus_five_prime_stop(scaffold, sstart, sentinel);
            let start = plus_start(scaffold, stop_five, stop_three);
            (stop_five, five_edge, stop_three, three_edge, start)
        }
        Strand::Minus => {
            let (stop_three, three_edge) = minus_three_prime_stop(scaffold, send, sentinel);
            let (stop_five, five_edge) = minus_five_prime_stop(scaffold, sstart);
            let start = minus_start(scaffold, stop_five, stop_three);
            (stop_five, five_edge, stop_three, three_edge, start)
        }
    };

    OrfCall {
        stop_five: stop_five as u64,
        start: start.map(|s| s as u64),
        stop_three: stop_three as u64,
        five_prime_edge,
        three_prime_edge,
    }
}

fn plus_three_prime_stop(seq: &[u8], subject_end: usize) -> (usize, bool) {
    let mut pos = subject_end;
    for _ in 0..step_cap(seq.len()) {
        if pos + 3 > seq.len() {
            return (pos + 1, true);
        }
        if stop_at(seq, pos, pos + 3, Strand::Plus) {
            return (pos + 1, false);
        }
        pos += 3;
    }
    (pos + 1, true)
}

fn plus_five_prime_stop(seq: &[u8], subject_start: usize, sentinel: usize) -> (usize, bool) {
    let mut pos = subject_start;
    for _ in 0..step_cap(seq.len().max(subject_start)) {
        if pos < 4 {
            return (sentinel, true);
        }
        // codon ending just before `pos`
        let is_stop = stop_at(seq, pos - 4, pos - 1, Strand::Plus);
        pos -= 3;
        if is_stop {
            return (pos, false);
        }
    }
    (sentinel, true)
}

fn plus_start(seq: &[u8], stop_five: usize, stop_three: usize) -> Option<usize> {
    let mut cur = stop_five + 2;
    for _ in 0..step_cap(seq.len()) {
        if cur >= stop_three {
            return None;
        }
        if start_at(seq, cur, cur + 3, Strand::Plus) {
            return Some(cur + 1);
        }
        cur += 3;
    }
    None
}

fn minus_three_prime_stop(seq: &[u8], subject_end: usize, sentinel: usize) -> (usize, bool) {
    let mut pos = subject_end;
    for _ in 0..step_cap(seq.len().max(subject_end)) {
        if pos < 4 {
            return (sentinel, true);
        }
        if stop_at(seq, pos - 4, pos - 1, Strand::Minus) {
            return (pos - 3, false);
        }
        pos -= 3;
    }
    (sentinel, true)
}

fn minus_five_prime_stop(seq: &[u8], subject_start: usize) -> (usize, bool) {
    let mut pos = subject_start;
    for _ in 0..step_cap(seq.len()) {
        if pos + 3 > seq.len() {
            return (pos.saturating_sub(2), true);
        }
        if stop_at(seq, pos, pos + 3, Strand::Minus) {
            return (pos + 1, false);
        }
        pos += 3;
    }
    (pos.saturating_sub(2), true)
}

fn minus_start(seq: &[u8], stop_five: usize, stop_three: usize) -> Option<usize> {
    let mut cur = stop_five.saturating_sub(4);
    for _ in 0..step_cap(seq.len().max(stop_five)) {
        // the start codon must lie wholly upstream of the 3' stop
        if cur < stop_three + 3 {
            return None;
        }
        let found = cur
            .checked_sub(3)
            .is_some_and(|lo| start_at(seq, lo, cur, Strand::Minus));
        if found {
            return Some(cur - 2);
        }
        cur = cur.saturating_sub(3);
    }
    None
}

/// Resolves ORF boundaries by fetching scaffolds from a sequence database.
///
/// Nothing is cached: every call fetches the scaffold again.
#[derive(Debug)]
pub struct CodonBoundaryResolver<'a, D: ?Sized> {
    db: &'a D,
}

impl<'a, D: SequenceDatabase + ?Sized> CodonBoundaryResolver<'a, D> {
    /// Resolver reading scaffolds from `db`.
    pub fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Database the resolver reads from.
    pub fn database(&self) -> &'a D {
        self.db
    }

    /// Locate the stops and the start codon around `record`.
    pub fn resolve(&self, record: &AlignmentRecord) -> Result<OrfCall, ResolverError> {
        if record.reading_frame == 0 {
            return Err(ResolverError::ZeroFrame(record.subject_id.clone()));
        }
        let strand = record.strand();
        let mut scaffold = fetch_or_empty(self.db, &record.subject_id, strand, None);
        if strand == Strand::Minus {
            scaffold.reverse();
        }

        let call = scan_orf(
            &scaffold,
            strand,
            record.subject_start,
            record.subject_end,
            record.reading_frame.unsigned_abs(),
        );
        debug!(
            subject = %record.subject_id,
            frame = record.reading_frame,
            stop_five = call.stop_five,
            start = ?call.start,
            stop_three = call.stop_three,
            "resolved codon boundaries"
        );
        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaffold_with(len: usize, codons: &[(usize, &[u8; 3])]) -> Vec<u8> {
        let mut seq = vec![b'C'; len];
        for (pos, codon) in codons {
            seq[pos - 1..pos + 2].copy_from_slice(&codon[..]);
        }
        seq
    }

    #[test]
    fn plus_strand_finds_flanking_stops_and_start() {
        let seq = scaffold_with(200, &[(70, b"TAA"), (88, b"ATG"), (160, b"TAG")]);
        let call = scan_orf(&seq, Strand::Plus, 100, 129, 1);
        assert_eq!(call.stop_five, 70);
        assert_eq!(call.start, Some(88));
        assert_eq!(call.stop_three, 160);
        assert!(!call.five_prime_edge && !call.three_prime_edge);
    }

    #[test]
    fn plus_strand_edges_use_sentinels() {
        let seq = scaffold_with(60, &[(22, b"atg")]);
        let call = scan_orf(&seq, Strand::Plus, 31, 45, 1);
        assert!(call.five_prime_edge);
        assert_eq!(call.stop_five, 1);
        assert!(call.three_prime_edge);
        assert_eq!(call.stop_three, 61);
        assert_eq!(call.start, Some(22));
    }

    #[test]
    fn out_of_frame_start_is_ignored() {
        let seq = scaffold_with(200, &[(70, b"TGA"), (89, b"ATG"), (160, b"TAA")]);
        let call = scan_orf(&seq, Strand::Plus, 100, 129, 1);
        assert_eq!(call.start, None);
    }

    #[test]
    fn minus_strand_mirrors_plus_arithmetic() {
        // Antisense reading (5'→3' on minus) laid out like the plus test.
        let antisense = scaffold_with(200, &[(70, b"TAA"), (88, b"ATG"), (160, b"TAG")]);
        // Oriented scaffold: plus numbering, complemented bases.
        let mut oriented = antisense;
        oriented.reverse();

        let call = scan_orf(&oriented, Strand::Minus, 101, 72, 1);
        assert_eq!(call.stop_five, 129);
        assert_eq!(call.start, Some(111));
        assert_eq!(call.stop_three, 39);
    }

    #[test]
    fn minus_start_scan_skips_codon_adjacent_to_stop() {
        let antisense = scaffold_with(200, &[(70, b"TAA"), (73, b"ATG"), (160, b"TAG")]);
        let mut oriented = antisense;
        oriented.reverse();

        let call = scan_orf(&oriented, Strand::Minus, 101, 72, 1);
        assert_eq!(call.stop_five, 129);
        assert_eq!(call.start, None);
    }

    #[test]
    fn minus_start_beyond_edge_sentinel_is_rejected() {
        // reads ATG on minus at plus coordinates 1..3, past the 3' sentinel
        let mut oriented = vec![b'C'; 60];
        oriented[..3].copy_from_slice(b"GTA");

        let call = scan_orf(&oriented, Strand::Minus, 30, 10, 2);
        assert!(call.three_prime_edge);
        assert_eq!(call.stop_three, 2);
        assert_eq!(call.start, None);
    }

    #[test]
    fn empty_scaffold_yields_no_start() {
        let call = scan_orf(&[], Strand::Plus, 10, 40, 2);
        assert_eq!(call.start, None);
        assert!(call.five_prime_edge && call.three_prime_edge);
    }
}
