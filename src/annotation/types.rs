use crate::sequence::Strand;

/// One raw hit between the query protein and a genomic scaffold.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentRecord {
    /// Scaffold accession.
    pub subject_id: String,
    /// Species owning the scaffold.
    pub species_name: String,
    /// 1-based alignment start on the scaffold (greater than `subject_end` on minus).
    pub subject_start: u64,
    /// 1-based alignment end on the scaffold.
    pub subject_end: u64,
    /// Signed reading frame; the sign is the strand, the magnitude 1..=3.
    pub reading_frame: i8,
    /// Alignment start on the query protein.
    pub query_start: u64,
    /// Alignment end on the query protein.
    pub query_end: u64,
    /// Alignment length.
    pub alignment_length: u64,
    /// Number of mismatches.
    pub mismatch_count: u64,
    /// Total number of gaps.
    pub gap_count: u64,
    /// Aligned query residues including `-` gaps.
    pub query_alignment: String,
    /// Aligned subject residues including `-` gaps.
    pub subject_alignment: String,
}

impl AlignmentRecord {
    /// Strand encoded by the reading frame.
    pub fn strand(&self) -> Strand {
        Strand::from_frame(self.reading_frame)
    }
}

/// Stop/start boundaries found around one alignment.
///
/// Coordinates are 1-based positions on the plus-strand numbering of the
/// scaffold. On the plus strand `stop_five < start < stop_three`; on the
/// minus strand the order is reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrfCall {
    /// Upstream in-frame stop, or the edge sentinel.
    pub stop_five: u64,
    /// First start codon downstream of `stop_five`, if any.
    pub start: Option<u64>,
    /// Downstream in-frame stop, or the edge sentinel.
    pub stop_three: u64,
    /// `stop_five` is a scaffold-edge sentinel rather than a stop codon.
    pub five_prime_edge: bool,
    /// `stop_three` is a scaffold-edge sentinel rather than a stop codon.
    pub three_prime_edge: bool,
}

impl OrfCall {
    /// Whether a start codon was found.
    pub fn has_start(&self) -> bool {
        self.start.is_some()
    }
}

/// Final coding sequence for a clean alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotatedOrf {
    /// Species owning the scaffold.
    pub species_name: String,
    /// First coordinate as reported (start codon on plus, upper bound on minus).
    pub start: u64,
    /// Second coordinate as reported (last coding base on plus, lower bound on minus).
    pub stop: u64,
    /// Signed reading frame of the source alignment.
    pub reading_frame: i8,
    /// Coding sequence, start codon through the last sense codon.
    pub sequence: String,
}
