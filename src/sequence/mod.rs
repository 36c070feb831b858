//! Nucleotide primitives shared by the resolver and the splice stitcher.
//!
//! Everything here works on ASCII bytes as returned by the sequence database
//! and treats bases case-insensitively.

mod codon;

pub use codon::{
    find_first, find_last, is_start_codon, is_stop_codon, reverse_complement, translate, Strand,
    START_CODON, STOP_CODONS,
};
