use std::fmt;

/// Canonical start codon.
pub const START_CODON: &[u8; 3] = b"ATG";
/// Stop codons of the standard genetic code.
pub const STOP_CODONS: [&[u8; 3]; 3] = [b"TAA", b"TAG", b"TGA"];

/// Standard genetic code (NCBI table 1) indexed by `16 * b1 + 4 * b2 + b3`
/// with bases ordered T, C, A, G.
const STANDARD_CODE: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

/// Genomic strand of a scaffold read or fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    /// Forward strand.
    Plus,
    /// Reverse strand.
    Minus,
}

impl Strand {
    /// Strand encoded by the sign of a BLAST reading frame.
    pub fn from_frame(frame: i8) -> Self {
        if frame > 0 {
            Strand::Plus
        } else {
            Strand::Minus
        }
    }

    /// Name used by `blastdbcmd -strand`.
    pub fn as_str(self) -> &'static str {
        match self {
            Strand::Plus => "plus",
            Strand::Minus => "minus",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn codon_eq(codon: &[u8], expected: &[u8; 3]) -> bool {
    codon.len() == 3 && codon.eq_ignore_ascii_case(expected)
}

/// `true` for `TAA`, `TAG` or `TGA` in any case. Shorter slices never match.
pub fn is_stop_codon(codon: &[u8]) -> bool {
    STOP_CODONS.iter().any(|stop| codon_eq(codon, stop))
}

/// `true` for `ATG` in any case.
pub fn is_start_codon(codon: &[u8]) -> bool {
    codon_eq(codon, START_CODON)
}

/// Reverse complement; IUPAC codes other than ACGT/U pass through unchanged.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'T' | b'U' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            b'a' => b't',
            b't' | b'u' => b'a',
            b'c' => b'g',
            b'g' => b'c',
            other => other,
        })
        .collect()
}

fn base_code(base: u8) -> Option<usize> {
    match base {
        b'T' | b't' | b'U' | b'u' => Some(0),
        b'C' | b'c' => Some(1),
        b'A' | b'a' => Some(2),
        b'G' | b'g' => Some(3),
        _ => None,
    }
}

/// Translate with the standard code, dropping stop symbols.
///
/// A trailing partial codon is ignored and codons containing ambiguous bases
/// translate to `X`.
pub fn translate(seq: &[u8]) -> String {
    seq.chunks_exact(3)
        .filter_map(|codon| {
            let residue = match (base_code(codon[0]), base_code(codon[1]), base_code(codon[2])) {
                (Some(a), Some(b), Some(c)) => STANDARD_CODE[16 * a + 4 * b + c],
                _ => b'X',
            };
            (residue != b'*').then_some(residue as char)
        })
        .collect()
}

/// Index of the leftmost occurrence of `motif`, ignoring case.
pub fn find_first(haystack: &[u8], motif: &[u8]) -> Option<usize> {
    if motif.is_empty() || haystack.len() < motif.len() {
        return None;
    }
    haystack
        .windows(motif.len())
        .position(|window| window.eq_ignore_ascii_case(motif))
}

/// Index of the rightmost occurrence of `motif`, ignoring case.
pub fn find_last(haystack: &[u8], motif: &[u8]) -> Option<usize> {
    if motif.is_empty() || haystack.len() < motif.len() {
        return None;
    }
    haystack
        .windows(motif.len())
        .rposition(|window| window.eq_ignore_ascii_case(motif))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"TAA", true ; "ochre")]
    #[test_case(b"tag", true ; "lowercase amber")]
    #[test_case(b"TgA", true ; "mixed case opal")]
    #[test_case(b"ATG", false ; "start codon")]
    #[test_case(b"TA", false ; "truncated")]
    fn stop_codon_matching(codon: &[u8], expected: bool) {
        assert_eq!(is_stop_codon(codon), expected);
    }

    #[test]
    fn start_codon_is_case_insensitive() {
        assert!(is_start_codon(b"atg"));
        assert!(!is_start_codon(b"ATGA"));
    }

    #[test]
    fn translation_drops_stops_and_partial_codons() {
        assert_eq!(translate(b"ATGGCCTAAGG"), "MA");
        assert_eq!(translate(b"ATGNNNTGG"), "MXW");
    }

    #[test]
    fn motif_search_directions() {
        let seq = b"AGTCCGTAAG";
        assert_eq!(find_first(seq, b"GT"), Some(1));
        assert_eq!(find_last(seq, b"GT"), Some(5));
        assert_eq!(find_first(seq, b"TT"), None);
        assert_eq!(find_last(b"G", b"GT"), None);
    }

    #[test]
    fn reverse_complement_preserves_case() {
        assert_eq!(reverse_complement(b"ACGTn"), b"nACGT");
        assert_eq!(reverse_complement(b"aacg"), b"cgtt");
    }
}
