use super::GatewayError;

/// Second-token markers of unnamed species (`Candida sp.`, `Pichia aff.`).
const UNNAMED_MARKERS: [&str; 2] = ["sp.", "aff."];
/// Strain/collection prefixes that belong to an unnamed species' name.
const COLLECTION_PREFIXES: [&str; 9] = [
    "NRRL", "CBS", "JCM", "NYNU", "CRUB", "Ashbya", "UWO(PS)", "MTCC", "UWOPS",
];
/// Marker of metagenome-assembled genomes.
const MAG_MARKER: &str = "MAG";

fn is_one_of(token: Option<&&str>, candidates: &[&str]) -> bool {
    token.is_some_and(|token| candidates.iter().any(|c| token.eq_ignore_ascii_case(c)))
}

fn join(tokens: &[&str], from: usize, to: usize) -> String {
    let to = to.min(tokens.len());
    let from = from.min(to);
    tokens[from..to].join(" ")
}

/// Extract the species name from a database descriptor of the form
/// `ACCESSION Genus epithet [strain ...]`.
pub fn parse_species_name(descriptor: &str) -> Result<String, GatewayError> {
    let cleaned: String = descriptor
        .trim()
        .trim_start_matches('>')
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '\''))
        .collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(GatewayError::UnparseableSpecies(descriptor.to_string()));
    }

    let name = if tokens.iter().any(|t| t.eq_ignore_ascii_case(MAG_MARKER)) {
        join(&tokens, 3, 7)
    } else if is_one_of(tokens.get(2), &UNNAMED_MARKERS) {
        if is_one_of(tokens.get(3), &COLLECTION_PREFIXES) {
            join(&tokens, 1, 5)
        } else {
            join(&tokens, 1, 4)
        }
    } else {
        join(&tokens, 1, 3)
    };

    if name.is_empty() {
        return Err(GatewayError::UnparseableSpecies(descriptor.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("NC_001133.9 Saccharomyces cerevisiae S288C chromosome I", "Saccharomyces cerevisiae" ; "binomial")]
    #[test_case(">CP017623.1 [Candida] albicans SC5314 chromosome 1", "Candida albicans" ; "bracketed genus")]
    #[test_case("JAB1.1 Candida sp. CBS 12345 contig_7", "Candida sp. CBS 12345" ; "collection strain")]
    #[test_case("JAB2.1 Pichia aff. kudriavzevii contig_2", "Pichia aff. kudriavzevii" ; "affinis")]
    #[test_case("JAB3.1 MAG TPA_asm: Candida 'sake' isolate X contig_1", "Candida sake isolate X" ; "metagenome assembled")]
    fn species_names(descriptor: &str, expected: &str) {
        assert_eq!(parse_species_name(descriptor).unwrap(), expected);
    }

    #[test]
    fn too_short_descriptor_is_fatal() {
        assert!(matches!(
            parse_species_name("NC_1 scaffold"),
            Err(GatewayError::UnparseableSpecies(_))
        ));
    }
}
