use orfmend::annotation::scan_orf;
use orfmend::sequence::Strand;
use proptest::prelude::*;

fn bases() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T')],
        60..300,
    )
}

/// In-frame alignment of `codons` codons placed by `seed`.
fn alignment(len: usize, seed: usize, codons: usize) -> (u64, u64) {
    let span = 3 * codons;
    let low = 1 + seed % (len - span + 1);
    (low as u64, (low + span - 1) as u64)
}

proptest! {
    #[test]
    fn plus_boundaries_are_ordered(
        scaffold in bases(),
        seed in 0usize..10_000,
        codons in 1usize..20,
        frame in 1u8..=3,
    ) {
        let (low, high) = alignment(scaffold.len(), seed, codons);
        let call = scan_orf(&scaffold, Strand::Plus, low, high, frame);
        if let Some(start) = call.start {
            prop_assert!(call.stop_five < start, "{call:?}");
            prop_assert!(start < call.stop_three, "{call:?}");
        }
        prop_assert_eq!(call, scan_orf(&scaffold, Strand::Plus, low, high, frame));
    }

    #[test]
    fn minus_boundaries_are_ordered(
        scaffold in bases(),
        seed in 0usize..10_000,
        codons in 1usize..20,
        frame in 1u8..=3,
    ) {
        let (low, high) = alignment(scaffold.len(), seed, codons);
        let call = scan_orf(&scaffold, Strand::Minus, high, low, frame);
        if let Some(start) = call.start {
            prop_assert!(start < call.stop_five, "{call:?}");
            prop_assert!(start > call.stop_three, "{call:?}");
        }
    }
}
