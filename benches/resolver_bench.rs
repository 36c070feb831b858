//! Codon boundary and gap classification benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orfmend::annotation::{scan_orf, GapClassifier};
use orfmend::sequence::Strand;
use orfmend::AlignmentRecord;

fn scaffold(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_u32;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            b"ACGT"[(state >> 16) as usize % 4]
        })
        .collect()
}

fn benchmark_scan(c: &mut Criterion) {
    let seq = scaffold(1_000_000);

    c.bench_function("scan_orf_plus_1mb", |b| {
        b.iter(|| black_box(scan_orf(black_box(&seq), Strand::Plus, 500_001, 500_300, 1)));
    });
    c.bench_function("scan_orf_minus_1mb", |b| {
        b.iter(|| black_box(scan_orf(black_box(&seq), Strand::Minus, 500_300, 500_001, 2)));
    });
}

fn benchmark_partition(c: &mut Criterion) {
    let records: Vec<AlignmentRecord> = (0..10_000)
        .map(|i| AlignmentRecord {
            subject_id: format!("scf{i}"),
            species_name: "Candida albicans".to_string(),
            subject_start: 100,
            subject_end: 399,
            reading_frame: 1,
            query_start: 1,
            query_end: 100,
            alignment_length: 100,
            mismatch_count: 0,
            gap_count: (i % 16) as u64,
            query_alignment: format!("MK{}LL", "-".repeat(i % 16)),
            subject_alignment: "MKAAAAAAAAAAAAAAAALL".to_string(),
        })
        .collect();
    let classifier = GapClassifier::default();

    c.bench_function("partition_10k_records", |b| {
        b.iter(|| black_box(classifier.partition(records.clone())));
    });
}

criterion_group!(benches, benchmark_scan, benchmark_partition);
criterion_main!(benches);
