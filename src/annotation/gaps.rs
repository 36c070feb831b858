use std::collections::BTreeMap;

use tracing::debug;

use super::AlignmentRecord;

/// Gap run that marks a query alignment as needing manual handling.
pub const DEFAULT_GAP_RUN_THRESHOLD: usize = 10;

/// Alignment records split by whether their query alignment contains a long
/// gap run.
///
/// Records only ever move from `clean` to `gapped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapPartition {
    clean: BTreeMap<String, AlignmentRecord>,
    gapped: BTreeMap<String, AlignmentRecord>,
}

impl GapPartition {
    /// Records usable for automatic ORF annotation.
    pub fn clean(&self) -> &BTreeMap<String, AlignmentRecord> {
        &self.clean
    }

    /// Records routed to manual / multi-alignment handling.
    pub fn gapped(&self) -> &BTreeMap<String, AlignmentRecord> {
        &self.gapped
    }

    /// Total number of records in both sides.
    pub fn len(&self) -> usize {
        self.clean.len() + self.gapped.len()
    }

    /// `true` when no records were partitioned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move `ids` from the clean side to the gapped side.
    ///
    /// Ids not present on the clean side are ignored. Returns the number of
    /// records moved.
    pub fn demote<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut moved = 0;
        for id in ids {
            if let Some(record) = self.clean.remove(id) {
                debug!(subject = id, "demoting clean alignment to manual handling");
                self.gapped.insert(id.to_string(), record);
                moved += 1;
            }
        }
        moved
    }

    /// Consume the partition, returning `(clean, gapped)`.
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<String, AlignmentRecord>,
        BTreeMap<String, AlignmentRecord>,
    ) {
        (self.clean, self.gapped)
    }
}

/// Splits alignment records on a configurable gap-run threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapClassifier {
    threshold: usize,
}

impl Default for GapClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_GAP_RUN_THRESHOLD)
    }
}

impl GapClassifier {
    /// Classifier flagging runs of at least `threshold` gap characters.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    /// Configured gap-run threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether `alignment` contains a run of at least `threshold` `-` characters.
    pub fn has_long_gap(&self, alignment: &str) -> bool {
        let mut run = 0usize;
        for b in alignment.bytes() {
            if b == b'-' {
                run += 1;
                if run >= self.threshold {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    }

    /// Partition `records` by their query alignment.
    ///
    /// A later record with the same subject id replaces an earlier one.
    pub fn partition<I>(&self, records: I) -> GapPartition
    where
        I: IntoIterator<Item = AlignmentRecord>,
    {
        let mut partition = GapPartition::default();
        for record in records {
            let id = record.subject_id.clone();
            if self.has_long_gap(&record.query_alignment) {
                partition.clean.remove(&id);
                partition.gapped.insert(id, record);
            } else {
                partition.gapped.remove(&id);
                partition.clean.insert(id, record);
            }
        }
        debug!(
            clean = partition.clean.len(),
            gapped = partition.gapped.len(),
            threshold = self.threshold,
            "partitioned alignments by query gap runs"
        );
        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("MKV---------LLA", 10, false ; "nine gaps")]
    #[test_case("MKV----------LLA", 10, true ; "ten gaps")]
    #[test_case("M-K-V-L-L-A-----", 5, true ; "trailing run")]
    #[test_case("-----", 6, false ; "short run below custom threshold")]
    fn long_gap_detection(alignment: &str, threshold: usize, expected: bool) {
        assert_eq!(GapClassifier::new(threshold).has_long_gap(alignment), expected);
    }
}
