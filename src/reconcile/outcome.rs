use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{info, warn};

use super::{Fragment, ReconcileError, ScaffoldFragments, SplicedGene};

/// Identity of one reconciled scaffold.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaffoldKey {
    /// Species of the query protein.
    pub query_species: String,
    /// Scaffold accession.
    pub scaffold_id: String,
}

impl ScaffoldKey {
    /// Key for `scaffold_id` under `query_species`.
    pub fn new(query_species: impl Into<String>, scaffold_id: impl Into<String>) -> Self {
        Self {
            query_species: query_species.into(),
            scaffold_id: scaffold_id.into(),
        }
    }

    /// Key of a manual-annotation record.
    pub fn of(scaffold: &ScaffoldFragments) -> Self {
        Self::new(&scaffold.query_species, &scaffold.scaffold_id)
    }
}

impl fmt::Display for ScaffoldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.query_species, self.scaffold_id)
    }
}

/// Decision taken for one scaffold.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// No fragment validated against the reference protein.
    Remove,
    /// Several fragments validated; needs a human.
    FurtherAnnotation,
    /// Keep a single fragment.
    Keep {
        /// Index into the scaffold's fragment list.
        fragment_index: usize,
    },
    /// Two fragments spliced into one gene.
    Combine(SplicedGene),
}

impl Outcome {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Remove => "remove",
            Outcome::FurtherAnnotation => "further-annotation",
            Outcome::Keep { .. } => "keep",
            Outcome::Combine(_) => "combine",
        }
    }
}

/// A scaffold whose reconciliation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedScaffold {
    /// Which scaffold.
    pub key: ScaffoldKey,
    /// Rendered error.
    pub reason: String,
}

/// One outcome per scaffold, plus the scaffolds that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeLedger {
    outcomes: BTreeMap<ScaffoldKey, Outcome>,
    unresolved: Vec<UnresolvedScaffold>,
}

impl OutcomeLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `key`. A second outcome for the same scaffold
    /// is an error and leaves the first one in place.
    pub fn record(&mut self, key: ScaffoldKey, outcome: Outcome) -> Result<(), ReconcileError> {
        match self.outcomes.entry(key) {
            Entry::Occupied(entry) => Err(ReconcileError::DuplicateOutcome(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(outcome);
                Ok(())
            }
        }
    }

    /// Note that `key` could not be reconciled.
    pub fn mark_unresolved(&mut self, key: ScaffoldKey, reason: impl Into<String>) {
        self.unresolved.push(UnresolvedScaffold {
            key,
            reason: reason.into(),
        });
    }

    /// Fold `other` into this ledger.
    ///
    /// Every outcome of `other` is taken unless this ledger already holds
    /// one for the same scaffold; such conflicts keep the existing outcome
    /// and are reported as the first duplicate. A scaffold never ends up
    /// both resolved and unresolved.
    pub fn merge(&mut self, other: OutcomeLedger) -> Result<(), ReconcileError> {
        let mut first_duplicate = None;
        for (key, outcome) in other.outcomes {
            if let Err(err) = self.record(key, outcome) {
                first_duplicate.get_or_insert(err);
            }
        }
        self.unresolved.extend(other.unresolved);
        self.unresolved.sort_by(|a, b| a.key.cmp(&b.key));
        first_duplicate.map_or(Ok(()), Err)
    }

    /// Outcome recorded for `key`.
    pub fn get(&self, key: &ScaffoldKey) -> Option<&Outcome> {
        self.outcomes.get(key)
    }

    /// Outcomes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ScaffoldKey, &Outcome)> {
        self.outcomes.iter()
    }

    /// Number of scaffolds with an outcome.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// `true` when no outcome has been recorded.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Scaffolds that failed.
    pub fn unresolved(&self) -> &[UnresolvedScaffold] {
        &self.unresolved
    }

    /// Build the final tables, looking up fragment details in `scaffolds`.
    ///
    /// Each scaffold lands in exactly one table; an unresolved entry for a
    /// scaffold that also has an outcome is dropped.
    pub fn into_report(self, scaffolds: &[ScaffoldFragments]) -> ReconciliationReport {
        let by_key: HashMap<ScaffoldKey, &ScaffoldFragments> = scaffolds
            .iter()
            .map(|scaffold| (ScaffoldKey::of(scaffold), scaffold))
            .collect();

        let outcomes = self.outcomes;
        let mut unresolved: Vec<_> = self
            .unresolved
            .into_iter()
            .filter(|row| !outcomes.contains_key(&row.key))
            .collect();
        unresolved.sort_by(|a, b| a.key.cmp(&b.key));
        unresolved.dedup_by(|a, b| a.key == b.key);
        let mut report = ReconciliationReport {
            unresolved,
            ..ReconciliationReport::default()
        };

        for (key, outcome) in outcomes {
            match outcome {
                Outcome::Remove => report.removed.push(key),
                Outcome::Combine(gene) => report.combined.push(CombinedGene { key, gene }),
                Outcome::FurtherAnnotation => match by_key.get(&key) {
                    Some(scaffold) => report.further_annotation.push((*scaffold).clone()),
                    None => warn!(scaffold = %key, "no manual record for scaffold; skipping"),
                },
                Outcome::Keep { fragment_index } => {
                    let kept = by_key.get(&key).and_then(|scaffold| {
                        scaffold
                            .fragments
                            .get(fragment_index)
                            .map(|fragment| (scaffold.species_name.clone(), *fragment))
                    });
                    match kept {
                        Some((species_name, fragment)) => report.auto_annotated.push(KeptAlignment {
                            key,
                            species_name,
                            fragment,
                        }),
                        None => warn!(scaffold = %key, fragment_index, "kept fragment not found; skipping"),
                    }
                }
            }
        }

        if !report.removed.is_empty() {
            info!(
                scaffolds = report.removed.len(),
                "all alignments of these scaffolds failed reciprocal search"
            );
            for key in &report.removed {
                info!(scaffold = %key, "removed");
            }
        }
        report
    }
}

/// Kept fragment of an auto-annotated scaffold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeptAlignment {
    /// Which scaffold.
    pub key: ScaffoldKey,
    /// Species owning the scaffold.
    pub species_name: String,
    /// The fragment that was kept.
    pub fragment: Fragment,
}

/// Spliced gene of a combined scaffold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedGene {
    /// Which scaffold.
    pub key: ScaffoldKey,
    /// Stitched gene model.
    pub gene: SplicedGene,
}

/// Per-species tally of reconciliation outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeciesCounts {
    /// Scaffolds needing manual review.
    pub further_annotation: usize,
    /// Scaffolds reduced to one fragment.
    pub auto_annotated: usize,
    /// Scaffolds spliced into one gene.
    pub combined: usize,
    /// Scaffolds discarded.
    pub removed: usize,
    /// Scaffolds that failed.
    pub unresolved: usize,
}

fn tally<'a>(
    counts: &'a mut BTreeMap<String, SpeciesCounts>,
    species: &str,
) -> &'a mut SpeciesCounts {
    counts.entry(species.to_string()).or_default()
}

/// Final reconciliation tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Full records of scaffolds needing manual review.
    pub further_annotation: Vec<ScaffoldFragments>,
    /// Scaffolds reduced to one fragment.
    pub auto_annotated: Vec<KeptAlignment>,
    /// Spliced genes.
    pub combined: Vec<CombinedGene>,
    /// Scaffolds whose every alignment failed reciprocal search.
    pub removed: Vec<ScaffoldKey>,
    /// Scaffolds whose reconciliation failed.
    pub unresolved: Vec<UnresolvedScaffold>,
}

impl ReconciliationReport {
    /// Outcome counts keyed by query species.
    pub fn species_counts(&self) -> BTreeMap<String, SpeciesCounts> {
        let mut counts = BTreeMap::new();
        for scaffold in &self.further_annotation {
            tally(&mut counts, &scaffold.query_species).further_annotation += 1;
        }
        for kept in &self.auto_annotated {
            tally(&mut counts, &kept.key.query_species).auto_annotated += 1;
        }
        for combined in &self.combined {
            tally(&mut counts, &combined.key.query_species).combined += 1;
        }
        for key in &self.removed {
            tally(&mut counts, &key.query_species).removed += 1;
        }
        for unresolved in &self.unresolved {
            tally(&mut counts, &unresolved.key.query_species).unresolved += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaffold(id: &str) -> ScaffoldFragments {
        ScaffoldFragments {
            query_species: "Saccharomyces cerevisiae".into(),
            scaffold_id: id.into(),
            species_name: "Candida albicans".into(),
            fragments: vec![
                Fragment {
                    subject_start: 10,
                    subject_stop: 90,
                    reading_frame: 1,
                    query_start: 1,
                    query_stop: 27,
                },
                Fragment {
                    subject_start: 400,
                    subject_stop: 250,
                    reading_frame: -2,
                    query_start: 30,
                    query_stop: 80,
                },
            ],
        }
    }

    fn key(id: &str) -> ScaffoldKey {
        ScaffoldKey::new("Saccharomyces cerevisiae", id)
    }

    #[test]
    fn duplicate_outcome_is_rejected() {
        let mut ledger = OutcomeLedger::new();
        ledger.record(key("a"), Outcome::Remove).unwrap();
        let err = ledger.record(key("a"), Outcome::FurtherAnnotation).unwrap_err();
        assert!(matches!(err, ReconcileError::DuplicateOutcome(k) if k == key("a")));
        assert_eq!(ledger.get(&key("a")), Some(&Outcome::Remove));
    }

    #[test]
    fn merge_rejects_overlapping_ledgers() {
        let mut left = OutcomeLedger::new();
        left.record(key("a"), Outcome::Remove).unwrap();
        let mut right = OutcomeLedger::new();
        right.record(key("b"), Outcome::FurtherAnnotation).unwrap();
        right.mark_unresolved(key("c"), "no valid combination");
        left.merge(right).unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(left.unresolved().len(), 1);

        let mut again = OutcomeLedger::new();
        again.record(key("b"), Outcome::Remove).unwrap();
        again.record(key("d"), Outcome::Remove).unwrap();
        assert!(matches!(
            left.merge(again),
            Err(ReconcileError::DuplicateOutcome(k)) if k == key("b")
        ));
        assert_eq!(left.get(&key("b")), Some(&Outcome::FurtherAnnotation));
        assert_eq!(left.get(&key("d")), Some(&Outcome::Remove));
        assert_eq!(left.unresolved().len(), 1);
        assert!(left.unresolved().iter().all(|u| u.key != key("b")));
    }

    #[test]
    fn report_lists_each_scaffold_once() {
        let scaffolds = vec![scaffold("a"), scaffold("b")];
        let mut ledger = OutcomeLedger::new();
        ledger.record(key("a"), Outcome::FurtherAnnotation).unwrap();
        ledger.mark_unresolved(key("a"), "no valid splice combination");
        ledger.mark_unresolved(key("b"), "no valid splice combination");
        ledger.mark_unresolved(key("b"), "no valid splice combination");

        let report = ledger.into_report(&scaffolds);
        assert_eq!(report.further_annotation, vec![scaffold("a")]);
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].key, key("b"));

        let tally = report.species_counts()["Saccharomyces cerevisiae"];
        assert_eq!((tally.further_annotation, tally.unresolved), (1, 1));
    }

    #[test]
    fn report_resolves_kept_fragment_and_counts() {
        let scaffolds = vec![scaffold("a"), scaffold("b"), scaffold("c")];
        let mut ledger = OutcomeLedger::new();
        ledger.record(key("a"), Outcome::Keep { fragment_index: 1 }).unwrap();
        ledger.record(key("b"), Outcome::FurtherAnnotation).unwrap();
        ledger.record(key("c"), Outcome::Remove).unwrap();

        let report = ledger.into_report(&scaffolds);
        assert_eq!(report.auto_annotated.len(), 1);
        assert_eq!(report.auto_annotated[0].fragment.subject_start, 400);
        assert_eq!(report.auto_annotated[0].species_name, "Candida albicans");
        assert_eq!(report.further_annotation, vec![scaffold("b")]);
        assert_eq!(report.removed, vec![key("c")]);

        let counts = report.species_counts();
        let tally = counts["Saccharomyces cerevisiae"];
        assert_eq!(
            (tally.auto_annotated, tally.further_annotation, tally.removed),
            (1, 1, 1)
        );
    }
}
