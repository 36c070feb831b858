use crate::sequence::Strand;

/// One alignment of the query protein on a scaffold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    /// 1-based alignment start on the scaffold.
    pub subject_start: u64,
    /// 1-based alignment stop on the scaffold.
    pub subject_stop: u64,
    /// Signed reading frame.
    pub reading_frame: i8,
    /// Alignment start on the query protein.
    pub query_start: u64,
    /// Alignment stop on the query protein.
    pub query_stop: u64,
}

impl Fragment {
    /// Strand encoded by the reading frame.
    pub fn strand(&self) -> Strand {
        Strand::from_frame(self.reading_frame)
    }

    /// Scaffold span as `(low, high)`.
    pub fn subject_span(&self) -> (u64, u64) {
        ordered(self.subject_start, self.subject_stop)
    }

    /// Query span as `(low, high)`.
    pub fn query_span(&self) -> (u64, u64) {
        ordered(self.query_start, self.query_stop)
    }

    /// `|subject_stop - subject_start|`.
    pub fn subject_length(&self) -> u64 {
        self.subject_start.abs_diff(self.subject_stop)
    }
}

/// All curated alignments of one query species on one scaffold.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaffoldFragments {
    /// Species of the query protein.
    pub query_species: String,
    /// Scaffold accession.
    pub scaffold_id: String,
    /// Species owning the scaffold.
    pub species_name: String,
    /// Alignments in table order.
    pub fragments: Vec<Fragment>,
}

impl ScaffoldFragments {
    /// Whether every fragment lies on the same strand.
    pub fn single_strand(&self) -> bool {
        let mut strands = self.fragments.iter().map(Fragment::strand);
        match strands.next() {
            Some(first) => strands.all(|s| s == first),
            None => true,
        }
    }
}

/// Handling chosen for a multi-alignment scaffold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Validate each fragment; ambiguity goes to manual review.
    Manual,
    /// Keep the longest validated fragment.
    Longer,
    /// Try to splice the two fragments across an intron.
    NoOverlaps,
}

fn ordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Whether two coordinate ranges overlap.
///
/// Each range is normalised to `(low, high)` first. The ranges overlap when an
/// endpoint of either lies inside the other, so the test is symmetric.
pub fn alignments_overlap(a: (u64, u64), b: (u64, u64)) -> bool {
    let a = ordered(a.0, a.1);
    let b = ordered(b.0, b.1);
    let inside = |base: (u64, u64), p: u64| base.0 <= p && p <= base.1;
    inside(a, b.0) || inside(a, b.1) || inside(b, a.0) || inside(b, a.1)
}

/// Route a scaffold to one of the reconciliation paths.
pub fn classify(scaffold: &ScaffoldFragments) -> Route {
    let [first, second] = scaffold.fragments.as_slice() else {
        return Route::Manual;
    };
    if first.strand() != second.strand() {
        return Route::Longer;
    }

    let subject = alignments_overlap(first.subject_span(), second.subject_span());
    let query = alignments_overlap(first.query_span(), second.query_span());
    match (subject, query) {
        (true, true) => Route::Manual,
        (true, false) => Route::Longer,
        (false, true) => Route::Manual,
        (false, false) => Route::NoOverlaps,
    }
}
