use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{GatewayError, Hit, HomologySearch, SearchProgram, SearchQuery, SequenceDatabase};
use crate::sequence::{reverse_complement, Strand};

#[derive(Debug, Clone)]
struct Scaffold {
    description: String,
    plus: Vec<u8>,
}

/// Sequence database held in memory, with `blastdbcmd` strand and range
/// semantics.
#[derive(Debug, Clone, Default)]
pub struct InMemorySequenceDb {
    scaffolds: HashMap<String, Scaffold>,
}

impl InMemorySequenceDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scaffold given its plus-strand bases.
    pub fn with_scaffold(
        mut self,
        accession: impl Into<String>,
        description: impl Into<String>,
        plus: impl Into<Vec<u8>>,
    ) -> Self {
        self.insert(accession, description, plus);
        self
    }

    /// Add or replace a scaffold given its plus-strand bases.
    pub fn insert(
        &mut self,
        accession: impl Into<String>,
        description: impl Into<String>,
        plus: impl Into<Vec<u8>>,
    ) {
        self.scaffolds.insert(
            accession.into(),
            Scaffold {
                description: description.into(),
                plus: plus.into(),
            },
        );
    }

    fn scaffold(&self, accession: &str) -> Result<&Scaffold, GatewayError> {
        self.scaffolds
            .get(accession)
            .ok_or_else(|| GatewayError::UnknownAccession(accession.to_string()))
    }
}

impl SequenceDatabase for InMemorySequenceDb {
    fn fetch_metadata(&self, accession: &str) -> Result<String, GatewayError> {
        let scaffold = self.scaffold(accession)?;
        Ok(format!("{accession} {}", scaffold.description))
    }

    fn fetch_range(
        &self,
        accession: &str,
        strand: Strand,
        range: Option<(u64, u64)>,
    ) -> Result<Vec<u8>, GatewayError> {
        let plus = &self.scaffold(accession)?.plus;
        let span = match range {
            None => &plus[..],
            Some((start, end)) => {
                let lo = start.max(1) as usize - 1;
                let hi = (end as usize).min(plus.len());
                if lo >= hi {
                    &[][..]
                } else {
                    &plus[lo..hi]
                }
            }
        };
        Ok(match strand {
            Strand::Plus => span.to_vec(),
            Strand::Minus => reverse_complement(span),
        })
    }
}

type Responder =
    dyn Fn(SearchProgram, &SearchQuery, &Path) -> Result<Vec<Hit>, GatewayError> + Send + Sync;

/// Homology search answered by a closure; counts the searches it served.
pub struct ScriptedSearch {
    responder: Box<Responder>,
    calls: AtomicUsize,
}

impl ScriptedSearch {
    /// Wrap `responder`, which receives every search request.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(SearchProgram, &SearchQuery, &Path) -> Result<Vec<Hit>, GatewayError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    /// A search that never finds anything.
    pub fn empty() -> Self {
        Self::new(|_, _, _| Ok(Vec::new()))
    }

    /// Number of searches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ScriptedSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedSearch")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl HomologySearch for ScriptedSearch {
    fn search(
        &self,
        program: SearchProgram,
        query: &SearchQuery,
        database: &Path,
    ) -> Result<Vec<Hit>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(program, query, database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> InMemorySequenceDb {
        InMemorySequenceDb::new().with_scaffold("scf1", "Candida albicans SC5314 chr1", b"AACCGGTTAC".to_vec())
    }

    #[test]
    fn ranges_follow_blastdbcmd_semantics() {
        let db = db();
        assert_eq!(db.fetch_range("scf1", Strand::Plus, Some((3, 6))).unwrap(), b"CCGG");
        assert_eq!(db.fetch_range("scf1", Strand::Minus, Some((1, 3))).unwrap(), b"GTT");
        assert_eq!(db.fetch_range("scf1", Strand::Minus, None).unwrap(), b"GTAACCGGTT");
        assert_eq!(db.fetch_range("scf1", Strand::Plus, Some((8, 40))).unwrap(), b"TAC");
        assert!(db.fetch_range("scf1", Strand::Plus, Some((12, 20))).unwrap().is_empty());
    }

    #[test]
    fn metadata_starts_with_accession() {
        assert_eq!(db().fetch_metadata("scf1").unwrap(), "scf1 Candida albicans SC5314 chr1");
        assert!(matches!(
            db().fetch_metadata("missing"),
            Err(GatewayError::UnknownAccession(_))
        ));
    }

    #[test]
    fn scripted_search_counts_calls() {
        let search = ScriptedSearch::new(|_, query, _| Ok(vec![Hit::ranked(&query.id, "NP_1")]));
        let query = SearchQuery::new("q", "", b"MK".to_vec());
        let hits = search.search(SearchProgram::BlastP, &query, Path::new("db")).unwrap();
        assert_eq!(hits[0].subject_id, "NP_1");
        assert_eq!(search.calls(), 1);
    }
}
