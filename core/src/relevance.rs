//! TF-IDF relevance over a finished [`Corpus`].
//!
//! Every table here is rebuilt from scratch on each call. Scores only exist
//! for (term, document) pairs with a non-zero raw count.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::index::{Corpus, DocId};

/// term → document id → score.
pub type TermTable = BTreeMap<String, BTreeMap<DocId, f64>>;

/// Final relevance table handed to writers.
pub type RelevanceTable = TermTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfMode {
    /// `ln(N / df)`
    #[default]
    Plain,
    /// `ln(1 + N / df)`
    Smoothed,
}

impl IdfMode {
    pub fn idf(self, num_docs: usize, df: usize) -> f64 {
        let ratio = num_docs as f64 / df.max(1) as f64;
        match self {
            IdfMode::Plain => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

/// Raw count divided by the document's highest term count.
pub fn term_frequencies(corpus: &Corpus) -> TermTable {
    let docs = corpus.documents();
    corpus
        .terms()
        .map(|(term, postings)| {
            let per_doc = postings
                .iter()
                .map(|p| {
                    let doc = &docs[p.slot as usize];
                    (doc.id, p.count as f64 / doc.max_term_count as f64)
                })
                .collect();
            (term.to_string(), per_doc)
        })
        .collect()
}

pub fn inverse_document_frequencies(corpus: &Corpus, mode: IdfMode) -> BTreeMap<String, f64> {
    let n = corpus.len();
    corpus
        .terms()
        .map(|(term, postings)| (term.to_string(), mode.idf(n, postings.len())))
        .collect()
}

pub fn compute_relevance(corpus: &Corpus, mode: IdfMode) -> RelevanceTable {
    let idf = inverse_document_frequencies(corpus, mode);
    let mut relevance = term_frequencies(corpus);
    for (term, per_doc) in relevance.iter_mut() {
        let idf_t = idf.get(term).copied().unwrap_or(0.0);
        for score in per_doc.values_mut() {
            *score *= idf_t;
        }
    }
    tracing::info!(num_terms = relevance.len(), ?mode, "computed term relevance");
    relevance
}
