use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{IndexError, Result};
use crate::tokenizer::process_document;

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub id: DocId,
    pub title: String,
    /// Highest count any single term reaches in this document, 0 if it has no scorable terms.
    pub max_term_count: u32,
    /// Resolved link destinations. May contain the document's own id.
    pub links: BTreeSet<DocId>,
}

impl DocMeta {
    fn new(id: DocId, title: String) -> Self {
        Self { id, title, max_term_count: 0, links: BTreeSet::new() }
    }
}

/// One input record as handed over by a loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    pub id: Option<DocId>,
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl DocRecord {
    pub fn new(id: DocId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { id: Some(id), title: Some(title.into()), body: body.into() }
    }
}

/// Occurrences of one term in one document, addressed by arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub slot: u32,
    pub count: u32,
}

/// First ingestion pass: every id/title pair must be known before links resolve.
#[derive(Debug, Default)]
pub struct TitleRegistry {
    docs: Vec<DocMeta>,
    slots: HashMap<DocId, usize>,
    titles: HashMap<String, DocId>,
}

impl TitleRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn register(&mut self, id: DocId, title: impl Into<String>) -> Result<()> {
        if self.slots.contains_key(&id) {
            return Err(IndexError::DuplicateId(id));
        }
        let title = title.into();
        if let Some(previous) = self.titles.insert(title.clone(), id) {
            tracing::warn!(%title, previous, id, "duplicate title, later document wins link resolution");
        }
        self.slots.insert(id, self.docs.len());
        self.docs.push(DocMeta::new(id, title));
        Ok(())
    }

    /// Register a loader record; `position` is only used for error reporting.
    pub fn register_record(&mut self, position: usize, record: &DocRecord) -> Result<DocId> {
        let id = record.id.ok_or(IndexError::MissingField { field: "id", record: position })?;
        let title = record
            .title
            .as_deref()
            .ok_or(IndexError::MissingField { field: "title", record: position })?;
        self.register(id, title)?;
        Ok(id)
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn into_builder(self) -> CorpusBuilder {
        let n = self.docs.len();
        CorpusBuilder {
            docs: self.docs,
            slots: self.slots,
            titles: self.titles,
            ingested: vec![false; n],
            dictionary: HashMap::new(),
            terms: Vec::new(),
            postings: Vec::new(),
        }
    }
}

/// Second ingestion pass: document bodies are normalized and counted.
#[derive(Debug)]
pub struct CorpusBuilder {
    docs: Vec<DocMeta>,
    slots: HashMap<DocId, usize>,
    titles: HashMap<String, DocId>,
    ingested: Vec<bool>,
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    postings: Vec<Vec<Posting>>,
}

impl CorpusBuilder {
    /// Tokenize `"{title} {body}"` for a registered document and fold the counts in.
    ///
    /// Returns the surviving stems in document order.
    pub fn ingest(&mut self, id: DocId, body: &str) -> Result<Vec<String>> {
        let slot = *self.slots.get(&id).ok_or(IndexError::UnknownDocument(id))?;
        if self.ingested[slot] {
            return Err(IndexError::AlreadyIngested(id));
        }

        let titles = &self.titles;
        let normalized = process_document(&self.docs[slot].title, body, |dest| titles.get(dest).copied());

        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for stem in &normalized.stems {
            let tid = match self.dictionary.get(stem.as_str()) {
                Some(&tid) => tid,
                None => {
                    let tid = self.terms.len() as TermId;
                    self.dictionary.insert(stem.clone(), tid);
                    self.terms.push(stem.clone());
                    self.postings.push(Vec::new());
                    tid
                }
            };
            *tf_counts.entry(tid).or_insert(0) += 1;
        }

        let max_term_count = tf_counts.values().copied().max().unwrap_or(0);
        for (tid, count) in tf_counts {
            self.postings[tid as usize].push(Posting { slot: slot as u32, count });
        }

        let doc = &mut self.docs[slot];
        doc.max_term_count = max_term_count;
        doc.links = normalized.links;
        self.ingested[slot] = true;
        tracing::debug!(id, tokens = normalized.stems.len(), links = doc.links.len(), max_term_count, "ingested document");

        Ok(normalized.stems)
    }

    pub fn finish(self) -> Corpus {
        let pending = self.ingested.iter().filter(|done| !**done).count();
        if pending > 0 {
            tracing::debug!(pending, "registered documents without a body");
        }
        tracing::info!(num_docs = self.docs.len(), num_terms = self.terms.len(), "corpus complete");
        Corpus {
            docs: self.docs,
            slots: self.slots,
            titles: self.titles,
            dictionary: self.dictionary,
            terms: self.terms,
            postings: self.postings,
        }
    }
}

/// Immutable, queryable corpus. Documents sit in registration order.
#[derive(Debug, Clone)]
pub struct Corpus {
    docs: Vec<DocMeta>,
    slots: HashMap<DocId, usize>,
    titles: HashMap<String, DocId>,
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    postings: Vec<Vec<Posting>>,
}

impl Corpus {
    /// Run both ingestion passes over `records`, stopping at the first error.
    pub fn from_records(records: &[DocRecord]) -> Result<Self> {
        let mut registry = TitleRegistry::new();
        let ids = records
            .iter()
            .enumerate()
            .map(|(pos, record)| registry.register_record(pos, record))
            .collect::<Result<Vec<_>>>()?;

        let mut builder = registry.into_builder();
        for (id, record) in ids.into_iter().zip(records) {
            builder.ingest(id, &record.body)?;
        }
        Ok(builder.finish())
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn documents(&self) -> &[DocMeta] { &self.docs }

    pub fn ids(&self) -> impl Iterator<Item = DocId> + '_ { self.docs.iter().map(|d| d.id) }

    pub fn slot(&self, id: DocId) -> Option<usize> { self.slots.get(&id).copied() }

    pub fn document(&self, id: DocId) -> Option<&DocMeta> { self.slot(id).map(|s| &self.docs[s]) }

    pub fn title(&self, id: DocId) -> Option<&str> { self.document(id).map(|d| d.title.as_str()) }

    pub fn id_for_title(&self, title: &str) -> Option<DocId> { self.titles.get(title).copied() }

    pub fn max_term_count(&self, id: DocId) -> Option<u32> { self.document(id).map(|d| d.max_term_count) }

    pub fn links(&self, id: DocId) -> Option<&BTreeSet<DocId>> { self.document(id).map(|d| &d.links) }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    /// Terms with their postings, in first-seen order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &[Posting])> + '_ {
        self.terms.iter().map(String::as_str).zip(self.postings.iter().map(Vec::as_slice))
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.dictionary
            .get(term)
            .map(|&tid| self.postings[tid as usize].as_slice())
            .unwrap_or(&[])
    }

    pub fn term_count(&self, term: &str, id: DocId) -> u32 {
        let Some(slot) = self.slot(id) else { return 0 };
        self.postings(term)
            .iter()
            .find(|p| p.slot as usize == slot)
            .map_or(0, |p| p.count)
    }

    pub fn document_frequency(&self, term: &str) -> usize { self.postings(term).len() }

    /// id → title, for writers.
    pub fn titles(&self) -> BTreeMap<DocId, String> {
        self.docs.iter().map(|d| (d.id, d.title.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_resolve_forward() {
        let corpus = Corpus::from_records(&[
            DocRecord::new(1, "First", "see [[Second]] and [[Nowhere]]"),
            DocRecord::new(2, "Second", "plain text"),
        ])
        .unwrap();
        assert_eq!(corpus.links(1).unwrap().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert!(corpus.links(2).unwrap().is_empty());
    }

    #[test]
    fn max_term_count_tracks_most_frequent_stem() {
        let corpus = Corpus::from_records(&[DocRecord::new(7, "Cats", "cat cats dog")]).unwrap();
        assert_eq!(corpus.term_count("cat", 7), 3);
        assert_eq!(corpus.max_term_count(7), Some(3));
        assert_eq!(corpus.term_count("dog", 7), 1);
        assert_eq!(corpus.term_count("bird", 7), 0);
    }

    #[test]
    fn ingest_rejects_unknown_and_repeated_ids() {
        let mut registry = TitleRegistry::new();
        registry.register(1, "One").unwrap();
        let mut builder = registry.into_builder();
        assert_eq!(builder.ingest(2, "x"), Err(IndexError::UnknownDocument(2)));
        builder.ingest(1, "x").unwrap();
        assert_eq!(builder.ingest(1, "x"), Err(IndexError::AlreadyIngested(1)));
    }
}
