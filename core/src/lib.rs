//! Relevance and ranking engine for a corpus of hyperlinked wiki pages.
//!
//! Ingestion runs in two passes ([`TitleRegistry`] then [`CorpusBuilder`]) and
//! ends in an immutable [`Corpus`]. TF-IDF relevance and PageRank authority are
//! then computed independently from it.

pub mod error;
pub mod index;
pub mod persist;
pub mod rank;
pub mod relevance;
pub mod tokenizer;

pub use error::{IndexError, Result};
pub use index::{Corpus, CorpusBuilder, DocId, DocMeta, DocRecord, Posting, TermId, TitleRegistry};
pub use rank::{compute_page_rank, LinkGraph, RankConfig, RankOutcome, RankVector};
pub use relevance::{compute_relevance, IdfMode, RelevanceTable};
