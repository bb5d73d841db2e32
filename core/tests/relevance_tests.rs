use std::f64::consts::LN_2;

use wikirank_core::relevance::{inverse_document_frequencies, term_frequencies};
use wikirank_core::tokenizer::normalize_word;
use wikirank_core::{compute_relevance, Corpus, DocRecord, IdfMode};

fn stem(word: &str) -> String { normalize_word(word).unwrap() }

fn fruit_corpus() -> Corpus {
    Corpus::from_records(&[
        DocRecord::new(1, "Alpha", "apple apple banana"),
        DocRecord::new(2, "Beta", "apple cherry"),
        DocRecord::new(3, "Gamma", "cherry cherry cherry [[Alpha|apple]]"),
    ])
    .unwrap()
}

#[test]
fn repeated_page_term_has_full_tf_and_zero_idf() {
    let corpus = Corpus::from_records(&[
        DocRecord::new(200, "The", "page page page"),
        DocRecord::new(30, "A", "page"),
    ])
    .unwrap();
    let tf = term_frequencies(&corpus);
    let idf = inverse_document_frequencies(&corpus, IdfMode::Plain);
    assert_eq!(tf["page"][&200], 1.0);
    assert_eq!(tf["page"][&30], 1.0);
    assert_eq!(idf["page"], 0.0);
}

#[test]
fn tf_is_bounded_and_hits_one_at_the_max() {
    let corpus = fruit_corpus();
    let tf = term_frequencies(&corpus);
    for doc in corpus.documents() {
        let mut saw_one = false;
        for per_doc in tf.values() {
            if let Some(&value) = per_doc.get(&doc.id) {
                assert!(value > 0.0 && value <= 1.0);
                saw_one |= value == 1.0;
            }
        }
        assert!(saw_one, "document {} has no term at tf 1", doc.id);
    }
    assert_eq!(tf[&stem("banana")][&1], 0.5);
    assert_eq!(tf[&stem("apple")][&3], 1.0 / 3.0);
}

#[test]
fn idf_is_zero_only_for_terms_in_every_document() {
    let corpus = fruit_corpus();
    let idf = inverse_document_frequencies(&corpus, IdfMode::Plain);
    assert_eq!(idf[&stem("apple")], 0.0);
    assert!((idf[&stem("cherry")] - (1.5f64).ln()).abs() < 1e-15);
    assert!((idf[&stem("banana")] - 3f64.ln()).abs() < 1e-15);
    for (term, value) in &idf {
        let everywhere = corpus.document_frequency(term) == corpus.len();
        assert_eq!(*value == 0.0, everywhere, "term {term}");
    }
}

#[test]
fn idf_strictly_decreases_with_document_frequency() {
    for n in 2..20 {
        for df in 1..n {
            assert!(IdfMode::Plain.idf(n, df) > IdfMode::Plain.idf(n, df + 1));
        }
    }
}

#[test]
fn relevance_is_tf_times_idf_for_nonzero_counts_only() {
    let corpus = Corpus::from_records(&[
        DocRecord::new(1, "The", "red red blue"),
        DocRecord::new(2, "A", "blue"),
    ])
    .unwrap();
    let relevance = compute_relevance(&corpus, IdfMode::Plain);
    assert_eq!(relevance[&stem("red")].len(), 1);
    assert!((relevance[&stem("red")][&1] - LN_2).abs() < 1e-15);
    assert_eq!(relevance[&stem("blue")][&1], 0.0);
    assert_eq!(relevance[&stem("blue")][&2], 0.0);
    assert!(!relevance[&stem("red")].contains_key(&2));
}

#[test]
fn smoothed_mode_keeps_common_terms_scored() {
    let corpus = fruit_corpus();
    let relevance = compute_relevance(&corpus, IdfMode::Smoothed);
    assert!(relevance[&stem("apple")][&1] > 0.0);
}

#[test]
fn relevance_is_idempotent() {
    let corpus = fruit_corpus();
    let first = compute_relevance(&corpus, IdfMode::Plain);
    let second = compute_relevance(&corpus, IdfMode::Plain);
    assert_eq!(first, second);
    for (term, per_doc) in &first {
        for (id, score) in per_doc {
            assert_eq!(score.to_bits(), second[term][id].to_bits());
        }
    }
}
