use wikirank_core::persist::{
    load_meta, load_ranks, load_relevance, load_titles, save_meta, save_ranks, save_relevance, save_titles,
    IndexPaths, MetaFile, FORMAT_VERSION,
};
use wikirank_core::{compute_page_rank, compute_relevance, Corpus, DocRecord, IdfMode, RankConfig};
use tempfile::tempdir;

#[test]
fn index_outputs_survive_a_round_trip() {
    let corpus = Corpus::from_records(&[
        DocRecord::new(1, "Rust", "systems [[Cargo|package manager]]"),
        DocRecord::new(2, "Cargo", "builds rust crates"),
    ])
    .unwrap();
    let relevance = compute_relevance(&corpus, IdfMode::Plain);
    let outcome = compute_page_rank(&corpus, &RankConfig::default()).unwrap();

    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path().join("index"));
    save_titles(&paths, &corpus.titles()).unwrap();
    save_ranks(&paths, &outcome.ranks.to_map()).unwrap();
    save_relevance(&paths, &relevance).unwrap();
    let meta = MetaFile {
        num_docs: 2,
        num_terms: corpus.num_terms() as u32,
        iterations: outcome.iterations as u32,
        converged: outcome.converged,
        idf_mode: IdfMode::Plain,
        created_at: "2024-01-01T00:00:00Z".into(),
        version: FORMAT_VERSION,
    };
    save_meta(&paths, &meta).unwrap();

    assert_eq!(load_titles(&paths).unwrap(), corpus.titles());
    assert_eq!(load_ranks(&paths).unwrap(), outcome.ranks.to_map());
    assert_eq!(load_relevance(&paths).unwrap(), relevance);
    assert_eq!(load_meta(&paths).unwrap(), meta);
    assert!(std::fs::read_to_string(paths.meta()).unwrap().contains("\"idf_mode\": \"plain\""));
}

#[test]
fn loading_from_an_empty_directory_fails() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    assert!(load_titles(&paths).is_err());
    assert!(load_meta(&paths).is_err());
}
