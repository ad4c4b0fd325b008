use std::fs;
use std::sync::Arc;

use proptest::prelude::*;
use ragdex_core::config::{IndexSettings, ScoringConfig};
use ragdex_core::data_processor::DirectorySource;
use ragdex_core::source::StaticSource;
use ragdex_core::traits::{DocumentSource, Retriever};
use ragdex_core::types::Document;
use ragdex_retrieve::RetrievalFacade;
use ragdex_store::{build_index, IndexStore, Snapshot};
use tempfile::TempDir;

fn two_docs() -> Vec<Document> {
    vec![
        Document::new("a", "Getting Started", "Install the CLI and run your first command"),
        Document::new("b", "API Reference", "Use the API key to authenticate requests"),
    ]
}

fn facade(documents: Vec<Document>) -> RetrievalFacade {
    let store = IndexStore::new(Arc::new(StaticSource::new(documents)), IndexSettings::default());
    RetrievalFacade::new(Arc::new(store), ScoringConfig::default())
}

#[test]
fn install_cli_scenario() {
    let facade = facade(two_docs());

    let results = facade.retrieve("install CLI", 10);
    assert_eq!(results[0].title, "Getting Started");
    assert_eq!(results[0].document_id, "a");
    assert!(results.iter().filter(|r| r.document_id == "b").all(|r| r.score < results[0].score));

    let top = facade.retrieve("install CLI", 1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].title, "Getting Started");

    assert!(facade.retrieve("xyzzy-nonexistent-term", 5).is_empty());
}

#[test]
fn degenerate_inputs_return_nothing() {
    let facade = facade(two_docs());
    assert!(facade.retrieve("", 5).is_empty());
    assert!(facade.retrieve("the of and", 5).is_empty());
    assert!(facade.retrieve("install", 0).is_empty());
}

#[test]
fn empty_corpus_returns_nothing() {
    assert!(facade(Vec::new()).retrieve("install", 5).is_empty());
}

#[test]
fn index_is_reused_until_cleared() {
    let facade = facade(two_docs());
    let store = Arc::clone(facade.store());

    facade.retrieve("install", 5);
    facade.retrieve("api", 5);
    assert_eq!(store.loads(), 1);

    facade.clear_index();
    assert!(!store.is_loaded());
    facade.retrieve("install", 5);
    assert_eq!(store.loads(), 2);
    assert_eq!(store.builds(), 2);
}

#[test]
fn default_limit_comes_from_scoring_config() {
    let documents: Vec<Document> = (0..6)
        .map(|i| Document::new(format!("d{i}"), format!("Doc {i}"), "shared proxy notes"))
        .collect();
    let store = IndexStore::new(Arc::new(StaticSource::new(documents)), IndexSettings::default());
    let scoring = ScoringConfig::builder().default_limit(3).build().unwrap();
    let facade = RetrievalFacade::new(Arc::new(store), scoring);

    let results = facade.retrieve_default("proxy");
    assert_eq!(results.len(), 3);
    let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
    assert_eq!(ids, vec!["d0", "d1", "d2"]);
}

#[test]
fn unreadable_source_degrades_to_empty_results() {
    let dir = TempDir::new().unwrap();
    let source = DirectorySource::new(dir.path().join("missing"));
    let store = Arc::new(IndexStore::new(Arc::new(source), IndexSettings::default()));
    let facade = RetrievalFacade::new(Arc::clone(&store), ScoringConfig::default());

    assert!(facade.retrieve("install", 5).is_empty());
    assert!(facade.try_retrieve("install", 5).is_err());
    assert!(!store.is_loaded());
}

#[test]
fn corrupt_snapshot_still_serves_results() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rag-index.json");
    fs::write(&path, b"not a snapshot").unwrap();
    let store = IndexStore::builder().snapshot_path(&path).build(Arc::new(StaticSource::new(two_docs())));
    let facade = RetrievalFacade::new(Arc::new(store), ScoringConfig::default());

    let results = facade.retrieve("install CLI", 1);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Getting Started");
}

#[test]
fn snapshot_and_runtime_build_answer_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rag-index.json");
    let settings = IndexSettings::default();
    Snapshot::from_build(build_index(&two_docs(), &settings).unwrap(), settings).write_atomic(&path).unwrap();

    let from_snapshot = RetrievalFacade::new(
        Arc::new(IndexStore::builder().snapshot_path(&path).build(Arc::new(StaticSource::new(Vec::new())))),
        ScoringConfig::default(),
    );
    let runtime = facade(two_docs());
    for query in ["install CLI", "api key", "authenticate requests", "first command"] {
        assert_eq!(from_snapshot.retrieve(query, 5), runtime.retrieve(query, 5));
    }
    assert_eq!(from_snapshot.store().builds(), 0);
}

#[test]
fn markdown_directory_end_to_end() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("guides")).unwrap();
    fs::write(
        dir.path().join("guides/proxy.md"),
        "---\ntitle: Proxy Setup\nkeywords: network, gateway\n---\n\nIntro text.\n\n## Configuration\n\nSet the upstream address in the gateway file.\n",
    )
    .unwrap();
    fs::write(dir.path().join("billing.md"), "# Billing\n\nInvoices are sent monthly.\n").unwrap();

    let source = DirectorySource::new(dir.path());
    assert_eq!(source.documents().unwrap().len(), 2);
    let store = IndexStore::new(Arc::new(source), IndexSettings::default());
    let facade = RetrievalFacade::new(Arc::new(store), ScoringConfig::default());

    let results = facade.retrieve("upstream gateway", 3);
    assert_eq!(results[0].document_id, "guides/proxy");
    assert_eq!(results[0].section.as_deref(), Some("Configuration"));
    assert_eq!(results[0].category, "guides");

    let context = facade.format_context(&results);
    assert!(context.starts_with("[1] Proxy Setup > Configuration\n"));
}

#[test]
fn usable_as_a_trait_object() {
    let retriever: Box<dyn Retriever> = Box::new(facade(two_docs()));
    assert_eq!(retriever.retrieve("api key", 1)[0].title, "API Reference");
    retriever.clear_index();
    assert_eq!(retriever.retrieve("api key", 1).len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn results_are_bounded_and_ordered(query in "[a-z ]{0,24}", limit in 0usize..6) {
        let facade = facade(two_docs());
        let results = facade.retrieve(&query, limit);
        prop_assert!(results.len() <= limit);
        prop_assert!(results.iter().all(|r| r.score > 0.0));
        prop_assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
