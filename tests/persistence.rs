//! Persistence and recovery tests for semantic-chat.
//!
//! These tests verify that learned pairings, the schema cache and the
//! configuration survive a restart (close + reopen cycle).

use std::sync::atomic::AtomicBool;

use semantic_chat::channel::ScriptedChannel;
use semantic_chat::config::ChatConfig;
use semantic_chat::corpus;
use semantic_chat::engine::{ChatEngine, StoreMode};
use semantic_chat::paths::ChatPaths;
use semantic_chat::schema::StaticSchemaSource;
use semantic_chat::store::{DurableStatementStore, Statement, StatementStore};
use semantic_chat::utterance::Candidate;

const SCHEMA: &str = r#"<http://schema.org/Movie> <http://www.w3.org/2000/01/rdf-schema#label> "Movie" .
<http://schema.org/musicBy> <http://www.w3.org/2000/01/rdf-schema#label> "musicBy" .
<http://schema.org/musicBy> <http://schema.org/domainIncludes> <http://schema.org/Movie> .
"#;

fn unseeded() -> ChatConfig {
    let mut config = ChatConfig::default();
    config.seed_if_empty = false;
    config
}

fn source(config: &ChatConfig) -> StaticSchemaSource {
    StaticSchemaSource::new().with(&config.schema.url, SCHEMA)
}

#[test]
fn taught_pairings_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = ChatPaths::rooted(dir.path());
    let config = unseeded();

    // First session: teach one response.
    {
        let mut channel = ScriptedChannel::new(["How are you?", "I am fine."]);
        let engine = ChatEngine::open(
            config.clone(),
            &paths,
            &source(&config),
            StoreMode::Durable,
            &mut channel,
        )
        .unwrap();
        engine.run(&mut channel, &AtomicBool::new(false)).unwrap();
        assert_eq!(engine.store().count().unwrap(), 1);
    }

    // Second session: the response is recalled without asking.
    {
        let mut channel = ScriptedChannel::new(["How are you?"]);
        let engine = ChatEngine::open(
            config.clone(),
            &paths,
            &source(&config),
            StoreMode::Durable,
            &mut channel,
        )
        .unwrap();
        engine.run(&mut channel, &AtomicBool::new(false)).unwrap();
        assert_eq!(channel.shown(), vec![Candidate::new("I am fine.", 1.0)]);
    }
}

#[test]
fn schema_is_downloaded_only_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = ChatPaths::rooted(dir.path());
    let config = unseeded();

    let first = source(&config);
    let mut channel = ScriptedChannel::new(Vec::<String>::new());
    ChatEngine::open(config.clone(), &paths, &first, StoreMode::Ephemeral, &mut channel).unwrap();
    assert_eq!(first.requests(), vec![config.schema.url.clone()]);

    let second = source(&config);
    ChatEngine::open(config.clone(), &paths, &second, StoreMode::Ephemeral, &mut channel)
        .unwrap();
    assert!(second.requests().is_empty());
}

#[test]
fn seeding_happens_only_on_an_empty_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = ChatPaths::rooted(dir.path());
    let config = ChatConfig::default();

    let count_after_first = {
        let mut channel = ScriptedChannel::new(Vec::<String>::new());
        let engine = ChatEngine::open(
            config.clone(),
            &paths,
            &source(&config),
            StoreMode::Durable,
            &mut channel,
        )
        .unwrap();
        assert!(channel.infos().contains(&"Training complete.".to_string()));
        engine.store().count().unwrap()
    };
    assert!(count_after_first > 0);

    let mut channel = ScriptedChannel::new(Vec::<String>::new());
    let engine = ChatEngine::open(
        config.clone(),
        &paths,
        &source(&config),
        StoreMode::Durable,
        &mut channel,
    )
    .unwrap();
    assert!(!channel.infos().contains(&"Training complete.".to_string()));
    assert_eq!(engine.store().count().unwrap(), count_after_first);
}

#[test]
fn durable_store_keeps_insertion_order() {
    let dir = tempfile::TempDir::new().unwrap();

    {
        let store = DurableStatementStore::open(dir.path()).unwrap();
        store.insert(Statement::new("Hi", Some("Hello".into()))).unwrap();
        store.insert(Statement::new("Hey", Some("Hello".into()))).unwrap();
    }

    let store = DurableStatementStore::open(dir.path()).unwrap();
    store.insert(Statement::new("Hi", Some("Hello".into()))).unwrap();
    let texts: Vec<String> = store
        .responses_to("Hello")
        .unwrap()
        .into_iter()
        .map(|s| s.text)
        .collect();
    assert_eq!(texts, vec!["Hi", "Hey"]);
}

#[test]
fn export_reflects_learned_pairings() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = DurableStatementStore::open(dir.path()).unwrap();
    store.insert(Statement::new("Hello", None)).unwrap();
    store.insert(Statement::new("Hi", Some("Hello".into()))).unwrap();

    let path = dir.path().join("export.json");
    assert_eq!(corpus::export_for_training(&store, &path).unwrap(), 1);
    let export: corpus::TrainingExport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(export.conversations, vec![["Hello".to_string(), "Hi".to_string()]]);
}

#[test]
fn config_round_trips_through_toml() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = ChatPaths::rooted(dir.path());
    let mut config = ChatConfig::with_name("Ada");
    config.confidence_threshold = 0.65;
    config.schema.extra_types = vec!["Movie".into()];

    config.save(&paths.config_file()).unwrap();
    let loaded = ChatConfig::load_or_default(&paths.config_file()).unwrap();
    assert_eq!(loaded, config);
}
