//! End-to-end dialogue tests for semantic-chat.
//!
//! Each test assembles a full engine over a small in-repo schema fixture and
//! drives it through a scripted channel, the way a human at a terminal would.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use semantic_chat::channel::{ChannelEvent, ScriptedChannel, TerminalChannel};
use semantic_chat::config::{ChatConfig, ConfidenceKind};
use semantic_chat::dialogue::{CycleOutcome, LISTENING_PROMPT};
use semantic_chat::engine::{ChatEngine, StoreMode};
use semantic_chat::message::{ChatMessage, VecSink};
use semantic_chat::paths::ChatPaths;
use semantic_chat::schema::{SchemaGraph, StaticSchemaSource};
use semantic_chat::store::{MemStatementStore, StatementStore};
use semantic_chat::utterance::Candidate;

const NS: &str = "http://schema.org/";

const SCHEMA: &str = r#"<http://schema.org/Movie> <http://www.w3.org/2000/01/rdf-schema#label> "Movie" .
<http://schema.org/musicBy> <http://www.w3.org/2000/01/rdf-schema#label> "musicBy" .
<http://schema.org/musicBy> <http://www.w3.org/2000/01/rdf-schema#comment> "The composer of the soundtrack." .
<http://schema.org/musicBy> <http://schema.org/domainIncludes> <http://schema.org/Movie> .
<http://schema.org/musicBy> <http://schema.org/rangeIncludes> <http://schema.org/Person> .
<http://schema.org/Book> <http://www.w3.org/2000/01/rdf-schema#label> "Book" .
<http://schema.org/author> <http://www.w3.org/2000/01/rdf-schema#label> "author" .
<http://schema.org/author> <http://schema.org/domainIncludes> <http://schema.org/Book> .
<http://schema.org/isbn> <http://www.w3.org/2000/01/rdf-schema#label> "isbn" .
<http://schema.org/isbn> <http://schema.org/domainIncludes> <http://schema.org/Book> .
"#;

fn engine_with(config: ChatConfig) -> (ChatEngine, Arc<MemStatementStore>) {
    let graph = Arc::new(SchemaGraph::from_ntriples(NS, SCHEMA.as_bytes()).unwrap());
    let store = Arc::new(MemStatementStore::new());
    let engine = ChatEngine::new(config, graph, store.clone());
    (engine, store)
}

fn engine() -> (ChatEngine, Arc<MemStatementStore>) {
    engine_with(ChatConfig::default())
}

#[test]
fn known_type_is_answered_with_a_question() {
    let (engine, store) = engine();
    let mut channel = ScriptedChannel::new(Vec::<String>::new());

    let outcome = engine.process("Avengers is a Movie", &mut channel).unwrap();

    assert_eq!(outcome, CycleOutcome::Accepted);
    assert_eq!(
        channel.shown(),
        vec![Candidate::new("What is musicBy for Avengers?", 1.0)]
    );
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn unknown_type_apology_goes_to_confirmation() {
    let (engine, store) = engine();
    let mut channel = ScriptedChannel::new(["yes"]);

    let outcome = engine.process("Foo is a Bar", &mut channel).unwrap();

    assert_eq!(outcome, CycleOutcome::Confirmed);
    assert!(channel.events().contains(&ChannelEvent::Confirm {
        response: "I'm sorry I don't know what sort of thing a 'Foo' is.".into(),
        utterance: "Foo is a Bar".into(),
    }));
    assert_eq!(store.responses_to("Foo is a Bar").unwrap().len(), 1);
}

#[test]
fn ambiguous_type_asks_for_confirmation() {
    // Book has two properties, so the specificity score is 0.5.
    let (engine, store) = engine();
    let mut channel = ScriptedChannel::new(["no", "Who wrote Dune?"]);

    let outcome = engine.process("Dune is a Book", &mut channel).unwrap();

    assert_eq!(outcome, CycleOutcome::Taught);
    let responses = store.responses_to("Dune is a Book").unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].text, "Who wrote Dune?");
    assert_eq!(
        channel.infos(),
        vec!["Confirmed response.", "Response added to database."]
    );
}

#[test]
fn lowering_the_threshold_accepts_ambiguous_questions() {
    let mut config = ChatConfig::default();
    config.confidence_threshold = 0.5;
    let (engine, _) = engine_with(config);
    let mut channel = ScriptedChannel::new(Vec::<String>::new());

    let outcome = engine.process("Dune is a Book", &mut channel).unwrap();
    assert_eq!(outcome, CycleOutcome::Accepted);
}

#[test]
fn taught_response_is_used_next_time() {
    let (engine, _) = engine();
    let mut channel = ScriptedChannel::new([
        "How are you?",
        "I am fine, thanks.",
        "How are you?",
    ]);

    engine.run(&mut channel, &AtomicBool::new(false)).unwrap();

    assert_eq!(
        channel.shown(),
        vec![Candidate::new("I am fine, thanks.", 1.0)]
    );
}

#[test]
fn empty_teaching_leaves_the_store_untouched() {
    let (engine, store) = engine();
    let mut channel = ScriptedChannel::new(["Hello", ""]);

    engine.run(&mut channel, &AtomicBool::new(false)).unwrap();

    assert_eq!(store.count().unwrap(), 0);
    assert!(channel.infos().is_empty());
}

#[test]
fn confirmed_pairing_is_recalled_without_asking() {
    let (engine, store) = engine();
    let mut channel = ScriptedChannel::new(["yes"]);

    let first = engine.process("Foo is a Bar", &mut channel).unwrap();
    let recorded = store.count().unwrap();
    // The stored pairing is now an exact best-match hit and outranks the apology.
    let second = engine.process("Foo is a Bar", &mut channel).unwrap();

    assert_eq!(first, CycleOutcome::Confirmed);
    assert_eq!(second, CycleOutcome::Accepted);
    assert_eq!(store.count().unwrap(), recorded);
}

#[test]
fn seeded_policy_is_reproducible_across_engines() {
    let mut config = ChatConfig::default();
    config.confidence_policy.kind = ConfidenceKind::Seeded;
    config.confidence_policy.seed = Some(7);

    let (a, _) = engine_with(config.clone());
    let (b, _) = engine_with(config);
    let mut ca = ScriptedChannel::new(["yes"]);
    let mut cb = ScriptedChannel::new(["yes"]);

    let oa = a.process("Avengers is a Movie", &mut ca).unwrap();
    let ob = b.process("Avengers is a Movie", &mut cb).unwrap();
    assert_eq!(oa, ob);
    assert_eq!(ca.events(), cb.events());
}

#[test]
fn terminal_session_renders_prompts_and_answers() {
    let (engine, _) = engine();
    let sink = Arc::new(VecSink::new());
    let input = "Avengers is a Movie\nHello\nHi there\n";
    let mut channel = TerminalChannel::new(input.as_bytes(), Box::new(sink.clone()), 3);

    engine.run(&mut channel, &AtomicBool::new(false)).unwrap();

    let messages = sink.messages();
    assert_eq!(messages[0], ChatMessage::prompt(LISTENING_PROMPT));
    assert_eq!(
        messages[1],
        ChatMessage::Response {
            text: "What is musicBy for Avengers?".into(),
            confidence: 1.0
        }
    );
    assert!(messages.contains(&ChatMessage::prompt("teach me about: Hello")));
    assert!(messages.contains(&ChatMessage::system("Response added to database.")));
    assert_eq!(messages.last(), Some(&ChatMessage::prompt(LISTENING_PROMPT)));
}

#[test]
fn startup_trains_and_greets() {
    let dir = tempfile::TempDir::new().unwrap();
    let paths = ChatPaths::rooted(dir.path());
    let config = ChatConfig::with_name("Ada");
    let source = StaticSchemaSource::new().with(&config.schema.url, SCHEMA);
    let mut channel = ScriptedChannel::new(["Hello", "Bye"]);

    let engine =
        ChatEngine::open(config, &paths, &source, StoreMode::Ephemeral, &mut channel).unwrap();
    engine.run(&mut channel, &AtomicBool::new(false)).unwrap();

    let infos = channel.infos();
    assert_eq!(infos.first().map(String::as_str), Some("Loading..."));
    assert!(infos.contains(&"Hello, my name is Ada".to_string()));
    // "Hello" is in the greetings corpus, so it is answered without asking.
    assert!(!channel.shown().is_empty());
    assert!(paths.schema_dir().join("schema.nt").is_file());
}
