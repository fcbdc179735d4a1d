//! Engine facade: assembles the chatbot from its parts.
//!
//! The `ChatEngine` owns the schema graph, the statement store and the
//! dialogue loop. Construction fails fast: a schema that cannot be fetched
//! or parsed, or a store that cannot be opened, is a startup error rather
//! than something discovered per utterance.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::adapter::{
    AdapterChain, BestMatchAdapter, ConfidencePolicy, OntologyAdapter, PropertyMatch,
    SeededConfidence, SpecificityConfidence,
};
use crate::channel::Channel;
use crate::config::{ChatConfig, ConfidenceConfig, ConfidenceKind};
use crate::corpus::{self, CorpusPack, TrainingReport};
use crate::dialogue::{CycleOutcome, DialogueLoop};
use crate::error::ChatResult;
use crate::feedback::Reconciler;
use crate::paths::ChatPaths;
use crate::schema::{SchemaGraph, SchemaSource, ensure_cached};
use crate::store::{DurableStatementStore, MemStatementStore, StatementStore};

/// Where statements live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// redb file under the data directory.
    #[default]
    Durable,
    /// In memory; everything learned is lost on exit.
    Ephemeral,
}

/// Summary numbers for `semchat stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub statements: usize,
    pub known_inputs: usize,
    pub schema_triples: usize,
    pub adapters: Vec<String>,
}

/// Cache every schema file the config asks for and return their paths.
///
/// The main schema comes first, followed by one `{Type}.nt` file per entry
/// of `schema.extra_types`. Files already on disk are not fetched again.
pub fn cache_schema(
    config: &ChatConfig,
    paths: &ChatPaths,
    source: &dyn SchemaSource,
) -> ChatResult<Vec<PathBuf>> {
    let dir = paths.schema_dir();
    let mut files = Vec::with_capacity(1 + config.schema.extra_types.len());

    let main = dir.join(&config.schema.file_name);
    ensure_cached(&main, &config.schema.url, source)?;
    files.push(main);

    for type_name in &config.schema.extra_types {
        let path = dir.join(format!("{type_name}.nt"));
        ensure_cached(&path, &config.schema.type_url(type_name), source)?;
        files.push(path);
    }
    Ok(files)
}

/// Fetch (if needed) and load the schema graph.
pub fn load_schema(
    config: &ChatConfig,
    paths: &ChatPaths,
    source: &dyn SchemaSource,
) -> ChatResult<SchemaGraph> {
    let files = cache_schema(config, paths, source)?;
    let graph = SchemaGraph::load(&config.schema.namespace, &files)?;
    tracing::info!(
        files = files.len(),
        triples = graph.len()?,
        "schema graph loaded"
    );
    Ok(graph)
}

/// Open the statement store for `mode`.
pub fn open_store(paths: &ChatPaths, mode: StoreMode) -> ChatResult<Arc<dyn StatementStore>> {
    Ok(match mode {
        StoreMode::Durable => Arc::new(DurableStatementStore::open(&paths.database_dir())?),
        StoreMode::Ephemeral => Arc::new(MemStatementStore::new()),
    })
}

/// Build the confidence policy named in the config.
pub fn confidence_policy(config: &ConfidenceConfig) -> Box<dyn ConfidencePolicy> {
    match config.kind {
        ConfidenceKind::Specificity => Box::new(SpecificityConfidence),
        ConfidenceKind::Seeded => Box::new(SeededConfidence::new(config.seed.unwrap_or(0))),
    }
}

/// The assembled chatbot.
pub struct ChatEngine {
    config: ChatConfig,
    graph: Arc<SchemaGraph>,
    store: Arc<dyn StatementStore>,
    export_path: Option<PathBuf>,
    dialogue: DialogueLoop<AdapterChain>,
}

impl ChatEngine {
    /// Open everything from disk: config checks, schema, store, seeding.
    ///
    /// Status messages go to `channel` in the order a user sees them at
    /// startup, ending with the greeting.
    pub fn open(
        config: ChatConfig,
        paths: &ChatPaths,
        source: &dyn SchemaSource,
        mode: StoreMode,
        channel: &mut dyn Channel,
    ) -> ChatResult<Self> {
        config.validate()?;
        paths.ensure_dirs()?;

        channel.info("Loading...")?;
        let graph = Arc::new(load_schema(&config, paths, source)?);
        let store = open_store(paths, mode)?;

        let engine = Self::new(config, graph, store).with_export_path(paths.training_export());
        engine.seed_if_empty(channel)?;
        channel.info(&format!("Hello, my name is {}", engine.config.name))?;
        Ok(engine)
    }

    /// Assemble from an already loaded graph and store. Does not seed.
    pub fn new(
        config: ChatConfig,
        graph: Arc<SchemaGraph>,
        store: Arc<dyn StatementStore>,
    ) -> Self {
        let ontology = OntologyAdapter::new(
            Arc::clone(&graph),
            confidence_policy(&config.confidence_policy),
        );
        let chain = AdapterChain::new()
            .with(ontology)
            .with(BestMatchAdapter::new(Arc::clone(&store)));
        let dialogue = DialogueLoop::new(
            chain,
            Reconciler::new(Arc::clone(&store)),
            config.confidence_threshold,
        );

        tracing::info!(
            name = %config.name,
            threshold = config.confidence_threshold,
            adapters = ?dialogue.matcher().names(),
            "chat engine assembled"
        );

        Self {
            config,
            graph,
            store,
            export_path: None,
            dialogue,
        }
    }

    /// Write a training export to `path` after every training run.
    pub fn with_export_path(mut self, path: PathBuf) -> Self {
        self.export_path = Some(path);
        self
    }

    /// Train from the bundled corpus when enabled and the store is empty.
    ///
    /// Returns whether training ran.
    pub fn seed_if_empty(&self, channel: &mut dyn Channel) -> ChatResult<bool> {
        if !self.config.seed_if_empty || !self.store.is_empty()? {
            return Ok(false);
        }
        self.train(channel)?;
        Ok(true)
    }

    /// Train from every bundled pack, then write the training export.
    pub fn train(&self, channel: &mut dyn Channel) -> ChatResult<Vec<TrainingReport>> {
        self.train_with(channel, &[])
    }

    /// Train from the bundled packs followed by `extra`, then write the
    /// training export.
    pub fn train_with(
        &self,
        channel: &mut dyn Channel,
        extra: &[CorpusPack],
    ) -> ChatResult<Vec<TrainingReport>> {
        channel.info("Training, may take a while...")?;
        let mut reports = corpus::train_bundled(self.store.as_ref())?;
        for pack in extra {
            reports.push(corpus::train(pack, self.store.as_ref())?);
        }

        if let Some(path) = &self.export_path {
            channel.info("exporting training data")?;
            corpus::export_for_training(self.store.as_ref(), path)?;
        }
        channel.info("Training complete.")?;
        Ok(reports)
    }

    /// Write every known pairing as training data.
    pub fn export(&self, path: &Path) -> ChatResult<usize> {
        corpus::export_for_training(self.store.as_ref(), path)
    }

    /// Properties the schema attaches to a concept name.
    pub fn describe(&self, type_name: &str) -> ChatResult<Vec<PropertyMatch>> {
        OntologyAdapter::new(Arc::clone(&self.graph), Box::new(SpecificityConfidence))
            .describe(type_name)
    }

    pub fn stats(&self) -> ChatResult<EngineStats> {
        let statements = self.store.statements()?;
        let mut inputs: Vec<&str> = statements
            .iter()
            .filter_map(|s| s.in_response_to.as_deref())
            .collect();
        inputs.sort_unstable();
        inputs.dedup();

        Ok(EngineStats {
            statements: statements.len(),
            known_inputs: inputs.len(),
            schema_triples: self.graph.len()?,
            adapters: self
                .dialogue
                .matcher()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    /// Run one dialogue cycle.
    pub fn process(&self, text: &str, channel: &mut dyn Channel) -> ChatResult<CycleOutcome> {
        self.dialogue.process(text, channel)
    }

    /// Serve the conversation until input ends or `shutdown` is set.
    pub fn run(&self, channel: &mut dyn Channel, shutdown: &AtomicBool) -> ChatResult<()> {
        self.dialogue.run(channel, shutdown)
    }

    /// Serve the channel, exposing when the loop is idle at the prompt.
    pub fn run_interruptible(
        &self,
        channel: &mut dyn Channel,
        shutdown: &AtomicBool,
        idle: &AtomicBool,
    ) -> ChatResult<()> {
        self.dialogue.run_interruptible(channel, shutdown, idle)
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<SchemaGraph> {
        &self.graph
    }

    pub fn store(&self) -> &Arc<dyn StatementStore> {
        &self.store
    }
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("name", &self.config.name)
            .field("threshold", &self.config.confidence_threshold)
            .field("adapters", &self.dialogue.matcher().names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ScriptedChannel;
    use crate::schema::StaticSchemaSource;

    const SCHEMA: &str = r#"<http://schema.org/Movie> <http://www.w3.org/2000/01/rdf-schema#label> "Movie" .
<http://schema.org/musicBy> <http://www.w3.org/2000/01/rdf-schema#label> "musicBy" .
<http://schema.org/musicBy> <http://schema.org/domainIncludes> <http://schema.org/Movie> .
"#;

    const BOOK: &str = r#"<http://schema.org/isbn> <http://schema.org/domainIncludes> <http://schema.org/Book> .
"#;

    fn source(config: &ChatConfig) -> StaticSchemaSource {
        StaticSchemaSource::new()
            .with(&config.schema.url, SCHEMA)
            .with(&config.schema.type_url("Book"), BOOK)
    }

    #[test]
    fn open_reports_startup_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = ChatPaths::rooted(dir.path());
        let config = ChatConfig::default();
        let mut channel = ScriptedChannel::new(Vec::<String>::new());

        let engine = ChatEngine::open(
            config.clone(),
            &paths,
            &source(&config),
            StoreMode::Ephemeral,
            &mut channel,
        )
        .unwrap();

        assert_eq!(
            channel.infos(),
            vec![
                "Loading...",
                "Training, may take a while...",
                "exporting training data",
                "Training complete.",
                "Hello, my name is Terminal",
            ]
        );
        assert!(engine.store().count().unwrap() > 0);
        assert!(paths.training_export().is_file());
    }

    #[test]
    fn extra_packs_train_after_the_bundled_ones() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pets.toml");
        std::fs::write(
            &path,
            r#"
[corpus]
id = "pets"
name = "Pets"

[[conversations]]
lines = ["Do you have a cat?", "No, but I like dogs."]
"#,
        )
        .unwrap();
        let pack = corpus::load_corpus_file(&path).unwrap();

        let graph = Arc::new(
            SchemaGraph::from_ntriples("http://schema.org/", SCHEMA.as_bytes()).unwrap(),
        );
        let engine = ChatEngine::new(
            ChatConfig::default(),
            graph,
            Arc::new(MemStatementStore::new()),
        );
        let mut channel = ScriptedChannel::new(Vec::<String>::new());
        let reports = engine.train_with(&mut channel, &[pack]).unwrap();

        let last = reports.last().unwrap();
        assert_eq!(last.id, "pets");
        assert_eq!(last.statements_added, 2);
        assert_eq!(
            engine.store().responses_to("Do you have a cat?").unwrap()[0].text,
            "No, but I like dogs."
        );
    }

    #[test]
    fn extra_types_are_cached_and_merged() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = ChatPaths::rooted(dir.path());
        let mut config = ChatConfig::default();
        config.seed_if_empty = false;
        config.schema.extra_types = vec!["Book".into()];
        let src = source(&config);
        let mut channel = ScriptedChannel::new(Vec::<String>::new());

        let engine =
            ChatEngine::open(config, &paths, &src, StoreMode::Ephemeral, &mut channel).unwrap();
        assert!(paths.schema_dir().join("Book.nt").is_file());
        assert_eq!(engine.describe("Book").unwrap().len(), 1);
        assert_eq!(engine.describe("Movie").unwrap().len(), 1);
        assert_eq!(src.requests().len(), 2);
    }

    #[test]
    fn invalid_config_fails_before_any_download() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = ChatPaths::rooted(dir.path());
        let mut config = ChatConfig::default();
        config.confidence_threshold = 1.5;
        let src = source(&config);
        let mut channel = ScriptedChannel::new(Vec::<String>::new());

        let result = ChatEngine::open(config, &paths, &src, StoreMode::Ephemeral, &mut channel);
        assert!(result.is_err());
        assert!(src.requests().is_empty());
    }

    #[test]
    fn missing_schema_is_a_startup_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = ChatPaths::rooted(dir.path());
        let mut channel = ScriptedChannel::new(Vec::<String>::new());
        let result = ChatEngine::open(
            ChatConfig::default(),
            &paths,
            &StaticSchemaSource::new(),
            StoreMode::Ephemeral,
            &mut channel,
        );
        assert!(result.is_err());
    }

    #[test]
    fn ontology_question_goes_through_the_loop() {
        let graph = Arc::new(SchemaGraph::from_ntriples("http://schema.org/", SCHEMA.as_bytes()).unwrap());
        let store: Arc<dyn StatementStore> = Arc::new(MemStatementStore::new());
        let engine = ChatEngine::new(ChatConfig::default(), graph, store);

        let mut channel = ScriptedChannel::new(Vec::<String>::new());
        let outcome = engine.process("Avengers is a Movie", &mut channel).unwrap();
        assert_eq!(outcome, CycleOutcome::Accepted);
        assert_eq!(channel.shown()[0].text, "What is musicBy for Avengers?");

        let stats = engine.stats().unwrap();
        assert_eq!(stats.adapters, vec!["ontology", "best-match"]);
        assert_eq!(stats.statements, 0);
        assert_eq!(stats.schema_triples, 3);
    }
}
