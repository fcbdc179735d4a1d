//! semchat CLI: a chatbot that learns what things are.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use semantic_chat::channel::{Channel, TerminalChannel};
use semantic_chat::config::ChatConfig;
use semantic_chat::corpus;
use semantic_chat::engine::{self, ChatEngine, StoreMode};
use semantic_chat::message::{JsonSink, MessageSink, StdoutSink};
use semantic_chat::paths::ChatPaths;
use semantic_chat::schema::{HttpSchemaSource, SchemaSource};

#[derive(Parser)]
#[command(
    name = "semchat",
    version,
    about = "Chatbot that learns from you and asks about what it recognizes"
)]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/semantic-chat/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory for config, data and schema cache.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep learned statements in memory only.
    #[arg(long, global = true)]
    ephemeral: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation (default).
    Chat(ChatArgs),

    /// Train the store from the bundled corpus and write the training export.
    Train {
        /// Additional corpus pack (TOML) to train from; repeatable.
        #[arg(long = "corpus", value_name = "FILE")]
        corpus: Vec<PathBuf>,
    },

    /// Write every known pairing as training JSON.
    Export {
        /// Output file (default: <data>/output/training_export.json).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List the schema properties that apply to a type.
    Describe {
        /// Type name in the schema namespace, e.g. "Movie".
        type_name: String,
    },

    /// Download the configured schema files if they are not cached yet.
    FetchSchema,

    /// Show store and schema statistics.
    Stats,
}

#[derive(Args, Default)]
struct ChatArgs {
    /// Display name of the bot.
    #[arg(long)]
    name: Option<String>,

    /// Confidence at or above which responses are shown without asking.
    #[arg(long)]
    threshold: Option<f32>,

    /// Do not train an empty store from the bundled corpus.
    #[arg(long)]
    no_seed: bool,

    /// Emit newline-delimited JSON messages instead of plain text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if cli.verbose > 0 {
        tracing_subscriber::EnvFilter::new(default_level)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let paths = match &cli.data_dir {
        Some(root) => ChatPaths::rooted(root),
        None => ChatPaths::resolve()?,
    };
    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let mut config = ChatConfig::load_or_default(&config_path)?;
    let mode = if cli.ephemeral {
        StoreMode::Ephemeral
    } else {
        StoreMode::Durable
    };
    let source = HttpSchemaSource::new(Duration::from_secs(config.schema.timeout_secs));

    match cli.command.unwrap_or(Commands::Chat(ChatArgs::default())) {
        Commands::Chat(args) => {
            if let Some(name) = args.name {
                config.name = name;
            }
            if let Some(threshold) = args.threshold {
                config.confidence_threshold = threshold;
            }
            if args.no_seed {
                config.seed_if_empty = false;
            }
            let sink: Box<dyn MessageSink> = if args.json {
                Box::new(JsonSink)
            } else {
                Box::new(StdoutSink)
            };
            chat(config, &paths, &source, mode, sink)?;
        }

        Commands::Train { corpus: files } => {
            let extra = files
                .iter()
                .map(|path| corpus::load_corpus_file(path))
                .collect::<Result<Vec<_>, _>>()?;
            config.validate()?;
            paths.ensure_dirs()?;
            let mut channel = terminal(Box::new(StdoutSink), &config);
            let graph = engine::load_schema(&config, &paths, &source)?;
            let store = engine::open_store(&paths, mode)?;
            let engine = ChatEngine::new(config, Arc::new(graph), store)
                .with_export_path(paths.training_export());
            let reports = engine.train_with(&mut channel, &extra)?;
            for report in reports {
                println!(
                    "{:<16} conversations: {:>3}  added: {:>4}  already known: {:>4}",
                    report.id,
                    report.conversations,
                    report.statements_added,
                    report.statements_skipped
                );
            }
        }

        Commands::Export { out } => {
            let store = engine::open_store(&paths, mode)?;
            let path = out.unwrap_or_else(|| paths.training_export());
            let n = corpus::export_for_training(store.as_ref(), &path)?;
            println!("Exported {n} pairing(s) to {}", path.display());
        }

        Commands::Describe { type_name } => {
            let graph = engine::load_schema(&config, &paths, &source)?;
            let store = engine::open_store(&paths, StoreMode::Ephemeral)?;
            let engine = ChatEngine::new(config, Arc::new(graph), store);
            let matches = engine.describe(&type_name)?;
            if matches.is_empty() {
                println!("No properties found for \"{type_name}\".");
            }
            for m in matches {
                let ranges: Vec<&str> = m.ranges.iter().map(|r| r.label.as_str()).collect();
                println!("{}  ->  {}", m.property.label, ranges.join(" | "));
                if let Some(comment) = &m.property.comment {
                    println!("    {comment}");
                }
            }
        }

        Commands::FetchSchema => {
            paths.ensure_dirs()?;
            for path in engine::cache_schema(&config, &paths, &source)? {
                println!("{}", path.display());
            }
        }

        Commands::Stats => {
            let graph = engine::load_schema(&config, &paths, &source)?;
            let store = engine::open_store(&paths, mode)?;
            let stats = ChatEngine::new(config, Arc::new(graph), store).stats()?;
            println!("Statements:     {}", stats.statements);
            println!("Known inputs:   {}", stats.known_inputs);
            println!("Schema triples: {}", stats.schema_triples);
            println!("Adapters:       {}", stats.adapters.join(", "));
        }
    }

    Ok(())
}

fn terminal(
    sink: Box<dyn MessageSink>,
    config: &ChatConfig,
) -> TerminalChannel<std::io::StdinLock<'static>> {
    TerminalChannel::new(
        std::io::stdin().lock(),
        sink,
        config.max_confirmation_attempts,
    )
}

fn chat(
    config: ChatConfig,
    paths: &ChatPaths,
    source: &dyn SchemaSource,
    mode: StoreMode,
    sink: Box<dyn MessageSink>,
) -> Result<()> {
    // Ctrl-C at the prompt exits at once. During a cycle the first Ctrl-C
    // stops the loop once the cycle ends; a second one exits.
    let idle = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register_conditional_shutdown(
        signal_hook::consts::SIGINT,
        0,
        Arc::clone(&idle),
    )
    .into_diagnostic()?;
    signal_hook::flag::register_conditional_shutdown(
        signal_hook::consts::SIGINT,
        1,
        Arc::clone(&shutdown),
    )
    .into_diagnostic()?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .into_diagnostic()?;

    let mut channel = terminal(sink, &config);
    let engine = ChatEngine::open(config, paths, source, mode, &mut channel)?;
    engine.run_interruptible(&mut channel, &shutdown, &idle)?;
    channel.info("Goodbye.")?;
    Ok(())
}

