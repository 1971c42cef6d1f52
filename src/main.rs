use crate::{
    background::Raster,
    config::Config,
    form::{FormController, FormStructure},
    page::{BackgroundOptions, EventTable, Page},
    seed::insert_sample_entries,
    store::{DocumentStore, JsonLinesStore, MemoryStore},
    terminal::{PIXEL_SIZE, TerminalApp, TerminalGuard},
};
use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use std::{
    env,
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing_subscriber::EnvFilter;

mod background;
mod config;
mod form;
mod page;
mod seed;
mod store;
mod terminal;

/// Run an animated survey in your terminal.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The path to the configuration file.
    #[clap(short, long, env = "PETALFORM_CONFIG")]
    config: Option<PathBuf>,

    /// The survey to present, overriding the one in the configuration file.
    #[clap(short, long, global = true)]
    survey: Option<PathBuf>,

    /// Keep responses in memory instead of writing them to the store.
    #[clap(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Present the survey. This is the default.
    Run,

    /// Insert randomly generated responses into the store.
    Seed {
        /// The number of responses to generate.
        #[clap(short = 'n', long, default_value_t = 250)]
        count: usize,
    },

    /// Print the JSON schema of survey files.
    #[cfg(feature = "json-schema")]
    Schema,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading config")?;
    config.apply_env(|name| env::var(name).ok());
    if let Some(survey) = cli.survey {
        config.survey = Some(survey);
    }
    config.validate()?;

    let structure = match &config.survey {
        Some(path) => FormStructure::load(path).with_context(|| format!("loading survey '{}'", path.display()))?,
        None => FormStructure::builtin().context("loading built-in survey")?,
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, structure, cli.dry_run),
        Command::Seed { count } => seed(&config, &structure, count, cli.dry_run),
        #[cfg(feature = "json-schema")]
        Command::Schema => {
            let schema = schemars::schema_for!(FormStructure);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn run(config: &Config, structure: FormStructure, dry_run: bool) -> anyhow::Result<()> {
    init_file_logging(config)?;
    let (store, memory) = open_store(config, dry_run)?;
    let background = BackgroundOptions {
        surface: Raster::new(PIXEL_SIZE, config.background.backdrop),
        density: config.background.density,
        rng: fastrand::Rng::new(),
    };
    let collection = config.store.collection.clone();
    let page = Page::new(FormController::new(structure), background, store, collection.clone(), EventTable::default());

    install_panic_hook();
    let app = TerminalApp::new(page, config.background.frame_interval(), config.background.backdrop);
    let page = app.run()?;

    if let Some(memory) = memory {
        let documents = memory.documents(&collection).len();
        tracing::info!(documents, "dry run finished, nothing was persisted");
    }
    tracing::info!(submitted = page.controller().is_submitted(), "survey page closed");
    Ok(())
}

fn seed(config: &Config, structure: &FormStructure, count: usize, dry_run: bool) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config.logging.level))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("initializing logging: {e}"))?;

    let (store, _) = open_store(config, dry_run)?;
    let mut rng = fastrand::Rng::new();
    let inserted = insert_sample_entries(store.as_ref(), &config.store.collection, structure, count, &mut rng)?;
    println!("inserted {inserted} entries into '{}'", config.store.collection);
    Ok(())
}

/// Open the store responses are written to. Dry runs also get the in-memory store back so
/// its contents can be inspected.
fn open_store(config: &Config, dry_run: bool) -> anyhow::Result<(Arc<dyn DocumentStore>, Option<Arc<MemoryStore>>)> {
    if dry_run {
        tracing::info!("dry run, responses will not be persisted");
        let memory = Arc::new(MemoryStore::default());
        let store: Arc<dyn DocumentStore> = memory.clone();
        return Ok((store, Some(memory)));
    }
    let path = config.store_path()?;
    let store = JsonLinesStore::open(&path).with_context(|| format!("opening store at '{}'", path.display()))?;
    tracing::info!(path = %store.root().display(), collection = %config.store.collection, "opened store");
    let store: Arc<dyn DocumentStore> = Arc::new(store);
    Ok((store, None))
}

/// The terminal is taken over while the form is shown, so logs go to a file.
fn init_file_logging(config: &Config) -> anyhow::Result<()> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating log directory '{}'", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file '{}'", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config.logging.level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("initializing logging: {e}"))
}

/// `RUST_LOG` takes precedence over the configured level.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        TerminalGuard::restore();
        default_hook(info);
    }));
}
