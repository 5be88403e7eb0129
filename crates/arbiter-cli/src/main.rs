mod display;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arbiter_ai::{
    ChatClient, DEFAULT_LLM_BASE_URL, DEFAULT_MODEL, default_report_filename, research,
};
use arbiter_client::{ApiClient, DEFAULT_BASE_URL};
use arbiter_core::resolve::DEFAULT_PAGE_SIZE;
use arbiter_core::{
    ArbitratorProfile, CaseApi, KeywordMatcher, Resolver, arbitrator_profile, case_summary,
};
use arbiter_store::{DEFAULT_DB_PATH, DEFAULT_SEED, RosterStore, parse_seed};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{Level, info};

#[derive(Debug, Parser)]
#[command(
    name = "arbiter",
    about = "ICSID/PCA case lookup and arbitrator conflict-of-interest research",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show one case with its parties, decisions and individuals
    Case {
        #[command(flatten)]
        api: ApiArgs,

        /// Case to fetch (defaults to the first case the API lists)
        #[arg(long)]
        case_id: Option<u64>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Resolve an arbitrator by name and list the cases they sat on
    Arbitrator {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Resolve an arbitrator and ask an LLM for conflict-of-interest research
    Coi {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        llm: LlmArgs,

        /// Entity to check for connections (repeatable)
        #[arg(long = "entity")]
        entities: Vec<String>,

        /// Shorter background narrative
        #[arg(long)]
        brief: bool,

        /// Report file (defaults to <Name>_<timestamp>.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Local roster of arbitrators
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
}

#[derive(Debug, Subcommand)]
enum RosterCommand {
    /// Create the roster table and insert seed rows not already present
    Seed {
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// JSON list of arbitrators (defaults to the bundled seed)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the roster as JSON
    List {
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ApiArgs {
    /// Case API key
    #[arg(long, env = "ARBITER_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "ARBITER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

impl ApiArgs {
    fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), self.api_key.clone())
    }
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// Arbitrator name, matched as a case-insensitive substring
    #[arg(long, visible_alias = "arbitrator")]
    name: String,

    /// Stop collecting candidate cases at this many
    #[arg(long, default_value_t = 10)]
    max_cases: usize,

    /// Decisions requested per search page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,
}

impl TargetArgs {
    fn resolver<'a, A: CaseApi + ?Sized>(&self, api: &'a A) -> Resolver<'a, A> {
        Resolver::new(api).with_page_size(self.page_size)
    }
}

#[derive(Debug, Args)]
struct LlmArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    llm_api_key: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_LLM_BASE_URL)]
    llm_base_url: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Also write the record as pretty JSON to this file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Print JSON instead of a card
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("arbiter v{}", env!("CARGO_PKG_VERSION"));

    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Case { api, case_id, out } => {
            cmd_case(&api.client(), case_id, &out, &mut stdout).await
        }
        Command::Arbitrator { api, target, out } => {
            cmd_arbitrator(&api.client(), &target, &out, &mut stdout).await
        }
        Command::Coi {
            api,
            target,
            llm,
            entities,
            brief,
            output,
        } => {
            let client = api.client();
            cmd_coi(&client, &target, llm, &entities, brief, output, &mut stdout).await
        }
        Command::Roster { command } => cmd_roster(command, &mut stdout),
    }
}

/// Logs go to stderr so stdout stays clean for cards and JSON.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

async fn cmd_case<A: CaseApi + ?Sized>(
    api: &A,
    case_id: Option<u64>,
    out: &OutputArgs,
    w: &mut dyn Write,
) -> Result<()> {
    let resolver = Resolver::new(api);

    let case_id = match case_id {
        Some(id) => id.to_string(),
        None => match resolver.first_case_id().await {
            Ok(id) => id,
            Err(e) if e.is_not_found() => {
                writeln!(w, "No cases available.")?;
                return Ok(());
            }
            Err(e) => return Err(e).context("listing cases"),
        },
    };

    let record = match resolver.fetch_case(&case_id).await {
        Ok(record) => record,
        Err(e) if e.is_not_found() => {
            writeln!(w, "No case found with id {case_id}.")?;
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("fetching case {case_id}")),
    };

    let summary = case_summary(&record, &KeywordMatcher::arbitrator());
    emit(w, &summary, out, display::write_case_card)
}

async fn cmd_arbitrator<A: CaseApi + ?Sized>(
    api: &A,
    target: &TargetArgs,
    out: &OutputArgs,
    w: &mut dyn Write,
) -> Result<()> {
    let Some(profile) = resolve_profile(api, target, w).await? else {
        return Ok(());
    };
    emit(w, &profile, out, display::write_profile_card)
}

async fn cmd_coi<A: CaseApi + ?Sized>(
    api: &A,
    target: &TargetArgs,
    llm: LlmArgs,
    entities: &[String],
    brief: bool,
    output: Option<PathBuf>,
    w: &mut dyn Write,
) -> Result<()> {
    let Some(profile) = resolve_profile(api, target, w).await? else {
        return Ok(());
    };

    let generator = ChatClient::new(llm.llm_base_url, llm.llm_api_key, llm.model);
    let report = research(&generator, &profile, entities, !brief)
        .await
        .context("generating conflict-of-interest research")?;

    let path = output.unwrap_or_else(|| {
        PathBuf::from(default_report_filename(&report.arbitrator_name, Utc::now()))
    });
    report
        .save(&path)
        .with_context(|| format!("saving report to {}", path.display()))?;

    display::write_report_card(w, &report, &path)?;
    Ok(())
}

/// Resolve the target into a profile. When nobody matches, says so on `w`
/// and returns `None`.
async fn resolve_profile<A: CaseApi + ?Sized>(
    api: &A,
    target: &TargetArgs,
    w: &mut dyn Write,
) -> Result<Option<ArbitratorProfile>> {
    let resolution = target
        .resolver(api)
        .resolve(&target.name, target.max_cases)
        .await
        .with_context(|| format!("searching decisions for {}", target.name))?;
    match resolution {
        Some(resolution) => Ok(Some(arbitrator_profile(&resolution))),
        None => {
            writeln!(w, "No arbitrator found matching \"{}\".", target.name)?;
            Ok(None)
        }
    }
}

fn cmd_roster(command: RosterCommand, w: &mut dyn Write) -> Result<()> {
    match command {
        RosterCommand::Seed { db, file } => {
            let json = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading seed file {}", path.display()))?,
                None => DEFAULT_SEED.to_string(),
            };
            let rows = parse_seed(&json)?;
            let store = open_roster(&db)?;
            let inserted = store.seed(&rows)?;
            writeln!(
                w,
                "Seeded {inserted} of {} arbitrators into {}.",
                rows.len(),
                db.display()
            )?;
        }
        RosterCommand::List { db } => {
            let store = open_roster(&db)?;
            writeln!(w, "{}", serde_json::to_string_pretty(&store.list()?)?)?;
        }
    }
    Ok(())
}

fn open_roster(db: &Path) -> Result<RosterStore> {
    RosterStore::open_persistent(db).with_context(|| format!("opening roster {}", db.display()))
}

/// Write `value` as a card (or JSON with `--json`), and save it with `--output`.
fn emit<T: Serialize>(
    w: &mut dyn Write,
    value: &T,
    out: &OutputArgs,
    card: fn(&mut dyn Write, &T) -> io::Result<()>,
) -> Result<()> {
    if let Some(path) = &out.output {
        write_json(path, value)?;
    }
    if out.json {
        writeln!(w, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        card(w, value)?;
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "saved");
    Ok(())
}
