//! Bolota: server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Open the medicine store and seed it on first run
//!   6. Build the LLM provider, PubMed client and tool registry
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Serve HTTP until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use bolota::config::{self, Config};
use bolota::error::AppError;
use bolota::llm::providers;
use bolota::logger;
use bolota::subsystems::chat::{ChatOrchestrator, prompt};
use bolota::subsystems::comms::{self, AppState};
use bolota::subsystems::pubmed::PubMedClient;
use bolota::subsystems::store::seed::{self, SeedOutcome};
use bolota::subsystems::store::{DrugLookup, MedicineStore};
use bolota::subsystems::tools::ToolRegistry;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some(), config.log_file.as_deref())?;

    info!(
        bot_name = %config.bot_name,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let store = MedicineStore::open(&config.store.db_path)?;
    let seeded = seed::seed_from_csv(&store, &config.store.seed_path, config.store.seed_delimiter)?;
    let store: Arc<dyn DrugLookup> = Arc::new(store);

    let provider = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(e.to_string()))?;
    let pubmed = PubMedClient::new(&config.pubmed)?;
    let registry = ToolRegistry::new(store, pubmed);
    let chat = ChatOrchestrator::new(provider, registry, prompt::system_instruction(&config));

    // Shared shutdown token, cancelled by Ctrl-C.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    print_startup_summary(&config, seeded);

    let state = AppState::new(&config.bot_name, config.active_model(), chat);
    comms::serve(&config.server.bind, state, shutdown).await?;

    let _ = { use std::io::Write as _; std::io::stderr().flush() };
    Ok(())
}

fn print_startup_summary(config: &Config, seeded: SeedOutcome) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        let char_count = text.chars().count();
        if char_count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let store_line = match seeded {
        SeedOutcome::AlreadyPopulated(n) => format!("{} ({n} medicines)", config.store.db_path.display()),
        SeedOutcome::Seeded { inserted, skipped } => format!(
            "{} (seeded {inserted}, skipped {skipped})",
            config.store.db_path.display()
        ),
    };
    let llm_line = format!("provider={} model={}", config.llm.provider, config.active_model());

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 🐾 Bolota                                                    ║");
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║   {}║", fit(format!("bot: {}", config.bot_name)));
    println!("║   {}║", fit(format!("pid: {}", std::process::id())));
    println!("║   {}║", fit(format!("http: {}", config.server.bind)));
    println!("║   {}║", fit(format!("store: {store_line}")));
    println!("║   {}║", fit(format!("llm: {llm_line}")));
    println!("║   {}║", fit("tools: get_drug_stock_price, search_scientific_articles".to_string()));
    println!("╚══════════════════════════════════════════════════════════════╝");
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: bolota [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier from the config default:
    //   -v      → warn
    //   -vv     → info
    //   -vvv    → debug  (tool dispatch, prompt layers)
    //   -vvvv+  → trace  (full LLM payload dumps)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}
