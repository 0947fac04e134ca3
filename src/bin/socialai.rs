use clap::{Parser, Subcommand};

use socialai::{Database, SocialAI, DEFAULT_PROMPT};

#[derive(Parser)]
#[command(name = "socialai", about = "Social media analytics cache and content idea generator")]
struct Cli {
    /// Database path (default: ~/.socialai/socialai.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log lines to this file instead of stderr (at debug level unless -v says more)
    #[arg(long, value_name = "PATH")]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch (or reuse) analytics and print trend and repurposing ideas
    Run {
        /// Accepted for compatibility; the fixed insight prompts are always used
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Like `run`, but log failures and raise an alert instead of exiting non-zero
    GuardedRun {
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,
    },
    /// Time a full run
    Monitor {
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,
    },
    /// Show the analytics rows for the current 30-day window
    Fetch {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print trend and pattern suggestions
    Trends,
    /// Print content repurposing suggestions
    Repurpose,
    /// Store a piece of user feedback
    Feedback {
        text: String,
    },
    /// Render the most recently cached analytics data
    Report {
        /// Leave out rows with missing values
        #[arg(long)]
        drop_incomplete: bool,
    },
    /// Encrypt text under a newly generated key
    Encrypt {
        text: String,
    },
    /// Decrypt a token produced by `encrypt`
    Decrypt {
        token: String,
        #[arg(long)]
        key: String,
    },
    /// Run only if the load-check endpoint reports few enough pending items
    BalanceLoad {
        /// Override the configured load_check_url
        #[arg(long)]
        url: Option<String>,
        /// Override the configured load_threshold
        #[arg(long)]
        threshold: Option<usize>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn init_logging(verbose: u8, log_file: Option<&str>) -> anyhow::Result<()> {
    let level = match (verbose, log_file.is_some()) {
        (0, false) => "warn",
        (1, false) => "info",
        (0..=2, _) => "debug",
        _ => "trace",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

async fn connect(db: Database) -> anyhow::Result<SocialAI> {
    let credentials = socialai::Credentials::from_env()?;
    Ok(SocialAI::from_config(db, credentials).await?)
}

fn print_list(heading: &str, items: &[String]) {
    println!("{heading}");
    for item in items {
        println!("- {item}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let db = match &cli.db {
        Some(path) => Database::open_at(path).await?,
        None => Database::open().await?,
    };

    match cli.command {
        Commands::Status => {
            print_status(&db).await?;
        }
        Commands::Config { action } => {
            handle_config(&db, action).await?;
        }
        Commands::Feedback { text } => {
            socialai::feedback::record_feedback(&db, &text).await?;
            println!("Feedback recorded.");
        }
        Commands::Report { drop_incomplete } => {
            let report = socialai::report::generate_report(&db, drop_incomplete).await?;
            println!("{report}");
        }
        Commands::Encrypt { text } => {
            let (token, key) = socialai::crypto::encrypt_data(&text)?;
            println!("token: {token}");
            println!("key:   {key}");
        }
        Commands::Decrypt { token, key } => {
            println!("{}", socialai::crypto::decrypt_data(&token, &key)?);
        }
        Commands::Run { prompt, json } => {
            let ai = connect(db).await?;
            let report = ai.log_requests_responses(&prompt).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }
        Commands::GuardedRun { prompt } => {
            let ai = connect(db).await?;
            if let Some(report) = ai.run_guarded(&prompt).await {
                print!("{}", report.render());
            }
        }
        Commands::Monitor { prompt } => {
            let ai = connect(db).await?;
            let (perf, result) = ai.monitor_performance(&prompt).await;
            if let Err(e) = &result {
                eprintln!("Run failed: {e}");
            }
            println!("{perf}");
        }
        Commands::Fetch { json } => {
            let ai = connect(db).await?;
            let rows = ai.retrieve_window_data().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Window: {}", socialai::AnalyticsWindow::ending(ai.today()));
                println!("{}", socialai::report::render_table(&rows));
            }
        }
        Commands::Trends => {
            let ai = connect(db).await?;
            let ideas = ai.analyze_trends_and_patterns().await?;
            print_list("Trends and patterns:", &ideas);
        }
        Commands::Repurpose => {
            let ai = connect(db).await?;
            let reused = ai.repurpose_existing_content().await?;
            print_list("Ways to repurpose existing content:", &reused);
        }
        Commands::BalanceLoad { url, threshold } => {
            let settings = socialai::Settings::load(&db).await?;
            let probe =
                socialai::HttpLoadProbe::new(url.unwrap_or(settings.load_check_url));
            let threshold = threshold.unwrap_or(settings.load_threshold);
            let ai = connect(db).await?;
            match ai.balance_load(&probe, threshold).await? {
                (socialai::LoadDecision::Skipped { pending }, _) => {
                    println!("Skipped: {pending} pending items (threshold {threshold}).");
                }
                (socialai::LoadDecision::Ran { .. }, Some(report)) => {
                    print!("{}", report.render());
                }
                (socialai::LoadDecision::Ran { .. }, None) => {}
            }
        }
    }

    Ok(())
}

async fn print_status(db: &Database) -> anyhow::Result<()> {
    let records = db.count(socialai::analytics::ANALYTICS_COLLECTION).await?;
    let feedback = db.count(socialai::feedback::FEEDBACK_COLLECTION).await?;
    let latest: Option<socialai::AnalyticsRecord> = db
        .find_latest(socialai::analytics::ANALYTICS_COLLECTION, &serde_json::json!({}))
        .await?;

    println!("Store Status");
    println!("  Analytics records: {records}");
    println!("  Feedback entries:  {feedback}");
    println!(
        "  Latest window:     {}",
        latest
            .map(|r| r.window.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(())
}

async fn handle_config(db: &Database, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let val: Option<String> = db
                .reader()
                .call({
                    let key = key.clone();
                    move |conn| socialai::storage::repository::get_config(conn, &key)
                })
                .await?;
            match val {
                Some(v) => println!("{key} = {v}"),
                None => println!("{key} is not set"),
            }
        }
        ConfigAction::Set { key, value } => {
            if !socialai::config::SETTING_KEYS.iter().any(|(k, _)| *k == key) {
                log::warn!("'{key}' is not a recognized setting; storing it anyway");
            }
            db.writer()
                .call(move |conn| {
                    socialai::storage::repository::set_config(conn, &key, &value)?;
                    Ok::<(), rusqlite::Error>(())
                })
                .await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items: Vec<(String, String)> = db
                .reader()
                .call(|conn| socialai::storage::repository::list_config(conn))
                .await?;
            println!("Settings (default shown when unset):");
            for (key, default) in socialai::config::SETTING_KEYS {
                match items.iter().find(|(k, _)| k == key) {
                    Some((_, v)) => println!("  {key} = {v}"),
                    None => println!("  {key} = {default} (default)"),
                }
            }
            for (k, v) in items
                .iter()
                .filter(|(k, _)| !socialai::config::SETTING_KEYS.iter().any(|(s, _)| s == k))
            {
                println!("  {k} = {v} (unrecognized)");
            }
        }
    }
    Ok(())
}
