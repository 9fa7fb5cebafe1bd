// src/main.rs
//
// Command-line front-end: resolves one link and prints the chooser sheet
// as JSON. Installed apps are declared on the command line since there is
// no platform package manager to query.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use linksheet_resolver::application::commands::resolve_link;
use linksheet_resolver::application::dto::{LinkAction, LinkRequestDto};
use linksheet_resolver::application::state::{NetworkOptions, ResolverState};
use linksheet_resolver::config::{JsonSettingsStore, SettingsProvider};
use linksheet_resolver::db::{create_connection_pool, create_connection_pool_at};
use linksheet_resolver::domain::ActivityInfo;
use linksheet_resolver::integrations::{InMemoryPackageManager, InstalledActivity};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAction {
    View,
    Send,
    Search,
}

impl From<CliAction> for LinkAction {
    fn from(action: CliAction) -> Self {
        match action {
            CliAction::View => LinkAction::View,
            CliAction::Send => LinkAction::Send,
            CliAction::Search => LinkAction::WebSearch,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "linksheet")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    linksheet https://www.google.com/amp/s/example.com/article
    linksheet --action send "look at https://youtu.be/abc"
    linksheet --browser org.mozilla.firefox --app com.reddit.frontpage=reddit.com https://reddit.com/r/rust
"#)]
struct Cli {
    /// URL to open, text to share, or search query
    #[arg(value_name = "LINK")]
    link: String,

    #[arg(long, value_enum, default_value = "view")]
    action: CliAction,

    /// Package of the app the link came from
    #[arg(long, value_name = "PACKAGE")]
    referrer: Option<String>,

    /// Installed browser (repeatable)
    #[arg(long = "browser", value_name = "PACKAGE")]
    browsers: Vec<String>,

    /// Installed app handling a host (repeatable)
    #[arg(long = "app", value_name = "PACKAGE=HOST")]
    apps: Vec<String>,

    /// Settings file (JSON); defaults to the user config directory
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// SQLite database; defaults to the user data directory
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Remote resolve service for redirects and AMP pages
    #[arg(long, value_name = "URL")]
    external_service: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "15")]
    timeout: u64,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn installed_activities(cli: &Cli) -> Result<Vec<InstalledActivity>, String> {
    let mut activities = Vec::new();

    for package in &cli.browsers {
        let activity = ActivityInfo::new(package, &format!("{}.Main", package), package);
        activities.push(InstalledActivity::browser(activity));
    }

    for spec in &cli.apps {
        let (package, host) = spec
            .split_once('=')
            .ok_or_else(|| format!("Expected PACKAGE=HOST, got '{}'", spec))?;
        let activity = ActivityInfo::new(package, &format!("{}.Main", package), package);
        activities.push(InstalledActivity::app_for_host(activity, host));
    }

    Ok(activities)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    // 1. INFRASTRUCTURE
    let pool = Arc::new(match &cli.database {
        Some(path) => create_connection_pool_at(path)?,
        None => create_connection_pool()?,
    });
    let settings: Arc<dyn SettingsProvider> = Arc::new(match &cli.settings {
        Some(path) => JsonSettingsStore::open(path.clone())?,
        None => JsonSettingsStore::open_default()?,
    });
    let packages = Arc::new(InMemoryPackageManager::new(installed_activities(&cli)?));

    // 2. APPLICATION STATE
    let options = NetworkOptions {
        request_timeout: Duration::from_secs(cli.timeout),
        external_service_endpoint: cli.external_service.clone(),
    };
    let state = ResolverState::bootstrap(pool, settings, packages, options)?;

    // 3. RESOLVE
    let request = LinkRequestDto {
        action: cli.action.into(),
        payload: cli.link.clone(),
        referrer_package: cli.referrer.clone(),
    };
    let sheet = resolve_link(request, &state)
        .await
        .map_err(|e| format!("{}: {}", e.message, e.details.unwrap_or_default()))?;

    println!("{}", serde_json::to_string_pretty(&sheet)?);
    Ok(())
}
