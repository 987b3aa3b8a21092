use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use whisper::{Client, Config};

mod secret_cmd;

#[derive(Parser)]
#[command(name = "whisper", version, about = "Share one-time secrets through Whisper")]
struct Cli {
    /// API endpoint (default from $WHISPER_ENDPOINT, ~/.whisper/config.toml or http://localhost:8318/v1)
    #[arg(long, short = 'e', global = true)]
    endpoint: Option<String>,

    /// Base URL used to build share links (default from $WHISPER_UI_URL or config)
    #[arg(long, global = true)]
    ui_url: Option<String>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, env = "WHISPER_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a secret and print its share link
    #[command(name = "create")]
    Create(CreateArgs),

    /// Fetch a secret by token or share link
    #[command(name = "fetch")]
    Fetch(FetchArgs),

    /// Destroy a secret by token or share link
    #[command(name = "destroy")]
    Destroy(DestroyArgs),

    /// Show the server status badge
    #[command(name = "status")]
    Status,

    /// View or modify config (~/.whisper/config.toml)
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Secret text
    #[arg(short, long, value_name = "TEXT")]
    pub secret: Option<String>,

    /// The --secret text is already base64 encoded
    #[arg(short = 'b', long = "b64encoded", alias = "b64", requires = "secret")]
    pub b64encoded: bool,

    /// Upload a file (at most 64 KB) as the secret
    #[arg(short = 'i', long = "in", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Generate a random secret of this length
    #[arg(short, long, value_name = "LEN")]
    pub generate: Option<usize>,

    /// Password required to fetch or destroy the secret
    #[arg(short, long)]
    pub password: Option<String>,

    /// Generate a random password of this length and print it
    #[arg(short = 'G', long, value_name = "LEN")]
    pub generate_password: Option<usize>,

    /// Number of times the secret may be fetched (1-108)
    #[arg(short, long, conflicts_with = "unlimited")]
    pub accesses: Option<i64>,

    /// Allow unlimited fetches until the secret expires
    #[arg(long)]
    pub unlimited: bool,

    /// Lifetime: 5m, 15m, 30m, 1h, 2h, 3h, 24h, 48h, 72h or 168h
    #[arg(short, long)]
    pub lifetime: Option<String>,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Token or full share link
    pub token: String,

    /// Password for protected secrets (prompted for if needed)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Write the secret to this file, or into this directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Destroy the secret after displaying it
    #[arg(long)]
    pub destroy: bool,

    /// Skip the destroy confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Token or full share link
    pub token: String,

    /// Password for protected secrets (defaults to the cached one)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current config
    Show,
    /// Set a config value
    Set {
        /// Key to set (api_url, ui_url, default_lifetime, default_accesses)
        key: String,
        /// Value to set
        value: String,
    },
    /// Reset config to defaults
    Reset,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Config { action } = cli.command {
        return handle_config(action);
    }

    let mut config = Config::load().unwrap_or_default().apply_env();
    if let Some(endpoint) = cli.endpoint {
        config.api_url = endpoint;
    }
    if let Some(ui_url) = cli.ui_url {
        config.ui_url = ui_url;
    }
    let client = Client::new(&config.api_url);

    match cli.command {
        Commands::Create(args) => secret_cmd::create(&client, &config, args),
        Commands::Fetch(args) => secret_cmd::fetch(&client, args),
        Commands::Destroy(args) => secret_cmd::destroy(&client, args),
        Commands::Status => secret_cmd::status(&client),
        Commands::Config { .. } => Ok(()),
    }
}

fn handle_config(action: Option<ConfigAction>) -> Result<()> {
    match action {
        None | Some(ConfigAction::Show) => {
            let config = Config::load().unwrap_or_default();
            println!("api_url = \"{}\"", config.api_url);
            println!("ui_url = \"{}\"", config.ui_url);
            println!("default_lifetime = \"{}\"", config.default_lifetime);
            println!("default_accesses = {}", config.default_accesses);
        }
        Some(ConfigAction::Set { key, value }) => {
            let mut config = Config::load().unwrap_or_default();
            config.set(&key, &value)?;
            let path = config.save()?;
            println!("saved to {}", path.display());
        }
        Some(ConfigAction::Reset) => {
            let config = Config::default();
            let path = config.save()?;
            println!("reset to defaults at {}", path.display());
        }
    }
    Ok(())
}
