//! Sift CLI - seed and search board members and posts

use std::fmt::Display;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sift_core::config::Config;
use sift_core::domain::{MemberRepository, PostRepository};
use sift_core::query::{FieldRef, Page, SearchParams, SortRegistry};
use sift_core::storage::Database;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "sift")]
#[command(author, version, about = "Keyword search and pagination over a board database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides database.path)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage members
    Members {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Manage posts
    Posts {
        #[command(subcommand)]
        action: PostAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum MemberAction {
    /// Register a member
    Add { username: String, nickname: String },
    /// Search members (kw-type: USERNAME, NICKNAME, ALL)
    Search(SearchArgs),
}

#[derive(Subcommand)]
enum PostAction {
    /// Write a post
    Add {
        /// Author member ID
        #[arg(long)]
        author: i64,
        title: String,
        content: String,
    },
    /// Search posts (kw-type: TITLE, CONTENT, AUTHOR_NICKNAME, ALL)
    Search(SearchArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Search mode
    #[arg(long)]
    kw_type: Option<String>,
    /// Keyword (empty matches everything)
    #[arg(long)]
    kw: Option<String>,
    /// Sort type such as ID or TITLE_ASC; repeat for secondary keys
    #[arg(long)]
    sort: Vec<String>,
    /// 1-based page number
    #[arg(long, allow_negative_numbers = true)]
    page: Option<i64>,
    /// Records per page
    #[arg(long, allow_negative_numbers = true)]
    page_size: Option<i64>,
}

impl SearchArgs {
    fn into_params(self) -> SearchParams {
        SearchParams {
            page: self.page,
            page_size: self.page_size,
            kw: self.kw,
            kw_type: self.kw_type,
            sort: self.sort,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
    /// Reset to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("sift=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(err) = &result {
        if let Some(core) = err.downcast_ref::<sift_core::Error>() {
            eprintln!("error[{}]: {}", core.code(), core);
            if let Some(hint) = core.suggestion() {
                eprintln!("  hint: {}", hint);
            }
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Members { action } => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database).await?;
            cmd_members(&db, &config, action, format, quiet).await
        }

        Commands::Posts { action } => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database).await?;
            cmd_posts(&db, &config, action, format, quiet).await
        }

        Commands::Config { action } => cmd_config(action, quiet),

        Commands::Doctor => cmd_doctor(cli.database, quiet).await,
    }
}

async fn open_database(config: &Config, path: Option<PathBuf>) -> anyhow::Result<Database> {
    let mut db_config = config.database_config();
    if let Some(path) = path {
        db_config.path = path;
    }
    debug!(path = %db_config.path.display(), "Opening database");
    Database::new(db_config).await
}

async fn cmd_members(
    db: &Database,
    config: &Config,
    action: MemberAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let repo = MemberRepository::with_options(db.pool().clone(), config.query_options());

    match action {
        MemberAction::Add { username, nickname } => {
            let member = repo.create(&username, &nickname).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&member)?),
                OutputFormat::Text => {
                    if !quiet {
                        println!("Created member {}", member);
                    } else {
                        println!("{}", member.id);
                    }
                }
            }
        }
        MemberAction::Search(args) => {
            let params = args.into_params();
            warn_unknown_sort_keys(repo.facade().registry(), &params.sort);
            let page = repo
                .facade()
                .search_params(&params, &config.search_limits())
                .await?;
            print_page(&page, format, quiet)?;
        }
    }
    Ok(())
}

async fn cmd_posts(
    db: &Database,
    config: &Config,
    action: PostAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let repo = PostRepository::with_options(db.pool().clone(), config.query_options());

    match action {
        PostAction::Add {
            author,
            title,
            content,
        } => {
            let post = repo.create(author, &title, &content).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&post)?),
                OutputFormat::Text => {
                    if !quiet {
                        println!("Created post {}", post);
                    } else {
                        println!("{}", post.id);
                    }
                }
            }
        }
        PostAction::Search(args) => {
            let params = args.into_params();
            warn_unknown_sort_keys(repo.facade().registry(), &params.sort);
            let page = repo
                .facade()
                .search_params(&params, &config.search_limits())
                .await?;
            print_page(&page, format, quiet)?;
        }
    }
    Ok(())
}

/// Searches drop sort keys they don't know; tell the operator which ones
fn warn_unknown_sort_keys<F: FieldRef>(registry: &SortRegistry<F>, sort: &[String]) {
    for token in sort {
        let directive = registry.parse_sort_type(token);
        if registry.resolve(&directive.key).is_none() {
            let valid: Vec<_> = registry.tokens().collect();
            eprintln!(
                "warning: ignoring unknown sort key '{}' (valid keys: {})",
                token,
                valid.join(", ")
            );
        }
    }
}

fn print_page<T: Serialize + Display>(
    page: &Page<T>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(page)?),
        OutputFormat::Text => {
            for record in &page.content {
                println!("{}", record);
            }
            if !quiet {
                if page.is_empty() {
                    println!("No results.");
                }
                println!();
                println!(
                    "Page {}/{} ({} total, {} per page)",
                    u64::from(page.page_index) + 1,
                    page.total_pages.max(1),
                    page.total_elements,
                    page.page_size
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(database: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Sift Health Check");
        println!("=================");
        println!();
    }

    let mut all_ok = true;

    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
                println!("     Falling back to defaults");
            }
            Config::default()
        }
    };

    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: {}", e),
        }
    }

    match open_database(&config, database).await {
        Ok(db) => {
            if !quiet {
                println!("[OK] Database: {}", db.path().display());
            }

            match db.health_check().await {
                Ok(()) => {
                    if !quiet {
                        println!("[OK] Connection: Healthy");
                    }
                }
                Err(e) => {
                    all_ok = false;
                    warn!(error = %e, "Database health check failed");
                    if !quiet {
                        println!("[!!] Connection: {}", e);
                    }
                }
            }

            match db.migration_status().await {
                Ok(status) if !status.needs_migration => {
                    if !quiet {
                        println!("[OK] Schema: version {}", status.current_version);
                    }
                }
                Ok(status) => {
                    all_ok = false;
                    if !quiet {
                        println!(
                            "[!!] Schema: version {} (expected {})",
                            status.current_version, status.target_version
                        );
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Schema: {}", e);
                    }
                }
            }

            db.close().await;
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: {}", e);
            }
        }
    }

    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed.");
        } else {
            println!("Some checks failed.");
        }
    }

    if all_ok {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Health check failed"))
    }
}
