//! Vaptrack CLI - security feature lifecycle tracker

use clap::{Parser, Subcommand};
use vaptrack_core::config::Config;
use vaptrack_core::domain::catalog::Scope;
use vaptrack_core::domain::features::MetaPatch;
use vaptrack_core::storage::{Database, DatabaseConfig, default_database_path};
use vaptrack_core::tracker::FeatureTracker;

#[derive(Parser)]
#[command(name = "vaptrack")]
#[command(author, version, about = "Security feature lifecycle tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage features
    Features {
        #[command(subcommand)]
        action: FeatureAction,
    },

    /// Manage domains and their enabled feature sets
    Domains {
        #[command(subcommand)]
        action: DomainAction,
    },

    /// Build record log
    Builds {
        #[command(subcommand)]
        action: BuildAction,
    },

    /// Catalog file management
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
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
enum FeatureAction {
    /// List features from a catalog, enriched with status and meta
    List {
        /// Catalog file (defaults to the configured one)
        #[arg(short, long)]
        file: Option<String>,
        /// Show only released features
        #[arg(long)]
        client: bool,
    },
    /// Transition a feature to a new status
    Transition {
        /// Feature key
        key: String,
        /// Target status (Draft, Develop, Test, Release)
        status: String,
        /// Note recorded in the audit log
        #[arg(short, long, default_value = "")]
        note: String,
        /// Acting user recorded in the audit log
        #[arg(short, long, default_value = "cli")]
        actor: String,
    },
    /// Show a feature's transition history, newest first
    History { key: String },
    /// Update a feature's meta record
    Meta {
        /// Feature key
        key: String,
        /// Catalog file the key must belong to
        #[arg(short, long)]
        file: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        test_method: Option<String>,
        #[arg(long)]
        verification_steps: Option<String>,
        #[arg(long)]
        include_test_method: Option<bool>,
        #[arg(long)]
        include_verification: Option<bool>,
        #[arg(long)]
        is_enforced: Option<bool>,
        #[arg(long)]
        wireframe_url: Option<String>,
        /// UI control schema as a JSON string (stored opaquely)
        #[arg(long)]
        generated_schema: Option<String>,
        /// Implementation data as a JSON string (stored opaquely)
        #[arg(long)]
        implementation_data: Option<String>,
    },
    /// Assign a feature to a user
    Assign {
        key: String,
        /// User to assign; omit to clear the assignment
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum DomainAction {
    /// List all domains with their enabled features
    List,
    /// Add or update a domain
    Update {
        /// Hostname
        domain: String,
        #[arg(long)]
        wildcard: bool,
        #[arg(long, default_value = "")]
        license_id: String,
        #[arg(long)]
        license_type: Option<String>,
    },
    /// Replace a domain's enabled feature set
    SetFeatures {
        /// Hostname
        domain: String,
        /// Feature keys (the full desired set; all must be released)
        keys: Vec<String>,
    },
}

#[derive(Subcommand)]
enum BuildAction {
    /// Record a build for a domain
    Record {
        /// Hostname
        domain: String,
        /// Package version
        #[arg(short, long)]
        version: Option<String>,
        /// Feature keys bundled; omit to use the domain's enabled set
        keys: Vec<String>,
    },
    /// Show build history, newest first
    History {
        /// Filter by hostname
        #[arg(short, long)]
        domain: Option<String>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List catalog files in the data directory
    Files,
    /// Show the raw entries of one catalog file
    Show { file: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vaptrack=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    // Lazily open the database only for commands that need it
    let open_tracker = || async {
        let db_path = match &config.database.path {
            Some(path) => path.clone(),
            None => default_database_path(),
        };
        let db = Database::new(DatabaseConfig::with_path(db_path)).await?;
        let data_dir = config.catalog_data_dir()?;
        anyhow::Ok((FeatureTracker::new(&db, data_dir), db))
    };

    match cli.command {
        Commands::Features { action } => {
            let (tracker, _db) = open_tracker().await?;
            cmd_features(&tracker, &config, action, cli.format, cli.quiet).await
        }

        Commands::Domains { action } => {
            let (tracker, _db) = open_tracker().await?;
            cmd_domains(&tracker, &config, action, cli.format, cli.quiet).await
        }

        Commands::Builds { action } => {
            let (tracker, _db) = open_tracker().await?;
            cmd_builds(&tracker, &config, action, cli.format, cli.quiet).await
        }

        Commands::Catalog { action } => {
            let (tracker, _db) = open_tracker().await?;
            cmd_catalog(&tracker, action, cli.format)
        }

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Doctor => cmd_doctor(&config, cli.quiet).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_features(
    tracker: &FeatureTracker,
    config: &Config,
    action: FeatureAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        FeatureAction::List { file, client } => {
            let file = file.unwrap_or_else(|| config.catalog.default_file.clone());
            let scope = if client { Scope::Client } else { Scope::Admin };
            let views = tracker.list_features(&file, scope).await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&views)?);
                return Ok(());
            }

            if views.is_empty() {
                if !quiet {
                    println!("No features found in '{}'.", file);
                }
            } else {
                if !quiet {
                    println!("Features ({}):", file);
                }
                for v in views {
                    let assigned = v
                        .assigned_to
                        .map(|u| format!(" [{}]", u))
                        .unwrap_or_default();
                    let released = v
                        .implemented_at
                        .map(|t| format!(" released {}", t.format("%Y-%m-%d")))
                        .unwrap_or_default();
                    println!(
                        "  {} - {} ({}){}{}",
                        v.key, v.label, v.status, assigned, released
                    );
                }
            }
        }
        FeatureAction::Transition {
            key,
            status,
            note,
            actor,
        } => {
            tracker.transition_feature(&key, &status, &note, &actor).await?;
            if !quiet {
                let current = tracker.feature_status(&key).await?;
                println!("Feature '{}' is now {}.", key, current);
            }
        }
        FeatureAction::History { key } => {
            let events = tracker.get_history(&key).await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&events)?);
                return Ok(());
            }

            if events.is_empty() {
                if !quiet {
                    println!("No history for '{}'.", key);
                }
            } else {
                if !quiet {
                    println!("History for '{}':", key);
                }
                for e in events {
                    let note = if e.note.is_empty() {
                        String::new()
                    } else {
                        format!(" - {}", e.note)
                    };
                    println!(
                        "  {} {} -> {} by {}{}",
                        e.created_at.format("%Y-%m-%d %H:%M:%S"),
                        e.old_status,
                        e.new_status,
                        e.actor,
                        note
                    );
                }
            }
        }
        FeatureAction::Meta {
            key,
            file,
            category,
            test_method,
            verification_steps,
            include_test_method,
            include_verification,
            is_enforced,
            wireframe_url,
            generated_schema,
            implementation_data,
        } => {
            let file = file.unwrap_or_else(|| config.catalog.default_file.clone());
            let patch = MetaPatch {
                category,
                test_method,
                verification_steps,
                include_test_method,
                include_verification,
                is_enforced,
                wireframe_url,
                generated_schema: generated_schema
                    .map(|s| serde_json::from_str(&s))
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("Invalid generated_schema JSON: {}", e))?,
                implementation_data: implementation_data
                    .map(|s| serde_json::from_str(&s))
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("Invalid implementation_data JSON: {}", e))?,
            };

            let meta = tracker.update_feature_meta(&file, &key, &patch).await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&meta)?);
            } else if !quiet {
                println!("Meta updated for '{}'.", key);
            }
        }
        FeatureAction::Assign { key, user } => {
            tracker.assign_feature(&key, user.as_deref()).await?;
            if !quiet {
                match user {
                    Some(user) => println!("Feature '{}' assigned to {}.", key, user),
                    None => println!("Feature '{}' unassigned.", key),
                }
            }
        }
    }
    Ok(())
}

async fn cmd_domains(
    tracker: &FeatureTracker,
    config: &Config,
    action: DomainAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        DomainAction::List => {
            let domains = tracker.list_domains().await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&domains)?);
                return Ok(());
            }

            if domains.is_empty() {
                if !quiet {
                    println!("No domains registered.");
                    println!("\nAdd one with: vaptrack domains update <hostname>");
                }
            } else {
                if !quiet {
                    println!("Domains:");
                }
                for d in domains {
                    let wildcard = if d.is_wildcard { " [wildcard]" } else { "" };
                    println!(
                        "  {} ({}){} - {} feature(s)",
                        d.domain,
                        d.license_type,
                        wildcard,
                        d.features.len()
                    );
                    for key in &d.features {
                        println!("    - {}", key);
                    }
                }
            }
        }
        DomainAction::Update {
            domain,
            wildcard,
            license_id,
            license_type,
        } => {
            let license_type =
                license_type.unwrap_or_else(|| config.build.default_license_type.clone());
            let stored = tracker
                .upsert_domain(&domain, wildcard, &license_id, &license_type)
                .await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&stored)?);
            } else if !quiet {
                println!("Domain '{}' saved ({}).", stored.domain, stored.license_type);
            }
        }
        DomainAction::SetFeatures { domain, keys } => {
            let stored = tracker.set_domain_features(&domain, &keys).await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&stored)?);
            } else if !quiet {
                println!(
                    "Domain '{}' now has {} enabled feature(s).",
                    stored.domain,
                    stored.features.len()
                );
            }
        }
    }
    Ok(())
}

async fn cmd_builds(
    tracker: &FeatureTracker,
    config: &Config,
    action: BuildAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        BuildAction::Record {
            domain,
            version,
            keys,
        } => {
            let version = version.unwrap_or_else(|| config.build.default_version.clone());

            let record = if keys.is_empty() {
                // No explicit keys: snapshot the domain's enabled set
                let stored = tracker
                    .get_domain(&domain)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Domain '{}' not found.", domain))?;
                tracker.record_build_from_domain(stored.id, &version).await?
            } else {
                tracker.record_build(&domain, &version, &keys).await?
            };

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else if !quiet {
                println!(
                    "Build {} recorded for '{}' with {} feature(s).",
                    record.version,
                    record.domain,
                    record.features.len()
                );
            }
        }
        BuildAction::History { domain } => {
            let records = tracker.get_build_history(domain.as_deref()).await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            if records.is_empty() {
                if !quiet {
                    println!("No builds recorded.");
                }
            } else {
                if !quiet {
                    println!("Builds:");
                }
                for r in records {
                    println!(
                        "  {} {} v{} ({} feature(s))",
                        r.created_at.format("%Y-%m-%d %H:%M:%S"),
                        r.domain,
                        r.version,
                        r.features.len()
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_catalog(
    tracker: &FeatureTracker,
    action: CatalogAction,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match action {
        CatalogAction::Files => {
            let files = tracker.list_catalog_files()?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else if files.is_empty() {
                println!("No catalog files found.");
            } else {
                for file in files {
                    println!("{}", file);
                }
            }
        }
        CatalogAction::Show { file } => {
            let entries = tracker.load_catalog(&file)?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("  {} - {}", entry.resolved_key(), entry.name);
                }
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

async fn cmd_doctor(config: &Config, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Vaptrack Health Check");
        println!("=====================");
        println!();
    }

    let mut all_ok = true;

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check catalog data directory
    match config.catalog_data_dir() {
        Ok(dir) => {
            if dir.exists() {
                if !quiet {
                    println!("[OK] Catalog directory: {}", dir.display());
                }
            } else {
                all_ok = false;
                if !quiet {
                    println!("[!!] Catalog directory: {} (missing)", dir.display());
                    println!("     Create it and add catalog JSON files.");
                }
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Catalog directory: Error - {}", e);
            }
        }
    }

    // Check database
    let db_result = async {
        let db_path = match &config.database.path {
            Some(path) => path.clone(),
            None => default_database_path(),
        };
        Database::new(DatabaseConfig::with_path(db_path)).await
    }
    .await;

    match db_result {
        Ok(db) => match db.health_check().await {
            Ok(()) => {
                if !quiet {
                    println!("[OK] Database: Connected");
                    println!("     Path: {}", db.path().display());
                }

                match db.migration_status().await {
                    Ok(status) => {
                        if !quiet {
                            if status.needs_migration {
                                println!(
                                    "[!!] Database: Migrations pending (v{} -> v{})",
                                    status.current_version, status.target_version
                                );
                            } else {
                                println!("[OK] Database: Schema v{}", status.current_version);
                            }
                        }
                    }
                    Err(e) => {
                        if !quiet {
                            println!("[!!] Database: Migration check failed - {}", e);
                        }
                    }
                }
            }
            Err(e) => {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: Health check failed - {}", e);
                }
            }
        },
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Failed to initialize - {}", e);
            }
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
