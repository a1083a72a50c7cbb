mod catalog;
mod compiler;
mod config;
mod error;
mod models;
mod template;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog::StaticCatalog;
use compiler::scan;
use compiler::{build_dispatch_workflow, invoke, ShortcutSpecGenerator, ToolCatalog, ToolRepository};
use config::ToolboxConfig;
use error::ToolboxError;
use models::ShortcutToolMetadata;
use template::ids::UuidGenerator;
use template::CollisionPolicy;

#[derive(Parser)]
#[command(name = "toolbox")]
#[command(about = "Compile workflow actions into tool definitions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level filter (e.g. debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile workflow templates into a tool catalog
    Compile {
        /// Workflow files or directories of *.json workflows
        #[arg(required = true)]
        templates: Vec<PathBuf>,
        /// Action definitions (JSON export of WFActions.plist)
        #[arg(long)]
        actions: Option<PathBuf>,
        /// App intent definitions keyed by bundle identifier
        #[arg(long)]
        intents: Option<PathBuf>,
        /// Tool definition overrides
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// Catalog output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// What to do with ambiguous parameter names
        #[arg(long, value_enum)]
        collision_policy: Option<CollisionPolicy>,
        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the tools in a compiled catalog
    List {
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print MCP tool entries instead of names
        #[arg(long)]
        mcp: bool,
    },

    /// Fill a tool's template with parameters and print the concrete action
    Instantiate {
        /// Tool name
        tool: String,
        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Build the runner workflow that dispatches to every tool
    Workflow {
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage project configuration (.toolbox/config.toml)
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Create default config.toml in .toolbox/ directory
    Init,
    /// Show path to the config file
    Path,
}

fn init_logging(level: &str) {
    let json_logging = std::env::var("TOOLBOX_LOG_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("toolbox={}", level).into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<ToolboxError>()
                .map_or(1, ToolboxError::exit_code);
            eprintln!("Error: {:#}", e);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = config::load_config(&config::config_dir(&cwd));

    match command {
        Commands::Compile {
            templates,
            actions,
            intents,
            overrides,
            output,
            collision_policy,
            compact,
        } => {
            let options = CompileOptions {
                actions: actions.or(config.catalog.actions_path.clone()),
                intents: intents.or(config.catalog.intents_path.clone()),
                overrides: overrides.or(config.catalog.overrides_path.clone()),
                output: output.unwrap_or(config.output.catalog_path.clone()),
                policy: collision_policy.unwrap_or(config.compiler.collision_policy),
                pretty: config.output.pretty && !compact,
            };
            handle_compile(&config, &templates, options)
        }
        Commands::List { catalog, mcp } => handle_list(&catalog_path(&config, catalog), mcp),
        Commands::Instantiate {
            tool,
            params,
            catalog,
        } => handle_instantiate(&catalog_path(&config, catalog), &tool, &params),
        Commands::Workflow { catalog, output } => {
            handle_workflow(&catalog_path(&config, catalog), output.as_deref())
        }
        Commands::Config { action } => handle_config(&cwd, &config, action),
    }
}

fn catalog_path(config: &ToolboxConfig, flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| config.output.catalog_path.clone())
}

struct CompileOptions {
    actions: Option<PathBuf>,
    intents: Option<PathBuf>,
    overrides: Option<PathBuf>,
    output: PathBuf,
    policy: CollisionPolicy,
    pretty: bool,
}

fn handle_compile(config: &ToolboxConfig, templates: &[PathBuf], options: CompileOptions) -> anyhow::Result<()> {
    let lookups = StaticCatalog::from_files(options.actions.as_deref(), options.intents.as_deref())?;
    tracing::debug!("{} action definitions available", lookups.action_count());
    let generator = ShortcutSpecGenerator::new(lookups.clone(), lookups, options.policy);
    let mut repository = ToolRepository::new(config.compiler.tool_type.clone(), generator);

    if let Some(path) = &options.overrides {
        let entries = scan::read_overrides(path)?;
        let count = scan::register_overrides(&mut repository, entries)?;
        tracing::info!("Registered {} overrides from {}", count, path.display());
    }

    let stats = scan::scan(&mut repository, templates, config.compiler.skip_logical_actions)?;
    if repository.is_empty() {
        tracing::warn!("No parameterized actions found in {} files", stats.files);
    }
    for (action, tagged) in repository.list_with_keys() {
        tracing::debug!(
            "{} <- {} ({} params)",
            tagged.spec.effective_name(),
            action.identifier,
            tagged.spec.definition.parameters.len()
        );
    }
    let overridden = repository
        .list()
        .iter()
        .filter(|t| t.spec.overrides.is_some())
        .count();
    let tools = repository.len();

    let catalog = repository.into_catalog();
    catalog.write_to(&options.output, options.pretty)?;

    println!(
        "Compiled {} tools ({} overridden) from {} files ({} duplicates) -> {}",
        tools,
        overridden,
        stats.files,
        stats.duplicates,
        options.output.display()
    );
    Ok(())
}

fn load_catalog(path: &Path) -> anyhow::Result<ToolCatalog<ShortcutToolMetadata>> {
    if !path.exists() {
        anyhow::bail!(
            "Catalog not found: {} (run `toolbox compile` first)",
            path.display()
        );
    }
    Ok(ToolCatalog::read_from(path)?)
}

fn handle_list(path: &Path, mcp: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(path)?;
    if catalog.is_empty() {
        eprintln!("Catalog {} has no tools", path.display());
        return Ok(());
    }

    if mcp {
        println!("{}", serde_json::to_string_pretty(&catalog.mcp_tools())?);
        return Ok(());
    }

    for definition in catalog.definitions() {
        let summary = definition.description.lines().next().unwrap_or_default();
        println!(
            "{} ({} params): {}",
            definition.name,
            definition.parameters.len(),
            summary
        );
    }
    Ok(())
}

fn handle_instantiate(path: &Path, tool: &str, params: &str) -> anyhow::Result<()> {
    let catalog = load_catalog(path)?;
    let params: serde_json::Value = serde_json::from_str(params).map_err(ToolboxError::from)?;
    let serde_json::Value::Object(params) = params else {
        anyhow::bail!("--params must be a JSON object");
    };

    let action = invoke(&catalog, tool, &params)?;
    println!("{}", serde_json::to_string_pretty(&action)?);
    Ok(())
}

fn handle_workflow(path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let catalog = load_catalog(path)?;
    let workflow = build_dispatch_workflow(&catalog, &mut UuidGenerator)?;
    let text = serde_json::to_string_pretty(&workflow)?;

    match output {
        Some(out) => {
            std::fs::write(out, text)?;
            println!("Wrote {} actions to {}", workflow.actions.len(), out.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn handle_config(cwd: &Path, config: &ToolboxConfig, action: Option<ConfigAction>) -> anyhow::Result<()> {
    let toolbox_dir = cwd.join(config::CONFIG_DIR);
    let config_path = toolbox_dir.join(config::CONFIG_FILE);

    match action {
        Some(ConfigAction::Path) => {
            println!("{}", config::config_dir(cwd).join(config::CONFIG_FILE).display());
        }
        Some(ConfigAction::Init) => {
            std::fs::create_dir_all(&toolbox_dir)?;
            if config_path.exists() {
                eprintln!("Config already exists: {}", config_path.display());
                return Ok(());
            }
            std::fs::write(&config_path, config::DEFAULT_CONFIG)?;
            println!("Created: {}", config_path.display());
        }
        None => {
            println!("# Effective config\n");
            println!("{}", toml::to_string_pretty(config)?);
        }
    }

    Ok(())
}
