use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use script_summaries_indexer::{
    Regenerator, SourceWatcher, SummariesConfig, SummariesService, CONFIG_FILE_NAME,
};
use script_summaries_store::{trim_summary, DeclaredType, SummaryIndex, SummaryQuery};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

const WORKSPACE_CRATES: &[&str] = &[
    "script_summaries_extractor",
    "script_summaries_store",
    "script_summaries_indexer",
    "script_summaries_cli",
];

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "script-summaries")]
#[command(about = "Class summaries for C# scripts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Config file (defaults to <project>/script-summaries.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild every artifact and print the run statistics as JSON
    Regenerate,

    /// Print the summary of a script by its relative path
    Get(GetArgs),

    /// Print the summary of a type by owner and full type name
    Type(TypeArgs),

    /// List every script that has a summary
    List,

    /// Watch the scan root and regenerate on changes
    Watch,
}

#[derive(Args)]
struct GetArgs {
    /// Path relative to the project, e.g. Assets/Scripts/Foo.cs
    path: String,

    /// Maximum summary lines to print (0 = all; defaults to tooltip_line_length)
    #[arg(long)]
    max_lines: Option<usize>,
}

#[derive(Args)]
struct TypeArgs {
    /// Owning assembly name, or `-` when unknown
    owner: String,

    /// Fully-qualified type name, e.g. Game.Foo
    type_name: String,

    /// Maximum summary lines to print (0 = all; defaults to tooltip_line_length)
    #[arg(long)]
    max_lines: Option<usize>,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let project_dir = match &cli.project {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("Failed to resolve current directory")?,
    };
    let config = load_config(cli.config.as_deref(), &project_dir)?;
    init_logging(&cli, &config);

    match cli.command {
        Commands::Regenerate => {
            let stats = Regenerator::new(config, &project_dir).regenerate();
            print_stdout(&serde_json::to_string_pretty(&stats)?)?;
        }
        Commands::Get(args) => {
            let index = open_index(&config, &project_dir);
            let summary = index.get_summary(SummaryQuery::Path(&args.path));
            print_summary(summary, args.max_lines, &config, &args.path)?;
        }
        Commands::Type(args) => {
            let owner = (args.owner != "-").then(|| args.owner.clone());
            let declared = DeclaredType::new(args.type_name.clone(), owner);
            let index = open_index(&config, &project_dir);
            let summary = index.get_summary(SummaryQuery::Type(&declared));
            print_summary(summary, args.max_lines, &config, &args.type_name)?;
        }
        Commands::List => {
            let index = open_index(&config, &project_dir);
            let lines: Vec<String> = index
                .entries()
                .into_iter()
                .map(|(path, summary)| {
                    let first = summary.lines().next().unwrap_or_default().trim().to_string();
                    format!("{path}\t{first}")
                })
                .collect();
            if !lines.is_empty() {
                print_stdout(&lines.join("\n"))?;
            }
        }
        Commands::Watch => run_watch(config, &project_dir).await?,
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>, project_dir: &Path) -> Result<SummariesConfig> {
    match explicit {
        Some(path) => SummariesConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => SummariesConfig::for_project(project_dir).with_context(|| {
            format!(
                "Failed to load {}",
                project_dir.join(CONFIG_FILE_NAME).display()
            )
        }),
    }
}

fn init_logging(cli: &Cli, config: &SummariesConfig) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if config.enable_debug_logging {
        for module in WORKSPACE_CRATES {
            builder.filter_module(module, log::LevelFilter::Debug);
        }
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn open_index(config: &SummariesConfig, project_dir: &Path) -> SummaryIndex {
    let index = SummaryIndex::new(config.resolve(project_dir).output_dir);
    index.reinitialize();
    index
}

fn print_summary(
    summary: Option<String>,
    max_lines: Option<usize>,
    config: &SummariesConfig,
    what: &str,
) -> Result<()> {
    let Some(summary) = summary else {
        eprintln!("No summary for {what}");
        std::process::exit(1);
    };
    let max_lines = max_lines.unwrap_or(config.tooltip_line_length);
    print_stdout(&trim_summary(&summary, max_lines))
}

async fn run_watch(config: SummariesConfig, project_dir: &Path) -> Result<()> {
    if !config.auto_generate_on_reload {
        log::warn!("auto_generate_on_reload is off; changes will be reported but not regenerated");
    }

    let service = Arc::new(SummariesService::new(config, project_dir));
    let mut watcher = SourceWatcher::new(&service.regenerator().paths().scan_root);
    service.watch_and_regenerate(&mut watcher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        let _ = shutdown_tx.send(true);
    });

    watcher
        .run(shutdown_rx)
        .await
        .context("Source watcher failed")?;
    Ok(())
}
