use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use patchdeps_core::{AnalysisMode, OutputFormat, PatchdepsConfig, RawRevision};
use patchdeps_gitpulse::mining::{collect_revisions, MiningOptions};
use patchdeps_gitpulse::series::read_series;
use patchdeps_lineage::{analyze, AnalysisOptions};

const CONFIG_FILE: &str = ".patchdeps.toml";

#[derive(Parser)]
#[command(
    name = "patchdeps",
    version,
    about = "Find textual dependencies among a series of patches",
    long_about = "patchdeps replays a series of commits or patch files line by line and reports\n\
                   which ones depend on which earlier ones, so a series can be reordered, split\n\
                   or reviewed piece by piece.\n\n\
                   Examples:\n  \
                     patchdeps analyze                       Analyze the whole history of HEAD\n  \
                     patchdeps analyze origin/main..HEAD     Analyze the commits of a branch\n  \
                     patchdeps analyze --patch outgoing/     Analyze a format-patch series\n  \
                     patchdeps analyze --output dot | dot -Tsvg > deps.svg"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .patchdeps.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Infer dependencies among commits or patch files
    #[command(long_about = "Infer dependencies among commits or patch files.\n\n\
        Revisions are selected like `git rev-list` selects them (default: HEAD) and\n\
        analyzed oldest first. With --patch, patch files are read instead, in the\n\
        order given; a directory contributes its *.patch and *.diff files by name.\n\n\
        Examples:\n  patchdeps analyze HEAD~10..HEAD\n  patchdeps analyze --window 0 --output list\n  \
        patchdeps analyze --patch 0001-a.patch --patch 0002-b.patch --mode file")]
    Analyze {
        /// Revisions or ranges to analyze (default: HEAD)
        specs: Vec<String>,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Read revisions from patch files or directories instead of git
        #[arg(long, value_name = "FILE")]
        patch: Vec<PathBuf>,

        /// Analysis granularity: line or file
        #[arg(long)]
        mode: Option<AnalysisMode>,

        /// Proximity window in lines; 0 reports hard dependencies only
        #[arg(long, short = 'w')]
        window: Option<u32>,

        /// Context lines requested from git (default: the window)
        #[arg(long, short = 'C')]
        context_lines: Option<u32>,

        /// Report format: list, matrix, dot or json
        #[arg(long, short)]
        output: Option<OutputFormat>,
    },
    /// Create a default .patchdeps.toml configuration file
    #[command(long_about = "Create a default .patchdeps.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .patchdeps.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mpatchdeps\x1b[0m v{version}, dependencies among patches\n");
        println!("Quick start:");
        println!("  \x1b[36mpatchdeps analyze\x1b[0m                  Analyze the history of HEAD");
        println!("  \x1b[36mpatchdeps analyze main..topic\x1b[0m      Analyze a branch");
        println!("  \x1b[36mpatchdeps init\x1b[0m                     Create a .patchdeps.toml\n");
    } else {
        println!("patchdeps v{version}, dependencies among patches\n");
        println!("Quick start:");
        println!("  patchdeps analyze                  Analyze the history of HEAD");
        println!("  patchdeps analyze main..topic      Analyze a branch");
        println!("  patchdeps init                     Create a .patchdeps.toml\n");
    }

    println!("Run 'patchdeps <command> --help' for details.");
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("failed to initialize logging")
}

fn load_config(path: Option<&Path>) -> Result<PatchdepsConfig> {
    match path {
        Some(path) => PatchdepsConfig::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display())),
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                Ok(PatchdepsConfig::from_file(default_path)?)
            } else {
                Ok(PatchdepsConfig::default())
            }
        }
    }
}

fn spinner(message: &'static str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn collect(
    path: &Path,
    specs: &[String],
    patches: &[PathBuf],
    context_lines: u32,
) -> Result<Vec<RawRevision>> {
    if !patches.is_empty() {
        if !specs.is_empty() {
            miette::bail!(miette::miette!(
                help = "drop the revision arguments or the --patch options",
                "revision specs and --patch cannot be combined"
            ));
        }
        return Ok(read_series(patches)?);
    }

    let options = MiningOptions {
        context_lines,
        ..MiningOptions::default()
    };
    Ok(collect_revisions(path, specs, &options)?)
}

const DEFAULT_CONFIG: &str = r#"# patchdeps configuration
# See: https://github.com/Meru143/patchdeps

[analysis]
# Granularity: "line" replays every line, "file" links revisions touching the same file
# mode = "line"
# Proximity window in lines; 0 reports hard dependencies only
# window = 2
# Context lines requested from git (defaults to the window)
# context_lines = 2
# Paths excluded from analysis
# skip_patterns = ["*.lock", "CHANGELOG.md", "docs/**"]

[output]
# Report format: "list", "matrix", "dot" or "json"
# format = "matrix"
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => print_welcome(use_color),
        Some(Command::Analyze {
            ref specs,
            ref path,
            ref patch,
            mode,
            window,
            context_lines,
            output,
        }) => {
            let mut analysis = config.analysis.clone();
            if let Some(mode) = mode {
                analysis.mode = mode;
            }
            if let Some(window) = window {
                analysis.window = window;
            }
            if context_lines.is_some() {
                analysis.context_lines = context_lines;
            }
            let format = output.unwrap_or(config.output.format);
            let options = AnalysisOptions::from_config(&analysis)?;

            let progress = spinner("Collecting revisions...");
            let revisions = collect(path, specs, patch, analysis.effective_context_lines())
                .inspect_err(|_| {
                    if let Some(pb) = &progress {
                        pb.finish_and_clear();
                    }
                })?;
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            tracing::info!(revisions = revisions.len(), "collected revisions");

            let map = analyze(&revisions, &options)?;
            let report = patchdeps_report::render(&map, format, use_color)?;
            print!("{report}");
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "patchdeps", &mut std::io::stdout());
        }
    }

    Ok(())
}
