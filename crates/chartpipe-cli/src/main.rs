//! chartpipe CLI - CI/CD glue for Helm chart monorepos

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chartpipe_ci::{NotificationKind, PipelineConfig, Step};

mod commands;
mod display;
mod error;
mod exit_codes;
mod util;

use commands::bump::BumpArg;
use commands::detect::OutputFormat;
use commands::{ChartSelection, Context};
use error::Result;

#[derive(Parser)]
#[command(name = "chartpipe")]
#[command(version)]
#[command(about = "Detect, validate, package and publish Helm charts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding one chart per subdirectory
    #[arg(long, global = true, env = "CHARTS_DIR", default_value = "charts")]
    charts_dir: PathBuf,

    /// Where chart archives are written
    #[arg(long, global = true, env = "PACKAGES_DIR", default_value = ".packages")]
    packages_dir: PathBuf,

    /// helm binary
    #[arg(long = "helm", global = true, env = "HELM_BIN", default_value = "helm")]
    helm_bin: String,

    /// git binary
    #[arg(long = "git", global = true, env = "GIT_BIN", default_value = "git")]
    git_bin: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Chart name, `--all` or `--input-file`
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ChartArgs {
    /// Chart name (directory below the charts directory)
    chart: Option<String>,

    /// Every chart in the charts directory
    #[arg(long)]
    all: bool,

    /// File listing chart names, one per line
    #[arg(long, value_name = "FILE")]
    input_file: Option<PathBuf>,
}

impl ChartArgs {
    fn selection(&self) -> ChartSelection {
        match (&self.chart, &self.input_file, self.all) {
            (Some(name), _, _) => ChartSelection::One(name.clone()),
            (None, Some(path), _) => ChartSelection::InputFile(path.clone()),
            (None, None, _) => ChartSelection::All,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print charts changed relative to the base ref
    Detect {
        /// Compare `<BASE>...HEAD` instead of deriving the range from CI variables
        #[arg(long)]
        base: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also write the result to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List all charts with their versions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run `helm lint --strict`
    Lint(ChartArgs),

    /// Update dependencies and check rendered templates parse as YAML
    Test(ChartArgs),

    /// Lint and render-check
    Validate(ChartArgs),

    /// Package charts into the packages directory
    Package(ChartArgs),

    /// Push packaged charts, skipping versions already in the registry
    Push {
        #[command(flatten)]
        charts: ChartArgs,

        /// Registry, e.g. oci://ghcr.io/acme/charts
        #[arg(long)]
        registry: Option<String>,
    },

    /// Validate, package and push
    Release {
        #[command(flatten)]
        charts: ChartArgs,

        /// Registry, e.g. oci://ghcr.io/acme/charts
        #[arg(long)]
        registry: Option<String>,
    },

    /// Bump a chart version (patch, minor or major)
    Bump {
        /// Chart name
        chart: String,

        /// Version component to increment
        #[arg(value_enum)]
        kind: BumpArg,
    },

    /// Log in to the registry with CI credentials
    Login {
        /// Registry, e.g. oci://ghcr.io/acme/charts
        #[arg(long)]
        registry: Option<String>,
    },

    /// Print a pipeline banner and post to Discord when configured
    Notify {
        /// validated or published
        #[arg(long)]
        kind: NotificationKind,

        /// File listing chart names, one per line
        #[arg(long, value_name = "FILE")]
        input_file: PathBuf,

        /// Registry shown in the message
        #[arg(long)]
        registry: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(PipelineConfig {
        charts_dir: cli.charts_dir,
        packages_dir: cli.packages_dir,
        helm_bin: cli.helm_bin,
        git_bin: cli.git_bin,
    });
    tracing::debug!("{:?}", ctx.env);

    match cli.command {
        Commands::Detect {
            base,
            format,
            output,
        } => commands::detect::run(&ctx, base.as_deref(), format, output.as_deref()),

        Commands::List { json } => commands::list::run(&ctx, json),

        Commands::Lint(charts) => commands::lint::run(&ctx, &charts.selection(), Step::Lint),
        Commands::Test(charts) => commands::lint::run(&ctx, &charts.selection(), Step::Test),
        Commands::Validate(charts) => {
            commands::lint::run(&ctx, &charts.selection(), Step::Validate)
        }

        Commands::Package(charts) => commands::package::run(&ctx, &charts.selection()),

        Commands::Push { charts, registry } => {
            commands::publish::push(&ctx, &charts.selection(), registry.as_deref())
        }

        Commands::Release { charts, registry } => {
            commands::publish::release(&ctx, &charts.selection(), registry.as_deref())
        }

        Commands::Bump { chart, kind } => commands::bump::run(&ctx, &chart, kind),

        Commands::Login { registry } => commands::login::run(&ctx, registry.as_deref()),

        Commands::Notify {
            kind,
            input_file,
            registry,
        } => commands::notify::run(&ctx, kind, &input_file, registry.as_deref()),
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
