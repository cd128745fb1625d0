//! arch-log - show the change history or PKGBUILD of an Arch Linux package

mod output;

use std::io::IsTerminal;

use arch_log_lib::{
    ConfigError, Endpoints, FormatOptions, PackageRequest, ProviderFlags, ResolveError, Resolver,
    Selection, render,
};
use clap::Parser;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::output::OutputError;

#[derive(Parser, Debug)]
#[command(name = "arch-log", version)]
#[command(
    about = "Show the change history or PKGBUILD of Arch Linux, AUR and Arch ARM packages",
    long_about = None
)]
struct Cli {
    /// Package to look up, optionally as `repo/pkgname`
    #[arg(value_name = "PACKAGE")]
    package: Option<String>,

    /// Restrict the lookup to a repository (e.g. core, extra, extra-testing)
    #[arg(short = 'r', long, value_name = "REPO")]
    repo: Option<String>,

    /// Only consult the official Arch repositories
    #[arg(long)]
    arch: bool,

    /// Only consult the AUR
    #[arg(long)]
    aur: bool,

    /// Consult Arch ARM before the other providers (PKGBUILDs only)
    #[arg(long)]
    arm: bool,

    /// Only consult Arch ARM (PKGBUILDs only)
    #[arg(long)]
    arm_only: bool,

    /// Print the PKGBUILD instead of the change history
    ///
    /// The PKGBUILD is piped through `$PAGER` if it is set.
    #[arg(short = 'p', long)]
    pkgbuild: bool,

    /// Maximum number of changes to show
    #[arg(short = 'n', long, value_name = "N", default_value_t = 10)]
    number: usize,

    /// Show the newest changes first
    #[arg(short = 'R', long)]
    reverse: bool,

    /// Show full commit messages
    #[arg(short = 'l', long)]
    long: bool,

    /// Enable debug output
    #[arg(short = 'd', long)]
    debug: bool,
}

impl Cli {
    fn flags(&self) -> ProviderFlags {
        ProviderFlags {
            arch: self.arch,
            aur: self.aur,
            arm: self.arm,
            arm_only: self.arm_only,
        }
    }

    fn format_options(&self, color: bool) -> FormatOptions {
        FormatOptions {
            max: self.number,
            reverse: self.reverse,
            long: self.long,
            color,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Initialize tracing; `RUST_LOG` takes precedence over `--debug`.
fn init_tracing(debug: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) if debug => "warn,arch_log_lib=debug,arch_log=debug".to_string(),
        Err(_) => "warn,arch_log_lib=info,arch_log=info".to_string(),
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(debug)
                .with_level(true)
                .without_time()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let package = cli.package.as_deref().unwrap_or_default();
    let request = PackageRequest::parse(package, cli.repo.as_deref())?;
    let selection = Selection::new(cli.flags());
    let resolver = Resolver::new(&Endpoints::from_env())?;

    debug!("Looking up {:?} with {:?}", request, selection);

    if cli.pkgbuild {
        let resolved = resolver.raw_file(&request, &selection).await?;
        debug!("PKGBUILD served by {}", resolved.provider);
        output::show_pkgbuild(resolved.value).await?;
    } else {
        let resolved = resolver.history(&request, &selection).await?;
        debug!(
            "{} changes served by {}",
            resolved.value.len(),
            resolved.provider
        );
        let text = render(resolved.value, &cli.format_options(use_color()));
        output::write_stdout(text.as_bytes()).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
