use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ghrelease_core::{
    find_asset, with_logging, ApiError, ClientConfig, ListOptions, ReleasesService, TracingSink,
    Transport, UreqTransport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ghrelease")]
#[command(about = "List GitHub releases and download their assets", long_about = None)]
struct Cli {
    /// API root; overrides GHRELEASE_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Log every HTTP request and response head
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List releases and their assets
    List {
        owner: String,
        repo: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Download the first asset with the given name
    Download {
        owner: String,
        repo: String,
        asset: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghrelease=info,ghrelease_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let network = UreqTransport::new(&config);
    let transport: Box<dyn Transport> = if cli.verbose {
        Box::new(with_logging(network, TracingSink))
    } else {
        Box::new(network)
    };
    let service = ReleasesService::from_config(&config, transport);

    run(cli.command, &service, &mut std::io::stdout().lock())
}

/// Execute `command`, writing listings and stdout downloads to `out`.
fn run<T: Transport>(
    command: Commands,
    service: &ReleasesService<T>,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List {
            owner,
            repo,
            page,
            per_page,
        } => {
            let releases = service.list_releases(&owner, &repo, &ListOptions { page, per_page })?;
            for release in releases {
                writeln!(out, "{}\t{}", release.tag_name, release.name.unwrap_or_default())?;
                for asset in release.assets {
                    writeln!(out, "  {}\t{}\t{} bytes", asset.id, asset.name, asset.size)?;
                }
            }
        }
        Commands::Download {
            owner,
            repo,
            asset,
            output,
        } => {
            let releases = service.list_releases(&owner, &repo, &ListOptions::default())?;
            let found = find_asset(&releases, &asset).ok_or(ApiError::NotFound)?;
            tracing::info!(asset = %found.name, id = found.id, "downloading");
            let bytes = service.download_release_asset(&owner, &repo, found.id)?;
            match output {
                Some(path) => std::fs::write(&path, &bytes)?,
                None => out.write_all(&bytes)?,
            }
        }
    }

    Ok(())
}
