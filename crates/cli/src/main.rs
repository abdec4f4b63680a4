mod echo;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use vernissage_core::catalog::CatalogService;
use vernissage_core::{
    BatchConfig, BatchController, CancelFlag, ExtractConfig, FetchConfig, GoogleDriveCatalog, GoogleSlidesBuilder,
    JsonFileStore, KEY_FILE, Ledger, Site, SiteClient, TOKEN_FILE, build_enhancer, resolve_google_token,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source site selecting the extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SiteArg {
    SocksStudio,
    PublicDomainReview,
}

impl From<SiteArg> for Site {
    fn from(arg: SiteArg) -> Self {
        match arg {
            SiteArg::SocksStudio => Site::SocksStudio,
            SiteArg::PublicDomainReview => Site::PublicDomainReview,
        }
    }
}

/// Turn art-blog articles into slide presentations, one per article
#[derive(Parser, Debug)]
#[command(name = "vernissage")]
#[command(author = "Vernissage Contributors")]
#[command(version = VERSION)]
#[command(about = "Turn art-blog articles into slide presentations", long_about = None)]
struct Args {
    /// Number of new items to process
    #[arg(value_name = "COUNT", default_value_t = 10)]
    count: usize,

    /// Source site to process
    #[arg(short, long, value_enum)]
    site: SiteArg,

    /// Directory holding the per-site ledger files
    #[arg(long, default_value = "ledger", value_name = "DIR")]
    ledger_dir: PathBuf,

    /// HTTP timeout for source-site pages, in seconds
    #[arg(long, default_value = "10", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for source-site requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "vernissage=debug,vernissage_core=debug" } else { "vernissage=info,vernissage_core=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    if args.verbose {
        echo::print_banner();
    }

    let site: Site = args.site.into();
    let profile = site.profile();

    // Setup failures below are fatal; nothing has been processed yet.
    if args.verbose {
        echo::print_step(1, 4, "Resolving credentials");
    }
    let token = resolve_google_token(Path::new(TOKEN_FILE)).context("Google access token is required")?;
    let enhancer = build_enhancer(Path::new(KEY_FILE));

    if args.verbose {
        echo::print_step(2, 4, &format!("Preparing Drive folder for {}", profile.display_name().bright_white()));
    }
    let catalog = GoogleDriveCatalog::new(token.clone())?;
    let folder_id = catalog
        .get_or_create_folder(&profile.folder_name())
        .await
        .context("Failed to prepare the Drive folder")?;
    let catalog_id = catalog
        .get_or_create_tabular_catalog(&profile.catalog_name())
        .await
        .context("Failed to prepare the catalog spreadsheet")?;

    if args.verbose {
        echo::print_step(3, 4, "Opening ledger");
    }
    let store = JsonFileStore::new(JsonFileStore::site_path(&args.ledger_dir, site));
    let ledger = Ledger::open(Box::new(store)).context("Failed to open the ledger")?;

    let mut fetch_config = FetchConfig { timeout: args.timeout, ..Default::default() };
    if let Some(user_agent) = args.user_agent {
        fetch_config.user_agent = user_agent;
    }
    let source = SiteClient::new(site, fetch_config, ExtractConfig::default())?;
    let builder = GoogleSlidesBuilder::new(token)?;

    let config = BatchConfig { target: args.count, folder_id, catalog_id };
    let mut controller = BatchController::new(source, builder, catalog, ledger, enhancer, config);

    // Ctrl-C requests a cooperative stop; the in-flight item still
    // finishes before the loop ends.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                echo::print_warning("Stop requested, finishing the current item");
                cancel.cancel();
            }
        });
    }

    if args.verbose {
        echo::print_step(4, 4, &format!("Processing up to {} new items", args.count));
    }
    tracing::info!(site = site.slug(), count = args.count, "starting batch run");
    let summary = controller.run(&cancel).await;

    eprintln!();
    for created in &summary.created {
        echo::print_success(&format!(
            "{} • {} slides • {}",
            created.title,
            created.slide_count,
            created.presentation_url.bright_white().underline()
        ));
    }
    for skipped in &summary.skipped {
        echo::print_warning(&format!("{} • {}", skipped.article_url, skipped.reason));
    }
    if summary.stopped {
        echo::print_info("Stopped by request");
    }
    echo::print_info(&format!(
        "Created {} presentation(s), {} slide(s) total, {} skipped",
        summary.created.len(),
        summary.total_slides(),
        summary.skipped.len()
    ));

    // Per-item failures only reduce the created count; they never change
    // the exit code.
    Ok(())
}
