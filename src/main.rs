use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use land_record_search::api::{self, AppState};
use land_record_search::audit_log::SledSearchLog;
use land_record_search::captcha::CaptchaStore;
use land_record_search::config::AppConfig;
use land_record_search::logging::{init_logging, OperationTimer};
use land_record_search::metrics::MetricsCollector;
use land_record_search::models::RawSearchRequest;
use land_record_search::repository::{InMemoryRepository, LocationRepository, SearchRequestRepository};
use land_record_search::seed::{self, SeedData};
use land_record_search::service::SearchService;
use land_record_search::validation::SearchValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, overrides configuration
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run a single search against the seeded store and print the result
    Search {
        /// Village id (manual mode)
        #[arg(long)]
        village: Option<u64>,

        /// Survey number (manual mode)
        #[arg(long)]
        survey: Option<String>,

        /// Subdivision number
        #[arg(long)]
        subdivision: Option<String>,

        /// Owner name fragment (manual mode)
        #[arg(long)]
        owner: Option<String>,

        /// Property UID, switches to uid mode
        #[arg(long)]
        uid: Option<String>,

        /// Record type: 7-12, 8a, property-card or k-prat
        #[arg(short, long, default_value = "7-12")]
        record_type: String,

        /// Ten-digit mobile number recorded with the search
        #[arg(short, long, default_value = "9999999999")]
        mobile: String,
    },
    /// List the configured states
    States,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; keep the guard alive for the file writer
    let log_level = config.get_log_level();
    let log_file = config.logging.file_path.as_deref().map(Path::new);
    let _guard = init_logging(
        Some(log_level.as_str()),
        log_file,
        config.logging.format == "json",
    )?;
    MetricsCollector::init()?;

    info!("Starting land-record-search");

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => serve(&config, bind.as_deref()).await?,
        Commands::Search {
            village,
            survey,
            subdivision,
            owner,
            uid,
            record_type,
            mobile,
        } => {
            let raw = RawSearchRequest {
                search_mode: Some(if uid.is_some() { "uid" } else { "manual" }.to_string()),
                village_id: village,
                survey_number: survey,
                subdivision_number: subdivision,
                owner_name: owner,
                property_uid: uid,
                record_type: Some(record_type),
                mobile_number: Some(mobile),
                language: Some("english".to_string()),
                captcha: Some("CLI".to_string()),
                ..RawSearchRequest::default()
            };
            search_once(&config, &raw).await?;
        }
        Commands::States => list_states(&config).await?,
    }

    Ok(())
}

/// Load the reference data named in configuration, or the built-in set.
async fn load_repository(config: &AppConfig) -> Result<Arc<InMemoryRepository>> {
    let data = match &config.storage.seed_file {
        Some(path) => {
            info!(seed_file = %path, "Loading seed file");
            SeedData::from_file(Path::new(path))
                .with_context(|| format!("Failed to read seed file {path}"))?
        }
        None => seed::builtin(),
    };

    let repo = InMemoryRepository::new();
    data.apply(&repo).await.context("Failed to apply seed data")?;
    Ok(Arc::new(repo))
}

/// Pick the audit backend named in configuration.
fn open_audit_log(
    config: &AppConfig,
    repo: &Arc<InMemoryRepository>,
) -> Result<(Arc<dyn SearchRequestRepository>, Option<Arc<SledSearchLog>>)> {
    if config.storage.audit_backend == "sled" {
        let log = Arc::new(
            SledSearchLog::open(Path::new(&config.storage.audit_path))
                .with_context(|| format!("Failed to open audit log at {}", config.storage.audit_path))?,
        );
        info!(path = %config.storage.audit_path, rows = log.len(), "Opened sled audit log");
        let audit: Arc<dyn SearchRequestRepository> = log.clone();
        Ok((audit, Some(log)))
    } else {
        debug!("Using in-memory audit log");
        let audit: Arc<dyn SearchRequestRepository> = repo.clone();
        Ok((audit, None))
    }
}

fn build_service(
    config: &AppConfig,
    repo: Arc<InMemoryRepository>,
    audit: Arc<dyn SearchRequestRepository>,
    captchas: &Arc<CaptchaStore>,
    metrics: Arc<MetricsCollector>,
) -> SearchService {
    let service = SearchService::new(repo, audit)
        .with_validator(SearchValidator::new(config.search.max_owner_fragment_len))
        .with_metrics(metrics);
    if config.captcha.verify {
        service.with_captcha_verification(captchas.clone())
    } else {
        service
    }
}

async fn serve(config: &AppConfig, bind: Option<&str>) -> Result<()> {
    let addr = match bind {
        Some(raw) => raw
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address {raw}"))?,
        None => config.get_bind_address()?,
    };

    let repo = load_repository(config).await?;
    let (audit, sled_log) = open_audit_log(config, &repo)?;
    let captchas = Arc::new(CaptchaStore::new(config.captcha.length, config.captcha.ttl_secs));
    let metrics = Arc::new(MetricsCollector::default());
    let service = build_service(config, repo.clone(), audit.clone(), &captchas, metrics.clone());

    let state = AppState {
        locations: repo.clone(),
        records: repo,
        audit,
        search: Arc::new(service),
        captchas,
    };
    let app = api::app(state, &config.server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, base_path = %config.server.base_path, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(log) = sled_log {
        log.flush().await?;
    }
    let snapshot = metrics.snapshot();
    info!(
        searches_completed = snapshot.searches_completed,
        searches_failed = snapshot.searches_failed,
        results_returned = snapshot.results_returned,
        validation_failures = snapshot.validation_failures,
        captchas_issued = snapshot.captchas_issued,
        "Server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[allow(clippy::print_stdout)]
async fn search_once(config: &AppConfig, raw: &RawSearchRequest) -> Result<()> {
    let timer = OperationTimer::new("cli_search");
    let repo = load_repository(config).await?;
    let (audit, sled_log) = open_audit_log(config, &repo)?;
    let captchas = Arc::new(CaptchaStore::new(config.captcha.length, config.captcha.ttl_secs));
    let mut cli_config = config.clone();
    // A one-shot CLI run has no way to answer a challenge.
    cli_config.captcha.verify = false;
    let service = build_service(
        &cli_config,
        repo,
        audit,
        &captchas,
        Arc::new(MetricsCollector::default()),
    );

    let outcome = service.search(raw).await?;
    if let Some(log) = sled_log {
        log.flush().await?;
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    timer.finish();
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn list_states(config: &AppConfig) -> Result<()> {
    let repo = load_repository(config).await?;
    for state in repo.list_states().await? {
        println!("{:>3}  {:<4} {}", state.id, state.code, state.name.name_en);
    }
    Ok(())
}
