use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_core::cache::{CacheBackend, CatalogCache, MemoryBackend, RedisBackend};
use catalog_core::config::{CacheConfig, Config};
use catalog_core::{BootstrapPolicy, Catalog, Database, ManifestNormalizer, RemoteVersionResolver};
use vcpkg_catalog::{api, ingest};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Package catalog for vcpkg-style registry dumps")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the catalog HTTP API
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Normalize a registry dump and load it into the catalog
    Ingest {
        /// Manifest file with Baseline, Size and Source
        manifest: PathBuf,

        /// Write the canonical packages as JSON to this file ("-" for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write packages to the database
        #[arg(long)]
        no_store: bool,

        /// Look up versions on each package's git remote
        #[arg(long)]
        resolve_versions: bool,

        /// Entries normalized in parallel
        #[arg(short, long, default_value_t = ingest::DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Keep vcpkg-cmake, vcpkg-cmake-config and vcpkg-msbuild as dependencies
        #[arg(long)]
        keep_bootstrap_deps: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "vcpkg_catalog=debug,catalog_core=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Some(Commands::Serve { port, host }) => serve(&config, &host, port).await?,
        Some(Commands::Ingest {
            manifest,
            output,
            no_store,
            resolve_versions,
            concurrency,
            keep_bootstrap_deps,
        }) => {
            let bootstrap = if keep_bootstrap_deps {
                BootstrapPolicy::Keep
            } else {
                BootstrapPolicy::Filter
            };
            let resolver = resolve_versions
                .then(|| RemoteVersionResolver::git(config.git.program.clone(), config.git.timeout));

            let raw = ingest::read_manifest(&manifest)?;
            let normalized =
                ingest::normalize_manifest(raw, ManifestNormalizer::new(bootstrap), resolver, concurrency)
                    .await;
            tracing::info!(
                packages = normalized.packages.len(),
                dropped = normalized.dropped,
                "Normalized manifest"
            );

            if !no_store {
                let catalog = open_catalog(&config).await?;
                let summary = ingest::store_packages(&catalog, &normalized.packages).await?;
                tracing::info!(
                    stored = summary.stored,
                    duplicates = summary.duplicates,
                    rejected = summary.rejected,
                    failed_rows = summary.failed_rows,
                    "Stored packages"
                );
            }

            if let Some(output) = output {
                let path = (output.as_os_str() != "-").then_some(output.as_path());
                ingest::write_packages(path, &normalized.packages)?;
            }
        }
        None => serve(&config, "127.0.0.1", 8000).await?,
    }

    Ok(())
}

/// Open the store and the cache. Both live until the process exits.
async fn open_catalog(config: &Config) -> anyhow::Result<Catalog> {
    let db = Database::open_url(&config.database.url)
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    db.migrate().context("Failed to apply schema")?;

    let backend: Arc<dyn CacheBackend> = match &config.cache {
        CacheConfig::Redis { host, port } => {
            Arc::new(RedisBackend::connect(&CacheConfig::redis_url(host, *port)).await?)
        }
        CacheConfig::Memory => Arc::new(MemoryBackend::new()),
    };

    Ok(Catalog::new(db, CatalogCache::new(backend, config.cache_ttl)))
}

async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting catalog server on port {}", port);

    let catalog = open_catalog(config).await?;
    let app = api::create_router(catalog);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Catalog server listening on http://{}:{}", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Catalog server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
