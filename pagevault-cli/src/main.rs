//! `pagevault` operator CLI.
//!
//! Bootstraps storage, ingests page images from local files, and inspects
//! or delivers stored pages. Configuration comes from `PAGEVAULT_*`
//! environment variables; the master key is read from the variable named
//! by `PAGEVAULT_MASTER_KEY_ENV` (default `MASTER_KEY_BASE64`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagevault_cloud::s3_transport::S3Transport;
use pagevault_cloud::secrets::{EnvSecretProvider, load_key_hierarchy};
use pagevault_cloud::{IngestRequest, PageVault, VaultConfig};
use pagevault_storage::{DuckDbMetadataStore, MetadataStore, PageRecord};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// PageVault operator CLI.
#[derive(Parser)]
#[command(name = "pagevault")]
#[command(about = "Encrypted page storage and delivery", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the page bucket if it does not exist.
    SetupStorage,

    /// Encrypt a local page image and upload it.
    EncryptUpload {
        /// Image file to ingest.
        file: PathBuf,

        document_id: String,

        /// Page number, starting at 1.
        page_no: u32,
    },

    /// Print the stored metadata record of a page.
    Inspect { document_id: String, page_no: u32 },

    /// Decrypt a page server-side and write the image to a file.
    Fetch {
        document_id: String,
        page_no: u32,

        /// Output file.
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Issue a signed URL and page key for client-side decryption.
    Grant { document_id: String, page_no: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = VaultConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::SetupStorage => {
            let transport = connect(&config).await?;
            if transport.ensure_bucket().await? {
                println!("Created bucket: {}", transport.bucket());
            } else {
                println!("Bucket already exists: {}", transport.bucket());
            }
        }

        Commands::EncryptUpload {
            file,
            document_id,
            page_no,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let vault = open_vault(&config).await?;
            let receipt = vault
                .ingest(IngestRequest::new(document_id, page_no, bytes))
                .await?;
            println!("Uploaded: {}", receipt.blob_path);
        }

        Commands::Inspect {
            document_id,
            page_no,
        } => {
            let store = open_metadata(&config)?;
            let meta = store
                .get(&document_id, page_no)
                .await?
                .with_context(|| format!("No metadata for {document_id} page {page_no}"))?;
            println!("{}", serde_json::to_string_pretty(&PageRecord::from(&meta))?);
        }

        Commands::Fetch {
            document_id,
            page_no,
            out,
        } => {
            let vault = open_vault(&config).await?;
            let page = vault
                .delivery_pipeline()
                .stream(&document_id, page_no, true)
                .await?;
            tokio::fs::write(&out, &page.bytes)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!(
                "Wrote {} bytes ({}) to {}",
                page.bytes.len(),
                page.content_type,
                out.display()
            );
        }

        Commands::Grant {
            document_id,
            page_no,
        } => {
            let vault = open_vault(&config).await?;
            let grant = vault
                .delivery_pipeline()
                .bundle(&document_id, page_no, true)
                .await?;
            println!("{}", serde_json::to_string_pretty(&grant)?);
        }
    }

    Ok(())
}

async fn connect(config: &VaultConfig) -> Result<S3Transport> {
    S3Transport::connect(config)
        .await
        .with_context(|| format!("Failed to connect to bucket {}", config.s3_bucket))
}

fn open_metadata(config: &VaultConfig) -> Result<Arc<DuckDbMetadataStore>> {
    let store = match &config.metadata_db_path {
        Some(path) => DuckDbMetadataStore::open(path)
            .with_context(|| format!("Failed to open metadata database {}", path.display()))?,
        None => {
            warn!("PAGEVAULT_METADATA_DB is not set; metadata lives only for this run");
            DuckDbMetadataStore::open_in_memory()?
        }
    };
    Ok(Arc::new(store))
}

async fn open_vault(config: &VaultConfig) -> Result<PageVault> {
    let keys = load_key_hierarchy(&EnvSecretProvider::new(&config.master_key_env))
        .context("Master key unavailable")?;
    let transport = connect(config).await?;
    let metadata = open_metadata(config)?;
    Ok(PageVault::new(
        Arc::new(keys),
        Arc::new(transport),
        metadata,
        config,
    )?)
}
