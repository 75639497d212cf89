//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use futures::StreamExt;
use tracing::{debug, error};
use vidstream_core::catalog::{NewVideo, TITLE_MAX_CHARS};
use vidstream_core::config::VidstreamConfig;
use vidstream_core::streaming::{LocalFilesystem, StreamingOrchestrator};
use vidstream_core::{Result, VideoCatalog};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to (defaults to VIDSTREAM_HOST or 127.0.0.1)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (defaults to VIDSTREAM_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory uploaded videos are stored in (defaults to UPLOADS_DIR or ./uploads)
        #[arg(long)]
        uploads_dir: Option<PathBuf>,
    },
    /// Run a local file through the streaming pipeline and report the response
    Probe {
        /// Video file to probe
        file: PathBuf,
        /// Range header value, e.g. "bytes=0-1023"
        #[arg(short, long)]
        range: Option<String>,
    },
}

/// Handle the CLI command with configuration already read from the environment
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands, config: VidstreamConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve {
            host,
            port,
            uploads_dir,
        } => serve(config, host, port, uploads_dir).await,
        Commands::Probe { file, range } => {
            let report = probe(&file, range.as_deref(), config.storage.read_chunk_size)
                .await
                .map_err(|e| anyhow::anyhow!("{}: {e}", e.user_message()))?;
            debug!("Probe of {} streamed {} bytes", file.display(), report.bytes_streamed);
            print_report(&report);
            Ok(())
        }
    }
}

async fn serve(
    mut config: VidstreamConfig,
    host: Option<String>,
    port: Option<u16>,
    uploads_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = uploads_dir {
        config.storage.uploads_dir = dir;
    }

    println!("Starting Vidstream API...");
    println!("URL: http://{}:{}", config.server.host, config.server.port);
    println!("Uploads: {}", config.storage.uploads_dir.display());
    println!("{:-<50}", "");

    vidstream_web::run_server(config).await.map_err(|e| {
        error!("Server failed: {}", e);
        anyhow::anyhow!("Server failed: {e}")
    })
}

/// Outcome of streaming a local file.
#[derive(Debug)]
pub struct ProbeReport {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Bytes actually produced by the body stream
    pub bytes_streamed: u64,
}

/// Register `file` in a throwaway catalog and stream it as the server would.
///
/// # Errors
/// - `VidstreamError::Catalog` - File name is not a usable title
/// - `VidstreamError::Streaming` - File missing, range rejected or read failed
pub async fn probe(file: &Path, range: Option<&str>, chunk_size: usize) -> Result<ProbeReport> {
    let title: String = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect();

    let catalog = Arc::new(VideoCatalog::new());
    let record = catalog.create(NewVideo {
        user_id: "probe".to_string(),
        title,
        description: "Probed from the command line".to_string(),
        file_path: file.to_path_buf(),
    })?;

    let orchestrator =
        StreamingOrchestrator::new(catalog, Arc::new(LocalFilesystem::new(chunk_size)));
    let descriptor = orchestrator.stream(&record.id.to_string(), range).await?;

    let headers = descriptor
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let mut bytes_streamed = 0u64;
    let mut body = descriptor.body;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        bytes_streamed += chunk.len() as u64;
    }

    Ok(ProbeReport {
        status: descriptor.status.as_u16(),
        headers,
        bytes_streamed,
    })
}

fn print_report(report: &ProbeReport) {
    println!("Status: {}", report.status);
    for (name, value) in &report.headers {
        println!("{name}: {value}");
    }
    println!("Bytes streamed: {}", report.bytes_streamed);
}
