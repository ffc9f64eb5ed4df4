use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use error::AppError;
use minihls_engine::hls::{Assembler, AssemblyEvent, HlsConfig};
use minihls_engine::{DownloaderConfig, HttpSession, ProxyAuth, ProxyConfig};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod error;
mod prompt;
mod utils;

use cli::CliArgs;
use utils::progress::ProgressManager;
use utils::{create_dirs, default_output_name, parse_headers};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<(), AppError> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("minihls={level},minihls_engine={level}")));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();
    init_logging(args.verbose)?;

    // Without a URL on the command line both URL and proxy are asked for.
    let (url, proxy) = match args.url.clone() {
        Some(url) => (url, args.proxy.clone()),
        None => {
            let answers = prompt::ask_terminal(args.proxy.is_none()).await?;
            (answers.url, args.proxy.clone().or(answers.proxy))
        }
    };
    if url.trim().is_empty() {
        return Err(AppError::InvalidInput("playlist URL is empty".to_string()));
    }

    info!(
        "HTTP timeout configuration: overall={}s, connect={}s",
        args.timeout, args.connect_timeout
    );

    // Create common download configuration
    let download_config = {
        let mut builder = DownloaderConfig::builder()
            .with_timeout(Duration::from_secs(args.timeout))
            .with_connect_timeout(Duration::from_secs(args.connect_timeout))
            .with_headers(parse_headers(&args.headers));

        if let Some(proxy_url) = proxy {
            // Configure proxy authentication if both username and password are provided
            let auth = match (&args.proxy_user, &args.proxy_pass) {
                (Some(username), Some(password)) => Some(ProxyAuth {
                    username: username.clone(),
                    password: password.clone(),
                }),
                _ => None,
            };
            info!(
                proxy_url = %proxy_url,
                proxy_type = ?args.proxy_type,
                has_auth = auth.is_some(),
                "Using explicit proxy configuration for downloads"
            );
            builder = builder.with_proxy(ProxyConfig {
                url: proxy_url,
                proxy_type: args.proxy_type,
                auth,
            });
        } else {
            builder = builder.with_system_proxy(args.use_system_proxy);
        }
        builder.build()
    };

    let hls_config = HlsConfig::default()
        .with_base_config(download_config)
        .with_download_concurrency(args.concurrency)
        .with_offload_decryption(args.offload_decryption);

    let output: PathBuf = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_name(&chrono::Local::now()));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            create_dirs(parent).await?;
        }
    }

    let progress = if args.no_progress {
        ProgressManager::new_disabled()
    } else {
        ProgressManager::new()
    };

    // One session per run so cookies carry across every request.
    let session = HttpSession::new(&hls_config.base)?;
    let handler = progress.clone();
    let mut assembler = Assembler::new(&session, hls_config)
        .with_event_handler(Arc::new(move |event: AssemblyEvent| {
            handler.handle_event(event)
        }));

    let report = match assembler.run(&url, &output).await {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            return Err(e.into());
        }
    };

    info!(
        path = %report.path.display(),
        segments = report.segments,
        bytes = report.bytes_written,
        encrypted = report.encrypted,
        "Download finished"
    );
    Ok(())
}
