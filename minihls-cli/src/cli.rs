use clap::Parser;
use minihls_engine::ProxyType;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    author = "qmaru <https://github.com/qmaru>",
    version,
    about = "Encrypted HLS stream downloader",
    long_about = "Downloads the highest quality variant of an HLS master playlist,\n\
                  decrypts AES-128 segments and joins them into a single .ts file.\n\
                  \n\
                  When no URL is given on the command line the tool asks for one,\n\
                  followed by an optional SOCKS5 proxy address."
)]
pub struct CliArgs {
    /// Master (or media) playlist URL
    #[arg(help = "Playlist URL to download (prompted for when omitted)")]
    pub url: Option<String>,

    /// Output file
    #[arg(
        short,
        long,
        help = "Output file path (default: all_<YYYYmmddHHMMSS>.ts in the current directory)"
    )]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Segments fetched ahead of the writer
    #[arg(
        short = 'c',
        long,
        default_value = "1",
        help = "Number of segments downloaded concurrently. Output order is always preserved."
    )]
    pub concurrency: usize,

    /// Decrypt on the blocking thread pool
    #[arg(
        long,
        help = "Run segment decryption on a separate thread pool (useful together with --concurrency)"
    )]
    pub offload_decryption: bool,

    /// Overall timeout in seconds
    #[arg(
        long,
        default_value = "30",
        help = "Overall timeout in seconds for each HTTP request (0 disables it)"
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Proxy address (e.g., "127.0.0.1:1080")
    #[arg(
        long,
        help = "Proxy server address, with or without scheme (e.g., \"127.0.0.1:1080\")"
    )]
    pub proxy: Option<String>,

    /// Proxy type used when the address carries no scheme
    #[arg(long, value_enum, default_value_t = ProxyType::Socks5, help = "Proxy type")]
    pub proxy_type: ProxyType,

    /// Proxy username
    #[arg(long, help = "Username for proxy authentication")]
    pub proxy_user: Option<String>,

    /// Proxy password
    #[arg(long, help = "Password for proxy authentication")]
    pub proxy_pass: Option<String>,

    /// Use system proxy settings
    #[arg(
        long,
        help = "Use system proxy settings when no explicit proxy is configured"
    )]
    pub use_system_proxy: bool,

    /// Custom HTTP headers
    #[arg(
        short = 'H',
        long = "header",
        help = "Add custom HTTP header (format: 'Name: Value'). Can be used multiple times."
    )]
    pub headers: Vec<String>,

    /// Disable the progress bar
    #[arg(long, help = "Disable the progress bar")]
    pub no_progress: bool,
}
