//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "SNAPSTYLE_DEBUG")]
    /// Enable debug logging. Env: SNAPSTYLE_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "4321", env = "SNAPSTYLE_PORT")]
    /// http listener, defaults to `4321`.
    /// Env: SNAPSTYLE_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "SNAPSTYLE_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: SNAPSTYLE_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, default_value = "./data/generated", env = "SNAPSTYLE_DATA_DIR")]
    /// Where generated images, originals and the metadata mirror live.
    /// Env: SNAPSTYLE_DATA_DIR
    pub data_dir: PathBuf,

    #[clap(
        long,
        default_value = "./content/generated-images",
        env = "SNAPSTYLE_CONTENT_DIR"
    )]
    /// Where the canonical metadata records live.
    /// Env: SNAPSTYLE_CONTENT_DIR
    pub content_dir: PathBuf,

    #[clap(long, required = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// Bearer credential for the image API. Env: OPENAI_API_KEY
    pub api_key: String,

    #[clap(
        long,
        default_value = "https://api.openai.com/v1",
        env = "OPENAI_BASE_URL"
    )]
    /// Base URL of the OpenAI-compatible image API. Env: OPENAI_BASE_URL
    pub api_base_url: String,

    #[clap(
        long,
        required = true,
        env = "SNAPSTYLE_AUTH_PASSWORD",
        hide_env_values = true
    )]
    /// Shared password for the generation pages. Env: SNAPSTYLE_AUTH_PASSWORD
    pub auth_password: String,

    #[clap(long, env = "SNAPSTYLE_SECURE_COOKIES")]
    /// Mark the session cookie `Secure`, turn on behind HTTPS.
    /// Env: SNAPSTYLE_SECURE_COOKIES
    pub secure_cookies: bool,

    #[clap(long, default_value = "300", env = "SNAPSTYLE_REQUEST_TIMEOUT_SECS")]
    /// Timeout for calls to the image API and downloads.
    /// Env: SNAPSTYLE_REQUEST_TIMEOUT_SECS
    pub request_timeout_secs: u64,

    #[clap(long, default_value = "25", env = "SNAPSTYLE_MAX_UPLOAD_MB")]
    /// Largest accepted request body in megabytes.
    /// Env: SNAPSTYLE_MAX_UPLOAD_MB
    pub max_upload_mb: usize,
}
