//! Config handling

use std::path::PathBuf;
use std::time::Duration;

use tracing::log::LevelFilter;

use crate::cli::CliOptions;
use crate::constants::{DEFAULT_CONTENT_DIR, DEFAULT_DATA_DIR};

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Settings for the image API client.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Base URL, eg `https://api.openai.com/v1`, without a trailing slash.
    pub base_url: String,
    /// Bearer credential.
    pub api_key: String,
    /// Applies to the generation call and to result downloads.
    pub timeout: Duration,
}

/// Runtime settings shared by the server and the pipeline.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Artifact root: generated images, originals, `metadata/` mirror.
    pub data_dir: PathBuf,
    /// Canonical metadata directory.
    pub content_dir: PathBuf,
    /// Image API settings.
    pub api: ApiConfig,
    /// Shared secret for the auth gate.
    pub auth_password: String,
    /// Set `Secure` on the session cookie.
    pub secure_cookies: bool,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Builds a config rooted at the default directories, mostly for tests.
    pub fn new(api_base_url: &str, api_key: &str, auth_password: &str) -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.clone(),
            content_dir: DEFAULT_CONTENT_DIR.clone(),
            api: ApiConfig {
                base_url: api_base_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
                timeout: Duration::from_secs(300),
            },
            auth_password: auth_password.to_string(),
            secure_cookies: false,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }

    /// Points both storage directories somewhere else.
    pub fn with_dirs(mut self, data_dir: impl Into<PathBuf>, content_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self.content_dir = content_dir.into();
        self
    }
}

impl From<CliOptions> for AppConfig {
    fn from(cli: CliOptions) -> Self {
        Self {
            data_dir: cli.data_dir,
            content_dir: cli.content_dir,
            api: ApiConfig {
                base_url: cli.api_base_url.trim_end_matches('/').to_string(),
                api_key: cli.api_key,
                timeout: Duration::from_secs(cli.request_timeout_secs),
            },
            auth_password: cli.auth_password,
            secure_cookies: cli.secure_cookies,
            max_upload_bytes: cli.max_upload_mb.saturating_mul(1024 * 1024),
        }
    }
}
