//! Configuration and user-facing text constants
//!
//! Loads settings from environment variables and declares the static
//! messages the bot sends.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// remove.bg API key. Required: there is deliberately no fallback
    /// default, so a missing key fails configuration loading instead of
    /// silently calling the API with a baked-in secret.
    pub remove_bg_api_key: String,

    /// remove.bg endpoint URL. Overridable so tests can point the client
    /// at a local mock server.
    #[serde(default = "default_remove_bg_endpoint")]
    pub remove_bg_endpoint: String,
}

fn default_remove_bg_endpoint() -> String {
    REMOVE_BG_ENDPOINT.to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value
    /// (`TELEGRAM_TOKEN`, `REMOVE_BG_API_KEY`) is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // Note: Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}

/// Production remove.bg endpoint
pub const REMOVE_BG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Welcome text sent for /start and /help (Markdown)
pub const WELCOME_MESSAGE: &str = "\
Welcome to *Background Remover Bot*⚡️

I can help you remove backgrounds from your images instantly.
Simply send me a photo and I'll process it for you.

Supported formats: JPEG, PNG, WebP, HEIC";

/// Transient status text shown while a photo is being processed
pub const PROCESSING_MESSAGE: &str = "⌛ Processing your image...";

/// Shown when the photo's file extension maps to an unsupported MIME type
pub const UNSUPPORTED_FORMAT_MESSAGE: &str =
    "❌ Sorry, this image format is not supported. Please send a JPEG, PNG, WebP, or HEIC image.";

/// Generic failure text for download, upstream, and unexpected errors
pub const PROCESSING_ERROR_MESSAGE: &str =
    "❌ Sorry, there was an error processing your image. Please try again later.";

/// Declared for parity with the upstream size limit; no size check is
/// currently performed before download, so this text is never sent.
pub const FILE_TOO_LARGE_MESSAGE: &str =
    "❌ The image file is too large. Please send an image smaller than 25MB.";

/// File name used for the processed image attachment
pub const OUTPUT_FILE_NAME: &str = "background_removed.png";

/// Caption attached to the processed image
pub const RESULT_CAPTION: &str = "✨ Here's your image with the background removed!";
