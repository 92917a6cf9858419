//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::site::ORIGIN;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hard upper bound on products per run.
pub const MAX_ITEMS_LIMIT: usize = 200;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site origin used to absolutize links
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Directory receiving spreadsheets and image folders
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Maximum number of products per run (capped at 200)
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Download and normalize product images
    #[serde(default = "default_true")]
    pub download_images: bool,

    /// Seller code template, e.g. `20250305-W001`
    #[serde(default = "default_product_code")]
    pub product_code: String,

    /// Wait after each scroll on listing pages, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Wait after each navigation before reading the page, in milliseconds
    #[serde(default = "default_page_load_ms")]
    pub page_load_ms: u64,

    /// Random jitter added to the page load wait (0 to this value)
    #[serde(default = "default_page_load_jitter_ms")]
    pub page_load_jitter_ms: u64,

    /// Navigation timeout in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Chrome/Chromium executable; auto-detected when unset
    #[serde(default)]
    pub chromium_path: Option<PathBuf>,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Public base URL where uploaded images will live
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Banner image appended to every HTML description
    #[serde(default = "default_banner_image_url")]
    pub banner_image_url: String,

    /// Listen address for `serve`
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_origin() -> String {
    ORIGIN.to_string()
}

fn default_output_root() -> PathBuf {
    PathBuf::from("public/results")
}

fn default_max_items() -> usize {
    MAX_ITEMS_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_product_code() -> String {
    "20250305-W001".to_string()
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_page_load_ms() -> u64 {
    3000
}

fn default_page_load_jitter_ms() -> u64 {
    2000
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_image_base_url() -> String {
    "https://images.example-market.com/fredmeyer".to_string()
}

fn default_banner_image_url() -> String {
    "https://images.example-market.com/fredmeyer/banner/notice.jpg".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            output_root: default_output_root(),
            max_items: default_max_items(),
            download_images: true,
            product_code: default_product_code(),
            settle_ms: default_settle_ms(),
            page_load_ms: default_page_load_ms(),
            page_load_jitter_ms: default_page_load_jitter_ms(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            chromium_path: None,
            headless: true,
            image_base_url: default_image_base_url(),
            banner_image_url: default_banner_image_url(),
            bind: default_bind(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("fredmeyer-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(root) = std::env::var("FM_OUTPUT_ROOT") {
            self.output_root = PathBuf::from(root);
        }

        if let Ok(code) = std::env::var("FM_PRODUCT_CODE") {
            self.product_code = code;
        }

        if let Ok(max) = std::env::var("FM_MAX_ITEMS") {
            if let Ok(m) = max.parse() {
                self.max_items = m;
            }
        }

        if let Ok(path) = std::env::var("FM_CHROMIUM_PATH") {
            self.chromium_path = Some(PathBuf::from(path));
        }

        if let Ok(settle) = std::env::var("FM_SETTLE_MS") {
            if let Ok(s) = settle.parse() {
                self.settle_ms = s;
            }
        }

        self
    }

    /// Clamps a requested item count to `1..=MAX_ITEMS_LIMIT`.
    pub fn clamp_max_items(requested: usize) -> usize {
        requested.clamp(1, MAX_ITEMS_LIMIT)
    }
}
