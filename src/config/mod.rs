//! Site configuration management for `letters.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[base]`    | Site metadata (name, language)                 |
//! | `[build]`   | Paths, layout, minification, asset bundles     |
//! | `[serve]`   | HTTP server (port, workers, socket, caching)   |
//! | `[[pages]]` | Route table: path → content, title, description |
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"
//! output = "public"
//!
//! [[build.bundles]]
//! name = "application"
//! kind = "css"
//! inputs = ["stylesheets/screen.css"]
//!
//! [serve]
//! port = 4567
//!
//! [[pages]]
//! route = "/api"
//! content = "api"
//! title = "The API"
//! description = "Letters lets you debug using these methods"
//! ```
//!
//! The config is loaded once at startup and passed by reference from there
//! on; nothing mutates it while the server runs.

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

pub use build::{BundleConfig, BundleKind};
pub use error::ConfigError;
pub use serve::STATIC_PREFIXES;

use base::BaseConfig;
use build::BuildConfig;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing letters.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Route table
    #[serde(default = "defaults::pages")]
    #[educe(Default = defaults::pages())]
    pub pages: Vec<PageConfig>,
}

/// `[[pages]]` entry - binds a route to a content document and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageConfig {
    /// Exact request path, e.g. `/api`.
    pub route: String,

    /// Content key: `<content>/<key>.md` or `<content>/<key>.html`.
    pub content: String,

    pub title: String,

    pub description: String,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("Invalid config `{}`", path.display()))
    }

    /// Load, apply CLI overrides and validate.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        if !config_path.exists() {
            bail!("Config file not found: {}", config_path.display());
        }

        let mut config = Self::from_path(&config_path)?;
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.assets, cli.assets.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.update_path_with_root(&root);

        let build_args = cli.build_args();
        Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
        self.build.clean |= build_args.clean;

        if let Commands::Serve {
            interface,
            port,
            workers,
            socket,
            ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.workers, workers.as_ref());
            if let Some(socket) = socket {
                self.serve.socket = Some(Self::normalize_path(&self.get_root().join(socket)));
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    pub fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.assets = Self::normalize_path(&root.join(&self.build.assets));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        if let Some(layout) = self.build.layout.as_ref() {
            self.build.layout = Some(Self::normalize_path(&root.join(layout)));
        }
        if let Some(socket) = self.serve.socket.as_ref() {
            self.serve.socket = Some(Self::normalize_path(&root.join(socket)));
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before building or serving.
    pub fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            bail!(ConfigError::Validation(
                "[[pages]] must define at least one route".into()
            ));
        }

        for (i, page) in self.pages.iter().enumerate() {
            Self::check_route(&page.route)?;
            if self.pages[..i].iter().any(|other| other.route == page.route) {
                bail!(ConfigError::Route {
                    route: page.route.clone(),
                    reason: "defined twice",
                });
            }
        }

        if self.serve.workers == 0 {
            bail!(ConfigError::Validation(
                "[serve.workers] must be at least 1".into()
            ));
        }

        if let Some(layout) = &self.build.layout
            && !layout.is_file()
        {
            bail!(ConfigError::Validation(format!(
                "[build.layout] not found: {}",
                layout.display()
            )));
        }

        for (i, bundle) in self.build.bundles.iter().enumerate() {
            if self.build.bundles[..i]
                .iter()
                .any(|other| other.name == bundle.name && other.kind == bundle.kind)
            {
                bail!(ConfigError::Validation(format!(
                    "[[build.bundles]] `{}` is defined twice",
                    bundle.name
                )));
            }
            if bundle.name.is_empty() {
                bail!(ConfigError::Validation(
                    "[[build.bundles]] name must not be empty".into()
                ));
            }
            if !bundle.command.is_empty() {
                Self::check_command_installed("[[build.bundles]] command", &bundle.command)?;
            }
        }

        Ok(())
    }

    /// A route must be absolute and must not be shadowed by a static prefix.
    fn check_route(route: &str) -> Result<()> {
        let reason = if !route.starts_with('/') {
            "must start with `/`"
        } else if STATIC_PREFIXES.iter().any(|prefix| route.starts_with(prefix)) {
            "is shadowed by a static asset directory"
        } else {
            return Ok(());
        };
        bail!(ConfigError::Route {
            route: route.to_owned(),
            reason,
        })
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
