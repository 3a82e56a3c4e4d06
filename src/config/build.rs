//! `[build]` section configuration.
//!
//! Contains build paths, html minification and the asset bundles.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Enums
// ============================================================================

/// Kind of an asset bundle; decides its output directory and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Css,
    Js,
}

impl BundleKind {
    /// Output directory, which is also the URL prefix the bundle is served under.
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Css => "stylesheets",
            Self::Js => "javascripts",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
        }
    }
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in letters.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"
/// assets = "assets"
/// output = "public"
/// layout = "templates/layout.html"
/// minify = true
/// copy = ["images"]
///
/// [[build.bundles]]
/// name = "application"
/// kind = "css"
/// inputs = ["stylesheets/screen.scss"]
/// command = ["sass", "--stdin", "--style=compressed"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Site root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Markdown/HTML page sources.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Asset sources (stylesheets, scripts, images).
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Build output directory, also the static file root when serving.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Layout template. The built-in layout is used when unset.
    #[serde(default = "defaults::build::layout")]
    #[educe(Default = defaults::build::layout())]
    pub layout: Option<PathBuf>,

    /// Minify rendered html pages.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Asset directories copied verbatim into the output directory.
    #[serde(default = "defaults::build::copy")]
    #[educe(Default = defaults::build::copy())]
    pub copy: Vec<PathBuf>,

    /// CSS/JS bundles.
    #[serde(default)]
    pub bundles: Vec<BundleConfig>,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[[build.bundles]]` entry - one fingerprinted css or js file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    /// Bundle base name, e.g. `application` → `application-1a2b3c4d.css`.
    pub name: String,

    pub kind: BundleKind,

    /// Source files relative to the assets directory, concatenated in order.
    pub inputs: Vec<PathBuf>,

    /// Optional filter command; the bundle is piped through its stdin/stdout.
    #[serde(default)]
    pub command: Vec<String>,
}
