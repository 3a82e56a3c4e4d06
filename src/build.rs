//! Site building orchestration.
//!
//! ```text
//! build_site()
//!     │
//!     ├── clean output (optional)
//!     ├── build_assets() ──► bundles + images in output dir → AssetManifest
//!     └── Site::load()   ──► routes + content + layout, all pages prerendered
//!
//! export_pages() ──► output/index.html, output/api/index.html, ...
//! ```

use crate::{assets::build_assets, config::SiteConfig, log, site::Site};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Build assets and load the site. Any missing content aborts here.
pub fn build_site(config: &SiteConfig) -> Result<Site> {
    let output = &config.build.output;

    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clean {}", output.display()))?;
        log!("build"; "cleaned {}", output.display());
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let manifest = build_assets(config).context("Asset pipeline failed")?;
    let site = Site::load(config, &manifest).context("Failed to load site")?;

    Ok(site)
}

/// Write every prerendered page into the output directory.
///
/// Returns the number of pages written.
pub fn export_pages(site: &Site, output: &Path) -> Result<usize> {
    let mut written = 0;
    for (page, response) in site.pages() {
        let path = output.join(page_output_path(&page.route));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, response.body.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log!("build"; "{} -> {}", page.route, path.strip_prefix(output).unwrap_or(&path).display());
        written += 1;
    }
    Ok(written)
}

/// Relative file for a route: `/` → `index.html`, `/api` → `api/index.html`.
fn page_output_path(route: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in route.split('/').filter(|s| !s.is_empty() && *s != "..") {
        path.push(segment);
    }
    path.join("index.html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::tests::letters_fixture;

    #[test]
    fn test_page_output_path() {
        assert_eq!(page_output_path("/"), PathBuf::from("index.html"));
        assert_eq!(page_output_path("/api"), PathBuf::from("api/index.html"));
        assert_eq!(page_output_path("/docs/api/"), PathBuf::from("docs/api/index.html"));
        assert_eq!(page_output_path("/../etc"), PathBuf::from("etc/index.html"));
    }

    #[test]
    fn test_build_and_export() {
        let (_dir, config) = letters_fixture();
        let site = build_site(&config).unwrap();
        let written = export_pages(&site, &config.build.output).unwrap();

        assert_eq!(written, 4);
        let api = fs::read_to_string(config.build.output.join("api/index.html")).unwrap();
        assert!(api.contains("<title>The API</title>"));
        assert!(config.build.output.join("index.html").is_file());
        assert!(config.build.output.join("ideas/index.html").is_file());
        assert!(config.build.output.join("resources/index.html").is_file());
    }

    #[test]
    fn test_clean_removes_old_output() {
        let (_dir, mut config) = letters_fixture();
        fs::create_dir_all(&config.build.output).unwrap();
        let stale = config.build.output.join("old.html");
        fs::write(&stale, "old").unwrap();

        config.build.clean = true;
        build_site(&config).unwrap();
        assert!(!stale.exists());
        assert!(config.build.output.is_dir());
    }

    #[test]
    fn test_missing_content_aborts_build() {
        let (dir, config) = letters_fixture();
        fs::remove_file(dir.path().join("content/index.md")).unwrap();

        let err = build_site(&config).unwrap_err();
        assert!(format!("{err:#}").contains("missing content `index`"));
    }
}
