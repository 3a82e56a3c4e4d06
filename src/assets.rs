//! Asset pipeline: fingerprinted css/js bundles and static image copies.
//!
//! ```text
//! assets/stylesheets/reset.css ─┐
//! assets/stylesheets/screen.css ┴─ concat ─ [command] ─ public/stylesheets/application-1a2b3c4d.css
//! assets/images/**            ─────────── copy ──────── public/images/**
//! ```
//!
//! The fingerprint changes whenever the bundle bytes change, so the layout
//! always links the current version and stale copies are removed.

use crate::{
    config::{BundleConfig, BundleKind, SiteConfig},
    log,
    utils::{exec, hash::fingerprint},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{fs, path::Path};
use walkdir::WalkDir;

/// URLs of the bundles the layout links, in `[[build.bundles]]` order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
}

/// Build every bundle and copy the static directories into the output dir.
pub fn build_assets(config: &SiteConfig) -> Result<AssetManifest> {
    let urls = config
        .build
        .bundles
        .par_iter()
        .map(|bundle| build_bundle(bundle, config))
        .collect::<Result<Vec<_>>>()?;

    let mut manifest = AssetManifest::default();
    for (bundle, url) in config.build.bundles.iter().zip(urls) {
        match bundle.kind {
            BundleKind::Css => manifest.stylesheets.push(url),
            BundleKind::Js => manifest.scripts.push(url),
        }
    }

    for dir in &config.build.copy {
        let source = config.build.assets.join(dir);
        if !source.is_dir() {
            log!("assets"; "skipping missing directory {}", dir.display());
            continue;
        }
        let copied = copy_dir(&source, &config.build.output.join(dir))?;
        log!("assets"; "{} ({copied} files)", dir.display());
    }

    Ok(manifest)
}

/// Concatenate, filter and write one bundle; returns its URL.
fn build_bundle(bundle: &BundleConfig, config: &SiteConfig) -> Result<String> {
    let mut content = Vec::new();
    for input in &bundle.inputs {
        let path = config.build.assets.join(input);
        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        content.extend_from_slice(&bytes);
        if !content.ends_with(b"\n") {
            content.push(b'\n');
        }
    }

    if !bundle.command.is_empty() {
        content = exec::pipe_through(config.get_root(), &bundle.command, &content)
            .with_context(|| format!("Failed to process bundle `{}`", bundle.name))?;
    }

    let kind = bundle.kind;
    let file_name = format!("{}-{}.{}", bundle.name, fingerprint(&content), kind.extension());
    let dir = config.build.output.join(kind.dir());
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(&file_name), &content)
        .with_context(|| format!("Failed to write {}/{file_name}", kind.dir()))?;

    remove_stale_versions(&dir, &bundle.name, kind.extension(), &file_name)?;

    log!("assets"; "{}/{file_name}", kind.dir());
    Ok(format!("/{}/{file_name}", kind.dir()))
}

/// Delete older fingerprinted copies of a bundle, keeping `current`.
fn remove_stale_versions(dir: &Path, name: &str, ext: &str, current: &str) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();

        if file_name != current && is_version_of(&file_name, name, ext) {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Whether `file_name` is `<name>-<8 hex>.<ext>`.
fn is_version_of(file_name: &str, name: &str, ext: &str) -> bool {
    file_name
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.strip_suffix(ext))
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|hash| hash.len() == 8 && hash.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Recursively copy `source` into `dest`; returns the number of files copied.
fn copy_dir(source: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(source)?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}
