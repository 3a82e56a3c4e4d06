//! Content store: page bodies keyed by content key.
//!
//! Loaded once from the content directory at startup and never mutated.

use super::SiteError;
use std::{collections::HashMap, fs, path::Path};

/// Source format of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Converted to HTML when rendered.
    Markdown,
    /// Inserted into the layout as-is.
    Html,
}

impl ContentKind {
    const ALL: [Self; 2] = [Self::Markdown, Self::Html];

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDocument {
    pub key: String,
    pub kind: ContentKind,
    pub source: String,
}

#[derive(Debug, Default)]
pub struct ContentStore {
    documents: HashMap<String, ContentDocument>,
}

impl ContentStore {
    /// Load the document for every key from `dir`.
    ///
    /// Each key must resolve to exactly one of `<key>.md` or `<key>.html`.
    pub fn load<'a>(
        dir: &Path,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, SiteError> {
        let mut documents = HashMap::new();

        for key in keys {
            if documents.contains_key(key) {
                continue;
            }

            let mut found = ContentKind::ALL
                .into_iter()
                .map(|kind| (kind, dir.join(format!("{key}.{}", kind.extension()))))
                .filter(|(_, path)| path.is_file());

            let (kind, path) = match (found.next(), found.next()) {
                (Some(hit), None) => hit,
                (None, _) => return Err(SiteError::MissingContent { key: key.into() }),
                (Some(_), Some(_)) => return Err(SiteError::AmbiguousContent { key: key.into() }),
            };

            let source = fs::read_to_string(&path).map_err(|err| SiteError::Io(path, err))?;
            documents.insert(
                key.to_owned(),
                ContentDocument {
                    key: key.to_owned(),
                    kind,
                    source,
                },
            );
        }

        Ok(Self { documents })
    }

    pub fn get(&self, key: &str) -> Result<&ContentDocument, SiteError> {
        self.documents
            .get(key)
            .ok_or_else(|| SiteError::MissingContent { key: key.into() })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}
