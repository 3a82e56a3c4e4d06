//! Static route table.
//!
//! Routes are exact paths; there are no parameters or wildcards.

use super::SiteError;
use crate::config::PageConfig;
use std::collections::HashMap;

/// A route bound to its content and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub route: String,
    pub content_key: String,
    pub title: String,
    pub description: String,
}

impl From<&PageConfig> for Page {
    fn from(page: &PageConfig) -> Self {
        Self {
            route: page.route.clone(),
            content_key: page.content.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
        }
    }
}

/// Exact-match map from request path to [`Page`], built once at startup.
#[derive(Debug)]
pub struct RouteTable {
    pages: Vec<Page>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new(pages: Vec<Page>) -> Result<Self, SiteError> {
        let mut index = HashMap::with_capacity(pages.len());

        for (i, page) in pages.iter().enumerate() {
            if !page.route.starts_with('/') {
                return Err(SiteError::InvalidRoute(page.route.clone()));
            }
            if index.insert(page.route.clone(), i).is_some() {
                return Err(SiteError::DuplicateRoute(page.route.clone()));
            }
        }

        Ok(Self { pages, index })
    }

    pub fn lookup(&self, path: &str) -> Option<&Page> {
        self.index.get(path).map(|&i| &self.pages[i])
    }

    /// Pages in definition order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

/// Reduce a raw request URL to the path used for route lookup.
///
/// Strips the query string and fragment, then percent-decodes.
pub fn request_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    urlencoding::decode(path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_owned())
}
