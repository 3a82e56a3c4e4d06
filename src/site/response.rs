//! Framework-independent http responses produced by the site.

use std::sync::Arc;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    /// Shared so that every request for a page reuses one prerendered body.
    pub body: Arc<str>,
}

impl RenderedResponse {
    pub fn html(body: impl Into<Arc<str>>) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type", CONTENT_TYPE_HTML.into())],
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::plain(404, "404 Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::plain(405, "405 Method Not Allowed").with_header("Allow", "GET, HEAD")
    }

    fn plain(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", CONTENT_TYPE_TEXT.into())],
            body: body.into(),
        }
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
