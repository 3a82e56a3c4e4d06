//! The site: route table, content and layout assembled into servable pages.
//!
//! # Architecture
//!
//! ```text
//! Site::load()
//!     │
//!     ├── RouteTable::new()     exact path → Page, fails on duplicates
//!     ├── ContentStore::load()  every content key → one .md/.html file
//!     └── Layout::render()      each page prerendered once, cache header set
//!
//! Site::dispatch(method, url)
//!     │
//!     └── request_path() → RouteTable::lookup() → prerendered response | 404 | 405
//! ```
//!
//! Everything is immutable once loaded, so a `Site` can be shared between
//! server workers behind an `Arc` without locking.

mod error;
mod layout;
mod response;
mod route;
mod store;

pub use error::SiteError;
pub use response::RenderedResponse;
pub use route::Page;

use layout::Layout;
pub(crate) use route::request_path;
use route::RouteTable;
use store::ContentStore;

use crate::{assets::AssetManifest, config::SiteConfig, log, utils::minify::minify_html};
use std::collections::HashMap;

#[derive(Debug)]
pub struct Site {
    routes: RouteTable,
    rendered: HashMap<String, RenderedResponse>,
}

impl Site {
    /// Resolve every route's content and prerender all pages.
    ///
    /// Fails if any route is invalid or any content key does not resolve to
    /// exactly one document.
    pub fn load(config: &SiteConfig, assets: &AssetManifest) -> Result<Self, SiteError> {
        let routes = RouteTable::new(config.pages.iter().map(Page::from).collect())?;

        let store = ContentStore::load(
            &config.build.content,
            routes.pages().iter().map(|page| page.content_key.as_str()),
        )?;
        log!("content"; "loaded {} documents from {}", store.len(), config.build.content.display());

        let layout = Layout::load(
            config.build.layout.as_deref(),
            &config.base.title,
            &config.base.language,
        )?;
        let cache_control = config.serve.cache.header_value();

        let mut rendered = HashMap::with_capacity(routes.pages().len());
        for page in routes.pages() {
            let doc = store.get(&page.content_key)?;
            log!("content"; "{} <- {}.{}", page.route, doc.key, doc.kind.extension());
            let response = layout.render(doc, &page.title, &page.description, assets);
            let body = minify_html(&response.body, config.build.minify).into_owned();
            let response = RenderedResponse { body: body.into(), ..response }
                .with_header("Cache-Control", cache_control.clone());
            rendered.insert(page.route.clone(), response);
        }

        Ok(Self { routes, rendered })
    }

    /// Answer a request for `url` with `method`.
    pub fn dispatch(&self, method: &str, url: &str) -> RenderedResponse {
        let path = request_path(url);
        let Some(page) = self.routes.lookup(&path) else {
            return RenderedResponse::not_found();
        };

        if !matches!(method, "GET" | "HEAD") {
            return RenderedResponse::method_not_allowed();
        }

        self.rendered
            .get(&page.route)
            .cloned()
            .unwrap_or_else(RenderedResponse::not_found)
    }

    /// Every page with its prerendered response, in route table order.
    pub fn pages(&self) -> impl Iterator<Item = (&Page, &RenderedResponse)> {
        self.routes
            .pages()
            .iter()
            .filter_map(|page| self.rendered.get(&page.route).map(|res| (page, res)))
    }
}
