//! HTTP server for the site.
//!
//! Built on `tiny_http`:
//!
//! - Page routes answered from the prerendered [`Site`]
//! - `/stylesheets/*`, `/javascripts/*`, `/images/*` served from the build output
//! - A fixed pool of worker threads sharing one listener
//! - TCP (with port auto-retry) or, on Unix, a socket for a reverse proxy
//! - Graceful shutdown on Ctrl+C
//!
//! ```text
//!              ┌──────────────┐
//!  listener ──►│ tiny_http    │──► worker 0 (main thread) ─┐
//!              │ Server (Arc) │──► worker 1                ├─► Site::dispatch / static file
//!              └──────────────┘──► worker N-1             ─┘
//! ```

use crate::{
    config::{STATIC_PREFIXES, SiteConfig},
    log,
    site::{RenderedResponse, Site, request_path},
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
    thread,
    time::Instant,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `site` until Ctrl+C is received.
pub fn serve_site(config: &SiteConfig, site: Site) -> Result<()> {
    let (server, addr) = bind(config)?;
    let server = Arc::new(server);
    let site = Arc::new(site);
    let static_root: Arc<Path> = Arc::from(config.build.output.as_path());
    let workers = config.serve.workers.max(1);

    // Each unblock() releases one worker blocked in recv()
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "{addr} ({workers} workers)");

    let handles = (1..workers)
        .map(|i| {
            let server = Arc::clone(&server);
            let site = Arc::clone(&site);
            let static_root = Arc::clone(&static_root);
            thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || worker_loop(&server, &site, &static_root))
                .context("Failed to spawn worker thread")
        })
        .collect::<Result<Vec<_>>>()?;

    worker_loop(&server, &site, &static_root);

    for handle in handles {
        if handle.join().is_err() {
            log!("error"; "worker thread panicked");
        }
    }

    if let Some(socket) = &config.serve.socket {
        fs::remove_file(socket).ok();
    }

    Ok(())
}

fn worker_loop(server: &Server, site: &Site, static_root: &Path) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, site, static_root) {
            log!("serve"; "request error: {e}");
        }
    }
}

// ============================================================================
// Binding
// ============================================================================

fn bind(config: &SiteConfig) -> Result<(Server, String)> {
    if let Some(socket) = &config.serve.socket {
        return bind_unix(socket);
    }

    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid [serve.interface] `{}`", config.serve.interface))?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    Ok((server, format!("http://{addr}")))
}

#[cfg(unix)]
fn bind_unix(socket: &Path) -> Result<(Server, String)> {
    // A socket left behind by a killed process would make bind fail
    if socket.exists() {
        fs::remove_file(socket)
            .with_context(|| format!("Failed to remove stale socket {}", socket.display()))?;
    }
    if let Some(parent) = socket.parent() {
        fs::create_dir_all(parent)?;
    }

    let server = Server::http_unix(socket)
        .map_err(|e| anyhow!("Failed to bind {}: {e}", socket.display()))?;
    Ok((server, format!("unix:{}", socket.display())))
}

#[cfg(not(unix))]
fn bind_unix(_socket: &Path) -> Result<(Server, String)> {
    anyhow::bail!("[serve.socket] is only supported on unix")
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_err = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request and log it.
fn handle_request(request: Request, site: &Site, static_root: &Path) -> Result<()> {
    let start = Instant::now();
    let method = request.method().as_str().to_owned();
    let url = request.url().to_owned();

    let path = request_path(&url);
    let response = if STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        static_file(&method, &path, static_root)?
    } else {
        site.dispatch(&method, &url).into()
    };

    let status = response.status;
    respond(request, response)?;

    log!("serve"; "{method} {url} {status} {:.1?}", start.elapsed());
    Ok(())
}

/// Resolve a static asset under `static_root`.
fn static_file(method: &str, path: &str, static_root: &Path) -> Result<OwnedResponse> {
    if !matches!(method, "GET" | "HEAD") {
        return Ok(RenderedResponse::method_not_allowed().into());
    }

    let Some(local_path) = resolve_static_path(static_root, path) else {
        return Ok(RenderedResponse::not_found().into());
    };
    if !local_path.is_file() {
        return Ok(RenderedResponse::not_found().into());
    }

    let content = fs::read(&local_path)
        .with_context(|| format!("Failed to read {}", local_path.display()))?;
    Ok(OwnedResponse {
        status: 200,
        headers: vec![("Content-Type", guess_content_type(&local_path).into())],
        body: content,
    })
}

/// Map a request path onto the static root, refusing anything that could
/// escape it.
fn resolve_static_path(static_root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| static_root.join(relative))
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Response with an owned body, ready to hand to `tiny_http`.
struct OwnedResponse {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl From<RenderedResponse> for OwnedResponse {
    fn from(res: RenderedResponse) -> Self {
        Self {
            status: res.status,
            headers: res.headers,
            body: res.body.as_bytes().to_vec(),
        }
    }
}

fn respond(request: Request, response: OwnedResponse) -> Result<()> {
    let OwnedResponse {
        status,
        headers,
        body,
    } = response;

    let headers = headers
        .iter()
        .map(|(name, value)| {
            Header::from_bytes(name.as_bytes(), value.as_bytes())
                .map_err(|()| anyhow!("Invalid header `{name}: {value}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    let len = body.len();
    let response = Response::new(StatusCode(status), headers, Cursor::new(body), Some(len), None);
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("map") => "application/json; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::tests::letters_fixture;
    use std::{
        io::{Read, Write},
        net::TcpStream,
    };

    #[test]
    fn test_resolve_static_path() {
        let root = Path::new("/srv/public");

        assert_eq!(
            resolve_static_path(root, "/images/logo.png"),
            Some(PathBuf::from("/srv/public/images/logo.png"))
        );
        assert_eq!(resolve_static_path(root, "/images/../../etc/passwd"), None);
        assert!(resolve_static_path(root, "/images/./logo.png").is_some());
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.css")), "text/css; charset=utf-8");
        assert_eq!(
            guess_content_type(Path::new("application-1a2b3c4d.js")),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(guess_content_type(Path::new("logo.png")), "image/png");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn test_static_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/logo.svg"), "<svg/>").unwrap();

        let res = static_file("GET", "/images/logo.svg", dir.path()).unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(res.body, b"<svg/>");
        assert_eq!(res.headers, vec![("Content-Type", "image/svg+xml".to_string())]);

        assert_eq!(static_file("GET", "/images/nope.svg", dir.path()).unwrap().status, 404);
        assert_eq!(static_file("GET", "/images", dir.path()).unwrap().status, 404);
        assert_eq!(static_file("DELETE", "/images/logo.svg", dir.path()).unwrap().status, 405);
    }

    /// Send one raw HTTP/1.0 request and read the whole response.
    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET {path} HTTP/1.0\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_http_roundtrip() {
        let (_dir, config) = letters_fixture();
        let site = Site::load(&config, &Default::default()).unwrap();
        fs::create_dir_all(config.build.output.join("stylesheets")).unwrap();
        fs::write(config.build.output.join("stylesheets/screen.css"), "h1{}").unwrap();

        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let static_root = config.build.output.clone();

        let worker = thread::spawn(move || {
            for _ in 0..3 {
                let request = server.recv().unwrap();
                handle_request(request, &site, &static_root).unwrap();
            }
        });

        let api = get(addr, "/api");
        assert!(api.contains(" 200 "), "{api}");
        assert!(api.contains("Cache-Control: max-age=300, public"), "{api}");
        assert!(api.contains("<title>The API</title>"), "{api}");

        let missing = get(addr, "/nonexistent");
        assert!(missing.contains(" 404 "), "{missing}");

        let css = get(addr, "/stylesheets/screen.css");
        assert!(css.contains(" 200 "), "{css}");
        assert!(css.ends_with("h1{}"), "{css}");

        worker.join().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_socket_replaces_stale_file() {
        use std::os::unix::net::UnixStream;

        let (dir, config) = letters_fixture();
        let site = Site::load(&config, &Default::default()).unwrap();

        let socket = dir.path().join("tmp/letters.sock");
        fs::create_dir_all(dir.path().join("tmp")).unwrap();
        fs::write(&socket, "left over from a killed server").unwrap();

        let (server, addr) = bind_unix(&socket).unwrap();
        assert_eq!(addr, format!("unix:{}", socket.display()));

        let static_root = config.build.output.clone();
        let worker = thread::spawn(move || {
            let request = server.recv().unwrap();
            handle_request(request, &site, &static_root).unwrap();
        });

        let mut stream = UnixStream::connect(&socket).unwrap();
        write!(stream, "GET / HTTP/1.0\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        worker.join().unwrap();

        assert!(response.contains(" 200 "), "{response}");
        assert!(
            response.contains("<title>The tiny debugging library for Ruby</title>"),
            "{response}"
        );
    }
}
