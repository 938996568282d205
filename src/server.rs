//! Development HTTP server over the output directory.
//!
//! Serves files as they are on disk; it never looks at the build registry,
//! so it can run on its own thread while the main thread rebuilds.

use percent_encoding::percent_decode_str;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot listen on {addr}: {message}")]
    Bind { addr: String, message: String },
}

/// A bound server that has not started answering requests yet.
pub struct DevServer {
    server: Arc<Server>,
    root: PathBuf,
}

/// Listen on `host:port`, serving files below `root`. Port 0 picks a free
/// port; see [`DevServer::addr`].
pub fn bind(host: &str, port: u16, root: &Path) -> Result<DevServer, ServeError> {
    let addr = format!("{host}:{port}");
    let server = Server::http(&addr).map_err(|e| ServeError::Bind {
        addr: addr.clone(),
        message: e.to_string(),
    })?;
    Ok(DevServer {
        server: Arc::new(server),
        root: root.to_path_buf(),
    })
}

impl DevServer {
    pub fn addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Answer requests on a background thread until [`ServerHandle::shutdown`].
    pub fn spawn(self) -> ServerHandle {
        let server = Arc::clone(&self.server);
        let thread = std::thread::spawn(move || self.run());
        ServerHandle { server, thread }
    }

    /// Answer requests on the current thread (blocking).
    pub fn run(self) {
        for request in self.server.incoming_requests() {
            if let Err(e) = respond(request, &self.root) {
                eprintln!("Request failed: {e}");
            }
        }
    }
}

/// A server running on its own thread.
pub struct ServerHandle {
    server: Arc<Server>,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    pub fn shutdown(self) {
        self.server.unblock();
        self.thread.join().ok();
    }
}

fn respond(request: Request, root: &Path) -> std::io::Result<()> {
    match resolve_path(request.url(), root) {
        Some(path) => {
            let file = fs::File::open(&path)?;
            let mut response = Response::from_file(file);
            if let Some(header) = content_type_header(content_type(&path)) {
                response.add_header(header);
            }
            request.respond(response)
        }
        None => {
            let mut response = Response::from_string("404 Not Found").with_status_code(404);
            if let Some(header) = content_type_header(PLAIN) {
                response.add_header(header);
            }
            request.respond(response)
        }
    }
}

fn content_type_header(value: &str) -> Option<Header> {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).ok()
}

/// The file a request URL maps to below `root`, if any. Directories map to
/// their `index.html`. Anything resolving outside `root` is refused.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let decoded = percent_decode_str(url).decode_utf8().ok()?;
    let path = decoded.split(['?', '#']).next().unwrap_or_default();
    let clean = path.trim_matches('/');
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let canonical = root.join(clean).canonicalize().ok()?;
    if !canonical.starts_with(root.canonicalize().ok()?) {
        return None;
    }
    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

const PLAIN: &str = "text/plain; charset=utf-8";

/// MIME type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt" | "md") => PLAIN,
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
