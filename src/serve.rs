//! HTTP server for the live dashboard
//!
//! `transboard serve --data-file transitions.json` → starts server, opens
//! browser, shows the dashboard.
//!
//! Routes:
//! - `GET /`, `GET /dashboard`: the dashboard page
//! - `GET /dashboard/dashboard-data`: `{ last_updated, results }`
//! - `GET /api/view?days=&unit=&batch=`: a rendered [`DashboardView`]

use crate::dashboard::{Dashboard, DashboardView};
use crate::filter::{FilterState, Selection};
use crate::loader::{self, LoadError};
use crate::report::html;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tiny_http::{Header, Method, Request, Response, Server};

pub const DATA_PATH: &str = "/dashboard/dashboard-data";
pub const VIEW_PATH: &str = "/api/view";

/// Body of the 404 served before the transitions file exists
pub const NOT_READY: &str = "Data not available yet. Wait for the first job to run.";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Transport-independent response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, content_type: "application/json", body },
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_string(&ErrorBody { error: message })
            .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string());
        Self { status, content_type: "application/json", body }
    }

    fn load_failure(err: &LoadError) -> Self {
        if err.is_not_found() {
            Self::error(404, NOT_READY)
        } else {
            Self::error(500, &err.to_string())
        }
    }

    fn not_found() -> Self {
        Self { status: 404, content_type: "text/plain", body: "Not found".to_string() }
    }
}

/// The transitions file, cached and reloaded when its mtime changes
pub struct DataCache {
    path: PathBuf,
    modified: Option<SystemTime>,
    dashboard: Option<Dashboard>,
}

impl DataCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), modified: None, dashboard: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Reload if the file changed since the last load
    pub fn refresh(&mut self) -> Result<(), LoadError> {
        let modified = self.file_modified();
        if self.dashboard.is_some() && modified == self.modified {
            return Ok(());
        }

        match loader::load_file(&self.path) {
            Ok(dataset) => {
                tracing::info!(path = %self.path.display(), transitions = dataset.len(), "data file (re)loaded");
                self.dashboard = Some(Dashboard::new(dataset));
                self.modified = modified;
                Ok(())
            }
            Err(e) => {
                self.dashboard = None;
                self.modified = None;
                Err(e)
            }
        }
    }

    pub fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        self.dashboard.as_mut()
    }
}

/// Start server, open browser, serve the dashboard
pub fn start(port: u16, data_file: PathBuf, defaults: FilterState, open_browser: bool) -> io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}/dashboard", port);
    tracing::info!(%url, data_file = %data_file.display(), "dashboard server listening");
    eprintln!("\n\x1b[1;32mtransboard\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Data: {}\n", data_file.display());

    if open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    let mut cache = DataCache::new(&data_file);
    if let Err(e) = cache.refresh() {
        tracing::warn!(error = %e, "no data yet");
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut cache, &defaults) {
            tracing::error!(error = %e, "failed to respond");
        }
    }

    Ok(())
}

fn handle_request(request: Request, cache: &mut DataCache, defaults: &FilterState) -> io::Result<()> {
    let reply = route(request.method(), request.url(), cache, defaults);
    tracing::debug!(method = %request.method(), url = request.url(), status = reply.status, "request");

    let header = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid content type"))?;
    let response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(header);
    request.respond(response)
}

/// Map a request to a reply
pub fn route(method: &Method, url: &str, cache: &mut DataCache, defaults: &FilterState) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/dashboard") | (&Method::Get, "/dashboard/") => dashboard_page(),
        (&Method::Get, DATA_PATH) => data(cache),
        (&Method::Get, VIEW_PATH) => view(query, cache, defaults),
        _ => Reply::not_found(),
    }
}

fn dashboard_page() -> Reply {
    let mut page = Vec::new();
    match html::write(&mut page, None, Some(VIEW_PATH)) {
        Ok(()) => Reply::html(String::from_utf8_lossy(&page).into_owned()),
        Err(e) => Reply::error(500, &e.to_string()),
    }
}

fn data(cache: &mut DataCache) -> Reply {
    if let Err(e) = cache.refresh() {
        return Reply::load_failure(&e);
    }
    match cache.dashboard_mut() {
        Some(dashboard) => Reply::json(200, &dashboard.dataset().to_payload()),
        None => Reply::error(404, NOT_READY),
    }
}

fn view(query: &str, cache: &mut DataCache, defaults: &FilterState) -> Reply {
    let selection: Selection = match serde_urlencoded::from_str(query) {
        Ok(selection) => selection,
        Err(e) => return Reply::error(400, &e.to_string()),
    };
    let filters = match selection.resolve(defaults) {
        Ok(filters) => filters,
        Err(e) => return Reply::error(400, &e.to_string()),
    };

    if let Err(e) = cache.refresh() {
        return Reply::load_failure(&e);
    }
    match cache.dashboard_mut() {
        Some(dashboard) => {
            dashboard.set_filters(filters);
            let view: DashboardView = dashboard.view();
            Reply::json(200, &view)
        }
        None => Reply::error(404, NOT_READY),
    }
}
