//! HTTP API for upload, list, fetch, and delete
//!
//! A blocking tiny_http loop: each request is routed by `(method, path)`,
//! handled to completion, and answered with a JSON body. Handlers are plain
//! functions over an [`AppContext`] so the routing layer stays a thin shell
//! and the logic is testable without a socket.
//!
//! Routes:
//! - `POST /upload`            multipart field `file` → validate, save, analyze, persist
//! - `GET  /statistics`        all records
//! - `GET  /statistics/{id}`   one record or 404
//! - `GET  /delete/{id}`       hard delete (read-verb kept for client compatibility)

use crate::analyzer::{self, Analysis};
use crate::config::Config;
use crate::db::Database;
use crate::ingest;
use multipart::server::Multipart;
use serde_json::{json, Value};
use std::io::{self, Read};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{error, info};

/// Application state built once at startup and passed to every handler.
pub struct AppContext {
    pub db: Database,
    pub config: Config,
}

impl AppContext {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config }
    }
}

/// A handler's answer: HTTP status plus JSON body.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": message.into() }))
    }
}

/// Start the server and serve requests until the process exits.
pub fn start(ctx: AppContext, port: u16) -> io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    info!(addr = %addr, "listening");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(&ctx, request) {
            error!(error = %e, "failed to answer request");
        }
    }

    Ok(())
}

fn handle_request(ctx: &AppContext, mut request: Request) -> io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/").to_string();
    let method = request.method().clone();

    let reply = match (&method, path.as_str()) {
        (&Method::Post, "/upload") => Some(match read_upload_part(&mut request) {
            Ok(Some((filename, data))) => upload(ctx, &filename, &data),
            Ok(None) => Reply::error(400, "No file part"),
            Err(e) => Reply::error(400, format!("Malformed upload: {}", e)),
        }),

        (&Method::Get, "/statistics") => Some(list_statistics(ctx)),

        (&Method::Get, p) if p.starts_with("/statistics/") => {
            parse_id(p, "/statistics/").map(|id| get_statistics(ctx, id))
        }

        (&Method::Get, p) if p.starts_with("/delete/") => {
            parse_id(p, "/delete/").map(|id| delete_statistics(ctx, id))
        }

        _ => None,
    };

    match reply {
        Some(reply) => {
            info!(method = %method, path = %path, status = reply.status, "handled");
            respond_json(request, reply)
        }
        None => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

/// `POST /upload` — validate the declared name, persist the bytes, run the
/// analysis, and create a record only when the analysis succeeded. A file
/// that fails analysis stays on disk; there is no cleanup.
pub fn upload(ctx: &AppContext, filename: &str, data: &[u8]) -> Reply {
    if filename.is_empty() {
        return Reply::error(400, "No selected file");
    }
    if !ingest::allowed_file(filename) {
        return Reply::error(400, "File type not allowed");
    }

    let sanitized = ingest::sanitize_filename(filename);
    let saved_path = match ingest::save_upload(&ctx.config.upload_dir, &sanitized, data) {
        Ok(path) => path,
        Err(e) => {
            error!(filename = %sanitized, error = %e, "failed to save upload");
            return Reply::error(500, e.to_string());
        }
    };

    match analyzer::analyze_file(&saved_path) {
        Analysis::Stats { mean, median, correlation } => {
            match ctx.db.insert_result(&sanitized, mean, median, correlation) {
                Ok(id) => Reply::new(
                    201,
                    json!({
                        "message": "File uploaded and analyzed successfully",
                        "result_id": id,
                    }),
                ),
                Err(e) => {
                    error!(filename = %sanitized, error = %e, "failed to store result");
                    Reply::error(500, e.to_string())
                }
            }
        }
        Analysis::Empty | Analysis::ParseError(_) => Reply::error(
            422,
            "Could not analyze data. Check file content (e.g., column names A and B).",
        ),
    }
}

/// `GET /statistics/{id}`
pub fn get_statistics(ctx: &AppContext, id: i32) -> Reply {
    match ctx.db.get_result(id) {
        Ok(Some(record)) => match serde_json::to_value(&record) {
            Ok(body) => Reply::new(200, body),
            Err(e) => Reply::error(500, e.to_string()),
        },
        Ok(None) => Reply::error(404, "Analysis result not found"),
        Err(e) => Reply::error(500, e.to_string()),
    }
}

/// `GET /statistics`
pub fn list_statistics(ctx: &AppContext) -> Reply {
    match ctx.db.get_results() {
        Ok(records) => match serde_json::to_value(&records) {
            Ok(body) => Reply::new(200, body),
            Err(e) => Reply::error(500, e.to_string()),
        },
        Err(e) => Reply::error(500, e.to_string()),
    }
}

/// `GET /delete/{id}` — fetch-or-404, then delete inside a transaction. A
/// storage failure rolls back and surfaces the error text with a 500.
pub fn delete_statistics(ctx: &AppContext, id: i32) -> Reply {
    match ctx.db.get_result(id) {
        Ok(Some(_)) => match ctx.db.delete_result(id) {
            Ok(_) => Reply::new(
                200,
                json!({ "message": format!("Item {} deleted successfully", id) }),
            ),
            Err(e) => {
                error!(id, error = %e, "delete failed");
                Reply::error(500, e.to_string())
            }
        },
        Ok(None) => Reply::error(404, "Analysis result not found"),
        Err(e) => Reply::error(500, e.to_string()),
    }
}

/// Extract the `file` field from a multipart body. `Ok(None)` means the
/// request either was not multipart or carried no `file` part.
fn read_upload_part(request: &mut Request) -> io::Result<Option<(String, Vec<u8>)>> {
    let boundary = match multipart_boundary(request) {
        Some(boundary) => boundary,
        None => return Ok(None),
    };

    let mut form = Multipart::with_body(request.as_reader(), boundary);
    while let Some(mut entry) = form.read_entry()? {
        if &*entry.headers.name == "file" {
            let filename = entry.headers.filename.clone().unwrap_or_default();
            let mut data = Vec::new();
            entry.data.read_to_end(&mut data)?;
            return Ok(Some((filename, data)));
        }
    }

    Ok(None)
}

fn multipart_boundary(request: &Request) -> Option<String> {
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_string())?;

    boundary_from_content_type(&content_type)
}

fn boundary_from_content_type(content_type: &str) -> Option<String> {
    // Media types compare case-insensitively.
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    if !media_type.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }

    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"').to_string())
}

/// Parse the trailing id of a route like `/statistics/{id}`. Anything that
/// is not a plain non-negative integer is treated as an unknown route.
fn parse_id(path: &str, prefix: &str) -> Option<i32> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

fn respond_json(request: Request, reply: Reply) -> io::Result<()> {
    let response = Response::from_string(reply.body.to_string())
        .with_status_code(reply.status)
        .with_header(
            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
        );
    request.respond(response)
}
