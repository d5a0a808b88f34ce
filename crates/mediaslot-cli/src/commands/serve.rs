//! Development media API over HTTP
//!
//! Requests are handled one at a time on the calling thread.

use anyhow::{Context, Result};
use mediaslot_media::{ApiResponse, MediaService};
use std::io::Read;
use tiny_http::{Header, Response, Server};

pub fn run(service: &MediaService, addr: &str) -> Result<()> {
    if !service.mode().is_development() {
        eprintln!(
            "Warning: running in {} mode; every API request will be refused",
            service.mode()
        );
    }

    let server = Server::http(addr).map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    let json_header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| anyhow::anyhow!("invalid content-type header"))?;
    println!("Serving media API on http://{}", addr);

    for mut request in server.incoming_requests() {
        let method = request.method().to_string();
        let url = request.url().to_string();

        let mut body = Vec::new();
        let response = match request.as_reader().read_to_end(&mut body) {
            Ok(_) => service.handle(&method, &url, &body),
            Err(e) => {
                tracing::warn!(method = %method, url = %url, error = %e, "failed to read request body");
                ApiResponse {
                    status: 400,
                    body: serde_json::json!({ "success": false, "error": e.to_string() }),
                }
            }
        };
        tracing::info!(method = %method, url = %url, status = response.status, "handled request");

        let payload = serde_json::to_vec(&response.body).context("encoding response")?;
        let reply = Response::from_data(payload)
            .with_status_code(response.status)
            .with_header(json_header.clone());
        if let Err(e) = request.respond(reply) {
            tracing::warn!(url = %url, error = %e, "failed to send response");
        }
    }
    Ok(())
}
