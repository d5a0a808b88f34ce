//! Development HTTP API
//!
//! Transport-agnostic request handling: a server hands over the method, path
//! and raw body and gets back a status code and JSON body. Routes, for
//! `<kind>` in `images` and `videos`:
//!
//! | Method | Path                     | Body                                   |
//! |--------|--------------------------|----------------------------------------|
//! | GET    | `/api/<kind>/manifest`   |                                        |
//! | POST   | `/api/<kind>/select`     | `{slot, selected}`                     |
//! | DELETE | `/api/<kind>/candidate`  | `{slot, filename}`                     |
//! | POST   | `/api/<kind>/generate`   | `{slot, prompt?, count?, aspect?, duration?}` |
//!
//! Outside development mode every route answers 403 before any file is read.

use crate::generator::GenerateInput;
use crate::kind::MediaKind;
use crate::service::MediaService;
use mediaslot_core::MediaError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Status code and JSON body for one request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": message.into() }),
        }
    }

    fn from_error(err: &MediaError) -> Self {
        let status = status_for(err);
        if status >= 500 {
            tracing::error!(error = %err, "request failed");
        }
        Self::error(status, err.to_string())
    }
}

/// HTTP status for an operation error
pub fn status_for(err: &MediaError) -> u16 {
    match err {
        e if e.is_not_found() => 404,
        e if e.is_validation() => 400,
        MediaError::Forbidden(_) => 403,
        _ => 500,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Manifest,
    Select,
    DeleteCandidate,
    Generate,
}

impl Action {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "manifest" => Some(Action::Manifest),
            "select" => Some(Action::Select),
            "candidate" => Some(Action::DeleteCandidate),
            "generate" => Some(Action::Generate),
            _ => None,
        }
    }

    fn method(self) -> &'static str {
        match self {
            Action::Manifest => "GET",
            Action::Select | Action::Generate => "POST",
            Action::DeleteCandidate => "DELETE",
        }
    }
}

fn route(path: &str) -> Option<(MediaKind, Action)> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let rest = path.strip_prefix("/api/")?.trim_end_matches('/');
    let (kind, action) = rest.split_once('/')?;
    let kind = match kind {
        "images" => MediaKind::Image,
        "videos" => MediaKind::Video,
        _ => return None,
    };
    Some((kind, Action::parse(action)?))
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    slot: Option<String>,
    selected: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateBody {
    slot: Option<String>,
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    slot: Option<String>,
    prompt: Option<String>,
    count: Option<u32>,
    aspect: Option<String>,
    duration: Option<u32>,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiResponse> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body)
        .map_err(|e| ApiResponse::error(400, format!("Invalid JSON body: {}", e)))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiResponse> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiResponse::from_error(&MediaError::MissingRequiredField(field.to_string())))
}

impl MediaService {
    /// Handle one API request
    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> ApiResponse {
        let Some((kind, action)) = route(path) else {
            return ApiResponse::error(404, format!("No route for {}", path));
        };
        if !method.eq_ignore_ascii_case(action.method()) {
            return ApiResponse::error(
                405,
                format!("{} not allowed on {}; use {}", method, path, action.method()),
            );
        }
        if let Err(e) = self.mode().ensure_development("The media API") {
            return ApiResponse::from_error(&e);
        }
        tracing::debug!(method, path, "api request");

        let result = match action {
            Action::Manifest => self.handle_manifest(kind),
            Action::Select => self.handle_select(kind, body),
            Action::DeleteCandidate => self.handle_delete(kind, body),
            Action::Generate => self.handle_generate(kind, body),
        };
        result.unwrap_or_else(|response| response)
    }

    fn handle_manifest(&self, kind: MediaKind) -> Result<ApiResponse, ApiResponse> {
        let manifest = self.manifest(kind).map_err(|e| ApiResponse::from_error(&e))?;
        Ok(ApiResponse::ok(to_value(&manifest)?))
    }

    fn handle_select(&self, kind: MediaKind, body: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let body: SelectBody = parse_body(body)?;
        let slot = required(body.slot, "slot")?;
        let selected = required(body.selected, "selected")?;
        let outcome = self
            .select(kind, &slot, &selected)
            .map_err(|e| ApiResponse::from_error(&e))?;
        Ok(ApiResponse::ok(json!({
            "success": true,
            "manifest": to_value(&outcome.manifest)?,
            "selectedPath": outcome.selected_path,
            "promoted": outcome.promoted,
        })))
    }

    fn handle_delete(&self, kind: MediaKind, body: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let body: CandidateBody = parse_body(body)?;
        let slot = required(body.slot, "slot")?;
        let filename = required(body.filename, "filename")?;
        let outcome = self
            .delete_candidate(kind, &slot, &filename)
            .map_err(|e| ApiResponse::from_error(&e))?;
        Ok(ApiResponse::ok(json!({
            "success": true,
            "manifest": to_value(&outcome.manifest)?,
            "removedFromDisk": outcome.removed_from_disk,
        })))
    }

    fn handle_generate(&self, kind: MediaKind, body: &[u8]) -> Result<ApiResponse, ApiResponse> {
        let body: GenerateBody = parse_body(body)?;
        let input = GenerateInput {
            slot: required(body.slot, "slot")?,
            prompt: body.prompt,
            count: body.count,
            aspect: body.aspect,
            duration: body.duration,
        };
        let outcome = self
            .generate(kind, input)
            .map_err(|e| ApiResponse::from_error(&e))?;

        if !outcome.output.success {
            return Ok(ApiResponse {
                status: 500,
                body: json!({
                    "success": false,
                    "error": outcome.output.failure_detail(),
                    "output": outcome.output.combined(),
                    "runId": outcome.output.run_id,
                }),
            });
        }
        Ok(ApiResponse::ok(json!({
            "success": true,
            "slot": to_value(&outcome.slot)?,
            "output": outcome.output.combined(),
            "runId": outcome.output.run_id,
        })))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApiResponse> {
    serde_json::to_value(value).map_err(|e| ApiResponse::from_error(&MediaError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KindConfig, RuntimeMode};
    use crate::manifest::{MediaFile, MediaManifest, SlotParams};
    use std::path::{Path, PathBuf};

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mediaslot_api_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn service(root: &Path, mode: RuntimeMode) -> MediaService {
        let mut images = KindConfig::with_root(MediaKind::Image, root.join("images"));
        images.generator = "mock".into();
        MediaService::new(
            mode,
            images,
            KindConfig::with_root(MediaKind::Video, root.join("videos")),
        )
    }

    fn seed(service: &MediaService) {
        let config = service.kind_config(MediaKind::Image);
        std::fs::create_dir_all(config.generated_dir_path()).unwrap();
        std::fs::write(config.generated_dir_path().join("a.png"), b"png").unwrap();
        let mut manifest = MediaManifest::new();
        manifest.append_candidate(
            "why-us",
            SlotParams {
                prompt: "team".into(),
                ..Default::default()
            },
            MediaFile::new("a.png", "generated/a.png"),
        );
        config.store().save(&manifest).unwrap();
    }

    #[test]
    fn test_routing() {
        assert_eq!(
            route("/api/images/manifest?t=1"),
            Some((MediaKind::Image, Action::Manifest))
        );
        assert_eq!(
            route("/api/videos/candidate/"),
            Some((MediaKind::Video, Action::DeleteCandidate))
        );
        assert_eq!(route("/api/audio/manifest"), None);
        assert_eq!(route("/api/images/unknown"), None);
        assert_eq!(route("/images/manifest"), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&MediaError::SlotNotFound("x".into())), 404);
        assert_eq!(status_for(&MediaError::MissingRequiredField("slot".into())), 400);
        assert_eq!(status_for(&MediaError::Forbidden("no".into())), 403);
        assert_eq!(status_for(&MediaError::GenerationError("boom".into())), 500);
    }

    #[test]
    fn test_unknown_route_and_wrong_method() {
        let root = temp_root();
        let service = service(&root, RuntimeMode::Development);
        assert_eq!(service.handle("GET", "/api/images/nope", b"").status, 404);
        assert_eq!(service.handle("GET", "/api/images/select", b"").status, 405);
        assert_eq!(service.handle("POST", "/api/videos/manifest", b"").status, 405);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_manifest_returns_empty_default() {
        let root = temp_root();
        let service = service(&root, RuntimeMode::Development);
        let response = service.handle("GET", "/api/videos/manifest", b"");
        assert_eq!(response.status, 200);
        assert_eq!(response.body["version"], "1.0");
        assert!(response.body["slots"].as_object().unwrap().is_empty());
        assert!(!root.join("videos/generated/manifest.json").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_production_is_forbidden() {
        let root = temp_root();
        seed(&service(&root, RuntimeMode::Development));
        let before = std::fs::read(root.join("images/generated/manifest.json")).unwrap();

        let service = service(&root, RuntimeMode::Production);
        let response = service.handle(
            "POST",
            "/api/images/select",
            br#"{"slot":"why-us","selected":"a.png"}"#,
        );
        assert_eq!(response.status, 403);
        assert_eq!(response.body["success"], false);
        assert_eq!(service.handle("GET", "/api/images/manifest", b"").status, 403);
        assert_eq!(
            std::fs::read(root.join("images/generated/manifest.json")).unwrap(),
            before
        );
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_select_response_shape() {
        let root = temp_root();
        let service = service(&root, RuntimeMode::Development);
        seed(&service);

        let response = service.handle(
            "POST",
            "/api/images/select",
            br#"{"slot":"why-us","selected":"a.png"}"#,
        );
        assert_eq!(response.status, 200);
        assert_eq!(response.body["success"], true);
        assert_eq!(response.body["promoted"], true);
        assert_eq!(response.body["selectedPath"], "/images/selected/why-us.png");
        assert_eq!(
            response.body["manifest"]["slots"]["why-us"]["selected"],
            "a.png"
        );
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_bad_requests() {
        let root = temp_root();
        let service = service(&root, RuntimeMode::Development);
        seed(&service);

        let bad_json = service.handle("POST", "/api/images/select", b"{not json");
        assert_eq!(bad_json.status, 400);

        let missing = service.handle("POST", "/api/images/select", br#"{"slot":"why-us"}"#);
        assert_eq!(missing.status, 400);
        assert!(missing.body["error"].as_str().unwrap().contains("selected"));

        let unknown = service.handle(
            "DELETE",
            "/api/images/candidate",
            br#"{"slot":"why-us","filename":"zzz.png"}"#,
        );
        assert_eq!(unknown.status, 404);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_delete_response_shape() {
        let root = temp_root();
        let service = service(&root, RuntimeMode::Development);
        seed(&service);

        let response = service.handle(
            "DELETE",
            "/api/images/candidate",
            br#"{"slot":"why-us","filename":"a.png"}"#,
        );
        assert_eq!(response.status, 200);
        assert_eq!(response.body["removedFromDisk"], true);
        assert!(response.body["manifest"]["slots"]["why-us"]["files"]
            .as_array()
            .unwrap()
            .is_empty());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_generate_with_mock() {
        let root = temp_root();
        let service = service(&root, RuntimeMode::Development);

        let response = service.handle(
            "POST",
            "/api/images/generate",
            br#"{"slot":"services/hero","prompt":"consultants","count":2}"#,
        );
        assert_eq!(response.status, 200);
        assert_eq!(response.body["slot"]["slot"], "services/hero");
        assert_eq!(response.body["slot"]["files"].as_array().unwrap().len(), 2);

        let no_prompt = service.handle("POST", "/api/images/generate", br#"{"slot":"about"}"#);
        assert_eq!(no_prompt.status, 400);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_generate_oversized_count_is_bad_request() {
        let root = temp_root();
        let service = service(&root, RuntimeMode::Development);

        let response = service.handle(
            "POST",
            "/api/images/generate",
            br#"{"slot":"hero","prompt":"p","count":4294967295}"#,
        );
        assert_eq!(response.status, 400);
        assert_eq!(response.body["success"], false);
        assert!(response.body["error"].as_str().unwrap().contains("count"));
        assert!(!root.join("images/generated").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_failure_is_500_with_output() {
        let root = temp_root();
        let mut service = service(&root, RuntimeMode::Development);
        seed(&service);
        let mut images = service.kind_config(MediaKind::Image).clone();
        images.generator = "command".into();
        images.command = Some("sh".into());
        images.args = vec!["-c".into(), "echo 'rate limited' >&2; exit 1".into(), "gen".into()];
        service = MediaService::new(
            RuntimeMode::Development,
            images,
            service.kind_config(MediaKind::Video).clone(),
        );

        let response = service.handle("POST", "/api/images/generate", br#"{"slot":"why-us"}"#);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["error"], "rate limited");
        assert!(response.body["output"].as_str().unwrap().contains("rate limited"));

        let manifest = service.snapshot(MediaKind::Image).unwrap();
        assert_eq!(manifest.slot("why-us").unwrap().files.len(), 1);
        std::fs::remove_dir_all(&root).ok();
    }
}
