//! API handlers for the posesión efectiva server
//!
//! Provides REST endpoints for:
//! - Filling the Formulario 2.1 template from an estate case record
//! - Saving, listing and loading draft case files

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use posesion_core::{render_case, EstateCase};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "posesion-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/generar-pdf
///
/// Body is the estate case record; the response streams the filled
/// form as a download.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Json(case): Json<EstateCase>,
) -> Result<Response, ServerError> {
    info!(
        "Generate request: causante={}, herederos={}, pasivos={}",
        case.causante.rut,
        case.herederos.len(),
        case.pasivos.len()
    );

    let template = tokio::fs::read(&state.template_path)
        .await
        .map_err(|e| {
            ServerError::TemplateUnavailable(format!("{}: {e}", state.template_path.display()))
        })?;

    let bytes = render_case(&template, &case, &state.registry)?;
    debug!("Generated {} bytes", bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=posesion_efectiva_completada.pdf",
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Draft save response
#[derive(Serialize)]
pub struct SaveDraftResponse {
    pub success: bool,
    pub archivo: String,
}

/// Handler: POST /api/guardar-borrador
///
/// Stores the request body verbatim so a half-entered form survives a
/// schema change.
pub async fn handle_save_draft(
    State(state): State<AppState>,
    Json(case): Json<serde_json::Value>,
) -> Result<Json<SaveDraftResponse>, ServerError> {
    let stamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let archivo = format!("borrador_{stamp}.json");

    let body =
        serde_json::to_vec_pretty(&case).map_err(|e| ServerError::Internal(e.to_string()))?;
    tokio::fs::write(state.drafts_dir.join(&archivo), body).await?;
    info!("Draft saved: {archivo}");

    Ok(Json(SaveDraftResponse {
        success: true,
        archivo,
    }))
}

/// One stored draft
#[derive(Serialize)]
pub struct DraftInfo {
    pub archivo: String,
    pub modificado: String,
}

/// Draft list response
#[derive(Serialize)]
pub struct DraftListResponse {
    pub success: bool,
    pub borradores: Vec<DraftInfo>,
}

/// Handler: GET /api/borradores
///
/// Lists stored drafts newest first.
pub async fn handle_list_drafts(
    State(state): State<AppState>,
) -> Result<Json<DraftListResponse>, ServerError> {
    let mut entries = match tokio::fs::read_dir(&state.drafts_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Json(DraftListResponse {
                success: true,
                borradores: Vec::new(),
            }));
        }
        Err(e) => return Err(e.into()),
    };

    let mut found: Vec<(DateTime<Utc>, String)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let archivo = entry.file_name().to_string_lossy().into_owned();
        if !archivo.starts_with("borrador_") || !archivo.ends_with(".json") {
            continue;
        }
        let modified = entry
            .metadata()
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::UNIX_EPOCH);
        found.push((modified, archivo));
    }
    found.sort_by(|a, b| b.cmp(a));

    Ok(Json(DraftListResponse {
        success: true,
        borradores: found
            .into_iter()
            .map(|(modified, archivo)| DraftInfo {
                archivo,
                modificado: modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
            .collect(),
    }))
}

/// Handler: GET /api/cargar-borrador/{archivo}
pub async fn handle_load_draft(
    State(state): State<AppState>,
    Path(archivo): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if archivo.contains('/') || archivo.contains('\\') || archivo.contains("..") {
        return Err(ServerError::InvalidRequest(format!(
            "Invalid draft filename '{archivo}'"
        )));
    }

    let body = match tokio::fs::read(state.drafts_dir.join(&archivo)).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::DraftNotFound(archivo));
        }
        Err(e) => return Err(e.into()),
    };
    let value = serde_json::from_slice(&body)
        .map_err(|e| ServerError::Internal(format!("Stored draft is not valid JSON: {e}")))?;

    Ok(Json(value))
}
