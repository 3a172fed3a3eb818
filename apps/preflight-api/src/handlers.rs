//! HTTP handlers for the Preflight API

use axum::{
    extract::{Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;

use preflight_core::{parse_order, ParsedOrder, ResultStore};
use shared_types::{Services, Specification, ValidationResult};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Create a new specification profile
pub async fn create_spec(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSpecRequest>,
) -> Result<Json<Specification>, ApiError> {
    let spec = req.into_spec();
    tracing::info!("Created specification: {} ({})", spec.name, spec.id);
    state.insert_spec(spec.clone());
    Ok(Json(spec))
}

/// List all stored specifications
pub async fn list_specs(State(state): State<Arc<AppState>>) -> Json<Vec<Specification>> {
    Json(state.all_specs())
}

/// Get one specification by id
pub async fn get_spec(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Specification>, ApiError> {
    state
        .find_spec(&id)
        .map(Json)
        .ok_or(ApiError::SpecNotFound(id))
}

/// Parse free-form order text into a specification
pub async fn parse_order_text(
    Json(req): Json<ParseOrderRequest>,
) -> Result<Json<ParsedOrder>, ApiError> {
    let parsed = parse_order(&req.text)?;
    Ok(Json(parsed))
}

/// Validate an uploaded document against a stored or ad-hoc spec
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidationResult>, ApiError> {
    let document = BASE64
        .decode(&req.document_base64)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid document base64: {}", e)))?;

    let (spec, services) = resolve_spec(&state, &req)?;

    // The engine does blocking I/O (temp files, converter subprocess);
    // keep it off the async workers.
    let worker_state = state.clone();
    let file_name = req.file_name.clone();
    let engine_spec = spec.clone();
    let result = tokio::task::spawn_blocking(move || {
        worker_state
            .engine
            .validate_with_services(&document, &file_name, &engine_spec, &services)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("validation task failed: {e}")))??;

    state.results.put(result.clone(), spec);
    tracing::info!("Stored validation result: {}", result.id);

    Ok(Json(result))
}

/// Retrieve a stored validation result with the spec it was judged against
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResultEnvelope>, ApiError> {
    state
        .results
        .get(&id)
        .map(|(result, spec)| Json(ResultEnvelope { result, spec }))
        .ok_or(ApiError::ResultNotFound(id))
}

fn resolve_spec(
    state: &AppState,
    req: &ValidateRequest,
) -> Result<(Specification, Services), ApiError> {
    match (&req.spec_id, &req.order_text) {
        (Some(id), _) => {
            let spec = state
                .find_spec(id)
                .ok_or_else(|| ApiError::SpecNotFound(id.clone()))?;
            Ok((spec, Services::default()))
        }
        (None, Some(text)) => {
            let parsed = parse_order(text)?;
            Ok((parsed.spec, parsed.services))
        }
        (None, None) => Err(ApiError::InvalidRequest(
            "either spec_id or order_text is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new())
    }

    fn sample_spec_request() -> CreateSpecRequest {
        CreateSpecRequest {
            name: "Romanzo 17x24".to_string(),
            page_width_cm: 17.0,
            page_height_cm: 24.0,
            top_margin_cm: 2.0,
            bottom_margin_cm: 2.0,
            left_margin_cm: 2.0,
            right_margin_cm: 2.0,
            requires_toc: false,
            no_color_pages: true,
            no_images: false,
            requires_header: false,
            requires_footnotes: false,
            min_page_count: 0,
        }
    }

    #[tokio::test]
    async fn test_spec_crud_round_trip() {
        let state = test_state();

        let Json(created) = create_spec(State(state.clone()), Json(sample_spec_request()))
            .await
            .unwrap();
        assert_eq!(created.name, "Romanzo 17x24");
        assert!(created.no_color_pages);

        let Json(all) = list_specs(State(state.clone())).await;
        assert_eq!(all.len(), 1);

        let Json(found) = get_spec(State(state.clone()), Path(created.id.clone()))
            .await
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_get_unknown_spec_is_not_found() {
        let err = get_spec(State(test_state()), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::SpecNotFound(_)));
    }

    #[tokio::test]
    async fn test_parse_order_endpoint() {
        let Json(parsed) = parse_order_text(Json(ParseOrderRequest {
            text: "Formato: 17x24\nMargini: 2cm".to_string(),
        }))
        .await
        .unwrap();
        assert_eq!(parsed.spec.page_width_cm, 17.0);
    }

    #[tokio::test]
    async fn test_validate_requires_spec_or_order_text() {
        let req = ValidateRequest {
            file_name: "tesi.pdf".to_string(),
            document_base64: BASE64.encode(b"irrelevant"),
            spec_id: None,
            order_text: None,
        };
        let err = validate(State(test_state()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_base64() {
        let req = ValidateRequest {
            file_name: "tesi.pdf".to_string(),
            document_base64: "%%% not base64 %%%".to_string(),
            spec_id: None,
            order_text: Some("Formato: 17x24".to_string()),
        };
        let err = validate(State(test_state()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_validate_with_unknown_spec_id_is_not_found() {
        let req = ValidateRequest {
            file_name: "tesi.pdf".to_string(),
            document_base64: BASE64.encode(b"irrelevant"),
            spec_id: Some("missing".to_string()),
            order_text: None,
        };
        let err = validate(State(test_state()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::SpecNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_result_is_not_found() {
        let err = get_result(State(test_state()), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ResultNotFound(_)));
    }
}
