// Session endpoints
// Thin layer over the ledger: extracts the caller, samples the tick, maps errors

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::ledger::manager::SessionLedgerState;
use crate::ledger::types::{LedgerError, SessionId, UserAddress};

/// Header carrying the caller's authenticated address. Authenticating it is
/// the deployment's concern; the ledger only checks ownership against it.
pub const CALLER_ADDRESS_HEADER: &str = "x-caller-address";

#[derive(Debug, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: SessionId,
}

fn caller_address(headers: &HeaderMap) -> Result<UserAddress, (StatusCode, Json<Value>)> {
    headers
        .get(CALLER_ADDRESS_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|address| !address.is_empty())
        .map(UserAddress::from)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("Missing {} header", CALLER_ADDRESS_HEADER)
                })),
            )
        })
}

fn ledger_error(err: LedgerError) -> (StatusCode, Json<Value>) {
    let status = match err {
        LedgerError::SessionAlreadyOpen | LedgerError::SessionStillOpen => StatusCode::CONFLICT,
        LedgerError::SessionNotFound => StatusCode::NOT_FOUND,
    };

    (status, Json(json!({ "error": err.to_string() })))
}

pub async fn start_session(
    State(state): State<SessionLedgerState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let caller = caller_address(&headers)?;

    // Admitting a mutating call advances the chain by one tick
    let now = state.clock.tick();
    let session_id = state
        .ledger
        .start_session(&caller, now)
        .await
        .map_err(ledger_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": session_id,
            "started_at": now
        })),
    ))
}

pub async fn end_session(
    State(state): State<SessionLedgerState>,
    headers: HeaderMap,
    Json(payload): Json<EndSessionRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let caller = caller_address(&headers)?;

    let now = state.clock.tick();
    let duration = state
        .ledger
        .end_session(&caller, payload.session_id, now)
        .await
        .map_err(ledger_error)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "session_id": payload.session_id,
            "ended_at": now,
            "duration": duration
        })),
    ))
}

pub async fn current_session(
    State(state): State<SessionLedgerState>,
    Path(address): Path<String>,
) -> (StatusCode, Json<Value>) {
    let session_id = state
        .ledger
        .current_session_for_user(&UserAddress::from(address))
        .await;

    (StatusCode::OK, Json(json!({ "session_id": session_id })))
}

pub async fn session_duration(
    State(state): State<SessionLedgerState>,
    Path((address, session_id)): Path<(String, SessionId)>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let duration = state
        .ledger
        .session_duration(&UserAddress::from(address), session_id)
        .await
        .map_err(ledger_error)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "session_id": session_id,
            "duration": duration
        })),
    ))
}
