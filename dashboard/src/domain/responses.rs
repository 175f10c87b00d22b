//! Classification of raw transport outcomes into [`ApiError`] and payloads.
//!
//! Every service that talks to the backend goes through these helpers so the
//! status-to-category table lives in one place.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::envelope::{Envelope, EnvelopeFailure};
use super::error::ApiError;
use super::ports::{TransportError, TransportResponse};

/// Map a failure where no response arrived.
pub(crate) fn map_transport_error(error: TransportError) -> ApiError {
    ApiError::network(error.to_string())
}

/// Map a non-2xx response to its category.
///
/// The backend's envelope message (with field errors folded in) is used when
/// the body decodes; otherwise a short preview of the raw body.
pub(crate) fn map_status_error(response: &TransportResponse) -> ApiError {
    let status = response.status;
    let message = failure_message(&response.body)
        .unwrap_or_else(|| fallback_message(status, &response.body));

    match status {
        400 => ApiError::validation(message),
        401 => ApiError::authentication_expired(message),
        403 => ApiError::forbidden(message),
        404 => ApiError::not_found(message),
        _ => ApiError::server(Some(status), message),
    }
}

/// Decode the `data` of a successful response.
///
/// A missing `data` is accepted when `T` can be built from JSON `null`
/// (unit or `Option`), which covers endpoints that only confirm an action.
pub(crate) fn decode_data<T>(response: &TransportResponse) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    if !response.is_success() {
        return Err(map_status_error(response));
    }

    let status = response.status;
    let envelope: Envelope<T> = serde_json::from_slice(&response.body).map_err(|error| {
        ApiError::server(Some(status), format!("undecodable response payload: {error}"))
    })?;

    match envelope.into_data() {
        Ok(data) => Ok(data),
        Err(EnvelopeFailure::Rejected {
            message,
            has_field_errors: true,
        }) => Err(ApiError::validation(message)),
        Err(EnvelopeFailure::Rejected { message, .. }) => {
            Err(ApiError::server(Some(status), message))
        }
        Err(EnvelopeFailure::MissingData) => serde_json::from_value(Value::Null).map_err(|_| {
            ApiError::server(Some(status), "response envelope carried no data")
        }),
    }
}

/// Envelope message of a failure body, when the body is an envelope.
pub(crate) fn failure_message(body: &[u8]) -> Option<String> {
    let envelope: Envelope<Value> = serde_json::from_slice(body).ok()?;
    let has_detail = !envelope.message.trim().is_empty()
        || envelope.errors.as_ref().is_some_and(|errors| !errors.is_empty());
    has_detail.then(|| envelope.failure_message())
}

fn fallback_message(status: u16, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {status}")
    } else {
        format!("status {status}: {preview}")
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
