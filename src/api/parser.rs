// src/api/parser.rs
//! Status checking and typed decoding of v3 responses.

use super::transport::ApiResponse;
use super::wire::{GetRecordValuesResponse, RecordDescriptor, RecordRef, RecordValue};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, Result};
use crate::model::Record;
use reqwest::StatusCode;
use serde::Deserialize;

/// Error body the service sends with non-200 responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceError {
    error_id: Option<String>,
    name: Option<String>,
    message: Option<String>,
}

/// Passes a 200 response through; anything else becomes `AppError::Transport`
/// with the body kept verbatim.
pub fn check_status(response: ApiResponse<String>) -> Result<ApiResponse<String>> {
    if response.status == StatusCode::OK {
        return Ok(response);
    }

    if let Ok(error) = serde_json::from_str::<ServiceError>(&response.data) {
        log::debug!(
            "Service error from {}: {} {} ({})",
            response.url,
            error.name.as_deref().unwrap_or("unknown"),
            error.message.as_deref().unwrap_or(""),
            error.error_id.as_deref().unwrap_or("no error id")
        );
    }

    Err(AppError::Transport {
        url: response.url,
        status: response.status,
        body: response.data,
    })
}

/// Decodes a response body after checking its status.
pub fn parse_api_response<T>(response: ApiResponse<String>, context: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let response = check_status(response)?;
    serde_json::from_str(&response.data).map_err(|e| {
        log::error!("Failed to parse {} from {}: {}", context, response.url, e);

        AppError::Deserialization {
            context: context.to_string(),
            source: e,
            body: preview(&response.data),
        }
    })
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let cut: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}

/// Decodes a `getRecordValues` response, pairing each result with its request.
pub fn parse_record_values(
    response: ApiResponse<String>,
    refs: &[RecordRef],
) -> Result<Vec<RecordDescriptor>> {
    let parsed: GetRecordValuesResponse = parse_api_response(response, "getRecordValues response")?;

    if parsed.results.len() != refs.len() {
        return Err(AppError::RecordCountMismatch {
            requested: refs.len(),
            returned: parsed.results.len(),
        });
    }

    refs.iter()
        .zip(parsed.results)
        .map(|(record_ref, record)| -> Result<RecordDescriptor> {
            let value = match &record.value {
                Some(value) => Some(RecordValue::decode(&record_ref.table, value).map_err(
                    |source| AppError::Deserialization {
                        context: format!("{} record {}", record_ref.table, record_ref.id),
                        source,
                        body: preview(&value.to_string()),
                    },
                )?),
                None => None,
            };
            Ok(Record {
                role: record.role,
                value,
            })
        })
        .collect()
}
