//! Classification of raw service responses.

use bytes::Bytes;
use parlance_core::error::TurnError;
use reqwest::header::HeaderMap;

use crate::error_body::extract_service_message;
use crate::metadata::TurnMetadata;

/// A successful response split into metadata and audio payload.
#[derive(Debug, Clone)]
pub struct DecodedTurn {
    /// Side-channel turn metadata.
    pub metadata: TurnMetadata,
    /// The NPC's spoken reply (possibly empty).
    pub audio: Bytes,
}

/// Classifies a response by status and decodes the metadata header.
///
/// # Errors
///
/// Returns `TurnError::Service` for any status other than 200 and
/// `TurnError::Protocol` when the metadata header is missing or invalid.
pub fn decode_turn_response(
    status: u16,
    headers: &HeaderMap,
    metadata_header: &str,
    body: Bytes,
) -> Result<DecodedTurn, TurnError> {
    if status != 200 {
        return Err(TurnError::Service {
            status,
            message: extract_service_message(&body),
        });
    }

    let header = headers
        .get(metadata_header)
        .ok_or_else(|| TurnError::Protocol(format!("response lacks {metadata_header} header")))?;
    let value = header
        .to_str()
        .map_err(|e| TurnError::Protocol(format!("{metadata_header} header is not ASCII: {e}")))?;
    let metadata = TurnMetadata::decode(value).map_err(TurnError::Protocol)?;

    Ok(DecodedTurn {
        metadata,
        audio: body,
    })
}
