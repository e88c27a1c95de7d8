//! Shareable-link channel: compressed state in a URL query parameter.
//!
//! The inbound path decodes a `state` parameter once at startup: URL-safe
//! base64, zlib decompression, then the JSON wire format. Absence of the
//! parameter is normal and yields `Ok(None)`; any malformation is a
//! [`StateError`] that aborts the startup restore only, never the host.
//! The encoder is the write side for producing the links.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use yazi::{CompressionLevel, Format, compress, decompress};

use crate::error::StateError;
use crate::snapshot::WorkspaceSnapshot;

/// Query parameter carrying the encoded snapshot.
pub const STATE_PARAM: &str = "state";

/// Encodes a snapshot as a URL-component-safe `state` parameter value.
pub fn encode_state_param(snapshot: &WorkspaceSnapshot) -> Result<String, StateError> {
    let json = snapshot.to_json()?;
    let compressed = compress(json.as_bytes(), Format::Zlib, CompressionLevel::Default)
        .map_err(|err| StateError::Compress {
            reason: format!("{err:?}"),
        })?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Decodes a `state` parameter value back into a snapshot.
pub fn decode_state_param(value: &str) -> Result<WorkspaceSnapshot, StateError> {
    let compressed = URL_SAFE_NO_PAD.decode(value)?;
    let (json, _checksum) =
        decompress(&compressed, Format::Zlib).map_err(|err| StateError::Decompress {
            reason: format!("{err:?}"),
        })?;
    let json = String::from_utf8(json).map_err(|err| StateError::Decompress {
        reason: err.to_string(),
    })?;
    WorkspaceSnapshot::from_json(&json)
}

/// Extracts and decodes the `state` parameter from a query string.
///
/// Accepts the query with or without its leading `?`. A missing parameter
/// is not an error: startup simply has no inbound state.
pub fn state_from_query(query: &str) -> Result<Option<WorkspaceSnapshot>, StateError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == STATE_PARAM {
            return decode_state_param(value).map(Some);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ConnectionRecord, DeviceRecord};

    fn sample() -> WorkspaceSnapshot {
        WorkspaceSnapshot(vec![DeviceRecord {
            id: "osc-0".to_string(),
            left: "10px".to_string(),
            top: "20px".to_string(),
            connections: vec![ConnectionRecord {
                id: 1,
                target: "outputnode-0".to_string(),
                output: 0,
                input: 2,
            }],
            inputs: std::collections::BTreeMap::new(),
        }])
    }

    #[test]
    fn param_roundtrip() {
        let encoded = encode_state_param(&sample()).unwrap();
        assert_eq!(decode_state_param(&encoded).unwrap(), sample());
    }

    #[test]
    fn encoded_param_is_url_component_safe() {
        let encoded = encode_state_param(&sample()).unwrap();
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn query_with_state_param_decodes() {
        let encoded = encode_state_param(&sample()).unwrap();
        let query = format!("?foo=bar&state={encoded}");
        let decoded = state_from_query(&query).unwrap().unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn query_without_state_param_is_none() {
        assert!(state_from_query("").unwrap().is_none());
        assert!(state_from_query("?foo=bar").unwrap().is_none());
    }

    #[test]
    fn malformed_base64_is_an_error() {
        assert!(state_from_query("state=%%%").is_err());
    }

    #[test]
    fn malformed_compressed_payload_is_an_error() {
        // Valid base64, but not a zlib stream.
        let bogus = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"not zlib");
        assert!(matches!(
            decode_state_param(&bogus),
            Err(StateError::Decompress { .. })
        ));
    }
}
