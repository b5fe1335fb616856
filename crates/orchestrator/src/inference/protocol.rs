#![forbid(unsafe_code)]

//! Wire format shared with the inference service: a 20-byte request of five
//! little-endian f32 values in the [`FeatureVector`] field order, answered by
//! a 4-byte little-endian i32 class code. One request per connection.

use crate::domain::AccessPattern;
use crate::error::InferenceError;
use crate::features::{FEATURE_COUNT, FeatureVector};

pub const REQUEST_LEN: usize = FEATURE_COUNT * 4;
pub const RESPONSE_LEN: usize = 4;

pub fn encode_request(features: &FeatureVector) -> [u8; REQUEST_LEN] {
    let mut frame = [0u8; REQUEST_LEN];
    for (chunk, value) in frame.chunks_exact_mut(4).zip(features.to_array()) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    frame
}

/// Inverse of [`encode_request`]; used by the in-process test service.
pub fn decode_request(frame: &[u8; REQUEST_LEN]) -> FeatureVector {
    let mut values = [0f32; FEATURE_COUNT];
    for (value, chunk) in values.iter_mut().zip(frame.chunks_exact(4)) {
        *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    FeatureVector::from_array(values)
}

pub fn encode_response(pattern: AccessPattern) -> [u8; RESPONSE_LEN] {
    pattern.code().to_le_bytes()
}

pub fn decode_response(frame: [u8; RESPONSE_LEN]) -> Result<AccessPattern, InferenceError> {
    let code = i32::from_le_bytes(frame);
    AccessPattern::from_code(code).ok_or(InferenceError::MalformedResponse(code))
}
