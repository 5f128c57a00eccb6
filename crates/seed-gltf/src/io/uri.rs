//! Data URIs and relative URI decoding.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{GltfError, Result};

/// MIME type for generic binary buffers.
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// MIME type registered for glTF buffers.
pub const MIME_GLTF_BUFFER: &str = "application/gltf-buffer";

/// True if `uri` is a `data:` URI.
pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Decode a base64 data URI into its MIME type and bytes.
///
/// Format: `data:[<mediatype>][;base64],<data>`. Only base64 payloads are
/// supported.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| GltfError::format("not a data URI"))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| GltfError::format("data URI has no payload separator"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| GltfError::format("only base64 data URIs are supported"))?;
    let bytes = STANDARD.decode(data)?;
    Ok((mime_type.to_string(), bytes))
}

/// Decode a data URI that must hold buffer content.
pub fn decode_buffer_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (mime_type, bytes) = decode_data_uri(uri)?;
    match mime_type.as_str() {
        MIME_OCTET_STREAM | MIME_GLTF_BUFFER => Ok(bytes),
        other => Err(GltfError::format(format!(
            "buffer data URI has unsupported MIME type {}",
            other
        ))),
    }
}

/// Encode bytes as a base64 data URI.
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Decode `%XX` escapes in a relative URI.
///
/// Malformed escapes are kept literally.
pub fn percent_decode(uri: &str) -> Result<String> {
    let bytes = uri.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                output.push((high << 4) | low);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(output)
        .map_err(|_| GltfError::format(format!("URI {} is not valid UTF-8 once decoded", uri)))
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Encode characters that may not appear unescaped in a relative URI.
pub fn percent_encode(path: &str) -> String {
    let mut output = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                output.push(b as char)
            }
            _ => output.push_str(&format!("%{:02X}", b)),
        }
    }
    output
}
