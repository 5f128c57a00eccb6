//! GLB binary container framing.
//!
//! Layout (little-endian):
//!
//! ```text
//! header  magic "glTF" | version 2 | total length
//! chunk   length | type "JSON" | JSON text padded with spaces
//! chunk   length | type "BIN\0" | binary payload padded with zeros   (optional)
//! ```
//!
//! Chunks of unknown type after the JSON chunk are skipped.

use std::io::{Read, Seek, SeekFrom};

use tracing::{trace, warn};

use crate::error::{GltfError, Result};
use crate::memory::align4;

/// GLB magic number ("glTF" in little-endian).
pub const GLB_MAGIC: u32 = 0x46546C67;

/// GLB container version.
pub const GLB_VERSION: u32 = 2;

/// JSON chunk type.
pub const CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"

/// Binary chunk type.
pub const CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

/// Size of the file header.
pub const HEADER_SIZE: usize = 12;

/// Size of a chunk header.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// The chunks of a GLB container, borrowed from its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbChunks<'a> {
    /// JSON chunk content, including trailing space padding.
    pub json: &'a [u8],
    /// BIN chunk content, including trailing zero padding.
    pub bin: Option<&'a [u8]>,
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Peek at a stream and report whether it starts with a GLB header.
///
/// The stream position is restored before returning, whatever the outcome.
/// Fewer than 4 bytes, or a GLB magic followed by an incomplete header, is a
/// truncation error.
pub fn is_binary_container<R: Read + Seek>(reader: &mut R) -> Result<bool> {
    let start = reader.stream_position()?;
    let mut header = [0u8; HEADER_SIZE];
    let mut filled = 0;
    let read_result = loop {
        match reader.read(&mut header[filled..]) {
            Ok(0) => break Ok(()),
            Ok(n) => {
                filled += n;
                if filled == HEADER_SIZE {
                    break Ok(());
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => break Err(e),
        }
    };
    reader.seek(SeekFrom::Start(start))?;
    read_result?;

    if filled < 4 {
        return Err(GltfError::format_at(
            format!("stream truncated: {} bytes available, at least 4 needed", filled),
            filled,
        ));
    }
    if read_u32(&header, 0) != GLB_MAGIC {
        return Ok(false);
    }
    if filled < HEADER_SIZE {
        return Err(GltfError::format_at(
            format!("GLB header truncated: {} of {} bytes", filled, HEADER_SIZE),
            filled,
        ));
    }
    Ok(true)
}

/// Split a GLB container into its JSON and BIN chunks.
///
/// Bytes past the declared total length are ignored.
pub fn read_glb(data: &[u8]) -> Result<GlbChunks<'_>> {
    if data.len() < HEADER_SIZE {
        return Err(GltfError::format_at("GLB header truncated", data.len()));
    }

    let magic = read_u32(data, 0);
    if magic != GLB_MAGIC {
        return Err(GltfError::format_at(
            format!("invalid GLB magic 0x{:08X}", magic),
            0,
        ));
    }
    let version = read_u32(data, 4);
    if version != GLB_VERSION {
        return Err(GltfError::format_at(
            format!("GLB version {} not supported", version),
            4,
        ));
    }
    let length = read_u32(data, 8) as usize;
    if length > data.len() {
        return Err(GltfError::format_at(
            format!(
                "GLB truncated: header declares {} bytes, {} available",
                length,
                data.len()
            ),
            data.len(),
        ));
    }
    if length < data.len() {
        trace!(
            declared = length,
            available = data.len(),
            "ignoring bytes past the GLB length"
        );
    }
    let data = &data[..length];

    let mut offset = HEADER_SIZE;
    let mut json: Option<&[u8]> = None;
    let mut bin: Option<&[u8]> = None;

    while offset < length {
        if offset + CHUNK_HEADER_SIZE > length {
            return Err(GltfError::format_at("chunk header truncated", offset));
        }
        let chunk_length = read_u32(data, offset) as usize;
        let chunk_type = read_u32(data, offset + 4);
        if chunk_length % 4 != 0 {
            return Err(GltfError::format_at(
                format!("chunk length {} is not a multiple of 4", chunk_length),
                offset,
            ));
        }

        let start = offset + CHUNK_HEADER_SIZE;
        let end = start
            .checked_add(chunk_length)
            .filter(|&end| end <= length)
            .ok_or_else(|| GltfError::format_at("chunk extends past the end of the GLB", offset))?;
        let content = &data[start..end];

        match (chunk_type, json.is_some()) {
            (CHUNK_JSON, false) => json = Some(content),
            (CHUNK_JSON, true) => {
                return Err(GltfError::format_at("GLB has more than one JSON chunk", offset));
            }
            (_, false) => {
                return Err(GltfError::format_at("first GLB chunk must be JSON", offset));
            }
            (CHUNK_BIN, true) => {
                if bin.is_some() {
                    return Err(GltfError::format_at("GLB has more than one BIN chunk", offset));
                }
                bin = Some(content);
            }
            (other, true) => {
                warn!(
                    chunk_type = format_args!("0x{:08X}", other),
                    length = chunk_length,
                    "skipping unknown GLB chunk"
                );
            }
        }
        trace!(chunk_type, offset, length = chunk_length, "read GLB chunk");
        offset = end;
    }

    let json = json.ok_or_else(|| GltfError::format_at("GLB has no JSON chunk", HEADER_SIZE))?;
    Ok(GlbChunks { json, bin })
}

/// Frame JSON text and an optional binary payload as a GLB container.
///
/// JSON is padded with spaces and BIN with zeros to 4-byte chunk lengths.
/// An empty payload produces no BIN chunk.
pub fn write_glb(json: &[u8], bin: Option<&[u8]>) -> Result<Vec<u8>> {
    let padded_json_len = align4(json.len());
    let bin = bin.filter(|b| !b.is_empty());
    let padded_bin_len = bin.map(|b| align4(b.len())).unwrap_or(0);

    let total_size = HEADER_SIZE
        + CHUNK_HEADER_SIZE
        + padded_json_len
        + bin.map(|_| CHUNK_HEADER_SIZE + padded_bin_len).unwrap_or(0);
    let total_u32 = u32::try_from(total_size)
        .map_err(|_| GltfError::format(format!("GLB of {} bytes exceeds 4 GiB", total_size)))?;

    let mut output = Vec::with_capacity(total_size);

    output.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    output.extend_from_slice(&GLB_VERSION.to_le_bytes());
    output.extend_from_slice(&total_u32.to_le_bytes());

    output.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
    output.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    output.extend_from_slice(json);
    output.resize(output.len() + padded_json_len - json.len(), 0x20);

    if let Some(bin) = bin {
        output.extend_from_slice(&(padded_bin_len as u32).to_le_bytes());
        output.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        output.extend_from_slice(bin);
        output.resize(output.len() + padded_bin_len - bin.len(), 0);
    }

    debug_assert_eq!(output.len(), total_size);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk(chunk_type: u32, content: &[u8]) -> Vec<u8> {
        let mut out = (content.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&chunk_type.to_le_bytes());
        out.extend_from_slice(content);
        out
    }

    fn container(version: u32, chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = GLB_MAGIC.to_le_bytes().to_vec();
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&((HEADER_SIZE + body.len()) as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn test_write_then_read() {
        let json = br#"{"asset":{"version":"2.0"}}"#;
        let bin = [1u8, 2, 3, 4, 5];
        let glb = write_glb(json, Some(&bin)).unwrap();

        assert_eq!(glb.len() % 4, 0);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());

        let chunks = read_glb(&glb).unwrap();
        assert_eq!(&chunks.json[..json.len()], json);
        assert!(chunks.json[json.len()..].iter().all(|&b| b == 0x20));
        let read_bin = chunks.bin.unwrap();
        assert_eq!(&read_bin[..5], &bin);
        assert_eq!(&read_bin[5..], &[0, 0, 0]);
    }

    #[test]
    fn test_empty_bin_is_omitted() {
        let glb = write_glb(b"{}  ", Some(&[])).unwrap();
        assert_eq!(glb.len(), HEADER_SIZE + CHUNK_HEADER_SIZE + 4);
        assert_eq!(read_glb(&glb).unwrap().bin, None);
    }

    #[test]
    fn test_rejects_wrong_version() {
        let glb = container(1, &[chunk(CHUNK_JSON, b"{}  ")]);
        let err = read_glb(&glb).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("version 1"));
    }

    #[test]
    fn test_rejects_second_bin_chunk() {
        let glb = container(
            2,
            &[
                chunk(CHUNK_JSON, b"{}  "),
                chunk(CHUNK_BIN, &[0; 4]),
                chunk(CHUNK_BIN, &[0; 4]),
            ],
        );
        assert!(read_glb(&glb).unwrap_err().to_string().contains("more than one BIN"));
    }

    #[test]
    fn test_rejects_json_not_first() {
        let glb = container(2, &[chunk(CHUNK_BIN, &[0; 4]), chunk(CHUNK_JSON, b"{}  ")]);
        assert!(read_glb(&glb).unwrap_err().to_string().contains("must be JSON"));
    }

    #[test]
    fn test_rejects_unaligned_chunk() {
        let glb = container(2, &[chunk(CHUNK_JSON, b"{} ")]);
        assert!(read_glb(&glb).unwrap_err().is_format());
    }

    #[test]
    fn test_skips_unknown_chunk_and_trailing_bytes() {
        let mut glb = container(
            2,
            &[
                chunk(CHUNK_JSON, b"{}  "),
                chunk(0x5458_4554, &[9; 8]),
                chunk(CHUNK_BIN, &[7; 4]),
            ],
        );
        glb.extend_from_slice(&[0xAA; 16]);
        let chunks = read_glb(&glb).unwrap();
        assert_eq!(chunks.json, b"{}  ");
        assert_eq!(chunks.bin, Some(&[7u8; 4][..]));
    }

    #[test]
    fn test_rejects_truncated_container() {
        let glb = write_glb(b"{}  ", Some(&[1, 2, 3, 4])).unwrap();
        let err = read_glb(&glb[..glb.len() - 2]).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_is_binary_container_restores_position() {
        let glb = write_glb(b"{}  ", None).unwrap();
        let mut cursor = Cursor::new(glb);
        assert!(is_binary_container(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);

        let mut json = Cursor::new(br#"{"asset":{}}"#.to_vec());
        assert!(!is_binary_container(&mut json).unwrap());
        assert_eq!(json.position(), 0);
    }

    #[test]
    fn test_is_binary_container_truncation() {
        let mut short = Cursor::new(vec![b'g', b'l']);
        assert!(is_binary_container(&mut short).unwrap_err().is_format());
        assert_eq!(short.position(), 0);

        let mut partial = Cursor::new(b"glTF\x02\x00".to_vec());
        let err = is_binary_container(&mut partial).unwrap_err();
        assert!(err.to_string().contains("header truncated"));
        assert_eq!(partial.position(), 0);
    }
}
