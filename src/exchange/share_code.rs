// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Single-song share codes: `OC6:<base64url json>` or `OC6GZ:<base64url gzip json>`.

use std::io::{self, Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use tracing::debug;

use super::bundle::Bundle;
use crate::error::ShareCodeError;
use crate::store::migrate::VersionedSongs;
use crate::store::{Catalogue, CatalogueEntry, CURRENT_VERSION};

/// Prefix of uncompressed codes
pub const PLAIN_PREFIX: &str = "OC6";
/// Prefix of gzip-compressed codes
pub const GZIP_PREFIX: &str = "OC6GZ";
/// Shortest payload accepted as a complete code
pub const MIN_PAYLOAD_LEN: usize = 16;

/// Encode one song as a share code
pub fn encode_share_code(name: &str, entry: &CatalogueEntry, compress: bool) -> io::Result<String> {
    let mut songs = Catalogue::new();
    songs.insert(name.to_string(), entry.clone());
    let bundle = Bundle {
        version: CURRENT_VERSION,
        songs,
    };
    let json = serde_json::to_vec(&bundle)?;
    if !compress {
        return Ok(format!("{}:{}", PLAIN_PREFIX, URL_SAFE_NO_PAD.encode(json)));
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let gz = encoder.finish()?;
    Ok(format!("{}:{}", GZIP_PREFIX, URL_SAFE_NO_PAD.encode(gz)))
}

fn gunzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

fn reject(err: ShareCodeError) -> ShareCodeError {
    debug!("share code rejected: {}", err);
    err
}

/// Split a code into its compression flag and cleaned payload
fn split_code(code: &str) -> Result<(bool, String), ShareCodeError> {
    let raw = code.trim();
    if raw.is_empty() {
        return Err(ShareCodeError::Empty);
    }
    let (compressed, rest) = if let Some(rest) = raw.strip_prefix("OC6GZ:") {
        (true, rest)
    } else if let Some(rest) = raw.strip_prefix("OC6:") {
        (false, rest)
    } else {
        return Err(ShareCodeError::UnknownPrefix);
    };
    let payload: String = rest
        .split(':')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let payload = payload.trim_end_matches('=').to_string();
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(ShareCodeError::Incomplete);
    }
    if !payload
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ShareCodeError::InvalidCharacters);
    }
    Ok((compressed, payload))
}

fn check_bundle(bytes: &[u8]) -> Result<VersionedSongs, ShareCodeError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| ShareCodeError::InvalidJson)?;
    let version = value.get("version");
    let songs = value.get("songs").and_then(Value::as_object);
    let (Some(version), Some(songs)) = (version, songs) else {
        return Err(ShareCodeError::NotCurrentBundle {
            found: version.map(Value::to_string).unwrap_or_else(|| "none".to_string()),
        });
    };
    if version.as_u64() != Some(u64::from(CURRENT_VERSION)) {
        return Err(ShareCodeError::NotCurrentBundle {
            found: version.to_string(),
        });
    }
    if songs.len() != 1 {
        return Err(ShareCodeError::SongCount { found: songs.len() });
    }
    Ok(VersionedSongs {
        declared: Some(CURRENT_VERSION),
        songs: songs.clone(),
    })
}

/// Decode a share code into a one-song bundle. Decompression runs on the
/// blocking pool.
pub async fn decode_share_code(code: &str) -> Result<VersionedSongs, ShareCodeError> {
    let (compressed, payload) = split_code(code).map_err(reject)?;
    let mut bytes = URL_SAFE_NO_PAD
        .decode(payload.as_bytes())
        .map_err(|_| reject(ShareCodeError::InvalidEncoding))?;
    if compressed {
        bytes = tokio::task::spawn_blocking(move || gunzip(&bytes))
            .await
            .map_err(|_| reject(ShareCodeError::InvalidCompressedData))?
            .map_err(|_| reject(ShareCodeError::InvalidCompressedData))?;
    }
    check_bundle(&bytes).map_err(reject)
}
