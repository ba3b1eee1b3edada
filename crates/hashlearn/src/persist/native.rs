//! Binary snapshot format.
//!
//! A snapshot is a 16-byte header followed by a Postcard-encoded [`Payload`].
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("HLRN")
//! 4       1     Version major
//! 5       1     Version minor
//! 6       1     Algorithm tag
//! 7       1     Bits the snapshot was saved with
//! 8       4     Payload size (bytes, little-endian)
//! 12      4     CRC32 of the payload (little-endian)
//! ```
//!
//! `bits` in the header is informational. The loader decides the table width.

use serde::{Deserialize, Serialize};

use super::SnapshotError;
use super::schema::ModelSchema;
use crate::model::Algorithm;

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes identifying a snapshot.
pub const MAGIC: &[u8; 4] = b"HLRN";

pub const CURRENT_VERSION_MAJOR: u8 = 1;

pub const CURRENT_VERSION_MINOR: u8 = 0;

pub const HEADER_SIZE: usize = 16;

// =============================================================================
// Payload
// =============================================================================

/// Version-tagged payload. New format versions add variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    V1(PayloadV1),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    pub model: ModelSchema,
}

// =============================================================================
// Header
// =============================================================================

/// Stable one-byte tag for each algorithm.
pub fn algorithm_tag(algorithm: Algorithm) -> u8 {
    match algorithm {
        Algorithm::SgdVw => 0,
        Algorithm::Solo => 1,
        Algorithm::PerCoordinateSolo => 2,
        Algorithm::PerCoordinatePistol => 3,
        Algorithm::Kt => 4,
        Algorithm::PerCoordinateKt => 5,
        Algorithm::Cocob => 6,
        Algorithm::PerCoordinateCocob => 7,
        Algorithm::FactorizationMachine => 8,
    }
}

pub fn algorithm_from_tag(tag: u8) -> Option<Algorithm> {
    Algorithm::ALL.into_iter().find(|&a| algorithm_tag(a) == tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub algorithm: Algorithm,
    pub bits: u8,
    pub payload_size: u32,
    pub checksum: u32,
}

impl SnapshotHeader {
    pub fn new(algorithm: Algorithm, bits: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            algorithm,
            bits: bits.min(u8::MAX as u32) as u8,
            payload_size: 0,
            checksum: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = algorithm_tag(self.algorithm);
        buf[7] = self.bits;
        buf[8..12].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, SnapshotError> {
        if &buf[0..4] != MAGIC {
            return Err(SnapshotError::NotASnapshot);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(SnapshotError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        let algorithm = algorithm_from_tag(buf[6]).ok_or(SnapshotError::NotASnapshot)?;

        Ok(Self {
            version_major,
            version_minor,
            algorithm,
            bits: buf[7],
            payload_size: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            checksum: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }
}

// =============================================================================
// Encode / decode
// =============================================================================

/// Header plus encoded payload.
pub fn encode(schema: ModelSchema, algorithm: Algorithm, bits: u32) -> Result<Vec<u8>, SnapshotError> {
    let payload = postcard::to_allocvec(&Payload::V1(PayloadV1 { model: schema }))?;

    let mut header = SnapshotHeader::new(algorithm, bits);
    header.payload_size = payload.len() as u32;
    header.checksum = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Validate the header and checksum, then decode the payload.
pub fn decode(bytes: &[u8]) -> Result<(SnapshotHeader, ModelSchema), SnapshotError> {
    let header_bytes: &[u8; HEADER_SIZE] = bytes
        .get(..HEADER_SIZE)
        .and_then(|head| head.try_into().ok())
        .ok_or(SnapshotError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        })?;
    let header = SnapshotHeader::from_bytes(header_bytes)?;

    let body = &bytes[HEADER_SIZE..];
    let expected = header.payload_size as usize;
    if body.len() < expected {
        return Err(SnapshotError::Truncated {
            expected,
            actual: body.len(),
        });
    }
    let payload = &body[..expected];

    let actual = crc32fast::hash(payload);
    if actual != header.checksum {
        return Err(SnapshotError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    let decoded: Payload = postcard::from_bytes(payload)?;
    let Payload::V1(v1) = decoded;
    Ok((header, v1.model))
}
