//! Encrypted metadata header.
//!
//! First bytes inside the encrypted stream:
//!
//! ```text
//! file_type u8 | offset_to_data u32 LE (= 5 + json length) | metadata JSON
//! ```
//!
//! `offset_to_data` lets a reader skip the JSON without parsing it.

use std::io::Read;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use super::{read_exact_or_truncated, FormatError};
use crate::recording::{AudioInfo, VideoInfo};

/// file_type + offset_to_data
pub const METADATA_PREFIX_LEN: usize = 1 + 4;

/// Largest metadata blob whose offset still fits in a `u32`.
pub const MAX_METADATA_LEN: usize = u32::MAX as usize - METADATA_PREFIX_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Video,
    Image,
}

impl FileType {
    pub fn as_u8(self) -> u8 {
        match self {
            FileType::Video => 1,
            FileType::Image => 2,
        }
    }
}

impl TryFrom<u8> for FileType {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FileType::Video),
            2 => Ok(FileType::Image),
            other => Err(FormatError::UnknownFileType(other)),
        }
    }
}

/// Decoded metadata header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataHeader {
    pub file_type: FileType,
    pub offset_to_data: u32,
    pub metadata_json: Vec<u8>,
}

/// Encode the metadata header. The offset is computed from the JSON length.
pub fn encode_metadata_header(
    file_type: FileType,
    metadata_json: &[u8],
) -> Result<Vec<u8>, FormatError> {
    if metadata_json.len() > MAX_METADATA_LEN {
        return Err(FormatError::MetadataTooLarge {
            len: metadata_json.len(),
        });
    }
    let offset_to_data = (METADATA_PREFIX_LEN + metadata_json.len()) as u32;

    let mut buf = Vec::with_capacity(METADATA_PREFIX_LEN + metadata_json.len());
    buf.put_u8(file_type.as_u8());
    buf.put_u32_le(offset_to_data);
    buf.put_slice(metadata_json);
    Ok(buf)
}

/// Decode a metadata header from the start of `bytes`, returning the header
/// and the slice that follows it.
pub fn decode_metadata_header(bytes: &[u8]) -> Result<(MetadataHeader, &[u8]), FormatError> {
    let mut cursor = bytes;
    let header = read_metadata_header(&mut cursor)?;
    Ok((header, cursor))
}

/// Read a metadata header from a decrypted stream.
pub fn read_metadata_header<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<MetadataHeader, FormatError> {
    let mut prefix = [0u8; METADATA_PREFIX_LEN];
    read_exact_or_truncated(reader, &mut prefix, "metadata header")?;

    let file_type = FileType::try_from(prefix[0])?;
    let offset_to_data = u32::from_le_bytes([prefix[1], prefix[2], prefix[3], prefix[4]]);
    let json_len = (offset_to_data as usize)
        .checked_sub(METADATA_PREFIX_LEN)
        .ok_or(FormatError::InvalidOffset(offset_to_data))?;

    let mut metadata_json = Vec::new();
    let read = reader
        .take(json_len as u64)
        .read_to_end(&mut metadata_json)?;
    if read != json_len {
        return Err(FormatError::Truncated {
            what: "metadata json",
        });
    }

    Ok(MetadataHeader {
        file_type,
        offset_to_data,
        metadata_json,
    })
}

/// JSON metadata of a video container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub timestamp: String,
    pub width: u32,
    pub height: u32,
    pub rotation: u16,
    pub video_bitrate: u32,
    pub audio_sample_rate: u32,
    pub audio_channel_count: u16,
    pub audio_bitrate: u32,
    pub codec: String,
}

impl VideoMetadata {
    pub fn new(timestamp: String, video: &VideoInfo, audio: &AudioInfo) -> Self {
        Self {
            timestamp,
            width: video.width,
            height: video.height,
            rotation: video.rotation.degrees(),
            video_bitrate: video.bitrate,
            audio_sample_rate: audio.sample_rate,
            audio_channel_count: audio.channel_count,
            audio_bitrate: audio.bitrate,
            codec: video.codec.clone(),
        }
    }
}

/// JSON metadata of an image container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub timestamp: String,
    pub format: String,
}

impl ImageMetadata {
    pub fn jpg(timestamp: String) -> Self {
        Self {
            timestamp,
            format: "jpg".to_string(),
        }
    }
}

/// Metadata for either container kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerMetadata {
    Video(VideoMetadata),
    Image(ImageMetadata),
}

impl ContainerMetadata {
    pub fn file_type(&self) -> FileType {
        match self {
            ContainerMetadata::Video(_) => FileType::Video,
            ContainerMetadata::Image(_) => FileType::Image,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            ContainerMetadata::Video(m) => serde_json::to_vec(m),
            ContainerMetadata::Image(m) => serde_json::to_vec(m),
        }
    }

    /// Full metadata header (prefix + JSON) ready to be encrypted.
    pub fn encode_header(&self) -> anyhow::Result<Vec<u8>> {
        let json = self.to_json()?;
        Ok(encode_metadata_header(self.file_type(), &json)?)
    }
}
