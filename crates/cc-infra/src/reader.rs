//! Container reader.
//!
//! Reads the plaintext discovery header, checks whether an identity is listed
//! as a recipient, then decrypts and decodes the rest. Used to verify
//! recordings and by companion tooling.

use std::fs::File;
use std::io::{BufReader, Read};
use std::iter;
use std::path::Path;

use age::x25519;
use cc_core::container::{
    read_discovery_header, read_metadata_header, DiscoveryHeader, FileType, Frame, FormatError,
    FrameStream, ImageMetadata, MetadataHeader, VideoMetadata,
};
use cc_core::recipient::KeyFingerprint;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("identity is not a recipient of this file")]
    NotARecipient,

    #[error("decryption failed: {0}")]
    Decrypt(#[from] age::DecryptError),

    #[error("file is not encrypted to X25519 recipients")]
    UnsupportedEnvelope,

    #[error("invalid metadata json: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerContent {
    Video {
        metadata: VideoMetadata,
        frames: Vec<Frame>,
    },
    Image {
        metadata: ImageMetadata,
        payload: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedContainer {
    pub discovery: DiscoveryHeader,
    pub metadata_header: MetadataHeader,
    pub content: ContainerContent,
}

pub struct ContainerReader;

impl ContainerReader {
    /// Fingerprint under which `identity` appears in discovery headers.
    pub fn fingerprint_of(identity: &x25519::Identity) -> KeyFingerprint {
        KeyFingerprint::from_public_key(&identity.to_public().to_string())
    }

    /// Read only the plaintext discovery header of a file.
    pub fn read_discovery(path: &Path) -> Result<DiscoveryHeader, ReadError> {
        let mut reader = BufReader::new(File::open(path)?);
        Ok(read_discovery_header(&mut reader)?)
    }

    /// Cheap check, without key agreement, that `identity` may decrypt `path`.
    pub fn is_addressed_to(path: &Path, identity: &x25519::Identity) -> Result<bool, ReadError> {
        Ok(Self::read_discovery(path)?.is_addressed_to(&Self::fingerprint_of(identity)))
    }

    pub fn open_path(path: &Path, identity: &x25519::Identity) -> Result<OpenedContainer, ReadError> {
        Self::open(BufReader::new(File::open(path)?), identity)
    }

    /// Decrypt and decode a whole container.
    pub fn open<R: Read>(
        mut reader: R,
        identity: &x25519::Identity,
    ) -> Result<OpenedContainer, ReadError> {
        let discovery = read_discovery_header(&mut reader)?;
        if !discovery.is_addressed_to(&Self::fingerprint_of(identity)) {
            return Err(ReadError::NotARecipient);
        }

        let decryptor = match age::Decryptor::new(reader)? {
            age::Decryptor::Recipients(d) => d,
            _ => return Err(ReadError::UnsupportedEnvelope),
        };
        let mut plaintext = decryptor.decrypt(iter::once(identity as &dyn age::Identity))?;

        let metadata_header = read_metadata_header(&mut plaintext)?;
        let content = match metadata_header.file_type {
            FileType::Video => {
                let metadata: VideoMetadata =
                    serde_json::from_slice(&metadata_header.metadata_json)?;
                let frames = FrameStream::new(plaintext).collect::<Result<Vec<_>, _>>()?;
                debug!(frames = frames.len(), "video container decoded");
                ContainerContent::Video { metadata, frames }
            }
            FileType::Image => {
                let metadata: ImageMetadata =
                    serde_json::from_slice(&metadata_header.metadata_json)?;
                let mut payload = Vec::new();
                plaintext.read_to_end(&mut payload)?;
                ContainerContent::Image { metadata, payload }
            }
        };

        Ok(OpenedContainer {
            discovery,
            metadata_header,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::container::{encode_discovery_header, encode_frame, ContainerMetadata, FrameType};
    use std::io::Write;

    fn build(identity: &x25519::Identity, metadata: &ContainerMetadata, body: &[u8]) -> Vec<u8> {
        let public = identity.to_public();
        let mut out =
            encode_discovery_header(&[KeyFingerprint::from_public_key(&public.to_string())])
                .unwrap();
        let encryptor =
            age::Encryptor::with_recipients(vec![Box::new(public) as Box<dyn age::Recipient + Send>])
                .unwrap();
        let mut w = encryptor.wrap_output(&mut out).unwrap();
        w.write_all(&metadata.encode_header().unwrap()).unwrap();
        w.write_all(body).unwrap();
        w.finish().unwrap();
        out
    }

    #[test]
    fn decodes_image_container() {
        let id = x25519::Identity::generate();
        let metadata = ContainerMetadata::Image(ImageMetadata::jpg("2024-01-01T00:00:00".into()));
        let bytes = build(&id, &metadata, b"\xFF\xD8jpeg");

        let opened = ContainerReader::open(&bytes[..], &id).unwrap();
        assert_eq!(opened.metadata_header.file_type, FileType::Image);
        match opened.content {
            ContainerContent::Image { metadata, payload } => {
                assert_eq!(metadata.format, "jpg");
                assert_eq!(payload, b"\xFF\xD8jpeg");
            }
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn decodes_video_frames() {
        let id = x25519::Identity::generate();
        let metadata = ContainerMetadata::Video(VideoMetadata {
            timestamp: "t".into(),
            width: 640,
            height: 480,
            rotation: 0,
            video_bitrate: 1,
            audio_sample_rate: 2,
            audio_channel_count: 1,
            audio_bitrate: 3,
            codec: "AVC".into(),
        });
        let mut body = encode_frame(FrameType::Video, 0, b"nal").unwrap();
        body.extend(encode_frame(FrameType::Audio, 21, b"aac").unwrap());
        let bytes = build(&id, &metadata, &body);

        let opened = ContainerReader::open(&bytes[..], &id).unwrap();
        let ContainerContent::Video { frames, metadata } = opened.content else {
            panic!("expected video");
        };
        assert_eq!(metadata.width, 640);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].frame_type, FrameType::Audio);
        assert_eq!(frames[1].pts_us, 21);
    }

    #[test]
    fn stranger_is_rejected_before_decryption() {
        let id = x25519::Identity::generate();
        let stranger = x25519::Identity::generate();
        let metadata = ContainerMetadata::Image(ImageMetadata::jpg("t".into()));
        let bytes = build(&id, &metadata, b"x");

        let err = ContainerReader::open(&bytes[..], &stranger).unwrap_err();
        assert!(matches!(err, ReadError::NotARecipient));
    }
}
