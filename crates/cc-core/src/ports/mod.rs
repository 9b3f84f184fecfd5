//! Port interfaces for the application layer
//!
//! Ports define the contract between the recording use cases and the
//! infrastructure that performs encryption, file I/O and persistence.
//! The core never touches the filesystem or a cipher directly.

mod cipher;
mod clock;
mod counter;
mod encoder;
mod key_validator;
mod output_store;
mod recipient_store;
mod storage_space;

pub use cipher::{CipherError, CipherStream, RawSink, StreamCipherPort};
pub use clock::*;
pub use counter::FileCounterPort;
pub use encoder::{EncoderControlPort, EncoderEvents};
pub use key_validator::PublicKeyValidatorPort;
pub use output_store::{
    IncompleteKind, IncompleteRecording, OutputFile, OutputStorePort, StorageError,
    BUSY_PREFIX, CORRUPTED_PREFIX,
};
pub use recipient_store::{RecipientStoreError, RecipientStorePort};
pub use storage_space::StorageSpacePort;
