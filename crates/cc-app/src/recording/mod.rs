//! Recording orchestration.
//!
//! [`RecordingSessionWriter`] owns the session lifecycle. Producers talk to a
//! running session through [`SessionHandle`]; one writer thread per session
//! owns the encrypted stream.

mod encrypted_output;
mod error;
mod guard;
mod handle;
mod session;
mod status_cell;
mod worker;
mod writer;

pub use encrypted_output::EncryptedOutput;
pub use error::StartError;
pub use guard::StorageGuard;
pub use handle::SessionHandle;
pub use session::SessionKind;
pub use status_cell::StatusCell;
pub use writer::{
    effective_queue_capacity, RecordingDeps, RecordingSessionWriter, StartRequest,
    DEFAULT_QUEUE_CAPACITY, MAX_QUEUE_CAPACITY,
};
