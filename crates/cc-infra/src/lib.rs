//! # cc-infra
//!
//! Adapters implementing the `cc-core` ports: the age stream cipher,
//! filesystem stores, the free-space lookup and the container reader.

pub mod crypto;
pub mod fs;
pub mod reader;
pub mod storage;
pub mod time;

pub use crypto::AgeStreamCipher;
pub use fs::{FileCounterStore, FileRecipientStore, FsOutputStore};
pub use reader::{ContainerContent, ContainerReader, OpenedContainer, ReadError};
pub use storage::SysinfoStorageSpace;
pub use time::SystemClock;
