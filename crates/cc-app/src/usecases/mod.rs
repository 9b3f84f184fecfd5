//! Use cases around the recorder.
//!
//! 录制本身由 [`crate::recording`] 负责；这里只放密钥管理与文件扫描。

pub mod manage_recipients;
pub mod scan_incomplete;

pub use manage_recipients::{ManageRecipients, RecipientError};
pub use scan_incomplete::ScanIncompleteRecordings;
