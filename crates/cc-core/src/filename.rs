//! Output file naming.
//!
//! Tokens: `$year $month $day $hour $min $sec $uuid $$num`. Date parts are
//! zero-padded to two digits, `$$num` to four.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_FILENAME_PATTERN: &str = "cryptocam-$$num.age";
pub const FILE_EXTENSION: &str = ".age";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilenamePattern(String);

impl Default for FilenamePattern {
    fn default() -> Self {
        Self(DEFAULT_FILENAME_PATTERN.to_string())
    }
}

impl FilenamePattern {
    /// Blank patterns fall back to the default.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            Self::default()
        } else {
            Self(pattern)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render a file name for the given local time and counter value.
    pub fn render(&self, now: NaiveDateTime, counter: u64, uuid: Uuid) -> String {
        // `$$num` goes last so no other token can consume its `$`.
        let name = self
            .0
            .replace("$year", &now.year().to_string())
            .replace("$month", &format!("{:02}", now.month()))
            .replace("$day", &format!("{:02}", now.day()))
            .replace("$hour", &format!("{:02}", now.hour()))
            .replace("$min", &format!("{:02}", now.minute()))
            .replace("$sec", &format!("{:02}", now.second()))
            .replace("$uuid", &uuid.to_string())
            .replace("$$num", &format!("{counter:04}"));

        let name = name.replace(['/', '\\'], "_");
        if name.ends_with(FILE_EXTENSION) {
            name
        } else {
            format!("{name}{FILE_EXTENSION}")
        }
    }
}
