pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::load_config;
pub use wiring::{default_data_dir, wire_recorder, wire_recorder_in, Recorder, WiringError};
