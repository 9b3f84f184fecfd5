//! Config file -> wiring -> recipients -> recording -> decryption.

use std::io::Write;

use age::x25519;
use cryptocam::bootstrap::{load_config, wire_recorder_in};
use cryptocam::FinalizationOutcome;
use cc_core::ports::IncompleteKind;
use cc_infra::{ContainerContent, ContainerReader};
use tempfile::TempDir;

fn write_config(root: &TempDir) -> std::path::PathBuf {
    let out_dir = root.path().join("DCIM");
    std::fs::create_dir_all(&out_dir).unwrap();
    let config_path = root.path().join("cryptocam.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"
[output]
directory = "{}"
filename_pattern = "photo-$$num"
"#,
        out_dir.display()
    )
    .unwrap();
    config_path
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn imported_key_can_decrypt_recorded_image() {
    let root = TempDir::new().unwrap();
    let config = load_config(write_config(&root)).unwrap();
    let recorder = wire_recorder_in(config, &root.path().join("data")).unwrap();

    let identity = x25519::Identity::generate();
    recorder
        .recipients
        .import("desktop", &identity.to_public().to_string())
        .await
        .unwrap();
    let selected = recorder.recipients.list_selected().await.unwrap();
    assert_eq!(selected.len(), 1);

    let handle = recorder.writer.start_image(selected).await.unwrap();
    assert_eq!(handle.file_name(), "photo-0001.age");
    handle.write_image(b"\xFF\xD8jpeg bytes\xFF\xD9".to_vec());
    let result = recorder.writer.stop().await.unwrap();

    assert_eq!(result.outcome, FinalizationOutcome::Success);
    assert!(ContainerReader::is_addressed_to(&result.path, &identity).unwrap());
    let opened = ContainerReader::open_path(&result.path, &identity).unwrap();
    let ContainerContent::Image { payload, metadata } = opened.content else {
        panic!("expected an image container");
    };
    assert_eq!(metadata.format, "jpg");
    assert_eq!(payload, b"\xFF\xD8jpeg bytes\xFF\xD9");

    let stranger = x25519::Identity::generate();
    assert!(!ContainerReader::is_addressed_to(&result.path, &stranger).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn leftover_busy_file_shows_up_in_scan() {
    let root = TempDir::new().unwrap();
    let config = load_config(write_config(&root)).unwrap();
    let out_dir = config.output_dir.clone().unwrap();
    let recorder = wire_recorder_in(config, &root.path().join("data")).unwrap();

    std::fs::write(out_dir.join("busy_photo-0007.age"), b"partial").unwrap();
    std::fs::write(out_dir.join("photo-0006.age"), b"complete").unwrap();

    let found = recorder.incomplete.execute(&out_dir).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, IncompleteKind::Busy);
    assert_eq!(found[0].intended_name, "photo-0007.age");
    assert_eq!(found[0].size_bytes, 7);
}
