use keepsake_logger::{LogSettings, Logger, LoggerError};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn log_files(dir: &std::path::Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn settings_route_events_to_json_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path().join("nested").join("logs");
    let settings = LogSettings { path: Some(dir.clone()), json: true, ..LogSettings::default() };

    let logger = Logger::builder().name("keepsake-file").console(false).settings(&settings)?.init()?;
    assert!(logger.writes_files());

    tracing::info!(session = "abc", bytes = 64, "Session data written");

    std::thread::sleep(Duration::from_millis(50));
    drop(logger);

    let files = log_files(&dir);
    assert_eq!(files.len(), 1, "one file per rotation period");

    let contents = fs::read_to_string(&files[0])?;
    let line = contents.lines().next().expect("one event should be written");
    assert!(line.starts_with('{'), "expected a JSON line, got {line}");
    assert!(line.contains("Session data written"));

    Ok(())
}

#[test]
fn no_output_is_a_configuration_error() {
    let err = Logger::builder().name("keepsake-silent").console(false).init().unwrap_err();
    assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
}
