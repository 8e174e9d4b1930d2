//! Live-reload behavior of watched configuration files.

#![cfg(feature = "watch")]

use std::time::{Duration, Instant};

use confit::{Context, Parameter, Registry, Value};

#[test]
fn rewriting_a_watched_file_updates_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = camino::Utf8PathBuf::try_from(dir.path().join("app.ini")).unwrap();
    std::fs::write(&path, "[default]\nport = 8080\n").unwrap();

    let mut registry = Registry::with_context(Context::new("testprog", [] as [&str; 0]));
    registry.register(Parameter::new(["--port"])).unwrap();
    registry.add_configuration_file(path.clone());
    registry.parse();
    assert_eq!(registry.resolve("port").unwrap(), Value::Str("8080".into()));

    let _watch = registry.watch_configuration_files().unwrap();
    // Give the watcher thread a moment to arm before mutating the file.
    std::thread::sleep(Duration::from_millis(250));
    std::fs::write(&path, "[default]\nport = 9090\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if registry.resolve("port").unwrap() == Value::Str("9090".into()) {
            break;
        }
        assert!(
            Instant::now() < deadline,
            "file change was never picked up by the watcher"
        );
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn dropping_the_watch_stops_reloading() {
    let dir = tempfile::tempdir().unwrap();
    let path = camino::Utf8PathBuf::try_from(dir.path().join("app.ini")).unwrap();
    std::fs::write(&path, "[default]\nport = 8080\n").unwrap();

    let mut registry = Registry::with_context(Context::new("testprog", [] as [&str; 0]));
    registry.register(Parameter::new(["--port"])).unwrap();
    registry.add_configuration_file(path.clone());
    registry.parse();

    let watch = registry.watch_configuration_files().unwrap();
    drop(watch);
    std::fs::write(&path, "[default]\nport = 9090\n").unwrap();
    std::thread::sleep(Duration::from_millis(250));
    // No watcher is alive, so only an explicit re-read sees the change.
    assert_eq!(registry.resolve("port").unwrap(), Value::Str("8080".into()));
    registry.read_configuration_files();
    assert_eq!(registry.resolve("port").unwrap(), Value::Str("9090".into()));
}
