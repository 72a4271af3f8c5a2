//! Detached validator hosts launched from a real binary.

#![cfg(unix)]

mod common;

use std::time::Duration;

use serde_json::json;

use roosevelt::config::schema::HtmlValidatorConfig;
use roosevelt::validator::lock::{is_held, lock_path};
use roosevelt::validator::{kill_detached, ValidatorHandle};

use common::project;

fn detached_config(host: &str) -> HtmlValidatorConfig {
    let mut config = HtmlValidatorConfig::default();
    config.command = vec!["sleep".into()];
    config.port = 30;
    config.separate_process.enable = true;
    config.separate_process.auto_killer = false;
    config.separate_process.host_command = vec![host.to_string()];
    config
}

async fn wait_until_released(root: &std::path::Path) {
    for _ in 0..100 {
        if !is_held(&lock_path(root)).unwrap() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("validator host never released its lock");
}

#[tokio::test]
async fn detached_host_takes_lock_and_stops_on_kill() {
    let host = env!("CARGO_BIN_EXE_roosevelt");
    let dir = project(json!({
        "name": "detached",
        "rooseveltConfig": {
            "port": 28_901,
            "htmlValidator": {
                "command": ["sleep"],
                "port": 30,
                "separateProcess": { "enable": true, "autoKiller": false, "hostCommand": [host] }
            }
        }
    }));
    let config = detached_config(host);

    let handle = ValidatorHandle::start(dir.path(), &config, 28_901).await.unwrap();

    let pid = match handle {
        ValidatorHandle::Detached(Some(pid)) => pid,
        other => panic!("expected a detached host with a pid, got {other:?}"),
    };
    assert!(is_held(&lock_path(dir.path())).unwrap());

    // A second start reuses the running host.
    let again = ValidatorHandle::start(dir.path(), &config, 28_901).await.unwrap();
    assert!(matches!(again, ValidatorHandle::Detached(Some(reused)) if reused == pid));

    assert_eq!(kill_detached(dir.path()).unwrap(), Some(pid));
    wait_until_released(dir.path()).await;
}

#[tokio::test]
async fn host_program_that_exits_is_reported() {
    let dir = project(json!({ "name": "broken-host", "rooseveltConfig": {} }));
    let config = detached_config("false");

    let err = ValidatorHandle::start(dir.path(), &config, 28_902).await.unwrap_err();

    assert!(err.to_string().contains("did not start"), "{err}");
    assert!(!is_held(&lock_path(dir.path())).unwrap());
}
