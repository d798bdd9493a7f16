use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn slicemarker_cmd() -> Command {
    Command::cargo_bin("slicemarker").expect("binary exists")
}

#[test]
fn help_prints_about() {
    slicemarker_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Multi-tool annotation engine for volumetric scan slices",
        ));
}

#[test]
fn no_args_prints_usage() {
    slicemarker_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--replay"));
}

#[test]
fn out_requires_replay_flag() {
    slicemarker_cmd()
        .args(["--out", "/tmp/nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "required arguments were not provided",
        ));
}

#[test]
fn init_config_writes_and_refuses_overwrite() {
    let temp = TempDir::new().unwrap();

    slicemarker_cmd()
        .env("XDG_CONFIG_HOME", temp.path())
        .arg("--init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created default config"));

    let config_path = temp.path().join("slicemarker").join("config.toml");
    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("[tools]"));
    assert!(contents.contains("default_tool"));

    // A second run must not clobber the existing file.
    slicemarker_cmd()
        .env("XDG_CONFIG_HOME", temp.path())
        .arg("--init-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn replay_exports_wire_selections() {
    let temp = TempDir::new().unwrap();
    let script_path = temp.path().join("script.json");
    let out_dir = temp.path().join("out");

    std::fs::write(
        &script_path,
        r#"{
            "slices": 6,
            "events": [
                { "event": "set_tool", "tool": "rectangle" },
                { "event": "pointer_down", "x": 10.0, "y": 10.0 },
                { "event": "pointer_move", "x": 60.0, "y": 40.0 },
                { "event": "pointer_up", "x": 60.0, "y": 40.0 },
                { "event": "settle" }
            ]
        }"#,
    )
    .unwrap();

    slicemarker_cmd()
        .env("XDG_CONFIG_HOME", temp.path())
        .args(["--replay"])
        .arg(&script_path)
        .args(["--out"])
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 selections live"));

    let json = std::fs::read_to_string(out_dir.join("selections.json")).unwrap();
    assert!(json.contains("\"rectangle\""));
    assert!(out_dir.join("render.png").exists());
}
