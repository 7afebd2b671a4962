// Binary-level tests for grafctl against a mocked Grafana API

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

struct Workspace {
    config_dir: TempDir,
    cwd: TempDir,
}

impl Workspace {
    fn empty() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            cwd: TempDir::new().unwrap(),
        }
    }

    fn with_profile(url: &str) -> Self {
        let ws = Self::empty();
        let yaml = format!(
            "active: test\nprofiles:\n  test:\n    name: test\n    url: {url}\n    user: admin\n    pass: s3cret\n"
        );
        fs::write(ws.config_dir.path().join("config.yaml"), yaml).unwrap();
        ws
    }

    fn grafctl(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("grafctl");
        cmd.current_dir(self.cwd.path())
            .env("GRAFCTL_CONFIG_DIR", self.config_dir.path())
            .env_remove("GRAFCTL_PROFILE")
            .env_remove("GRAFCTL_ORG")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn mock_catalog(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/api/datasources");
        then.status(200).json_body(json!([
            {"id": 1, "uid": "uid-123", "name": "Prom", "type": "prometheus"},
            {"id": 2, "uid": "p2", "name": "Prom Backup", "type": "prometheus"}
        ]));
    });
}

#[test]
fn help_lists_resource_commands() {
    let ws = Workspace::empty();
    ws.grafctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dash"))
        .stdout(predicate::str::contains("ds"))
        .stdout(predicate::str::contains("org"))
        .stdout(predicate::str::contains("--profile"));
}

#[test]
fn missing_profile_exits_with_config_code() {
    let ws = Workspace::empty();
    ws.grafctl()
        .args(["dash", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no active profile set"));
}

#[test]
fn config_add_then_list_masks_password() {
    let ws = Workspace::empty();
    ws.grafctl()
        .args([
            "config", "add", "--name", "prod", "--url", "http://grafana:3000", "--user",
            "admin", "--pass", "hunter2", "--use",
        ])
        .assert()
        .success();

    ws.grafctl()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prod"))
        .stdout(predicate::str::contains("http://grafana:3000"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn dash_list_renders_a_table() {
    let server = MockServer::start();
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/api/search")
            .query_param("type", "dash-db");
        then.status(200).json_body(json!([
            {"uid": "abc", "title": "Overview", "tags": ["prod"], "type": "dash-db"}
        ]));
    });
    let ws = Workspace::with_profile(&server.base_url());

    ws.grafctl()
        .args(["dash", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overview"))
        .stdout(predicate::str::contains("General"));
    search.assert();
}

#[test]
fn dash_read_external_emits_portable_template() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/dashboards/uid/d1");
        then.status(200).json_body(json!({
            "dashboard": {"id": 3, "uid": "d1", "version": 2, "title": "T",
                          "panels": [{"datasource": "uid-123"}]},
            "meta": {"folderUid": "f1"}
        }));
    });
    mock_catalog(&server);
    let ws = Workspace::with_profile(&server.base_url());

    ws.grafctl()
        .args(["dash", "read", "d1", "--external"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""datasource": "${DS_PROM}""#))
        .stdout(predicate::str::contains(r#""pluginId": "prometheus""#))
        .stdout(predicate::str::contains("uid-123").not());
}

#[test]
fn dash_create_maps_template_inputs_from_stdin() {
    let server = MockServer::start();
    mock_catalog(&server);
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/dashboards/db")
            .body_contains(r#""datasource":"p2""#)
            .body_contains(r#""overwrite":false"#);
        then.status(200)
            .json_body(json!({"status": "success", "uid": "new-uid", "version": 1}));
    });
    let ws = Workspace::with_profile(&server.base_url());
    let template = ws.cwd.path().join("template.json");
    fs::write(
        &template,
        json!({
            "__inputs": [{"name": "DS_PROM", "label": "Prom", "type": "datasource", "pluginId": "prometheus"}],
            "__requires": [{"type": "grafana", "id": "grafana", "name": "Grafana", "version": "1.0.0"}],
            "title": "Imported",
            "panels": [{"datasource": "${DS_PROM}"}]
        })
        .to_string(),
    )
    .unwrap();

    ws.grafctl()
        .args(["dash", "create", "--file"])
        .arg(&template)
        .write_stdin("7\n2\nn\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid selection. Please try again."))
        .stdout(predicate::str::contains("[2] Prom Backup (UID: p2)"))
        .stdout(predicate::str::contains("Dashboard created successfully."));
    create.assert();
}

#[test]
fn dash_create_without_candidates_fails_before_posting() {
    let server = MockServer::start();
    mock_catalog(&server);
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/dashboards/db");
        then.status(200);
    });
    let ws = Workspace::with_profile(&server.base_url());
    let template = ws.cwd.path().join("tempo.json");
    fs::write(
        &template,
        r#"{"__inputs": [{"name": "DS_TEMPO", "type": "datasource", "pluginId": "tempo"}], "title": "Traces"}"#,
    )
    .unwrap();

    ws.grafctl()
        .args(["dash", "create", "--file"])
        .arg(&template)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("no datasources found for type tempo"));
    create.assert_hits(0);
}

#[test]
fn request_reports_server_errors_with_exit_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/missing");
        then.status(404).json_body(json!({"message": "Not found"}));
    });
    let ws = Workspace::with_profile(&server.base_url());

    ws.grafctl()
        .args(["request", "get", "/api/missing"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("Not found"));
}

#[test]
fn org_header_follows_the_override_flag() {
    let server = MockServer::start();
    let scoped = server.mock(|when, then| {
        when.method(GET)
            .path("/api/datasources")
            .header("X-Grafana-Org-Id", "5");
        then.status(200).json_body(json!([]));
    });
    let ws = Workspace::with_profile(&server.base_url());

    ws.grafctl()
        .args(["--org", "5", "ds", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No resources found."));
    scoped.assert();
}

#[test]
fn completion_prints_bash_script() {
    let ws = Workspace::empty();
    ws.grafctl()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_grafctl"));
}
