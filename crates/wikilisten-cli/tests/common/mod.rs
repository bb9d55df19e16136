#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use serde_json::{Value, json};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);
#[allow(dead_code)]
pub const API_PATH: &str = "/w/api.php";

fn config_dir() -> &'static TempDir {
    static CONFIG_DIR: OnceLock<TempDir> = OnceLock::new();
    CONFIG_DIR.get_or_init(|| tempfile::tempdir().expect("failed to create config dir for tests"))
}

/// A `wikilisten` command isolated from the user's config and environment.
#[allow(dead_code)]
pub fn wikilisten_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wikilisten"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("WIKILISTEN_API_URL");
    cmd.env_remove("WIKILISTEN_ASSET_BASE_URL");
    cmd.env_remove("WIKILISTEN_TEMPLATE");
    cmd.env(
        "WIKILISTEN_CONFIG",
        config_dir().path().join("missing-config.toml"),
    );
    cmd
}

/// A command pointed at a mock API server.
#[allow(dead_code)]
pub fn wikilisten_cmd_for(server: &MockServer) -> Command {
    let mut cmd = wikilisten_cmd();
    cmd.env("WIKILISTEN_API_URL", format!("{}{API_PATH}", server.uri()));
    cmd
}

/// Parse one JSON object per stdout line.
#[allow(dead_code)]
pub fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[allow(dead_code)]
pub fn listen_tree(files: &[&str]) -> String {
    let templates: String = files
        .iter()
        .map(|file| {
            format!(
                "<template><title>Listen</title>\
                 <part><name>filename</name><equals>=</equals><value>{file}</value></part>\
                 </template>"
            )
        })
        .collect();
    format!("<root>{templates}</root>")
}

#[allow(dead_code)]
pub async fn mount_parse_tree(server: &MockServer, title: &str, files: &[&str]) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("action", "parse"))
        .and(query_param("prop", "parsetree"))
        .and(query_param("page", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parse": {"title": title, "pageid": 1, "parsetree": listen_tree(files)}
        })))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn mount_links(server: &MockServer, title: &str, links: &[(&str, bool)]) {
    let links: Vec<Value> = links
        .iter()
        .map(|(link, exists)| json!({"ns": 0, "title": link, "exists": exists}))
        .collect();
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("action", "parse"))
        .and(query_param("prop", "links"))
        .and(query_param("page", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parse": {"title": title, "pageid": 1, "links": links}
        })))
        .mount(server)
        .await;
}
