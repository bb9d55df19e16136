//! Shared fixtures for wiremock-backed tests.

#![allow(clippy::unwrap_used, dead_code)]

use crate::config::ApiConfig;
use crate::store::PageStore;
use crate::transport::ApiClient;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_PATH: &str = "/w/api.php";

pub fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        url: format!("{}{API_PATH}", server.uri()),
        timeout_secs: 5,
        max_retries: 0,
        retry_base_ms: 1,
        ..ApiConfig::default()
    }
}

pub fn client(server: &MockServer) -> ApiClient {
    ApiClient::from_config(&api_config(server)).unwrap()
}

pub fn store(server: &MockServer) -> PageStore {
    PageStore::new(client(server))
}

/// Parse tree with one `Listen` template per file name.
pub fn listen_tree(files: &[&str]) -> String {
    let templates: String = files
        .iter()
        .map(|file| {
            format!(
                "<template lineStart=\"1\"><title>Listen</title>\
                 <part><name>filename</name><equals>=</equals><value>{file}</value></part>\
                 <part><name>title</name><equals>=</equals><value>Sample</value></part>\
                 </template>"
            )
        })
        .collect();
    format!("<root>Article text.\n{templates}</root>")
}

pub fn parse_tree_body(title: &str, xml: &str) -> Value {
    json!({"parse": {"title": title, "pageid": 1, "parsetree": xml}})
}

/// Mount the `prop=parsetree` response for one title, expecting `calls` hits.
pub async fn mount_parse_tree(
    server: &MockServer,
    title: &str,
    xml: &str,
    delay: Duration,
    calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("action", "parse"))
        .and(query_param("prop", "parsetree"))
        .and(query_param("page", title))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(parse_tree_body(title, xml))
                .set_delay(delay),
        )
        .expect(calls)
        .mount(server)
        .await;
}

/// Mount the `prop=links` response for one title.
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
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"parse": {"title": title, "pageid": 1, "links": links}})),
        )
        .expect(1)
        .mount(server)
        .await;
}
