//! PubMed client against a mocked E-utilities server.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bolota::config::PubMedConfig;
use bolota::subsystems::pubmed::PubMedClient;

fn client(server: &MockServer) -> PubMedClient {
    PubMedClient::new(&PubMedConfig {
        base_url: server.uri(),
        article_base_url: "https://pubmed.ncbi.nlm.nih.gov".into(),
        domain_filter: "veterinary".into(),
        max_results: 3,
        timeout_seconds: 5,
    })
    .unwrap()
}

async fn mount_esearch(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("retmode", "json"))
        .and(query_param("retmax", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": { "idlist": ids }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn maps_summaries_in_uid_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("term", "otite canina AND veterinary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": { "idlist": ["222", "111"] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .and(query_param("id", "222,111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "uids": ["222", "111"],
                "111": {
                    "uid": "111",
                    "title": "Otitis externa in dogs",
                    "pubdate": "2023 Mar",
                    "authors": [{ "name": "Silva A" }]
                },
                "222": {
                    "uid": "222",
                    "title": "Canine ear disease",
                    "pubdate": "2024 Jan",
                    "authors": [{ "name": "Souza B" }, { "name": "Lima C" }, { "name": "Reis D" }]
                }
            }
        })))
        .mount(&server)
        .await;

    let articles = client(&server).search("otite canina").await;
    assert_eq!(articles.len(), 2);

    assert_eq!(articles[0].id, "222");
    assert_eq!(articles[0].authors, "Souza B, Lima C et al.");
    assert_eq!(articles[0].pub_date, "2024 Jan");
    assert_eq!(articles[0].url, "https://pubmed.ncbi.nlm.nih.gov/222/");

    assert_eq!(articles[1].title, "Otitis externa in dogs");
    assert_eq!(articles[1].authors, "Silva A");
}

#[tokio::test]
async fn missing_authors_use_fallback() {
    let server = MockServer::start().await;
    mount_esearch(&server, &["9"]).await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "uids": ["9"], "9": { "uid": "9", "title": "T", "pubdate": "2020" } }
        })))
        .mount(&server)
        .await;

    let articles = client(&server).search("x").await;
    assert_eq!(articles[0].authors, "Autores desconhecidos");
}

#[tokio::test]
async fn uid_without_entry_is_dropped() {
    let server = MockServer::start().await;
    mount_esearch(&server, &["1", "2"]).await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "uids": ["1", "2"], "2": { "uid": "2", "title": "Only me" } }
        })))
        .mount(&server)
        .await;

    let articles = client(&server).search("x").await;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id, "2");
}

#[tokio::test]
async fn zero_ids_skip_summary() {
    let server = MockServer::start().await;
    mount_esearch(&server, &[]).await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(client(&server).search("nothing").await.is_empty());
}

#[tokio::test]
async fn http_error_yields_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(client(&server).search("x").await.is_empty());
}

#[tokio::test]
async fn summary_failure_yields_empty() {
    let server = MockServer::start().await;
    mount_esearch(&server, &["1"]).await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client(&server).search("x").await.is_empty());
}

#[tokio::test]
async fn malformed_body_yields_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    assert!(client(&server).search("x").await.is_empty());
}

#[tokio::test]
async fn unreachable_server_yields_empty() {
    let server = MockServer::start().await;
    let c = client(&server);
    drop(server);

    assert!(c.search("x").await.is_empty());
}
