//! Integration tests for `GraphMailQueryEngine` against a wiremock-based
//! Graph API mock server, grounded on
//! `lnxdrive-graph/tests/integration`'s setup/mount pattern.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use outlook_core::domain::{FilterParams, OneOrMany, SelectParams};
use outlook_core::ports::graph::GraphQueryEngine;
use outlook_graph::GraphMailQueryEngine;

fn engine(server: &MockServer) -> GraphMailQueryEngine {
    GraphMailQueryEngine::new("user@example.com").with_base_url(server.uri())
}

#[tokio::test]
async fn query_filter_issues_one_page_for_small_top() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .and(query_param("$top", "10"))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "m1"}, {"id": "m2"}],
        })))
        .mount(&server)
        .await;

    let engine = engine(&server);
    let mut filter = FilterParams::default();
    filter.is_read = Some(false);

    let result = engine
        .query_filter("token", &filter, &SelectParams::new(), None, Some(10))
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 2);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn query_filter_fetches_computed_pages_with_top_and_skip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .and(query_param("$top", "150"))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "m1"}],
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .and(query_param("$top", "150"))
        .and(query_param("$skip", "150"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "m2"}],
        })))
        .mount(&server)
        .await;

    let engine = engine(&server);
    let result = engine
        .query_filter("token", &FilterParams::default(), &SelectParams::new(), None, Some(300))
        .await
        .unwrap();

    let mut ids: Vec<&str> = result.messages.iter().map(|m| m["id"].as_str().unwrap()).collect();
    ids.sort();
    assert_eq!(ids, vec!["m1", "m2"]);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn query_filter_truncates_to_max_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .and(query_param("$top", "2"))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "m1"}, {"id": "m2"}, {"id": "m3"}],
        })))
        .mount(&server)
        .await;

    let engine = engine(&server);
    let result = engine
        .query_filter("token", &FilterParams::default(), &SelectParams::new(), None, Some(2))
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 2);
}

#[tokio::test]
async fn query_filter_applies_exclude_client_side() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "m1", "subject": "Weekly Newsletter"},
                {"id": "m2", "subject": "Invoice"},
            ],
        })))
        .mount(&server)
        .await;

    let engine = engine(&server);
    let mut exclude = outlook_core::domain::ExcludeParams::default();
    exclude.exclude_subject = Some(OneOrMany::One("newsletter".into()));

    let result = engine
        .query_filter("token", &FilterParams::default(), &SelectParams::new(), Some(&exclude), Some(10))
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0]["id"], "m2");
}

#[tokio::test]
async fn query_filter_reports_a_failed_page_without_dropping_the_others() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .and(query_param("$top", "150"))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "m1"}],
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .and(query_param("$top", "150"))
        .and(query_param("$skip", "150"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine = engine(&server);
    let result = engine
        .query_filter("token", &FilterParams::default(), &SelectParams::new(), None, Some(300))
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0]["id"], "m1");
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].item_id.contains("150"));
}

#[tokio::test]
async fn query_search_is_a_single_request_with_no_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .and(query_param("$search", "\"invoice\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "m1"}],
            "@odata.nextLink": format!("{}/ignored", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server);
    let result = engine
        .query_search("token", "invoice", &SelectParams::new(), None, None)
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 1);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn batch_fetch_reports_per_item_errors_for_failed_sub_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/$batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [
                {"id": "1", "status": 200, "body": {"id": "m1", "subject": "ok"}},
                {"id": "2", "status": 404, "body": {"error": {"message": "not found"}}},
            ],
        })))
        .mount(&server)
        .await;

    let engine = engine(&server);
    let ids = vec!["m1".to_string(), "m2".to_string()];
    let result = engine.batch_fetch_by_ids("token", &ids, &SelectParams::new()).await.unwrap();

    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item_id, "m2");
}

#[tokio::test]
async fn query_url_surfaces_graph_errors_as_partial_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/user%40example.com/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "Access denied"}
        })))
        .mount(&server)
        .await;

    let engine = engine(&server);
    let url = format!("{}/users/user@example.com/messages", server.uri());
    let page = engine.query_url("token", &url, Some(10)).await.unwrap();

    assert!(page.messages.is_empty());
    assert_eq!(page.errors.len(), 1);
    assert!(page.errors[0].message.contains("403"));
}
