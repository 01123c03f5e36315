//! Tests for the HTTP-backed tools: SerpAPI search and the bot database

use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;
use zai_agent::tools::{
    BotDatabaseClient, ExecuteBotDatabaseTool, GetBotDatabaseSchemaTool, QueryBotDatabaseTool,
    SearchGoogleTool, ToolTrait,
};

fn parse(out: &str) -> Value {
    serde_json::from_str(out).unwrap()
}

// ============================================================================
// search_google
// ============================================================================

#[tokio::test]
async fn test_search_google_simplifies_results() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("engine".into(), "google".into()),
            Matcher::UrlEncoded("q".into(), "rust async".into()),
            Matcher::UrlEncoded("api_key".into(), "serp-key".into()),
            Matcher::UrlEncoded("num".into(), "2".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "answer_box": {"answer": "Tokio"},
                "organic_results": [
                    {"title": "Tokio", "link": "https://tokio.rs", "snippet": "runtime"},
                    {"title": "Async book", "link": "https://rust-lang.github.io/async-book"},
                    {"title": "Third", "link": "https://example.com"}
                ],
                "knowledge_graph": {"title": "Rust", "description": "A language"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let tool = SearchGoogleTool::new(
        Some("serp-key".to_string()),
        format!("{}/search", server.url()),
        5,
    );
    let out = parse(
        &tool
            .execute(json!({"query": "rust async", "num_results": 2}))
            .await
            .unwrap(),
    );

    mock.assert_async().await;
    assert_eq!(out["query"], "rust async");
    assert_eq!(out["direct_answer"]["answer"], "Tokio");
    assert_eq!(out["organic_results"].as_array().unwrap().len(), 2);
    assert_eq!(out["organic_results"][0]["link"], "https://tokio.rs");
    assert_eq!(out["knowledge_graph"]["description"], "A language");
}

#[tokio::test]
async fn test_search_google_caps_num_results() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("num".into(), "10".into()))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let tool = SearchGoogleTool::new(Some("k".to_string()), format!("{}/search", server.url()), 5);
    let out = parse(
        &tool
            .execute(json!({"query": "q", "num_results": 50}))
            .await
            .unwrap(),
    );

    mock.assert_async().await;
    assert_eq!(out["organic_results"], json!([]));
}

#[tokio::test]
async fn test_search_google_http_error_reported_as_json() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let tool = SearchGoogleTool::new(Some("bad".to_string()), format!("{}/search", server.url()), 5);
    let out = parse(&tool.execute(json!({"query": "q"})).await.unwrap());

    assert!(out["error"].as_str().unwrap().contains("401"));
    assert_eq!(out["query"], "q");
    assert!(out["message"].as_str().is_some());
}

#[tokio::test]
async fn test_search_google_without_key() {
    let tool = SearchGoogleTool::new(None, "http://127.0.0.1:9/search", 5);
    let out = parse(&tool.execute(json!({"query": "q"})).await.unwrap());
    assert_eq!(out["error"], "SERPAPI_KEY not configured");
}

#[tokio::test]
async fn test_search_google_rejects_missing_query() {
    let tool = SearchGoogleTool::new(Some("k".to_string()), "http://127.0.0.1:9/search", 5);
    let err = tool.execute(json!({})).await.unwrap_err();
    assert!(err.to_string().contains("invalid arguments for search_google"));
}

// ============================================================================
// Bot database
// ============================================================================

fn client(server: &mockito::ServerGuard) -> Arc<BotDatabaseClient> {
    Arc::new(BotDatabaseClient::new(format!("{}/api/", server.url()), "db-key"))
}

#[tokio::test]
async fn test_query_bot_database_posts_select() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/query")
        .match_header("x-api-key", "db-key")
        .match_body(Matcher::Json(json!({
            "query": "SELECT id FROM users",
            "params": []
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results": [{"id": 1}, {"id": 2}]}"#)
        .create_async()
        .await;

    let tool = QueryBotDatabaseTool::new(client(&server));
    let out = parse(
        &tool
            .execute(json!({"query": "SELECT id FROM users"}))
            .await
            .unwrap(),
    );

    mock.assert_async().await;
    assert_eq!(out["results"][1]["id"], 2);
}

#[tokio::test]
async fn test_query_bot_database_refuses_non_select() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/query")
        .expect(0)
        .create_async()
        .await;

    let tool = QueryBotDatabaseTool::new(client(&server));
    let out = parse(&tool.execute(json!({"query": "DELETE FROM users"})).await.unwrap());

    mock.assert_async().await;
    assert_eq!(out["error"], "Only SELECT queries are allowed with this function");
    assert_eq!(out["results"], json!([]));
}

#[tokio::test]
async fn test_execute_bot_database_refuses_select() {
    let server = mockito::Server::new_async().await;
    let tool = ExecuteBotDatabaseTool::new(client(&server));
    let out = parse(&tool.execute(json!({"query": "select 1"})).await.unwrap());

    assert_eq!(out["success"], false);
    assert_eq!(out["error"], "SELECT queries should use query_bot_database function");
}

#[tokio::test]
async fn test_execute_bot_database_posts_statement() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/execute")
        .match_header("x-api-key", "db-key")
        .with_status(200)
        .with_body(r#"{"success": true, "rows_affected": 3}"#)
        .create_async()
        .await;

    let tool = ExecuteBotDatabaseTool::new(client(&server));
    let out = parse(
        &tool
            .execute(json!({"query": "UPDATE users SET active = 0"}))
            .await
            .unwrap(),
    );

    mock.assert_async().await;
    assert_eq!(out["rows_affected"], 3);
}

#[tokio::test]
async fn test_schema_error_reported_as_json() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/schema")
        .with_status(500)
        .create_async()
        .await;

    let tool = GetBotDatabaseSchemaTool::new(client(&server));
    let out = parse(&tool.execute(json!({})).await.unwrap());

    assert!(out["error"].as_str().unwrap().contains("500"));
    assert_eq!(out["schema"], json!({}));
}

#[tokio::test]
async fn test_schema_returned_verbatim() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/schema")
        .match_header("x-api-key", "db-key")
        .with_status(200)
        .with_body(r#"{"users": ["id", "name"]}"#)
        .create_async()
        .await;

    let tool = GetBotDatabaseSchemaTool::new(client(&server));
    let out = parse(&tool.execute(json!({})).await.unwrap());
    assert_eq!(out["users"], json!(["id", "name"]));
}
