//! HTTP tests for the RajaOngkir client against a mock server.

use courier::{CostQuery, CourierError, CourierService, RajaOngkirClient};
use mockito::Matcher;
use secrecy::SecretString;

fn client(base_url: &str) -> RajaOngkirClient {
    RajaOngkirClient::new(base_url, SecretString::from("test-key".to_string()))
}

fn cost_query() -> CostQuery {
    CostQuery {
        origin: "501".to_string(),
        destination: "114".to_string(),
        weight: "1700".to_string(),
        courier: "jne".to_string(),
    }
}

#[tokio::test]
async fn provinces_sends_key_and_passes_body_through() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/province")
        .match_header("key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"rajaongkir":{"results":[{"province_id":"1","province":"Bali"}]}}"#)
        .create_async()
        .await;

    let body = client(&server.url()).provinces().await.unwrap();

    mock.assert_async().await;
    assert_eq!(body["rajaongkir"]["results"][0]["province"], "Bali");
}

#[tokio::test]
async fn cities_filters_by_province() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/city")
        .match_query(Matcher::UrlEncoded("province".into(), "9".into()))
        .match_header("key", "test-key")
        .with_status(200)
        .with_body(r#"{"rajaongkir":{"results":[]}}"#)
        .create_async()
        .await;

    let body = client(&server.url()).cities("9").await.unwrap();

    mock.assert_async().await;
    assert!(body["rajaongkir"]["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn costs_posts_form_encoded_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cost")
        .match_header("key", "test-key")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("origin".into(), "501".into()),
            Matcher::UrlEncoded("destination".into(), "114".into()),
            Matcher::UrlEncoded("weight".into(), "1700".into()),
            Matcher::UrlEncoded("courier".into(), "jne".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"rajaongkir":{"results":[{"code":"jne"}]}}"#)
        .create_async()
        .await;

    let body = client(&server.url()).costs(&cost_query()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(body["rajaongkir"]["results"][0]["code"], "jne");
}

#[tokio::test]
async fn incomplete_cost_query_never_reaches_upstream() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cost")
        .expect(0)
        .create_async()
        .await;

    let mut query = cost_query();
    query.weight.clear();
    let result = client(&server.url()).costs(&query).await;

    assert!(matches!(result, Err(CourierError::Validation(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/province")
        .with_status(400)
        .with_body(r#"{"rajaongkir":{"status":{"code":400,"description":"Invalid key"}}}"#)
        .create_async()
        .await;

    let err = client(&server.url()).provinces().await.unwrap_err();

    match err {
        CourierError::Upstream { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid key"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_is_http_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/province")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client(&server.url()).provinces().await.unwrap_err();
    assert!(matches!(err, CourierError::Http(_)));
}
