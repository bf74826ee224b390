use backer_discounts::core::response;
use backer_discounts::core::{DiscountApi, DiscountCodeInput, RawResponse};
use backer_discounts::{DiscountError, ShopifyClient};
use httpmock::prelude::*;

const GRAPHQL_PATH: &str = "/admin/api/2024-10/graphql.json";

fn input(code: &str) -> DiscountCodeInput {
    DiscountCodeInput {
        title: "Backer reward for Alice".to_string(),
        code: code.to_string(),
        starts_at: chrono::Utc::now(),
        amount: 25.0,
    }
}

fn client(server: &MockServer) -> ShopifyClient {
    let endpoint = ShopifyClient::admin_endpoint(&server.base_url(), "2024-10");
    ShopifyClient::new(endpoint, "shpat_test").unwrap()
}

#[tokio::test]
async fn test_sends_mutation_with_access_token() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path(GRAPHQL_PATH)
            .header("x-shopify-access-token", "shpat_test")
            .body_contains("discountCodeBasicCreate")
            .body_contains("BACKER_ALICE_1");
        then.status(200).json_body(serde_json::json!({
            "data": {
                "discountCodeBasicCreate": {
                    "codeDiscountNode": {"id": "gid://shopify/DiscountCodeNode/7"},
                    "userErrors": []
                }
            }
        }));
    });

    let raw = client(&server)
        .create_basic_code(&input("BACKER_ALICE_1"))
        .await
        .unwrap();

    api_mock.assert();
    assert!(matches!(raw, RawResponse::Bytes(_)));
    let node = response::interpret(response::normalize(raw).unwrap()).unwrap();
    assert_eq!(node["id"], "gid://shopify/DiscountCodeNode/7");
}

#[tokio::test]
async fn test_user_errors_come_back_as_a_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GRAPHQL_PATH);
        then.status(200).json_body(serde_json::json!({
            "data": {
                "discountCodeBasicCreate": {
                    "codeDiscountNode": null,
                    "userErrors": [{"field": ["basicCodeDiscount", "code"], "code": "TAKEN", "message": "Code must be unique"}]
                }
            }
        }));
    });

    let raw = client(&server)
        .create_basic_code(&input("BACKER_ALICE_1"))
        .await
        .unwrap();

    let err = response::interpret(response::normalize(raw).unwrap()).unwrap_err();
    assert!(matches!(err, DiscountError::RemoteValidationError { .. }));
    assert_eq!(err.to_string(), "basicCodeDiscount.code: Code must be unique");
}

#[tokio::test]
async fn test_http_failure_is_a_protocol_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GRAPHQL_PATH);
        then.status(401).body("[API] Invalid API key or access token");
    });

    let err = client(&server)
        .create_basic_code(&input("BACKER_ALICE_1"))
        .await
        .unwrap_err();

    assert!(matches!(err, DiscountError::RemoteProtocolError { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_unreachable_host_is_a_protocol_error() {
    let client = ShopifyClient::new("http://127.0.0.1:9/admin/api/2024-10/graphql.json", "t").unwrap();

    let err = client
        .create_basic_code(&input("BACKER_ALICE_1"))
        .await
        .unwrap_err();

    assert!(matches!(err, DiscountError::RemoteProtocolError { .. }));
}
