use crate::core::{DiscountApi, DiscountCodeInput, RawResponse};
use crate::utils::error::{DiscountError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "2024-10";

pub const DISCOUNT_CODE_BASIC_CREATE: &str = r#"mutation discountCodeBasicCreate($basicCodeDiscount: DiscountCodeBasicInput!) {
  discountCodeBasicCreate(basicCodeDiscount: $basicCodeDiscount) {
    codeDiscountNode {
      id
      codeDiscount {
        ... on DiscountCodeBasic {
          title
          codes(first: 1) {
            nodes {
              code
            }
          }
        }
      }
    }
    userErrors {
      field
      code
      message
    }
  }
}"#;

/// GraphQL Admin API client for one shop.
#[derive(Debug, Clone)]
pub struct ShopifyClient {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl ShopifyClient {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, access_token, Duration::from_secs(30))
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        })
    }

    /// `my-shop.myshopify.com` -> `https://my-shop.myshopify.com/admin/api/<version>/graphql.json`
    pub fn admin_endpoint(shop: &str, api_version: &str) -> String {
        let shop = shop.trim().trim_end_matches('/');
        let base = if shop.starts_with("http://") || shop.starts_with("https://") {
            shop.to_string()
        } else {
            format!("https://{}", shop)
        };
        format!("{}/admin/api/{}/graphql.json", base, api_version)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn variables(input: &DiscountCodeInput) -> serde_json::Value {
        json!({
            "basicCodeDiscount": {
                "title": input.title,
                "code": input.code,
                "startsAt": input.starts_at.to_rfc3339(),
                "customerSelection": { "all": true },
                "customerGets": {
                    "value": {
                        "discountAmount": {
                            "amount": input.amount,
                            "appliesOnEachItem": false
                        }
                    },
                    "items": { "all": true }
                },
                "appliesOncePerCustomer": true,
                "usageLimit": 1
            }
        })
    }
}

#[async_trait]
impl DiscountApi for ShopifyClient {
    async fn create_basic_code(&self, input: &DiscountCodeInput) -> Result<RawResponse> {
        let body = json!({
            "query": DISCOUNT_CODE_BASIC_CREATE,
            "variables": Self::variables(input),
        });

        tracing::debug!("POST {} for code {}", self.endpoint, input.code);
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DiscountError::remote(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DiscountError::remote(e.to_string()))?;
        tracing::debug!("API response status: {} ({} bytes)", status, bytes.len());

        if !status.is_success() {
            let snippet: String = String::from_utf8_lossy(&bytes).chars().take(200).collect();
            return Err(DiscountError::remote(format!("HTTP {}: {}", status, snippet)));
        }

        Ok(RawResponse::Bytes(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_admin_endpoint() {
        assert_eq!(
            ShopifyClient::admin_endpoint("my-shop.myshopify.com", "2024-10"),
            "https://my-shop.myshopify.com/admin/api/2024-10/graphql.json"
        );
        assert_eq!(
            ShopifyClient::admin_endpoint("http://127.0.0.1:8080/", "2024-10"),
            "http://127.0.0.1:8080/admin/api/2024-10/graphql.json"
        );
    }

    #[test]
    fn test_variables_shape() {
        let input = DiscountCodeInput {
            title: "Backer reward for Alice".to_string(),
            code: "BACKER_ALICE_1".to_string(),
            starts_at: chrono::Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
            amount: 25.0,
        };

        let vars = ShopifyClient::variables(&input);
        let discount = &vars["basicCodeDiscount"];

        assert_eq!(discount["code"], "BACKER_ALICE_1");
        assert_eq!(discount["startsAt"], "2026-10-19T09:00:00+00:00");
        assert_eq!(discount["customerSelection"]["all"], true);
        assert_eq!(discount["customerGets"]["items"]["all"], true);
        assert_eq!(
            discount["customerGets"]["value"]["discountAmount"]["amount"],
            25.0
        );
        assert_eq!(discount["appliesOncePerCustomer"], true);
        assert_eq!(discount["usageLimit"], 1);
    }
}
