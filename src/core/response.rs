use crate::domain::model::RawResponse;
use crate::utils::error::{DiscountError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<MutationData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationData {
    #[serde(rename = "discountCodeBasicCreate", default)]
    pub discount_code_basic_create: Option<DiscountCodeBasicCreatePayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodeBasicCreatePayload {
    #[serde(default)]
    pub code_discount_node: Option<serde_json::Value>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    fn describe(&self) -> String {
        match &self.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

/// 將三種回應形態統一解碼
///
/// A body that is already a JSON value is used as is, unless it is a JSON
/// string, which is decoded once more. Text and byte bodies are decoded.
pub fn normalize(raw: RawResponse) -> Result<GraphQlResponse> {
    let value = match raw {
        RawResponse::Structured(serde_json::Value::String(text)) => decode_text(text.as_bytes())?,
        RawResponse::Structured(value) => value,
        RawResponse::Text(text) => decode_text(text.as_bytes())?,
        RawResponse::Bytes(bytes) => decode_text(&bytes)?,
    };

    if !value.is_object() {
        return Err(DiscountError::response_format(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    serde_json::from_value(value).map_err(|e| DiscountError::response_format(e.to_string()))
}

fn decode_text(body: &[u8]) -> Result<serde_json::Value> {
    serde_json::from_slice(body).map_err(|e| DiscountError::response_format(e.to_string()))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Checks a normalized response for every kind of reported failure.
pub fn interpret(response: GraphQlResponse) -> Result<serde_json::Value> {
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(DiscountError::RemoteValidationError {
            messages: errors.into_iter().map(|e| e.message).collect(),
        });
    }

    let payload = response
        .data
        .and_then(|data| data.discount_code_basic_create)
        .ok_or_else(|| DiscountError::RemoteValidationError {
            messages: vec!["No response data from discount creation".to_string()],
        })?;

    if !payload.user_errors.is_empty() {
        return Err(DiscountError::RemoteValidationError {
            messages: payload.user_errors.iter().map(UserError::describe).collect(),
        });
    }

    Ok(payload.code_discount_node.unwrap_or(serde_json::Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success_body() -> serde_json::Value {
        json!({
            "data": {
                "discountCodeBasicCreate": {
                    "codeDiscountNode": {
                        "id": "gid://shopify/DiscountCodeNode/1",
                        "codeDiscount": {"codes": {"nodes": [{"code": "BACKER_ALICE_1"}]}}
                    },
                    "userErrors": []
                }
            }
        })
    }

    #[test]
    fn test_all_three_shapes_normalize_the_same() {
        let body = success_body();
        let shapes = vec![
            RawResponse::Structured(body.clone()),
            RawResponse::Structured(serde_json::Value::String(body.to_string())),
            RawResponse::Text(body.to_string()),
            RawResponse::Bytes(body.to_string().into_bytes()),
        ];

        for shape in shapes {
            let node = interpret(normalize(shape).unwrap()).unwrap();
            assert_eq!(node["id"], "gid://shopify/DiscountCodeNode/1");
        }
    }

    #[test]
    fn test_unrecognized_shapes_are_format_errors() {
        for shape in [
            RawResponse::Text("<html>Bad gateway</html>".into()),
            RawResponse::Bytes(vec![0xff, 0xfe]),
            RawResponse::Structured(json!([1, 2, 3])),
            RawResponse::Structured(json!({"data": "nope"})),
        ] {
            assert!(matches!(
                normalize(shape),
                Err(DiscountError::ResponseFormatError { .. })
            ));
        }
    }

    #[test]
    fn test_user_errors_are_joined_with_field_paths() {
        let body = json!({
            "data": {
                "discountCodeBasicCreate": {
                    "codeDiscountNode": null,
                    "userErrors": [
                        {"field": ["basicCodeDiscount", "code"], "message": "Code must be unique"},
                        {"field": null, "message": "Something else"}
                    ]
                }
            }
        });

        let err = interpret(normalize(RawResponse::Structured(body)).unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "basicCodeDiscount.code: Code must be unique, Something else"
        );
    }

    #[test]
    fn test_top_level_errors_win() {
        let body = json!({
            "errors": [{"message": "Throttled"}, {"message": "Access denied"}]
        });

        let err = interpret(normalize(RawResponse::Structured(body)).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Throttled, Access denied");
    }

    #[test]
    fn test_missing_payload() {
        let body = json!({"data": {}});

        let err = interpret(normalize(RawResponse::Structured(body)).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "No response data from discount creation");
    }
}
