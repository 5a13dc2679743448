use crate::utils::error::{E2eError, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;

/// HTTP 狀態碼分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Informational,
    Success,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusCategory {
    pub fn from_status(status: StatusCode) -> Self {
        Self::from_code(status.as_u16())
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            100..=199 => StatusCategory::Informational,
            200..=299 => StatusCategory::Success,
            300..=399 => StatusCategory::Redirect,
            400..=499 => StatusCategory::ClientError,
            _ => StatusCategory::ServerError,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCategory::Informational => "informational",
            StatusCategory::Success => "success",
            StatusCategory::Redirect => "redirect",
            StatusCategory::ClientError => "client_error",
            StatusCategory::ServerError => "server_error",
        };
        f.write_str(name)
    }
}

/// 以點號路徑查詢 JSON；數字片段同時可作為陣列索引
pub fn lookup<'a>(value: &'a Value, path: &str) -> Result<&'a Value> {
    if path.is_empty() {
        return Ok(value);
    }

    let mut current = value;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| E2eError::MissingField {
            path: path.to_string(),
        })?;
    }
    Ok(current)
}

/// 取出字串形式的值；數字 id 也接受
pub fn value_as_string(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(E2eError::AssertionFailed {
            message: format!("'{}' is not a string or number: {}", path, other),
        }),
    }
}

pub fn value_as_i64(value: &Value, path: &str) -> Result<i64> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| E2eError::AssertionFailed {
            message: format!("'{}' is not an integer: {}", path, n),
        }),
        Value::String(s) => s.parse().map_err(|_| E2eError::AssertionFailed {
            message: format!("'{}' is not an integer: {}", path, s),
        }),
        other => Err(E2eError::AssertionFailed {
            message: format!("'{}' is not an integer: {}", path, other),
        }),
    }
}

pub fn assert_keys(value: &Value, path: &str, keys: &[&str]) -> Result<()> {
    let target = lookup(value, path)?;
    let object = target.as_object().ok_or_else(|| E2eError::AssertionFailed {
        message: format!("'{}' is not an object", display_path(path)),
    })?;

    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed {
            message: format!(
                "'{}' is missing keys: {}",
                display_path(path),
                missing.join(", ")
            ),
        })
    }
}

pub fn assert_field_eq(value: &Value, path: &str, expected: &Value) -> Result<()> {
    let actual = lookup(value, path)?;
    if actual == expected {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed {
            message: format!("'{}' expected {}, got {}", path, expected, actual),
        })
    }
}

pub fn assert_array_len(value: &Value, path: &str, expected: usize) -> Result<()> {
    let items = array_at(value, path)?;
    if items.len() == expected {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed {
            message: format!(
                "'{}' expected {} items, got {}",
                display_path(path),
                expected,
                items.len()
            ),
        })
    }
}

/// 陣列中是否有元素的 `field` 等於 `expected`（字串與數字視為相同）
pub fn assert_array_contains(value: &Value, path: &str, field: &str, expected: &str) -> Result<()> {
    if find_in_array(value, path, field, expected)?.is_some() {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed {
            message: format!(
                "'{}' has no item with {} = {}",
                display_path(path),
                field,
                expected
            ),
        })
    }
}

pub fn find_in_array<'a>(
    value: &'a Value,
    path: &str,
    field: &str,
    expected: &str,
) -> Result<Option<&'a Value>> {
    let items = array_at(value, path)?;
    Ok(items.iter().find(|item| {
        lookup(item, field)
            .ok()
            .and_then(|v| value_as_string(v, field).ok())
            .is_some_and(|v| v == expected)
    }))
}

pub fn array_at<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>> {
    lookup(value, path)?
        .as_array()
        .ok_or_else(|| E2eError::AssertionFailed {
            message: format!("'{}' is not an array", display_path(path)),
        })
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_categories() {
        assert_eq!(StatusCategory::from_code(201), StatusCategory::Success);
        assert_eq!(StatusCategory::from_code(302), StatusCategory::Redirect);
        assert_eq!(StatusCategory::from_code(422), StatusCategory::ClientError);
        assert_eq!(StatusCategory::from_code(503), StatusCategory::ServerError);
        assert_eq!(StatusCategory::ClientError.to_string(), "client_error");
    }

    #[test]
    fn test_lookup_nested_paths() {
        let body = json!({"business": {"images": [{"id": 7}, {"id": "img-2"}]}});
        assert_eq!(lookup(&body, "business.images.0.id").unwrap(), &json!(7));
        assert!(matches!(
            lookup(&body, "business.images.5.id"),
            Err(E2eError::MissingField { .. })
        ));
        assert_eq!(lookup(&body, "").unwrap(), &body);
    }

    #[test]
    fn test_key_and_equality_assertions() {
        let body = json!({"user": {"id": "u1", "email": "a@b.test"}});
        assert!(assert_keys(&body, "user", &["id", "email"]).is_ok());
        let err = assert_keys(&body, "user", &["id", "token"]).unwrap_err();
        assert!(err.to_string().contains("token"));

        assert!(assert_field_eq(&body, "user.id", &json!("u1")).is_ok());
        assert!(assert_field_eq(&body, "user.id", &json!("u2")).is_err());
    }

    #[test]
    fn test_array_assertions() {
        let body = json!({"images": [{"id": 7}, {"id": "img-2"}]});
        assert!(assert_array_len(&body, "images", 2).is_ok());
        assert!(assert_array_len(&body, "images", 1).is_err());
        assert!(assert_array_contains(&body, "images", "id", "7").is_ok());
        assert!(assert_array_contains(&body, "images", "id", "img-2").is_ok());
        assert!(assert_array_contains(&body, "images", "id", "img-3").is_err());
        assert!(array_at(&body, "images.0").is_err());
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(value_as_i64(&json!(40), "points").unwrap(), 40);
        assert_eq!(value_as_i64(&json!("15"), "points").unwrap(), 15);
        assert!(value_as_i64(&json!(1.5), "points").is_err());
    }
}
