use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 遠端服務的 id 可能是字串或數字，統一轉成字串
pub fn flexible_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn flexible_id_opt<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// 評分可能以數字、數字字串或 `3.0` 形式出現
fn flexible_rating<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let whole = |f: f64| (f.fract() == 0.0 && f >= 0.0).then_some(f as u64);
    let parsed = match &value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(whole),
        _ => None,
    };
    parsed.and_then(|n| u8::try_from(n).ok()).ok_or_else(|| {
        serde::de::Error::custom(format!("review value must be an integer 0..=255, got {}", value))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// 測試期間建立的臨時使用者
#[derive(Debug, Clone, Serialize)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub token: OAuthToken,
}

impl TestUser {
    pub fn access_token(&self) -> &str {
        &self.token.access_token
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    #[serde(deserialize_with = "flexible_id")]
    pub int_xxid: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default, deserialize_with = "flexible_id_opt")]
    pub int_xxid: Option<String>,
    #[serde(deserialize_with = "flexible_rating")]
    pub value: u8,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub points_awarded: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promo {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(deserialize_with = "flexible_id")]
    pub team_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub contributed_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, deserialize_with = "flexible_id_opt")]
    pub id: Option<String>,
    pub label: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_ids_become_strings() {
        let review: Review =
            serde_json::from_value(json!({"id": 42, "int_xxid": 1001, "value": 3})).unwrap();
        assert_eq!(review.id, "42");
        assert_eq!(review.int_xxid.as_deref(), Some("1001"));
        assert_eq!(review.body, "");

        let entry: LeaderboardEntry =
            serde_json::from_value(json!({"team_id": "red", "contributed_points": 120})).unwrap();
        assert_eq!(entry.team_id, "red");
        assert!(serde_json::from_value::<Image>(json!({"id": [1]})).is_err());
    }

    #[test]
    fn test_review_value_accepts_numeric_forms() {
        for (raw, expected) in [(json!(3), 3), (json!("3"), 3), (json!(3.0), 3), (json!(" 4 "), 4)] {
            let review: Review = serde_json::from_value(json!({"id": "r-1", "value": raw})).unwrap();
            assert_eq!(review.value, expected);
        }

        for bad in [json!(3.5), json!(-1), json!(256), json!("three"), json!(null)] {
            let err = serde_json::from_value::<Review>(json!({"id": "r-1", "value": bad}))
                .unwrap_err()
                .to_string();
            assert!(err.contains("review value must be an integer"), "{}", err);
        }
    }

    #[test]
    fn test_token_type_defaults_to_bearer() {
        let token: OAuthToken =
            serde_json::from_value(json!({"access_token": "abc", "expires_in": 3600})).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert!(token.refresh_token.is_none());
    }
}
