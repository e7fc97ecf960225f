//! Deserializers for node JSON that encodes int64 values either as numbers or
//! as decimal strings.

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("integer out of i64 range: {n}"))),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid integer string {s:?}: {e}"))),
        Some(other) => Err(de::Error::custom(format!(
            "expected integer or numeric string, got {other}"
        ))),
    }
}

pub fn i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_i64(deserializer)?.ok_or_else(|| de::Error::custom("missing integer"))
}

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Treats an explicit `null` list the same as an absent one.
pub fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "super::opt_i64")]
        n: Option<i64>,
        #[serde(default, deserialize_with = "super::opt_string")]
        s: Option<String>,
    }

    fn sample(json: &str) -> Sample {
        serde_json::from_str(json).expect("sample json")
    }

    #[test]
    fn integers_accept_numbers_and_strings() {
        assert_eq!(sample(r#"{"n": 7}"#).n, Some(7));
        assert_eq!(sample(r#"{"n": "42"}"#).n, Some(42));
        assert_eq!(sample(r#"{"n": null}"#).n, None);
        assert_eq!(sample(r#"{}"#).n, None);
    }

    #[test]
    fn integers_reject_garbage() {
        assert!(serde_json::from_str::<Sample>(r#"{"n": "12x"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"n": [1]}"#).is_err());
    }

    #[test]
    fn strings_accept_numbers() {
        assert_eq!(sample(r#"{"s": 10000}"#).s.as_deref(), Some("10000"));
        assert_eq!(sample(r#"{"s": "upokt"}"#).s.as_deref(), Some("upokt"));
    }
}
