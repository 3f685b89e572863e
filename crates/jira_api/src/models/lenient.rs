use serde::de::{Deserializer, Error as DeError};
use serde::Deserialize;
use serde_json::Value;

/// Accepts ids sent either as JSON numbers or numeric strings (`"10000"`).
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("id out of range: {number}"))),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("non-numeric id: {text:?}"))),
        other => Err(D::Error::custom(format!("unexpected id value: {other}"))),
    }
}

/// Treats `null` and blank strings as absent.
pub(crate) fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|val| match val {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::deserialize_id")]
        id: i64,
        #[serde(default, deserialize_with = "super::deserialize_opt_string")]
        label: Option<String>,
    }

    #[test]
    fn id_accepts_numbers_and_numeric_strings() {
        let a: Probe = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        let b: Probe = serde_json::from_str(r#"{"id": "10000"}"#).unwrap();
        assert_eq!(a.id, 42);
        assert_eq!(b.id, 10000);
        assert!(serde_json::from_str::<Probe>(r#"{"id": "abc"}"#).is_err());
    }

    #[test]
    fn blank_strings_become_none() {
        let probe: Probe = serde_json::from_str(r#"{"id": 1, "label": "  "}"#).unwrap();
        assert!(probe.label.is_none());
        let probe: Probe = serde_json::from_str(r#"{"id": 1, "label": null}"#).unwrap();
        assert!(probe.label.is_none());
        let probe: Probe = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(probe.label.is_none());
    }
}
