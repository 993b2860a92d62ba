//! Accessors over archive JSON arguments.
//!
//! Legacy runtimes encode event args as positional arrays, newer ones as
//! camelCase objects. Enums are `{"__kind": .., "value": ..}`.

use serde_json::Value as JsonValue;

use super::error::DecodeError;

/// Positional argument of a legacy event. Fails on named args.
pub fn positional<'a>(args: &'a JsonValue, index: usize) -> Result<&'a JsonValue, DecodeError> {
    match args {
        JsonValue::Array(items) => items
            .get(index)
            .ok_or_else(|| DecodeError::malformed("args", format!("missing position {}", index))),
        _ => Err(DecodeError::malformed("args", "expected positional array")),
    }
}

/// Named argument. Fails on positional args; absent keys read as null.
pub fn named<'a>(args: &'a JsonValue, key: &str) -> Result<&'a JsonValue, DecodeError> {
    match args {
        JsonValue::Object(map) => Ok(map.get(key).unwrap_or(&JsonValue::Null)),
        _ => Err(DecodeError::malformed("args", "expected named object")),
    }
}

/// Named argument that must be present and non-null.
pub fn required<'a>(args: &'a JsonValue, key: &str) -> Result<&'a JsonValue, DecodeError> {
    let value = named(args, key)?;
    if value.is_null() {
        return Err(DecodeError::malformed(key, "missing"));
    }
    Ok(value)
}

/// Key presence inside an update struct: `None` when absent,
/// `Some(Null)` when explicitly cleared.
pub fn update_field<'a>(update: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    update.as_object().and_then(|map| map.get(key))
}

/// Numeric entity id. Large ids arrive as decimal strings.
pub fn id_from_any(value: &JsonValue) -> Result<String, DecodeError> {
    match value {
        JsonValue::Number(n) => n
            .as_u64()
            .map(|n| n.to_string())
            .ok_or_else(|| DecodeError::malformed("id", format!("not an unsigned integer: {}", n))),
        JsonValue::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            let trimmed = s.trim_start_matches('0');
            Ok(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
        }
        other => Err(DecodeError::malformed("id", format!("unexpected value {}", other))),
    }
}

pub fn opt_id(value: &JsonValue) -> Result<Option<String>, DecodeError> {
    match value {
        JsonValue::Null => Ok(None),
        other => id_from_any(other).map(Some),
    }
}

pub fn account(value: &JsonValue) -> Result<String, DecodeError> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(DecodeError::malformed("account", format!("unexpected value {}", value))),
    }
}

pub fn opt_account(value: &JsonValue) -> Result<Option<String>, DecodeError> {
    match value {
        JsonValue::Null => Ok(None),
        other => account(other).map(Some),
    }
}

pub fn boolean(value: &JsonValue) -> Result<bool, DecodeError> {
    value
        .as_bool()
        .ok_or_else(|| DecodeError::malformed("bool", format!("unexpected value {}", value)))
}

/// `(kind, value)` of an enum argument. Unit variants may be bare strings.
pub fn enum_kind(value: &JsonValue) -> Option<(&str, &JsonValue)> {
    match value {
        JsonValue::String(kind) => Some((kind.as_str(), &JsonValue::Null)),
        JsonValue::Object(map) => {
            let kind = map.get("__kind")?.as_str()?;
            Some((kind, map.get("value").unwrap_or(&JsonValue::Null)))
        }
        _ => None,
    }
}

/// Bytes argument as UTF-8. Accepts `0x`-prefixed hex or plain text.
pub fn bytes_to_string(value: &JsonValue) -> Result<String, DecodeError> {
    let raw = value
        .as_str()
        .ok_or_else(|| DecodeError::malformed("bytes", format!("unexpected value {}", value)))?;
    match raw.strip_prefix("0x") {
        Some(encoded) => {
            let bytes = hex::decode(encoded)
                .map_err(|e| DecodeError::malformed("bytes", e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| DecodeError::malformed("bytes", e.to_string()))
        }
        None => Ok(raw.to_string()),
    }
}

/// Domain name argument. Domains are case-insensitive on chain and are
/// carried lowercased everywhere past decoding.
pub fn domain_name(value: &JsonValue) -> Result<String, DecodeError> {
    bytes_to_string(value).map(|d| d.to_lowercase())
}

/// CID of a `Content` enum. `None` for `Content::None` and for raw or
/// other non-IPFS sources.
pub fn content_cid(value: &JsonValue) -> Result<Option<String>, DecodeError> {
    if value.is_null() {
        return Ok(None);
    }
    match enum_kind(value) {
        Some(("IPFS", cid)) => bytes_to_string(cid).map(Some),
        Some((_, _)) => Ok(None),
        None => Err(DecodeError::malformed("content", format!("unexpected value {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_positional_and_named_reject_each_other() {
        assert!(positional(&json!({"a": 1}), 0).is_err());
        assert!(named(&json!([1]), "a").is_err());
        assert_eq!(named(&json!({"a": 1}), "b").unwrap(), &JsonValue::Null);
        assert!(required(&json!({"a": null}), "a").is_err());
    }

    #[test]
    fn test_ids() {
        assert_eq!(id_from_any(&json!(10)).unwrap(), "10");
        assert_eq!(id_from_any(&json!("0010")).unwrap(), "10");
        assert_eq!(id_from_any(&json!("0")).unwrap(), "0");
        assert!(id_from_any(&json!("abc")).is_err());
        assert_eq!(opt_id(&JsonValue::Null).unwrap(), None);
    }

    #[test]
    fn test_content_cid() {
        let cid = "bafyreib";
        let encoded = format!("0x{}", hex::encode(cid));
        assert_eq!(
            content_cid(&json!({"__kind": "IPFS", "value": encoded})).unwrap(),
            Some(cid.to_string())
        );
        assert_eq!(content_cid(&json!({"__kind": "None"})).unwrap(), None);
        assert_eq!(content_cid(&json!("None")).unwrap(), None);
        assert!(content_cid(&json!(5)).is_err());
    }

    #[test]
    fn test_domain_name_is_lowercased() {
        let encoded = format!("0x{}", hex::encode("Alice.SUB"));
        assert_eq!(domain_name(&json!(encoded)).unwrap(), "alice.sub");
        assert_eq!(domain_name(&json!("Bob.Sub")).unwrap(), "bob.sub");
    }

    #[test]
    fn test_update_field_presence() {
        let update = json!({"hidden": true, "permissions": null});
        assert_eq!(update_field(&update, "hidden"), Some(&json!(true)));
        assert_eq!(update_field(&update, "permissions"), Some(&JsonValue::Null));
        assert_eq!(update_field(&update, "content"), None);
    }
}
