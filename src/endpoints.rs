/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Validation of the service-endpoint `config.json`.
//!
//! The document is validated but never rewritten: after it passes, the
//! original file bytes are copied verbatim into the extracted APK tree.

use crate::error::PatcherError;
use serde_json::{Map, Value};
use url::Url;

/// Keys that must be present and hold absolute URLs.
pub const HOST_KEYS: [&str; 3] = [
    "configservice_host",
    "loginservice_host",
    "matchingservice_host",
];

/// Key that must be present and hold a string. It is a lock token, not a
/// URL, and is deliberately never URL-validated.
pub const PUBLISHER_LOCK_KEY: &str = "publisher_lock";

/// Parse and validate the endpoint config. Unknown keys pass through
/// untouched. Returns the parsed object so callers can report on it.
pub fn validate(json_text: &str) -> Result<Map<String, Value>, PatcherError> {
    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| PatcherError::ConfigMalformed(e.to_string()))?;

    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(PatcherError::ConfigInvalidSchema(format!(
                "top level must be a JSON object, found {}",
                json_type_name(&other)
            )))
        }
    };

    for key in HOST_KEYS.iter().chain(std::iter::once(&PUBLISHER_LOCK_KEY)) {
        match object.get(*key) {
            None => {
                return Err(PatcherError::ConfigInvalidSchema(format!(
                    "missing required key `{}`",
                    key
                )))
            }
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(PatcherError::ConfigInvalidSchema(format!(
                    "`{}` must be a string, found {}",
                    key,
                    json_type_name(other)
                )))
            }
        }
    }

    for key in HOST_KEYS {
        // Presence and type were checked above
        let host = object
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default();
        Url::parse(host).map_err(|e| {
            PatcherError::ConfigInvalidSchema(format!(
                "`{}` is not an absolute URL ({}): {}",
                key, host, e
            ))
        })?;
    }

    Ok(object)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> serde_json::Value {
        serde_json::json!({
            "configservice_host": "https://config.example.com:443/config",
            "loginservice_host": "wss://login.example.com/login",
            "matchingservice_host": "wss://matching.example.com/matching",
            "publisher_lock": "rad15_live"
        })
    }

    #[test]
    fn accepts_valid_config() {
        let parsed = validate(&valid_config().to_string()).unwrap();
        assert_eq!(
            parsed.get("publisher_lock").and_then(|v| v.as_str()),
            Some("rad15_live")
        );
    }

    #[test]
    fn accepts_unknown_extra_keys() {
        let mut cfg = valid_config();
        cfg["extra_setting"] = serde_json::json!(42);
        validate(&cfg.to_string()).unwrap();
    }

    #[test]
    fn publisher_lock_may_be_any_string() {
        let mut cfg = valid_config();
        cfg["publisher_lock"] = serde_json::json!("not a url at all!!");
        validate(&cfg.to_string()).unwrap();
    }

    #[test]
    fn rejects_unparseable_json() {
        assert!(matches!(
            validate("{not json"),
            Err(PatcherError::ConfigMalformed(_))
        ));
    }

    #[test]
    fn rejects_non_object_top_level() {
        assert!(matches!(
            validate("[1, 2, 3]"),
            Err(PatcherError::ConfigInvalidSchema(_))
        ));
    }

    #[test]
    fn rejects_each_missing_required_key() {
        for key in HOST_KEYS.iter().chain(std::iter::once(&PUBLISHER_LOCK_KEY)) {
            let mut cfg = valid_config();
            cfg.as_object_mut().unwrap().remove(*key);
            let err = validate(&cfg.to_string()).unwrap_err();
            match err {
                PatcherError::ConfigInvalidSchema(msg) => assert!(msg.contains(key)),
                other => panic!("expected schema error for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn rejects_non_string_values() {
        let mut cfg = valid_config();
        cfg["publisher_lock"] = serde_json::json!(7);
        assert!(matches!(
            validate(&cfg.to_string()),
            Err(PatcherError::ConfigInvalidSchema(_))
        ));
    }

    #[test]
    fn rejects_relative_host_urls() {
        for key in HOST_KEYS {
            let mut cfg = valid_config();
            cfg[key] = serde_json::json!("config.example.com/config");
            let err = validate(&cfg.to_string()).unwrap_err();
            match err {
                PatcherError::ConfigInvalidSchema(msg) => assert!(msg.contains(key)),
                other => panic!("expected schema error for {}, got {:?}", key, other),
            }
        }
    }
}
