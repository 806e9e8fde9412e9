use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flatten a notification `data` mapping into the string-only form the
/// push wire format accepts.
///
/// Strings pass through verbatim, `null` becomes the empty string and any
/// other value is rendered as compact JSON text, so booleans read `true`
/// and `false` in lowercase JSON spelling, not a capitalised `True`.
pub fn normalize_data(data: &Map<String, Value>) -> BTreeMap<String, String> {
    data.iter()
        .map(|(key, value)| (key.clone(), stringify_value(value)))
        .collect()
}

fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_normalize_mixed_values() {
        let data = as_map(json!({
            "text": "hello",
            "count": 3,
            "ratio": 0.5,
            "flag": true,
            "missing": null,
            "list": [1, "a"],
            "nested": {"k": "v"}
        }));

        let normalized = normalize_data(&data);
        assert_eq!(normalized["text"], "hello");
        assert_eq!(normalized["count"], "3");
        assert_eq!(normalized["ratio"], "0.5");
        assert_eq!(normalized["flag"], "true");
        assert_eq!(normalized["missing"], "");
        assert_eq!(normalized["list"], r#"[1,"a"]"#);
        assert_eq!(normalized["nested"], r#"{"k":"v"}"#);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_data(&Map::new()).is_empty());
    }

    proptest! {
        #[test]
        fn normalize_keeps_keys_and_strings(entries in proptest::collection::btree_map("[a-z]{1,8}", ".*", 0..16)) {
            let data: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();

            let normalized = normalize_data(&data);
            prop_assert_eq!(normalized, entries);
        }

        #[test]
        fn normalize_renders_integers(key in "[a-z]{1,8}", n in any::<i64>()) {
            let mut data = Map::new();
            data.insert(key.clone(), json!(n));
            prop_assert_eq!(normalize_data(&data)[&key].clone(), n.to_string());
        }
    }
}
