//! Tests for the dynamic value model and its serde deserialization.
//!
//! This test suite covers:
//! - Deserializing values from JSON and YAML documents
//! - Typed extraction through `FromValue`
//! - Module and class handles

use std::collections::{BTreeMap, VecDeque};
use typed_settings_common::types::*;

#[cfg(test)]
mod deserialize_tests {
    use super::*;

    #[test]
    fn test_value_from_json_document() {
        let json = r#"{
            "STR": "text",
            "INT": 42,
            "FLOAT": 1.5,
            "BOOL": false,
            "NULL": null,
            "LIST": [1, "two"],
            "MAP": {"INNER": "x"}
        }"#;
        let doc: BTreeMap<String, Value> = serde_json::from_str(json).unwrap();

        assert_eq!(doc["STR"].as_str(), Some("text"));
        assert!(matches!(doc["INT"], Value::Int(42)));
        assert!(matches!(doc["FLOAT"], Value::Float(f) if (f - 1.5).abs() < f64::EPSILON));
        assert!(matches!(doc["BOOL"], Value::Bool(false)));
        assert!(matches!(doc["NULL"], Value::Null));
        assert_eq!(doc["LIST"].kind(), "list");
        assert_eq!(
            doc["MAP"].as_map().unwrap()["INNER"].as_str(),
            Some("x")
        );
    }

    #[test]
    fn test_value_from_yaml_document() {
        let yaml = "MY_APP:\n  STR_SETTING_1: override\n  EMPTY: ~\n";
        let doc: BTreeMap<String, Value> = serde_yaml::from_str(yaml).unwrap();

        let inner = doc["MY_APP"].as_map().unwrap();
        assert_eq!(inner["STR_SETTING_1"].as_str(), Some("override"));
        assert!(matches!(inner["EMPTY"], Value::Null));
    }

    #[test]
    fn test_huge_unsigned_integer_is_rejected() {
        let result: Result<Value, _> = serde_json::from_str("18446744073709551615");
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod from_value_tests {
    use super::*;

    #[test]
    fn test_from_value_matches_kind() {
        assert_eq!(String::from_value(Value::from("s")).unwrap(), "s");
        assert!(bool::from_value(Value::Bool(true)).unwrap());
        assert_eq!(i64::from_value(Value::Int(3)).unwrap(), 3);
        assert!((f64::from_value(Value::Int(2)).unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_value_hands_back_mismatch() {
        let back = bool::from_value(Value::from("true")).unwrap_err();
        assert_eq!(back.as_str(), Some("true"));
        assert_eq!(<bool as FromValue>::EXPECTED, "bool");
    }
}

#[cfg(test)]
mod handle_tests {
    use super::*;

    #[test]
    fn test_module_exposes_classes() {
        let module: ModuleRef = Module::new("collections")
            .with_class::<VecDeque<Value>>("deque")
            .with_class::<BTreeMap<String, Value>>("OrderedDict")
            .into();

        assert_eq!(module.path(), "collections");
        assert_eq!(
            module.class_names().collect::<Vec<_>>(),
            vec!["OrderedDict", "deque"]
        );

        let deque = module.class("deque").unwrap();
        assert_eq!(deque.qualified_name(), "collections.deque");
        assert!(deque.is::<VecDeque<Value>>());
        assert_eq!(format!("{module:?}"), "<module 'collections'>");
    }

    #[test]
    fn test_module_identity() {
        let a: ModuleRef = Module::new("pathlib").into();
        let b: ModuleRef = Module::new("pathlib").into();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(Value::Module(a.clone()).try_eq(&Value::Module(a)).unwrap());
    }
}
