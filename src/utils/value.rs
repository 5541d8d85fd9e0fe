use serde_json::Value;

/// Turn a configured label value (any YAML scalar) into a label string.
pub fn value_to_string(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    sanitize_label_value(&raw)
}

fn sanitize_label_value(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_are_stringified() {
        assert_eq!(value_to_string(&json!("nas")), "nas");
        assert_eq!(value_to_string(&json!(2)), "2");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&json!(null)), "");
    }

    #[test]
    fn test_control_characters_are_stripped() {
        assert_eq!(value_to_string(&json!("line\nbreak\t")), "linebreak");
    }
}
