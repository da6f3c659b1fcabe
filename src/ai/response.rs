use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn normalize(value: &Value) -> Self {
        if let Value::Array(items) = value {
            if let Some(first) = items.first() {
                return Self::new(message_text(first).unwrap_or_else(|| stringify(first)));
            }
        }

        if let Some(messages) = value.get("messages") {
            let text = messages
                .as_array()
                .and_then(|list| list.first())
                .and_then(message_text)
                .unwrap_or_else(|| stringify(messages));
            return Self::new(text);
        }

        if let Some(text) = value.get("text").and_then(Value::as_str) {
            return Self::new(text);
        }

        Self::new(stringify(value))
    }
}

fn message_text(message: &Value) -> Option<String> {
    if let Some(text) = message.as_str() {
        return Some(text.to_string());
    }
    if let Some(text) = message.get("text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    match message.get("content")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => {
            let parts: Vec<&str> = blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(""))
            }
        }
        _ => None,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_of_messages_takes_first() {
        let value = json!([{"type": "text", "text": "first"}, {"type": "text", "text": "second"}]);
        assert_eq!(Completion::normalize(&value).text, "first");
    }

    #[test]
    fn test_messages_attribute() {
        let value = json!({"messages": [{"role": "assistant", "content": "from messages"}]});
        assert_eq!(Completion::normalize(&value).text, "from messages");

        let odd = json!({"messages": {"unexpected": true}});
        assert_eq!(Completion::normalize(&odd).text, r#"{"unexpected":true}"#);
    }

    #[test]
    fn test_text_attribute_then_fallback() {
        assert_eq!(Completion::normalize(&json!({"text": "plain"})).text, "plain");
        assert_eq!(Completion::normalize(&json!("bare")).text, "bare");
        assert_eq!(Completion::normalize(&json!(42)).text, "42");
        assert_eq!(Completion::normalize(&json!([])).text, "[]");
    }

    #[test]
    fn test_list_takes_precedence_over_keys() {
        let value = json!([{"content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]}]);
        assert_eq!(Completion::normalize(&value).text, "ab");
    }
}
