use serde_json::Value;

/// One transport-level message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// Remote close, with the reason when one was given.
    Close(Option<String>),
}

impl Frame {
    /// Serialize `value` into a text frame.
    pub fn json(value: &Value) -> crate::error::Result<Self> {
        Ok(Self::Text(serde_json::to_string(value)?))
    }

    /// Application payload of a data frame.
    ///
    /// Text that parses as JSON becomes that JSON; anything else is kept as a
    /// JSON string so handlers still see it. Control frames have no payload.
    #[must_use]
    pub fn decode(&self) -> Option<Value> {
        match self {
            Self::Text(text) => Some(
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())),
            ),
            Self::Binary(bytes) => Some(serde_json::from_slice(bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            })),
            Self::Ping(_) | Self::Pong(_) | Self::Close(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode() {
        assert_eq!(
            Frame::Text(r#"{"channel":"trades"}"#.into()).decode(),
            Some(json!({"channel": "trades"}))
        );
        assert_eq!(Frame::Text("pong".into()).decode(), Some(json!("pong")));
        assert_eq!(Frame::Binary(b"[1,2]".to_vec()).decode(), Some(json!([1, 2])));
        assert_eq!(Frame::Ping(vec![1]).decode(), None);
    }
}
