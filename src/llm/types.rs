//! Message and result types for SQL generation.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing context and instructions.
    System,
    /// User message (the schema plus the question).
    User,
}

impl Role {
    /// Returns the role as a string for API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The outcome of a generation attempt.
///
/// `sql` is `None` when generation was skipped (no API key, unusable
/// schema); `explanation` then carries the reason for the caller to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

impl GeneratedQuery {
    /// A result that carries no SQL, only an explanation of why.
    pub fn explanation_only(explanation: impl Into<String>) -> Self {
        Self {
            sql: None,
            explanation: explanation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn test_generated_query_fields_default() {
        let parsed: GeneratedQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.sql, None);
        assert_eq!(parsed.explanation, "");
    }
}
