use std::fmt;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::errors::DomainError;

const MAX_SESSION_ID_LEN: usize = 128;

/// Opaque token identifying an anonymous cart owner.
///
/// Clients usually generate and persist it themselves; the service only checks
/// that it is a plain, bounded token before using it as a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() || raw.len() > MAX_SESSION_ID_LEN {
            return Err(DomainError::InvalidInput(format!(
                "session id must be 1 to {MAX_SESSION_ID_LEN} characters"
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidInput(
                "session id may only contain ASCII letters, digits, '-' and '_'".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Mint a fresh `session_<millis>_<suffix>` token.
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "session_{}_{}",
            Utc::now().timestamp_millis(),
            &suffix[..9]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_client_generated_token() {
        let id = SessionId::parse("session_1717171717171_k3j2h1g0f").expect("valid id");
        assert_eq!(id.as_str(), "session_1717171717171_k3j2h1g0f");
    }

    #[test]
    fn rejects_empty_token() {
        assert!(matches!(
            SessionId::parse(""),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_overlong_token() {
        let raw = "a".repeat(MAX_SESSION_ID_LEN + 1);
        assert!(SessionId::parse(&raw).is_err());
    }

    #[test]
    fn rejects_path_like_token() {
        assert!(SessionId::parse("../etc/passwd").is_err());
        assert!(SessionId::parse("a b").is_err());
    }

    #[test]
    fn generated_tokens_parse_back() {
        let id = SessionId::generate();
        assert!(id.as_str().starts_with("session_"));
        assert_eq!(SessionId::parse(id.as_str()).expect("parses"), id);
    }

    #[test]
    fn serializes_as_the_bare_token() {
        let id = SessionId::parse("session_abc").expect("valid");
        assert_eq!(
            serde_json::to_value(&id).expect("serialize"),
            serde_json::json!("session_abc")
        );
    }
}
