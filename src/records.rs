//! Record store payload types.
//!
//! Mirrors the JSON shapes served by the record store's REST API. The
//! store assigns ids as either JSON strings or numbers depending on how a
//! record was created, so ids are normalized to strings on deserialize.
//! Secret material (the password value itself) is intentionally not
//! deserialized; cleanup only needs the id and creation date.

use serde::{Deserialize, Deserializer};

/// A registered domain with an optional expiry date.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainRecord {
    /// Record key in the store.
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    /// Domain name (e.g. `example.com`).
    pub domain: String,
    /// Owning user's id.
    #[serde(rename = "userId", deserialize_with = "flexible_id")]
    pub user_id: String,
    /// Registrar / hosting provider label.
    #[serde(default)]
    pub provider: Option<String>,
    /// Expiry date as served by the store; may be absent or malformed.
    #[serde(default)]
    pub date: Option<String>,
}

/// A support password entry bearing its creation timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordRecord {
    /// Record key in the store.
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    /// Creation timestamp; may be absent on hand-edited records.
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn domain_with_string_id_round_trips() {
        let json = r#"{
            "id": "d1",
            "domain": "example.com",
            "userId": "u1",
            "provider": "acme",
            "date": "2025-12-31"
        }"#;
        let record: DomainRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "d1");
        assert_eq!(record.domain, "example.com");
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.provider.as_deref(), Some("acme"));
        assert_eq!(record.date.as_deref(), Some("2025-12-31"));
    }

    #[test]
    fn numeric_ids_are_normalized_to_strings() {
        let json = r#"{"id": 7, "domain": "example.org", "userId": 3}"#;
        let record: DomainRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "7");
        assert_eq!(record.user_id, "3");
        assert!(record.date.is_none());
    }

    #[test]
    fn password_ignores_secret_material() {
        let json = r#"{
            "id": "p1",
            "password": "hunter2",
            "hour_remaining": 12,
            "createdAt": "2025-06-14T10:00:00Z"
        }"#;
        let record: PasswordRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "p1");
        assert_eq!(record.created_at.as_deref(), Some("2025-06-14T10:00:00Z"));
    }

    #[test]
    fn password_without_creation_date_parses() {
        let record: PasswordRecord = serde_json::from_str(r#"{"id": 2}"#).unwrap();
        assert_eq!(record.id, "2");
        assert!(record.created_at.is_none());
    }
}
