use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored short link. Immutable once created; logically dead the instant
/// `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub code: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the link never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the code was chosen by the caller (affects conflict policy).
    pub alias_requested: bool,
}

impl ShortLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Cache TTL in seconds: the remaining lifetime capped by `default_ttl`,
    /// or `None` for an already-expired link (which must never be cached).
    pub fn cache_ttl(&self, default_ttl: u64, now: DateTime<Utc>) -> Option<u64> {
        match self.expires_at {
            Some(expires_at) => {
                let remaining = (expires_at - now).num_seconds();
                if remaining <= 0 {
                    None
                } else {
                    Some((remaining as u64).min(default_ttl))
                }
            }
            None => Some(default_ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expires_in: Option<Duration>) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            code: "abc123".to_string(),
            target: "https://example.com".to_string(),
            created_at: now,
            expires_at: expires_in.map(|d| now + d),
            alias_requested: false,
        }
    }

    #[test]
    fn test_never_expires() {
        let link = link(None);
        assert!(!link.is_expired(Utc::now() + Duration::days(365 * 100)));
        assert_eq!(link.cache_ttl(3600, Utc::now()), Some(3600));
    }

    #[test]
    fn test_is_expired_boundary() {
        let link = link(Some(Duration::hours(1)));
        let expires_at = link.expires_at.unwrap();
        assert!(!link.is_expired(expires_at - Duration::seconds(1)));
        // expiry is exclusive: dead the instant expires_at passes
        assert!(link.is_expired(expires_at));
        assert!(link.is_expired(expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_cache_ttl_bounded_by_remaining_lifetime() {
        let link = link(Some(Duration::seconds(120)));
        let now = link.created_at;
        assert_eq!(link.cache_ttl(3600, now), Some(120));
        assert_eq!(link.cache_ttl(60, now), Some(60));
    }

    #[test]
    fn test_cache_ttl_none_when_expired() {
        let link = link(Some(Duration::seconds(30)));
        let later = link.created_at + Duration::seconds(31);
        assert_eq!(link.cache_ttl(3600, later), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let original = link(Some(Duration::days(1)));
        let json = serde_json::to_string(&original).unwrap();
        let decoded: ShortLink = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }
}
