//! Represents an object (file) held in the remote blob store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single stored blob as returned by the listing endpoint.
///
/// The `key` is carried in its percent-encoded form so it is safe to embed
/// in a URL path segment, and `url` is always derived from the key at read
/// time, never persisted.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredObject {
    /// Percent-encoded object key within the bucket.
    pub key: String,

    /// Size in bytes, as reported by the store.
    #[serde(rename = "size")]
    pub size_bytes: i64,

    /// Timestamp set by the store at write time.
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,

    /// Public retrieval address: CDN origin + encoded key.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_wire_field_names() {
        let object = StoredObject {
            key: "1700000000000-ab12cd34-a.txt".into(),
            size_bytes: 10,
            last_modified: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            url: "https://cdn.aviateur.tech/1700000000000-ab12cd34-a.txt".into(),
        };

        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["key"], "1700000000000-ab12cd34-a.txt");
        assert_eq!(json["size"], 10);
        let stamp: DateTime<Utc> = json["lastModified"].as_str().unwrap().parse().unwrap();
        assert_eq!(stamp, object.last_modified);
        assert_eq!(
            json["url"],
            "https://cdn.aviateur.tech/1700000000000-ab12cd34-a.txt"
        );
    }
}
