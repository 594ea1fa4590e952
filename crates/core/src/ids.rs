use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source of opaque group and tab ids. Uniqueness rests on the random
/// component; callers never re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdGenerator {
    /// Bare UUIDv4 strings.
    #[default]
    Uuid,
    /// `<prefix>-<epoch-ms>-<hex>`.
    Timestamped,
}

impl IdGenerator {
    pub fn next(&self, prefix: &str) -> String {
        match self {
            IdGenerator::Uuid => Uuid::new_v4().to_string(),
            IdGenerator::Timestamped => {
                let millis = chrono::Utc::now().timestamp_millis();
                let random = Uuid::new_v4().simple().to_string();
                format!("{}-{}-{}", prefix, millis, &random[..12])
            }
        }
    }
}
