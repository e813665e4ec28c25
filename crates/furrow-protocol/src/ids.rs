use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Game IDs are random v4 UUIDs, assigned at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub Uuid);

impl GameId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player UIDs are opaque strings issued by the (external) auth layer.
///
/// AI seats use the reserved `ai-<n>` form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerUid(pub String);

impl PlayerUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn ai(seat: usize) -> Self {
        Self(format!("ai-{seat}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerUid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Parcel index within a field (0..FIELD_SIZE).
pub type ParcelIndex = u8;
