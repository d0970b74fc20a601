//! Participant identity and role resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable participant identifier, as handed to us by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A stable short prefix, used when a display name can't be resolved.
    pub fn short_prefix(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role a participant plays on the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Broker,
    Consultant,
    Bot,
    Unknown,
}

impl Default for Role {
    fn default() -> Self {
        Role::Unknown
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Buyer => "buyer",
            Role::Broker => "broker",
            Role::Consultant => "consultant",
            Role::Bot => "bot",
            Role::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A participant on the call.
///
/// Role starts at `Unknown` and is upgraded in place as roster data or name
/// heuristics resolve it — never replaced wholesale, so registry updates
/// don't invalidate outstanding references to the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub role: Role,
    pub is_bot: bool,
}

impl Participant {
    pub fn new(id: ParticipantId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role: Role::Unknown,
            is_bot: false,
        }
    }

    pub fn bot(id: ParticipantId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role: Role::Bot,
            is_bot: true,
        }
    }

    /// Upgrade the role in place. A no-op downgrade to `Unknown` is ignored
    /// so a later, more specific resolution is never clobbered by a stale one.
    pub fn set_role(&mut self, role: Role) {
        if role == Role::Unknown {
            return;
        }
        self.role = role;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_upgrade_ignores_unknown() {
        let mut p = Participant::new(ParticipantId::new("p1"), "Someone");
        p.set_role(Role::Buyer);
        p.set_role(Role::Unknown);
        assert_eq!(p.role, Role::Buyer);
    }

    #[test]
    fn short_prefix_is_stable() {
        let id = ParticipantId::new("abcdefghijklmnop");
        assert_eq!(id.short_prefix(), "abcdefgh");
    }
}
