//! Participant Registry: id -> display name / role resolution.
//!
//! Name -> role resolution is heuristic substring matching against the
//! configured buyer/seller/target names (spec §9 design note), grounded on
//! `bot.py`'s `_role_from_name` helper (around line 965).

use copilot_core::{Participant, ParticipantId, Role};
use parking_lot::RwLock;
use std::collections::HashMap;

pub struct Registry {
    participants: RwLock<HashMap<ParticipantId, Participant>>,
    buyer_name: String,
    seller_name: String,
    target_name: String,
}

impl Registry {
    pub fn new(buyer_name: impl Into<String>, seller_name: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            participants: RwLock::new(HashMap::new()),
            buyer_name: buyer_name.into(),
            seller_name: seller_name.into(),
            target_name: target_name.into(),
        }
    }

    /// Register a newly-joined participant, resolving its role from the
    /// configured names. Returns `Role::Unknown` as a valid, non-blocking
    /// result when nothing matches.
    pub fn register(&self, id: ParticipantId, display_name: impl Into<String>) -> Participant {
        let display_name = display_name.into();
        let role = self.resolve_role(&display_name);
        let mut participant = Participant::new(id.clone(), display_name);
        participant.set_role(role);
        self.participants.write().insert(id, participant.clone());
        participant
    }

    pub fn register_bot(&self, id: ParticipantId, display_name: impl Into<String>) {
        self.participants
            .write()
            .insert(id.clone(), Participant::bot(id, display_name));
    }

    pub fn remove(&self, id: &ParticipantId) -> Option<Participant> {
        self.participants.write().remove(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<Participant> {
        self.participants.read().get(id).cloned()
    }

    /// Snapshot of every known participant, for the shutdown persistence
    /// dump (spec §6 Persisted state).
    pub fn all(&self) -> HashMap<ParticipantId, Participant> {
        self.participants.read().clone()
    }

    /// Upgrade a participant's role in place once a roster lookup resolves
    /// it, without replacing the rest of the struct.
    pub fn upgrade_role(&self, id: &ParticipantId, role: Role) {
        if let Some(participant) = self.participants.write().get_mut(id) {
            participant.set_role(role);
        }
    }

    /// Display name, falling back to a stable short id prefix when
    /// unresolved (spec §4.3 step 2).
    pub fn display_name_or_prefix(&self, id: &ParticipantId) -> String {
        self.get(id)
            .map(|p| p.display_name)
            .unwrap_or_else(|| format!("Participant-{}", id.short_prefix()))
    }

    pub fn role_of(&self, id: &ParticipantId) -> Role {
        self.get(id).map(|p| p.role).unwrap_or(Role::Unknown)
    }

    fn resolve_role(&self, name: &str) -> Role {
        let n = name.to_lowercase();
        let matches = |configured: &str| {
            !configured.trim().is_empty()
                && (configured.to_lowercase().contains(&n) || n.contains(&configured.to_lowercase()))
        };
        if matches(&self.buyer_name) {
            Role::Buyer
        } else if matches(&self.seller_name) {
            Role::Broker
        } else if matches(&self.target_name) {
            Role::Consultant
        } else {
            Role::Unknown
        }
    }

    /// Fallback bot-id inference by name heuristic, used only when
    /// `Transport::bot_id()` doesn't supply an authoritative id (spec §9
    /// Open Question). Looks for names containing "AI Co-Pilot", "Bot", or
    /// "Assistant", matching `bot.py`'s keyword list (line ~903).
    pub fn infer_bot_id(&self) -> Option<ParticipantId> {
        const KEYWORDS: &[&str] = &["AI Co-Pilot", "Bot", "Assistant"];
        self.participants
            .read()
            .values()
            .find(|p| KEYWORDS.iter().any(|k| p.display_name.contains(k)))
            .map(|p| p.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_role_by_substring() {
        let registry = Registry::new("Alex Chen", "Jordan Lee", "Sam Patel");
        let p = registry.register(ParticipantId::new("p1"), "Alex Chen");
        assert_eq!(p.role, Role::Buyer);
    }

    #[test]
    fn unresolved_name_is_unknown_not_blocking() {
        let registry = Registry::new("Alex", "Jordan", "Sam");
        let p = registry.register(ParticipantId::new("p1"), "Random Person");
        assert_eq!(p.role, Role::Unknown);
    }

    #[test]
    fn infer_bot_id_matches_keyword() {
        let registry = Registry::new("Alex", "Jordan", "Sam");
        registry.register_bot(ParticipantId::new("bot1"), "AI Co-Pilot (Local)");
        assert_eq!(registry.infer_bot_id(), Some(ParticipantId::new("bot1")));
    }

    #[test]
    fn upgrade_role_does_not_replace_participant() {
        let registry = Registry::new("Alex", "Jordan", "Sam");
        registry.register(ParticipantId::new("p1"), "Random");
        registry.upgrade_role(&ParticipantId::new("p1"), Role::Broker);
        assert_eq!(registry.role_of(&ParticipantId::new("p1")), Role::Broker);
    }
}
