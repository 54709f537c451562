use std::collections::HashSet;

use crate::command::{CommandDescriptor, PermissionLevel};
use crate::context::{ChannelIdentity, ChatUser};
use crate::cooldown::CooldownStore;

/// Why an attempt did or did not pass the gate. Every non-`Pass` decision is
/// a silent rejection: no reply, no record, indistinguishable from "not a
/// command" for the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    ChannelIsLive,
    OnCooldown,
    PermissionDenied,
}

/// Stateful policy gate: only-offline check, cooldown ledger, role check, in
/// that order. Owns the only mutable state of the pipeline.
pub struct Gate {
    store: CooldownStore,
    admins: HashSet<String>,
}

impl Gate {
    pub fn new(store: CooldownStore, admins: impl IntoIterator<Item = String>) -> Self {
        Gate {
            store,
            admins: admins.into_iter().collect(),
        }
    }

    /// Decide one attempt. The cooldown slot is written as soon as the
    /// attempt clears the ledger, before the role check: a user probing
    /// permissions pays the same cooldown as a legitimate attempt.
    pub fn check(
        &self,
        channel: &ChannelIdentity,
        user: &ChatUser,
        descriptor: &CommandDescriptor,
        now_epoch_ms: i64,
    ) -> GateDecision {
        if descriptor.only_offline && channel.live {
            return GateDecision::ChannelIsLive;
        }

        if !self.store.try_arm(
            &channel.id,
            &user.id,
            descriptor.name,
            descriptor.cooldown_seconds,
            now_epoch_ms,
        ) {
            return GateDecision::OnCooldown;
        }

        if self.effective_role(channel, user) < descriptor.permission {
            return GateDecision::PermissionDenied;
        }

        GateDecision::Pass
    }

    /// Effective role: the maximum over the user's independent standings.
    /// Each badge is checked on its own so no badge state can mask another.
    pub fn effective_role(&self, channel: &ChannelIdentity, user: &ChatUser) -> PermissionLevel {
        let mut role = PermissionLevel::Viewer;
        if user.channel_vip {
            role = role.max(PermissionLevel::Vip);
        }
        if user.channel_moderator {
            role = role.max(PermissionLevel::Moderator);
        }
        if user.id == channel.id {
            role = role.max(PermissionLevel::Broadcaster);
        }
        if self.admins.contains(&user.name) {
            role = role.max(PermissionLevel::Admin);
        }
        role
    }

    /// Elevated trust sees raw defect messages instead of the apology.
    pub fn is_elevated(&self, channel: &ChannelIdentity, user: &ChatUser) -> bool {
        self.effective_role(channel, user) >= PermissionLevel::Admin
    }

    pub fn cooldowns(&self) -> &CooldownStore {
        &self.store
    }
}
