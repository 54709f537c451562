use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct CooldownEntry {
    command: String,
    until_epoch_ms: i64,
}

/// Per-channel cooldown ledger: channel id → user id → per-command
/// next-eligible times. Purely in-memory; rebuilt empty on restart.
///
/// The store is owned by the gate and mutated nowhere else. Checking and
/// arming happen in one critical section so two near-simultaneous messages
/// for the same (channel, user) cannot both pass.
#[derive(Debug, Default)]
pub struct CooldownStore {
    channels: Mutex<HashMap<String, HashMap<String, Vec<CooldownEntry>>>>,
}

impl CooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the ledger for (channel, user, command) and, if not blocked,
    /// write the new next-eligible time before returning. Returns `false`
    /// when the attempt is still on cooldown.
    ///
    /// Zero-cooldown commands never get a ledger entry.
    pub fn try_arm(
        &self,
        channel_id: &str,
        user_id: &str,
        command: &str,
        cooldown_seconds: u64,
        now_epoch_ms: i64,
    ) -> bool {
        if cooldown_seconds == 0 {
            return true;
        }

        let until_epoch_ms = now_epoch_ms + cooldown_seconds as i64 * 1000;

        let mut channels = self.channels.lock().unwrap();
        let entries = channels
            .entry(channel_id.to_string())
            .or_default()
            .entry(user_id.to_string())
            .or_default();

        match entries.iter_mut().find(|entry| entry.command == command) {
            Some(entry) => {
                if entry.until_epoch_ms > now_epoch_ms {
                    return false;
                }
                entry.until_epoch_ms = until_epoch_ms;
            }
            None => entries.push(CooldownEntry {
                command: command.to_string(),
                until_epoch_ms,
            }),
        }

        true
    }

    /// Next-eligible time for (channel, user, command), if a ledger entry
    /// exists. Inspection only.
    pub fn next_eligible(&self, channel_id: &str, user_id: &str, command: &str) -> Option<i64> {
        let channels = self.channels.lock().unwrap();
        channels
            .get(channel_id)?
            .get(user_id)?
            .iter()
            .find(|entry| entry.command == command)
            .map(|entry| entry.until_epoch_ms)
    }

    /// Drop all ledger state for a channel, e.g. after the bot parts it.
    /// In-flight invocations are unaffected.
    pub fn purge_channel(&self, channel_id: &str) {
        self.channels.lock().unwrap().remove(channel_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_passes_and_arms() {
        let store = CooldownStore::new();

        assert!(store.try_arm("11", "100", "ping", 5, 1_000));
        assert_eq!(store.next_eligible("11", "100", "ping"), Some(6_000));
    }

    #[test]
    fn test_second_attempt_within_window_is_blocked() {
        let store = CooldownStore::new();

        assert!(store.try_arm("11", "100", "ping", 5, 1_000));
        assert!(!store.try_arm("11", "100", "ping", 5, 3_000));
        // The blocked attempt must not push the window further out.
        assert_eq!(store.next_eligible("11", "100", "ping"), Some(6_000));
    }

    #[test]
    fn test_expired_entry_is_rearmed() {
        let store = CooldownStore::new();

        assert!(store.try_arm("11", "100", "ping", 5, 1_000));
        assert!(store.try_arm("11", "100", "ping", 5, 6_000));
        assert_eq!(store.next_eligible("11", "100", "ping"), Some(11_000));
    }

    #[test]
    fn test_zero_cooldown_never_writes_an_entry() {
        let store = CooldownStore::new();

        assert!(store.try_arm("11", "100", "say", 0, 1_000));
        assert!(store.try_arm("11", "100", "say", 0, 1_000));
        assert_eq!(store.next_eligible("11", "100", "say"), None);
    }

    #[test]
    fn test_ledger_is_scoped_per_channel_user_and_command() {
        let store = CooldownStore::new();

        assert!(store.try_arm("11", "100", "ping", 5, 1_000));
        assert!(store.try_arm("22", "100", "ping", 5, 1_000));
        assert!(store.try_arm("11", "200", "ping", 5, 1_000));
        assert!(store.try_arm("11", "100", "help", 5, 1_000));
        assert!(!store.try_arm("11", "100", "ping", 5, 1_000));
    }

    #[test]
    fn test_purge_channel_clears_its_ledger_only() {
        let store = CooldownStore::new();
        store.try_arm("11", "100", "ping", 5, 1_000);
        store.try_arm("22", "100", "ping", 5, 1_000);

        store.purge_channel("11");

        assert_eq!(store.next_eligible("11", "100", "ping"), None);
        assert_eq!(store.next_eligible("22", "100", "ping"), Some(6_000));
    }
}
