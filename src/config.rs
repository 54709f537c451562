use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Prefix a chat line must carry to be considered a command.
    pub prefix: String,
    /// Logins with Admin trust everywhere the bot sits.
    pub admins: Vec<String>,
    /// Appended to a reply that repeats the previous one, so the transport
    /// does not drop it as a duplicate.
    pub evasion_character: String,
    pub recorder_db_path: String,
    pub flush_interval_seconds: u64,
    /// Patterns the content filter applies in every channel.
    pub banned_phrases: Vec<String>,
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub disabled_commands: Vec<String>,
    #[serde(default)]
    pub banned_phrases: Vec<String>,
    /// Logins holding editor rights in this channel, for commands that
    /// declare the editor capability.
    #[serde(default)]
    pub editors: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: "!".to_string(),
            admins: vec!["keeper".to_string()],
            evasion_character: "\u{e0000}".to_string(),
            recorder_db_path: "/var/lib/chatwarden/executions.db".to_string(),
            flush_interval_seconds: 30,
            banned_phrases: vec![r"(?i)bigfollows\s*\.\s*com".to_string()],
            channels: vec![ChannelConfig {
                id: "11".to_string(),
                name: "somechannel".to_string(),
                disabled_commands: Vec::new(),
                banned_phrases: Vec::new(),
                editors: vec!["keeper".to_string()],
            }],
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn channel(&self, name_or_id: &str) -> Option<&ChannelConfig> {
        self.channels
            .iter()
            .find(|channel| channel.id == name_or_id || channel.name == name_or_id)
    }

    /// Per-channel banned-phrase patterns, keyed by channel id.
    pub fn channel_banned_phrases(&self) -> HashMap<String, Vec<String>> {
        self.channels
            .iter()
            .filter(|channel| !channel.banned_phrases.is_empty())
            .map(|channel| (channel.id.clone(), channel.banned_phrases.clone()))
            .collect()
    }

    /// Per-channel editor lists, keyed by channel id.
    pub fn channel_editors(&self) -> HashMap<String, Vec<String>> {
        self.channels
            .iter()
            .filter(|channel| !channel.editors.is_empty())
            .map(|channel| (channel.id.clone(), channel.editors.clone()))
            .collect()
    }
}
