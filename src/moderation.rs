use std::collections::HashMap;

use anyhow::Context as _;
use futures::future::BoxFuture;
use regex::Regex;

use crate::context::ChannelIdentity;

/// Fixed reply sent instead of a banned reply.
pub const BLOCKED_REPLY: &str = "that reply was blocked by the channel's content filter.";

/// Fixed reply sent when the filter itself cannot be reached.
pub const FILTER_FAILED_REPLY: &str = "unable to verify the reply against the content filter.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterVerdict {
    pub banned: bool,
    pub reason: Option<String>,
}

impl FilterVerdict {
    pub fn clean() -> Self {
        FilterVerdict::default()
    }

    pub fn banned(reason: impl Into<String>) -> Self {
        FilterVerdict {
            banned: true,
            reason: Some(reason.into()),
        }
    }
}

/// Moderation predicate for outbound replies. Only the boolean/reason
/// contract matters to the pipeline; how a verdict is reached is the
/// implementation's business.
pub trait ContentFilter: Send + Sync {
    fn check<'a>(
        &'a self,
        channel: &'a ChannelIdentity,
        text: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<FilterVerdict>>;
}

/// Pattern-list filter: a global set every channel inherits plus optional
/// per-channel additions. Patterns are compiled once at load.
#[derive(Debug)]
pub struct RegexContentFilter {
    global: Vec<Regex>,
    per_channel: HashMap<String, Vec<Regex>>,
}

impl RegexContentFilter {
    pub fn new(
        global_patterns: &[String],
        per_channel_patterns: &HashMap<String, Vec<String>>,
    ) -> anyhow::Result<Self> {
        let global = compile_patterns(global_patterns)
            .context("invalid global banned phrase pattern")?;

        let mut per_channel = HashMap::new();
        for (channel_id, patterns) in per_channel_patterns {
            let compiled = compile_patterns(patterns)
                .with_context(|| format!("invalid banned phrase pattern for channel {channel_id}"))?;
            per_channel.insert(channel_id.clone(), compiled);
        }

        Ok(RegexContentFilter { global, per_channel })
    }

    fn verdict(&self, channel_id: &str, text: &str) -> FilterVerdict {
        let channel_patterns = self.per_channel.get(channel_id);
        let patterns = self
            .global
            .iter()
            .chain(channel_patterns.into_iter().flatten());

        for pattern in patterns {
            if pattern.is_match(text) {
                return FilterVerdict::banned(pattern.as_str());
            }
        }
        FilterVerdict::clean()
    }
}

impl ContentFilter for RegexContentFilter {
    fn check<'a>(
        &'a self,
        channel: &'a ChannelIdentity,
        text: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<FilterVerdict>> {
        Box::pin(async move { Ok(self.verdict(&channel.id, text)) })
    }
}

fn compile_patterns(patterns: &[String]) -> anyhow::Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("failed to compile pattern '{pattern}'"))
        })
        .collect()
}
