use std::sync::OnceLock;
use std::time::Instant;

use crate::capability::Capabilities;
use crate::command::{BodyFuture, CommandDescriptor, CommandFlag, Outcome, PermissionLevel};
use crate::context::InvocationContext;

static STARTED: OnceLock<Instant> = OnceLock::new();

pub fn descriptor() -> CommandDescriptor {
    // Uptime counts from registration, which happens once at startup.
    STARTED.get_or_init(Instant::now);

    CommandDescriptor {
        name: "ping",
        aliases: &["pong"],
        description: "Pings the user with some small info.",
        permission: PermissionLevel::Viewer,
        only_offline: false,
        cooldown_seconds: 20,
        params: &[],
        flags: &[CommandFlag::SkipContentFilter, CommandFlag::ReplyIsThreaded],
        capabilities: Vec::new(),
        body: run,
    }
}

fn run<'a>(_ctx: &'a InvocationContext, _caps: &'a Capabilities) -> BodyFuture<'a> {
    Box::pin(async {
        let uptime = STARTED
            .get()
            .map(|started| format_duration(started.elapsed().as_secs()))
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Outcome::say(format!("Pong! Uptime {uptime}")))
    })
}

fn format_duration(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}
