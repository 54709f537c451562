use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::args::ParamSpec;
use crate::capability::{Capabilities, CapabilityBuilder};
use crate::context::InvocationContext;
use crate::errors::CommandError;

/// Permission required in a channel to run a command, lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum PermissionLevel {
    #[default]
    Viewer,
    Vip,
    Moderator,
    Broadcaster,
    Admin,
}

/// Per-command behavior toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlag {
    /// The reply bypasses the content filter.
    SkipContentFilter,
    /// The reply is sent as a threaded response to the invoking message.
    ReplyIsThreaded,
}

/// The uniform result every execution path converges to. An empty `text`
/// means nothing is said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub text: String,
}

impl Outcome {
    pub fn say(text: impl Into<String>) -> Self {
        Outcome {
            success: true,
            text: text.into(),
        }
    }

    pub fn silent() -> Self {
        Outcome {
            success: true,
            text: String::new(),
        }
    }

    pub fn fail(text: impl Into<String>) -> Self {
        Outcome {
            success: false,
            text: text.into(),
        }
    }
}

pub type BodyFuture<'a> = BoxFuture<'a, Result<Outcome, CommandError>>;

/// The executable part of a command. Plain function pointer; command modules
/// define a `fn run(...)` and reference it from their descriptor.
pub type CommandBody =
    for<'a> fn(&'a InvocationContext, &'a Capabilities) -> BodyFuture<'a>;

/// Static registration record for one command. Immutable after load.
pub struct CommandDescriptor {
    /// Primary invocation name, unique across the registry.
    pub name: &'static str,
    /// Other words which trigger this command.
    pub aliases: &'static [&'static str],
    /// Shown by the help command and the registry listing.
    pub description: &'static str,
    pub permission: PermissionLevel,
    /// Inert while the channel is flagged live.
    pub only_offline: bool,
    /// Per invoking user, per channel.
    pub cooldown_seconds: u64,
    pub params: &'static [ParamSpec],
    pub flags: &'static [CommandFlag],
    /// Capabilities built before the body runs; all must succeed.
    pub capabilities: Vec<Arc<dyn CapabilityBuilder>>,
    pub body: CommandBody,
}

impl CommandDescriptor {
    pub fn has_flag(&self, flag: CommandFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Name/alias table over the loaded descriptors. Read-only once the process
/// is serving messages; shared freely across concurrent invocations.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandDescriptor>>,
    lookup: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one descriptor, validating its identity and parameter schema.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> anyhow::Result<()> {
        validate(&descriptor)?;

        for key in identity_keys(&descriptor) {
            if self.lookup.contains_key(key) {
                bail!("command '{key}' already exists");
            }
        }

        let index = self.commands.len();
        for key in identity_keys(&descriptor) {
            self.lookup.insert(key, index);
        }
        self.commands.push(Arc::new(descriptor));
        Ok(())
    }

    pub fn get(&self, name_or_alias: &str) -> Option<Arc<CommandDescriptor>> {
        self.lookup
            .get(name_or_alias)
            .map(|&index| Arc::clone(&self.commands[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn identity_keys(descriptor: &CommandDescriptor) -> impl Iterator<Item = &'static str> + '_ {
    std::iter::once(descriptor.name).chain(descriptor.aliases.iter().copied())
}

/// Load-time validation. Runtime parsing is total, so ambiguity has to be
/// rejected here: duplicate parameter names and colliding short flags never
/// reach the parser.
fn validate(descriptor: &CommandDescriptor) -> anyhow::Result<()> {
    if descriptor.name.is_empty() {
        bail!("command has an empty name");
    }

    let mut keys = Vec::new();
    for key in identity_keys(descriptor) {
        if keys.contains(&key) {
            bail!("command '{}' repeats the identity '{key}'", descriptor.name);
        }
        keys.push(key);
    }

    let mut names = Vec::new();
    let mut short_flags = Vec::new();
    for param in descriptor.params {
        if param.name.is_empty() {
            bail!("command '{}' declares an unnamed parameter", descriptor.name);
        }
        if param.name.starts_with('-') {
            bail!(
                "command '{}' parameter '{}' collides with flag syntax",
                descriptor.name,
                param.name
            );
        }
        if names.contains(&param.name) {
            bail!(
                "command '{}' declares parameter '{}' twice",
                descriptor.name,
                param.name
            );
        }
        // First characters must be unique or `-x` resolution is ambiguous.
        let short = param.name.chars().next();
        if short_flags.contains(&short) {
            bail!(
                "command '{}' parameter '{}' collides on its short flag",
                descriptor.name,
                param.name
            );
        }
        names.push(param.name);
        short_flags.push(short);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ParamSpec;

    fn noop<'a>(_ctx: &'a InvocationContext, _caps: &'a Capabilities) -> BodyFuture<'a> {
        Box::pin(async { Ok(Outcome::silent()) })
    }

    fn descriptor(name: &'static str, aliases: &'static [&'static str]) -> CommandDescriptor {
        CommandDescriptor {
            name,
            aliases,
            description: "",
            permission: PermissionLevel::Viewer,
            only_offline: false,
            cooldown_seconds: 0,
            params: &[],
            flags: &[],
            capabilities: Vec::new(),
            body: noop,
        }
    }

    #[test]
    fn test_permission_levels_are_ordered() {
        assert!(PermissionLevel::Viewer < PermissionLevel::Vip);
        assert!(PermissionLevel::Vip < PermissionLevel::Moderator);
        assert!(PermissionLevel::Moderator < PermissionLevel::Broadcaster);
        assert!(PermissionLevel::Broadcaster < PermissionLevel::Admin);
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let mut registry = CommandRegistry::new();
        registry
            .register(descriptor("ping", &["pong", "latency"]))
            .unwrap();

        assert_eq!(registry.get("ping").unwrap().name, "ping");
        assert_eq!(registry.get("latency").unwrap().name, "ping");
        assert!(registry.get("Ping").is_none());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(descriptor("ping", &[])).unwrap();

        let err = registry.register(descriptor("ping", &[])).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_alias_repeating_own_name_is_rejected() {
        let err = CommandRegistry::new()
            .register(descriptor("ping", &["ping"]))
            .unwrap_err();
        assert!(err.to_string().contains("repeats"));
    }

    #[test]
    fn test_alias_conflicting_with_name_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(descriptor("ping", &[])).unwrap();

        assert!(registry.register(descriptor("status", &["ping"])).is_err());
    }

    #[test]
    fn test_short_flag_collision_is_rejected_at_registration() {
        let mut command = descriptor("emotes", &[]);
        const PARAMS: &[ParamSpec] = &[ParamSpec::boolean("case"), ParamSpec::string("channel")];
        command.params = PARAMS;

        let err = CommandRegistry::new().register(command).unwrap_err();
        assert!(err.to_string().contains("short flag"));
    }

    #[test]
    fn test_duplicate_param_name_is_rejected() {
        let mut command = descriptor("emotes", &[]);
        const PARAMS: &[ParamSpec] = &[ParamSpec::boolean("case"), ParamSpec::string("case")];
        command.params = PARAMS;

        assert!(CommandRegistry::new().register(command).is_err());
    }
}
