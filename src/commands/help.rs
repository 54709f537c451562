use crate::capability::Capabilities;
use crate::command::{BodyFuture, CommandDescriptor, CommandFlag, Outcome, PermissionLevel};
use crate::context::InvocationContext;
use crate::errors::CommandError;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: "help",
        aliases: &["commands"],
        description: "Lists commands, or describes the one you name.",
        permission: PermissionLevel::Viewer,
        only_offline: false,
        cooldown_seconds: 10,
        params: &[],
        flags: &[CommandFlag::ReplyIsThreaded],
        capabilities: Vec::new(),
        body: run,
    }
}

fn run<'a>(ctx: &'a InvocationContext, _caps: &'a Capabilities) -> BodyFuture<'a> {
    Box::pin(async move {
        match ctx.input.first() {
            Some(name) => {
                let Some(command) = ctx.registry.get(name) else {
                    return Err(CommandError::InvalidInput(format!(
                        "no such command '{name}'"
                    )));
                };

                let mut details = vec![
                    command.name.to_string(),
                    command.description.to_string(),
                    format!("cooldown {}s", command.cooldown_seconds),
                ];
                if !command.aliases.is_empty() {
                    details.push(format!("aliases: {}", command.aliases.join(", ")));
                }
                if command.permission > PermissionLevel::Viewer {
                    details.push(format!("requires {:?}", command.permission));
                }
                if command.only_offline {
                    details.push("offline only".to_string());
                }

                Ok(Outcome::say(details.join(" | ")))
            }
            None => {
                let mut names: Vec<&str> =
                    ctx.registry.iter().map(|command| command.name).collect();
                names.sort_unstable();
                Ok(Outcome::say(format!("commands: {}", names.join(", "))))
            }
        }
    })
}
