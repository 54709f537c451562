use crate::capability::Capabilities;
use crate::command::{BodyFuture, CommandDescriptor, Outcome, PermissionLevel};
use crate::context::InvocationContext;
use crate::errors::CommandError;

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: "say",
        aliases: &["echo"],
        description: "Repeats the given text as the bot.",
        permission: PermissionLevel::Moderator,
        only_offline: false,
        // Mod-gated already; the reply still goes through the content filter.
        cooldown_seconds: 0,
        params: &[],
        flags: &[],
        capabilities: Vec::new(),
        body: run,
    }
}

fn run<'a>(ctx: &'a InvocationContext, _caps: &'a Capabilities) -> BodyFuture<'a> {
    Box::pin(async move {
        let text = ctx.input.join(" ");
        if text.is_empty() {
            return Err(CommandError::InvalidInput(
                "give me something to say".to_string(),
            ));
        }
        Ok(Outcome::say(text))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::context_with_input;

    #[tokio::test]
    async fn test_say_echoes_the_input() {
        let descriptor = descriptor();
        let ctx = context_with_input(&descriptor, &["hello", "chat"]);

        let outcome = (descriptor.body)(&ctx, &Capabilities::default())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::say("hello chat"));
    }

    #[tokio::test]
    async fn test_say_rejects_empty_input() {
        let descriptor = descriptor();
        let ctx = context_with_input(&descriptor, &[]);

        let err = (descriptor.body)(&ctx, &Capabilities::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::InvalidInput(_)));
    }
}
