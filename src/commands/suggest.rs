use crate::args::ParamSpec;
use crate::capability::Capabilities;
use crate::command::{BodyFuture, CommandDescriptor, Outcome, PermissionLevel};
use crate::context::InvocationContext;
use crate::errors::CommandError;

static PARAMS: [ParamSpec; 1] = [ParamSpec::string("category")];

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: "suggest",
        aliases: &[],
        description: "Leaves a suggestion for the bot's keeper.",
        permission: PermissionLevel::Viewer,
        only_offline: false,
        cooldown_seconds: 60,
        params: &PARAMS,
        flags: &[],
        capabilities: Vec::new(),
        body: run,
    }
}

fn run<'a>(ctx: &'a InvocationContext, _caps: &'a Capabilities) -> BodyFuture<'a> {
    Box::pin(async move {
        let suggestion = ctx.input.join(" ");
        if suggestion.is_empty() {
            return Err(CommandError::InvalidInput(
                "tell me what to improve".to_string(),
            ));
        }

        // The execution record is the storage; the reply just acknowledges.
        let category = ctx.param_string("category");
        log::info!(
            "Suggestion from {} in #{} [{}]: {suggestion}",
            ctx.user.name,
            ctx.channel.name,
            if category.is_empty() { "general" } else { category },
        );

        Ok(Outcome::say("noted, thank you!"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::context_with_input;

    #[tokio::test]
    async fn test_suggestion_is_acknowledged() {
        let descriptor = descriptor();
        let ctx = context_with_input(&descriptor, &["more", "emotes"]);

        let outcome = (descriptor.body)(&ctx, &Capabilities::default())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::say("noted, thank you!"));
    }

    #[tokio::test]
    async fn test_category_flag_is_consumed_not_part_of_the_text() {
        let descriptor = descriptor();
        let ctx = context_with_input(&descriptor, &["--category", "emotes", "add", "pepe"]);

        assert_eq!(ctx.param_string("category"), "emotes");
        assert_eq!(ctx.input, vec!["add".to_string(), "pepe".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_suggestion_is_rejected() {
        let descriptor = descriptor();
        let ctx = context_with_input(&descriptor, &[]);

        let err = (descriptor.body)(&ctx, &Capabilities::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::InvalidInput(_)));
    }
}
