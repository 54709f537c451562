use chrono::{Local, Utc};

use crate::args::ParamSpec;
use crate::capability::Capabilities;
use crate::command::{BodyFuture, CommandDescriptor, Outcome, PermissionLevel};
use crate::context::InvocationContext;

static PARAMS: [ParamSpec; 1] = [ParamSpec::boolean("utc")];

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor {
        name: "time",
        aliases: &["now"],
        description: "Current time where the bot runs; --utc for UTC.",
        permission: PermissionLevel::Viewer,
        only_offline: false,
        cooldown_seconds: 5,
        params: &PARAMS,
        flags: &[],
        capabilities: Vec::new(),
        body: run,
    }
}

fn run<'a>(ctx: &'a InvocationContext, _caps: &'a Capabilities) -> BodyFuture<'a> {
    Box::pin(async move {
        let text = if ctx.param_boolean("utc") {
            Utc::now().format("%H:%M:%S UTC").to_string()
        } else {
            Local::now().format("%H:%M:%S %Z").to_string()
        };
        Ok(Outcome::say(text))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::context_with_input;

    #[tokio::test]
    async fn test_utc_flag_switches_the_clock() {
        let descriptor = descriptor();
        let ctx = context_with_input(&descriptor, &["--utc"]);

        let outcome = (descriptor.body)(&ctx, &Capabilities::default())
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.text.ends_with("UTC"));
    }

    #[tokio::test]
    async fn test_short_flag_works_too() {
        let descriptor = descriptor();
        let ctx = context_with_input(&descriptor, &["-u"]);

        let outcome = (descriptor.body)(&ctx, &Capabilities::default())
            .await
            .unwrap();

        assert!(outcome.text.ends_with("UTC"));
    }
}
