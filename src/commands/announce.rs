use std::sync::Arc;

use crate::capability::{Capabilities, EditorBuilder, EditorDirectory};
use crate::command::{BodyFuture, CommandDescriptor, Outcome, PermissionLevel};
use crate::context::InvocationContext;
use crate::errors::CommandError;

pub fn descriptor(editors: Arc<dyn EditorDirectory>) -> CommandDescriptor {
    CommandDescriptor {
        name: "announce",
        aliases: &[],
        description: "Posts an announcement; channel editors only.",
        permission: PermissionLevel::Vip,
        only_offline: false,
        cooldown_seconds: 10,
        params: &[],
        flags: &[],
        capabilities: vec![Arc::new(EditorBuilder::new(editors))],
        body: run,
    }
}

fn run<'a>(ctx: &'a InvocationContext, caps: &'a Capabilities) -> BodyFuture<'a> {
    Box::pin(async move {
        let editor = caps.editor().ok_or_else(|| {
            // Declared in the descriptor, so a missing entry is a wiring bug.
            CommandError::Defect("editor capability missing".to_string())
        })?;

        let announcement = ctx.input.join(" ");
        if announcement.is_empty() {
            return Err(CommandError::InvalidInput(
                "give me something to announce".to_string(),
            ));
        }

        Ok(Outcome::say(format!(
            "📣 {announcement} (via {})",
            editor.editor_login
        )))
    })
}
