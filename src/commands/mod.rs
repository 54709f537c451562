use std::sync::Arc;

use crate::capability::EditorDirectory;
use crate::command::CommandRegistry;

pub mod announce;
pub mod help;
pub mod ping;
pub mod say;
pub mod suggest;
pub mod time;

/// Register every builtin command. Called once at startup, before the
/// registry is shared with the engine.
pub fn register_builtins(
    registry: &mut CommandRegistry,
    editors: Arc<dyn EditorDirectory>,
) -> anyhow::Result<()> {
    registry.register(ping::descriptor())?;
    registry.register(help::descriptor())?;
    registry.register(say::descriptor())?;
    registry.register(time::descriptor())?;
    registry.register(suggest::descriptor())?;
    registry.register(announce::descriptor(editors))?;
    Ok(())
}
