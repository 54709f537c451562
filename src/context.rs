use std::collections::HashMap;
use std::sync::Arc;

use crate::args::ParamValue;
use crate::command::CommandRegistry;

/// A channel the bot sits in, as resolved by the chat transport. Live state
/// and the disabled-command list arrive already resolved; the pipeline never
/// fetches them mid-invocation.
#[derive(Debug, Clone, Default)]
pub struct ChannelIdentity {
    pub id: String,
    pub name: String,
    pub live: bool,
    pub disabled_commands: Vec<String>,
}

/// The invoking user, with the channel badges the transport attached to this
/// message. Broadcaster status is derived from the channel id, not a badge.
#[derive(Debug, Clone, Default)]
pub struct ChatUser {
    pub id: String,
    pub name: String,
    pub channel_moderator: bool,
    pub channel_vip: bool,
}

/// One inbound chat line as delivered by the transport.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub channel: ChannelIdentity,
    pub user: ChatUser,
    pub text: String,
    pub is_self: bool,
    /// Raw platform metadata, passed through unopened to command bodies and
    /// capability builders.
    pub metadata: HashMap<String, String>,
}

/// Per-invocation bundle handed to the command body. Created fresh for each
/// accepted chat line and discarded once the reply is produced.
#[derive(Clone)]
pub struct InvocationContext {
    pub channel: ChannelIdentity,
    pub user: ChatUser,
    /// Input tokens left over after flag parsing, in input order.
    pub input: Vec<String>,
    pub params: HashMap<String, ParamValue>,
    pub metadata: HashMap<String, String>,
    pub registry: Arc<CommandRegistry>,
}

impl InvocationContext {
    /// String parameter by name; `""` when absent.
    pub fn param_string(&self, name: &str) -> &str {
        match self.params.get(name) {
            Some(ParamValue::Str(s)) => s,
            _ => "",
        }
    }

    /// Boolean parameter by name; `false` when absent.
    pub fn param_boolean(&self, name: &str) -> bool {
        matches!(self.params.get(name), Some(ParamValue::Bool(true)))
    }
}
