use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};

use crate::context::InvocationContext;
use crate::errors::CommandError;

/// Verified permission to act as an editor of the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorAccess {
    pub editor_login: String,
}

/// Payload of a built capability. The set is closed; commands look up the
/// keys they declared and match on the variant they expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Editor(EditorAccess),
}

/// Name-keyed map of the capabilities built for one invocation.
#[derive(Debug, Default)]
pub struct Capabilities {
    inner: HashMap<&'static str, Capability>,
}

impl Capabilities {
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.inner.get(name)
    }

    pub fn editor(&self) -> Option<&EditorAccess> {
        match self.inner.get(EDITOR_CAPABILITY) {
            Some(Capability::Editor(access)) => Some(access),
            None => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

pub const EDITOR_CAPABILITY: &str = "editors";

/// A named, asynchronously constructed permission object a command declares
/// it needs. Builders are independent of each other within one invocation.
pub trait CapabilityBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    fn build<'a>(
        &'a self,
        ctx: &'a InvocationContext,
    ) -> BoxFuture<'a, Result<Capability, CommandError>>;
}

/// Build every declared capability concurrently and assemble the name-keyed
/// map once all builders have settled. Any failure discards partial success;
/// the first failing builder's error is returned verbatim and the command
/// body must not run.
pub async fn fetch(
    ctx: &InvocationContext,
    builders: &[Arc<dyn CapabilityBuilder>],
) -> Result<Capabilities, CommandError> {
    if builders.is_empty() {
        return Ok(Capabilities::default());
    }

    let settled = join_all(builders.iter().map(|builder| builder.build(ctx))).await;

    let mut inner = HashMap::with_capacity(builders.len());
    for (builder, result) in builders.iter().zip(settled) {
        inner.insert(builder.name(), result?);
    }

    Ok(Capabilities { inner })
}

/// Resolves which logins hold editor rights for a channel. Collaborator
/// boundary; production wires an emote-service client here, tests and the
/// demo use the config-backed [`StaticEditorDirectory`].
pub trait EditorDirectory: Send + Sync {
    fn editors_of<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<String>>>;
}

/// Editor lists taken from static configuration.
#[derive(Debug, Default)]
pub struct StaticEditorDirectory {
    by_channel: HashMap<String, Vec<String>>,
}

impl StaticEditorDirectory {
    pub fn new(by_channel: HashMap<String, Vec<String>>) -> Self {
        StaticEditorDirectory { by_channel }
    }
}

impl EditorDirectory for StaticEditorDirectory {
    fn editors_of<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<String>>> {
        Box::pin(async move {
            Ok(self
                .by_channel
                .get(channel_id)
                .cloned()
                .unwrap_or_default())
        })
    }
}

/// Builds [`Capability::Editor`] after verifying the invoking user against
/// the channel's editor list. Refusal short-circuits the whole invocation.
pub struct EditorBuilder {
    directory: Arc<dyn EditorDirectory>,
}

impl EditorBuilder {
    pub fn new(directory: Arc<dyn EditorDirectory>) -> Self {
        EditorBuilder { directory }
    }
}

impl CapabilityBuilder for EditorBuilder {
    fn name(&self) -> &'static str {
        EDITOR_CAPABILITY
    }

    fn build<'a>(
        &'a self,
        ctx: &'a InvocationContext,
    ) -> BoxFuture<'a, Result<Capability, CommandError>> {
        Box::pin(async move {
            let editors = self
                .directory
                .editors_of(&ctx.channel.id)
                .await
                .map_err(|err| {
                    CommandError::ExternalService(format!("editor lookup failed: {err:#}"))
                })?;

            let allowed = editors
                .iter()
                .any(|login| login.eq_ignore_ascii_case(&ctx.user.name));

            if !allowed {
                return Err(CommandError::CapabilityDenied(
                    "you are not an editor of this channel".to_string(),
                ));
            }

            Ok(Capability::Editor(EditorAccess {
                editor_login: ctx.user.name.clone(),
            }))
        })
    }
}
