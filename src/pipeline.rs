use std::sync::Arc;

use chrono::Utc;

use crate::args;
use crate::capability;
use crate::command::{CommandDescriptor, CommandFlag, CommandRegistry, Outcome};
use crate::context::{IncomingMessage, InvocationContext};
use crate::errors::CommandError;
use crate::gate::{Gate, GateDecision};
use crate::moderation::{self, ContentFilter};
use crate::recorder::{ExecutionRecord, Recorder};

/// What ordinary users see when a command hits an unclassified defect.
pub const DEFECT_APOLOGY: &str = "something broke while running that command.";

/// At most one reply leaves the pipeline per executed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Send as a threaded response to the invoking message.
    pub threaded: bool,
}

/// The execution engine: resolves a raw chat line to a descriptor, walks it
/// through the gate, parser, capability composer, command body and content
/// filter, and converges every path on one recorded outcome.
pub struct ExecutionEngine {
    prefix: String,
    registry: Arc<CommandRegistry>,
    gate: Gate,
    filter: Arc<dyn ContentFilter>,
    recorder: Arc<dyn Recorder>,
}

impl ExecutionEngine {
    pub fn new(
        prefix: impl Into<String>,
        registry: Arc<CommandRegistry>,
        gate: Gate,
        filter: Arc<dyn ContentFilter>,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        ExecutionEngine {
            prefix: prefix.into(),
            registry,
            gate,
            filter,
            recorder,
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Handle one inbound chat line. `None` means nothing is said: the line
    /// was not a command, or policy rejected it silently, or the command
    /// chose to stay quiet. Policy rejections are indistinguishable from
    /// unknown commands by design.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Option<Reply> {
        if msg.is_self {
            return None;
        }

        let stripped = msg.text.trim().strip_prefix(&self.prefix)?;

        let mut words = stripped.split_whitespace();
        let name = words.next()?.to_string();
        let input: Vec<String> = words.map(str::to_string).collect();

        if msg.channel.disabled_commands.iter().any(|c| *c == name) {
            log::debug!("Command '{name}' is disabled in #{}", msg.channel.name);
            return None;
        }

        // Unknown name is a no-op: unrecognized input is not a command.
        let descriptor = self.registry.get(&name)?;

        let now_epoch_ms = Utc::now().timestamp_millis();
        match self
            .gate
            .check(&msg.channel, &msg.user, &descriptor, now_epoch_ms)
        {
            GateDecision::Pass => {}
            decision => {
                log::debug!(
                    "Silent rejection of '{}' from {} in #{}: {decision:?}",
                    descriptor.name,
                    msg.user.name,
                    msg.channel.name
                );
                return None;
            }
        }

        let parsed = args::parse(&input, descriptor.params);
        let ctx = InvocationContext {
            channel: msg.channel.clone(),
            user: msg.user.clone(),
            input: parsed.remaining,
            params: parsed.values,
            metadata: msg.metadata.clone(),
            registry: Arc::clone(&self.registry),
        };

        let outcome = self.run_command(&ctx, &descriptor).await;

        let mut text = outcome.text.clone();
        if !outcome.success && !text.is_empty() {
            text = format!("❗ {text}");
        }

        if !text.is_empty() && !descriptor.has_flag(CommandFlag::SkipContentFilter) {
            text = self.screen_reply(&ctx, &descriptor, text).await;
        }

        self.recorder.record(ExecutionRecord {
            user_id: ctx.user.id.clone(),
            user_name: ctx.user.name.clone(),
            channel_id: ctx.channel.id.clone(),
            command: descriptor.name.to_string(),
            args: ctx.input.clone(),
            success: outcome.success,
            result: text.clone(),
        });

        if text.is_empty() {
            None
        } else {
            Some(Reply {
                text,
                threaded: descriptor.has_flag(CommandFlag::ReplyIsThreaded),
            })
        }
    }

    /// Run capabilities and the body, converting every failure mode into an
    /// Outcome. Nothing escapes this function.
    async fn run_command(&self, ctx: &InvocationContext, descriptor: &CommandDescriptor) -> Outcome {
        let capabilities = match capability::fetch(ctx, &descriptor.capabilities).await {
            Ok(capabilities) => capabilities,
            Err(CommandError::CapabilityDenied(reason)) => {
                return Outcome::fail(format!("{}: {reason}", ctx.user.name));
            }
            Err(err) => {
                log::error!(
                    "Capability builder defect in '{}': {err}",
                    descriptor.name
                );
                return self.defect_outcome(ctx, &err.to_string());
            }
        };

        match (descriptor.body)(ctx, &capabilities).await {
            Ok(outcome) => outcome,
            Err(CommandError::Argument(message)) | Err(CommandError::CapabilityDenied(message)) => {
                Outcome::fail(format!("{}: {message}", ctx.user.name))
            }
            Err(CommandError::InvalidInput(message))
            | Err(CommandError::ExternalService(message)) => Outcome::fail(message),
            Err(CommandError::Defect(detail)) => {
                log::error!("Command '{}' defect: {detail}", descriptor.name);
                self.defect_outcome(ctx, &detail)
            }
        }
    }

    fn defect_outcome(&self, ctx: &InvocationContext, detail: &str) -> Outcome {
        if self.gate.is_elevated(&ctx.channel, &ctx.user) {
            Outcome::fail(detail.to_string())
        } else {
            Outcome::fail(DEFECT_APOLOGY.to_string())
        }
    }

    async fn screen_reply(
        &self,
        ctx: &InvocationContext,
        descriptor: &CommandDescriptor,
        text: String,
    ) -> String {
        match self.filter.check(&ctx.channel, &text).await {
            Ok(verdict) if verdict.banned => {
                log::warn!(
                    "Reply of '{}' blocked in #{}: {}",
                    descriptor.name,
                    ctx.channel.name,
                    verdict.reason.as_deref().unwrap_or("no reason given")
                );
                moderation::BLOCKED_REPLY.to_string()
            }
            Ok(_) => text,
            Err(err) => {
                log::error!("Content filter check failed: {err:#}");
                moderation::FILTER_FAILED_REPLY.to_string()
            }
        }
    }
}
