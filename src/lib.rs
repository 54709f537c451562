pub mod args;
pub mod capability;
pub mod chat;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod cooldown;
pub mod errors;
pub mod gate;
pub mod moderation;
pub mod pipeline;
pub mod recorder;

pub use command::{CommandDescriptor, CommandFlag, CommandRegistry, Outcome, PermissionLevel};
pub use config::Config;
pub use context::{ChannelIdentity, ChatUser, IncomingMessage, InvocationContext};
pub use cooldown::CooldownStore;
pub use errors::CommandError;
pub use gate::{Gate, GateDecision};
pub use moderation::{ContentFilter, FilterVerdict, RegexContentFilter};
pub use pipeline::{ExecutionEngine, Reply};
pub use recorder::{ExecutionRecord, Recorder, SqliteRecorder};
