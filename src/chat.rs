use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::context::{ChannelIdentity, IncomingMessage};
use crate::pipeline::{ExecutionEngine, Reply};

/// Outbound reply boundary. The real chat transport implements this; the
/// demo and the stdin driver print to the console.
pub trait Responder: Send + Sync {
    fn send(&self, channel: &ChannelIdentity, reply: &Reply);
}

/// Prints replies to stdout, one line per reply.
#[derive(Debug, Default)]
pub struct ConsoleResponder;

impl Responder for ConsoleResponder {
    fn send(&self, channel: &ChannelIdentity, reply: &Reply) {
        if reply.threaded {
            println!("[#{}] ↳ {}", channel.name, reply.text);
        } else {
            println!("[#{}] {}", channel.name, reply.text);
        }
    }
}

/// Drives the execution engine from a stream of inbound messages and hands
/// replies to the responder. Each message runs as its own task so a slow
/// command body never holds up the rest of the chat.
#[derive(Clone)]
pub struct ChatDriver {
    engine: Arc<ExecutionEngine>,
    responder: Arc<dyn Responder>,
    evasion_character: String,
    last_replies: Arc<Mutex<HashMap<String, String>>>,
}

impl ChatDriver {
    pub fn new(
        engine: Arc<ExecutionEngine>,
        responder: Arc<dyn Responder>,
        evasion_character: impl Into<String>,
    ) -> Self {
        ChatDriver {
            engine,
            responder,
            evasion_character: evasion_character.into(),
            last_replies: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Consume messages until the sender side closes. In-flight invocations
    /// finish naturally; nothing is cancelled on shutdown.
    pub async fn run(&self, mut receiver: mpsc::UnboundedReceiver<IncomingMessage>) {
        while let Some(msg) = receiver.recv().await {
            let driver = self.clone();
            tokio::spawn(async move {
                driver.handle(msg).await;
            });
        }
    }

    /// Handle a single message end to end.
    pub async fn handle(&self, msg: IncomingMessage) {
        if let Some(reply) = self.engine.handle_message(&msg).await {
            let text = self.dedupe(&msg.channel.id, reply.text);
            self.responder.send(
                &msg.channel,
                &Reply {
                    text,
                    threaded: reply.threaded,
                },
            );
        }
    }

    /// The transport drops a message identical to the previous one, so a
    /// repeated reply gets the evasion character toggled on or off.
    fn dedupe(&self, channel_id: &str, text: String) -> String {
        if self.evasion_character.is_empty() {
            return text;
        }

        let mut last_replies = self.last_replies.lock().unwrap();
        let last = last_replies.entry(channel_id.to_string()).or_default();

        let mut out = text;
        if *last == out {
            if out.contains(&self.evasion_character) {
                out = out.replacen(&self.evasion_character, "", 1);
                out.truncate(out.trim_end().len());
            } else {
                out.push(' ');
                out.push_str(&self.evasion_character);
            }
        }

        *last = out.clone();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::command::CommandRegistry;
    use crate::context::ChatUser;
    use crate::cooldown::CooldownStore;
    use crate::gate::Gate;
    use crate::moderation::{ContentFilter, FilterVerdict};
    use crate::recorder::{ExecutionRecord, Recorder};

    struct CollectingResponder {
        sent: Mutex<Vec<String>>,
    }

    impl Responder for CollectingResponder {
        fn send(&self, _channel: &ChannelIdentity, reply: &Reply) {
            self.sent.lock().unwrap().push(reply.text.clone());
        }
    }

    struct CleanFilter;

    impl ContentFilter for CleanFilter {
        fn check<'a>(
            &'a self,
            _channel: &'a ChannelIdentity,
            _text: &'a str,
        ) -> futures::future::BoxFuture<'a, anyhow::Result<FilterVerdict>> {
            Box::pin(async { Ok(FilterVerdict::clean()) })
        }
    }

    struct NoopRecorder;

    impl Recorder for NoopRecorder {
        fn record(&self, _record: ExecutionRecord) {}
    }

    fn driver_with(responder: Arc<CollectingResponder>) -> ChatDriver {
        let mut registry = CommandRegistry::new();
        crate::commands::register_builtins(
            &mut registry,
            Arc::new(crate::capability::StaticEditorDirectory::default()),
        )
        .unwrap();

        let engine = ExecutionEngine::new(
            "!",
            Arc::new(registry),
            Gate::new(CooldownStore::new(), []),
            Arc::new(CleanFilter),
            Arc::new(NoopRecorder),
        );

        ChatDriver::new(Arc::new(engine), responder, "\u{e0000}")
    }

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            channel: ChannelIdentity {
                id: "11".to_string(),
                name: "somechannel".to_string(),
                ..Default::default()
            },
            user: ChatUser {
                id: "100".to_string(),
                name: "someone".to_string(),
                channel_moderator: true,
                ..Default::default()
            },
            text: text.to_string(),
            is_self: false,
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_replies_reach_the_responder() {
        let responder = Arc::new(CollectingResponder {
            sent: Mutex::new(Vec::new()),
        });
        let driver = driver_with(Arc::clone(&responder));

        driver.handle(message("!say hello chat")).await;

        assert_eq!(responder.sent.lock().unwrap().as_slice(), ["hello chat"]);
    }

    #[tokio::test]
    async fn test_repeated_reply_toggles_the_evasion_character() {
        let responder = Arc::new(CollectingResponder {
            sent: Mutex::new(Vec::new()),
        });
        let driver = driver_with(Arc::clone(&responder));

        driver.handle(message("!say again")).await;
        driver.handle(message("!say again")).await;
        driver.handle(message("!say again")).await;

        let sent = responder.sent.lock().unwrap();
        assert_eq!(sent[0], "again");
        assert_eq!(sent[1], "again \u{e0000}");
        assert_eq!(sent[2], "again");
    }
}
