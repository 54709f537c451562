use thiserror::Error;

/// The closed set of failure kinds a command body or capability builder may
/// raise. The execution engine converts each kind into its user-visible (or
/// logged) outcome; no other failure channel exists.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Malformed or ambiguous input. Always user-visible.
    #[error("{0}")]
    Argument(String),

    /// A declared capability refused to build. Short-circuits the pipeline
    /// with the builder-supplied reason shown to the user.
    #[error("{0}")]
    CapabilityDenied(String),

    /// The command rejected the semantic content of otherwise well-formed
    /// arguments. Shown to the user verbatim.
    #[error("{0}")]
    InvalidInput(String),

    /// A third-party collaborator failed. The message is assumed already safe
    /// to show.
    #[error("{0}")]
    ExternalService(String),

    /// Anything else. Logged in full; ordinary users only see a generic
    /// apology.
    #[error("{0}")]
    Defect(String),
}

impl CommandError {
    pub fn defect_from(err: anyhow::Error) -> Self {
        CommandError::Defect(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message_verbatim() {
        let err = CommandError::InvalidInput("that emote does not exist".to_string());
        assert_eq!(err.to_string(), "that emote does not exist");

        let err = CommandError::CapabilityDenied("you are not an editor".to_string());
        assert_eq!(err.to_string(), "you are not an editor");
    }

    #[test]
    fn test_defect_from_keeps_context_chain() {
        let err = anyhow::anyhow!("root cause").context("while talking to the store");
        let defect = CommandError::defect_from(err);
        let text = defect.to_string();
        assert!(text.contains("root cause"));
        assert!(text.contains("while talking to the store"));
    }
}
