//! Response prefixes agents use to signal what their reply means

pub const FOLLOWUP_PREFIX: &str = "FOLLOWUP:";
pub const ANSWER_PREFIX: &str = "ANSWER:";
pub const COMPLETE_PREFIX: &str = "COMPLETE:";

/// A decoded agent reply. The workflow dispatches on this, never on raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    /// The agent needs more information
    Followup(String),
    /// The router answering a follow-up. `prefixed` is false when `ANSWER:` was missing.
    Answer { content: String, prefixed: bool },
    /// Final output for the task. `prefixed` is false for replies without any prefix.
    Complete { content: String, prefixed: bool },
}

impl AgentReply {
    /// `answering_followup` is true only while the router handles a follow-up
    pub fn decode(response: &str, answering_followup: bool) -> Self {
        let text = response.trim_start();

        if let Some(question) = text.strip_prefix(FOLLOWUP_PREFIX) {
            return AgentReply::Followup(question.trim().to_string());
        }

        if answering_followup {
            return match text.strip_prefix(ANSWER_PREFIX) {
                Some(answer) => AgentReply::Answer {
                    content: answer.trim().to_string(),
                    prefixed: true,
                },
                None => AgentReply::Answer {
                    content: response.to_string(),
                    prefixed: false,
                },
            };
        }

        match text.strip_prefix(COMPLETE_PREFIX) {
            Some(content) => AgentReply::Complete {
                content: content.trim().to_string(),
                prefixed: true,
            },
            None => AgentReply::Complete {
                content: response.to_string(),
                prefixed: false,
            },
        }
    }

    pub fn is_followup(&self) -> bool {
        matches!(self, AgentReply::Followup(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_payload_is_trimmed() {
        assert_eq!(
            AgentReply::decode("COMPLETE:  It's sunny.  ", false),
            AgentReply::Complete {
                content: "It's sunny.".to_string(),
                prefixed: true
            }
        );
    }

    #[test]
    fn test_followup_wins_over_everything() {
        assert_eq!(
            AgentReply::decode("FOLLOWUP: what color?", true),
            AgentReply::Followup("what color?".to_string())
        );
        assert!(AgentReply::decode("  FOLLOWUP:why", false).is_followup());
    }

    #[test]
    fn test_answer_only_when_answering_followup() {
        assert_eq!(
            AgentReply::decode("ANSWER: blue", true),
            AgentReply::Answer {
                content: "blue".to_string(),
                prefixed: true
            }
        );
        assert_eq!(
            AgentReply::decode("Blue, probably.", true),
            AgentReply::Answer {
                content: "Blue, probably.".to_string(),
                prefixed: false
            }
        );
        // Outside a follow-up an ANSWER: reply is just unprefixed output
        assert_eq!(
            AgentReply::decode("ANSWER: blue", false),
            AgentReply::Complete {
                content: "ANSWER: blue".to_string(),
                prefixed: false
            }
        );
    }

    #[test]
    fn test_unprefixed_reply_kept_verbatim() {
        assert_eq!(
            AgentReply::decode("Just the answer ", false),
            AgentReply::Complete {
                content: "Just the answer ".to_string(),
                prefixed: false
            }
        );
    }

    #[test]
    fn test_complete_prefix_inside_followup_answer_is_unprefixed_answer() {
        let reply = AgentReply::decode("COMPLETE: done", true);
        assert_eq!(
            reply,
            AgentReply::Answer {
                content: "COMPLETE: done".to_string(),
                prefixed: false
            }
        );
    }
}
