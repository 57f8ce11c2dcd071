/// Role of a chat message as the OpenAI-compatible wire format names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Messages sent for a one-shot query: the configured system prompt followed
/// by the user's question.
pub fn query_messages(system_prompt: &str, question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if !system_prompt.trim().is_empty() {
        messages.push(Message::system(system_prompt));
    }
    messages.push(Message::user(question));
    messages
}

#[cfg(test)]
mod tests {
    use super::{MessageRole, query_messages};

    #[test]
    fn query_messages_lead_with_the_system_prompt() {
        let messages = query_messages("Be precise and concise.", "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "Be precise and concise.");
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn query_messages_skip_a_blank_system_prompt() {
        let messages = query_messages("   ", "hello");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
    }
}
