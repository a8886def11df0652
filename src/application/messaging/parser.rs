//! Message parser - Parses raw chat text into structured events

use crate::domain::entities::Incoming;

/// Parses incoming text into [`Incoming`] events, splitting `/command`
/// tokens from free text.
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse one raw message.
    ///
    /// Anything starting with the command prefix is a command; the token
    /// is lowercased and anything after the first whitespace is dropped.
    /// Everything else stays verbatim as free text, since it may be a
    /// password attempt.
    pub fn parse(&self, identity: impl Into<String>, text: impl Into<String>) -> Incoming {
        let text = text.into();
        let identity = identity.into();

        if let Some(rest) = text.trim_start().strip_prefix(&self.command_prefix) {
            let name = rest
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_lowercase();
            return Incoming::from_command(identity, name);
        }

        Incoming::from_text(identity, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Content;

    #[test]
    fn parses_commands() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "/register");
        assert_eq!(msg.content, Content::Command("register".to_string()));
    }

    #[test]
    fn command_token_ignores_args_and_case() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "/Login now please");
        assert_eq!(msg.content, Content::Command("login".to_string()));
    }

    #[test]
    fn free_text_is_kept_verbatim() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "  hunter2  ");
        assert_eq!(msg.content, Content::Text("  hunter2  ".to_string()));
    }

    #[test]
    fn custom_prefix() {
        let parser = MessageParser::new("!");
        let msg = parser.parse("42", "!help");
        assert_eq!(msg.content, Content::Command("help".to_string()));
        let msg = parser.parse("42", "/help");
        assert_eq!(msg.content, Content::Text("/help".to_string()));
    }
}
