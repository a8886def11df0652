//! Console adapter for development/testing

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::Reply;
use crate::domain::traits::{Bot, BotInfo};

/// Console bot adapter for local development. Everything types as one
/// fixed identity.
pub struct ConsoleAdapter {
    info: BotInfo,
}

/// Identity assigned to whoever is on the terminal.
pub const CONSOLE_IDENTITY: &str = "console";

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: name.into(),
                username: "console".to_string(),
            },
        }
    }

    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        use std::io::Write;
        print!("{}", prompt);
        std::io::stdout().flush().ok()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok()?;
        if input.is_empty() {
            return None; // EOF
        }
        Some(input.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_reply(&self, _identity: &str, reply: &Reply) -> Result<String, BotError> {
        println!("[BOT] {}", reply.text);
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
