use thiserror::Error;

use crate::channels::ChannelError;
use crate::panels::StoreError;

/// Handler failures. The first three variants carry the exact reply text
/// and become ephemeral replies; platform and store errors are logged with
/// detail and answered with a generic message.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Platform(#[from] ChannelError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BotError {
    pub fn user_message(&self) -> &str {
        match self {
            BotError::Validation(text)
            | BotError::Authorization(text)
            | BotError::NotFound(text) => text,
            BotError::Platform(_) | BotError::Store(_) => "❌ Erro ao processar a interação!",
        }
    }

    /// Internal failures deserve a log line with the underlying cause;
    /// user mistakes do not.
    pub fn is_internal(&self) -> bool {
        matches!(self, BotError::Platform(_) | BotError::Store(_))
    }
}
