pub mod chat;
pub mod provider;

pub use chat::OllamaChatModel;
pub use provider::OllamaProvider;
