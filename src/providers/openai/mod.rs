pub mod chat;
pub mod provider;

pub use chat::OpenAIChatModel;
pub use provider::OpenAIProvider;
