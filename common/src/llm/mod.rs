pub mod model;

pub use model::{ChatCompletion, ChatModel, Message, MessageRole, ModelConfig};
