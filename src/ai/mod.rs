pub mod gateway;
pub mod prompt;

pub use gateway::{ChatGateway, ChatRequest, HttpGateway};
