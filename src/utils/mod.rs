pub mod json;

pub use json::normalize_model_reply;
