//! AI Integration Layer
//!
//! HTTP clients for the text and image endpoints, JSON recovery from model
//! output, prompt construction, and timeout scaling.

pub mod client;
pub mod extract;
pub mod image;
pub mod prompt;
pub mod timeout;

pub use client::{ChatClient, ChatCompletion, ChatParams};
pub use extract::extract_json;
pub use image::{GenerateImage, ImageGenerator};
pub use prompt::ArticlePrompt;
pub use timeout::{request_timeout, with_timeout};
