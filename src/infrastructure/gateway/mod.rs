mod http_client;
mod openai;

pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::{ModeConfig, OpenAiModelGateway};

#[cfg(test)]
pub use http_client::mock;
