mod client;

pub use client::{AzureOpenAIClient, AzureOpenAIClientBuilder, DEFAULT_API_VERSION};
