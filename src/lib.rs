pub mod arxiv;
pub mod cache;
pub mod chat;
pub mod config;
pub mod context;
pub mod gateway;
pub mod model;
pub mod ollama;
