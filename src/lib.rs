pub mod app;
pub mod chat;
pub mod config;
pub mod history;
pub mod llm;
pub mod shared;
pub mod tui;
