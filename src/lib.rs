pub mod commands;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod link;
pub mod platform;
pub mod progress;
pub mod provider;
pub mod reference;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod ui;
