pub mod app;
pub mod archive;
pub mod cleanup;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod runtime;
pub mod update;
