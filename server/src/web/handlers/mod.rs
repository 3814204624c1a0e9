// server/src/web/handlers/mod.rs

pub mod auth_handlers;
