//! Telegram-facing bot layer.

pub mod handlers;
