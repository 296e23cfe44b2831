//! Telegram bot that removes image backgrounds via the remove.bg API.
//!
//! The bot receives photo messages, downloads the largest variant,
//! validates the declared format, submits the bytes to remove.bg, and
//! returns the processed image as a document attachment.

/// Telegram command and message handlers.
pub mod bot;
/// Settings and user-facing text constants.
pub mod config;
/// remove.bg client and the supported-format set.
pub mod removal;
