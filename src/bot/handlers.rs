//! Command and photo message handlers
//!
//! The photo workflow is split into an inner step function returning
//! `Result<Bytes, WorkflowError>`; the handler matches on the outcome so
//! every request ends in exactly one user-visible terminal state.

use crate::config::{
    OUTPUT_FILE_NAME, PROCESSING_ERROR_MESSAGE, PROCESSING_MESSAGE, RESULT_CAPTION,
    UNSUPPORTED_FORMAT_MESSAGE, WELCOME_MESSAGE,
};
use crate::removal::{self, RemoveBgClient};
use anyhow::Result;
use bytes::Bytes;
use std::sync::Arc;
use teloxide::{
    net::Download,
    prelude::*,
    types::{InputFile, ParseMode},
    utils::command::BotCommands,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Start the bot and show the welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Show the welcome/help message
    #[command(description = "Show help.")]
    Help,
}

/// Failure of a single step of the photo workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Telegram could not deliver the photo file
    #[error("failed to download photo: {0}")]
    Download(String),
    /// Suffix-derived MIME type is not in the supported set
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    /// The background-removal service returned the absence signal
    #[error("background removal service returned no result")]
    Upstream,
}

impl WorkflowError {
    /// Fixed user-facing text for this error category.
    ///
    /// Only the unsupported-format case gets its own message; download,
    /// upstream, and unknown failures all collapse to the generic text.
    #[must_use]
    pub fn user_text(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => UNSUPPORTED_FORMAT_MESSAGE,
            Self::Download(_) | Self::Upstream => PROCESSING_ERROR_MESSAGE,
        }
    }
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Handle the /start command
///
/// # Errors
///
/// Returns an error if sending the welcome message fails.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    info!(user_id = get_user_id_safe(&msg), "Start command received");
    bot.send_message(msg.chat.id, WELCOME_MESSAGE)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Handle the /help command
///
/// # Errors
///
/// Returns an error if sending the help message fails.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    info!(user_id = get_user_id_safe(&msg), "Help command received");
    bot.send_message(msg.chat.id, WELCOME_MESSAGE)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Process an uploaded photo and reply with the background removed.
///
/// Sends a status message, runs the workflow, and resolves to exactly one
/// terminal outcome: a document attachment on success, or the status
/// message edited to the categorized error text.
///
/// # Errors
///
/// Returns an error only when Telegram itself rejects a send/edit; the
/// caller reports those to the user as the generic processing error.
pub async fn handle_photo(bot: Bot, msg: Message, client: Arc<RemoveBgClient>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!(user_id, "Processing image request");

    let status = bot.send_message(msg.chat.id, PROCESSING_MESSAGE).await?;

    match run_workflow(&bot, &msg, &client).await {
        Ok(processed) => {
            let document = InputFile::memory(processed).file_name(OUTPUT_FILE_NAME);
            bot.send_document(msg.chat.id, document)
                .caption(RESULT_CAPTION)
                .await?;

            // The result is already delivered at this point: a failed
            // status-message cleanup must not surface as an error reply.
            if let Err(e) = bot.delete_message(msg.chat.id, status.id).await {
                warn!(user_id, "Failed to delete status message: {e}");
            }
            info!(user_id, "Image processing completed successfully");
        }
        Err(err) => {
            warn!(user_id, "Image workflow failed: {err}");
            bot.edit_message_text(msg.chat.id, status.id, err.user_text())
                .await?;
        }
    }

    Ok(())
}

/// Download, validate, and submit the photo. One step per failure kind.
async fn run_workflow(
    bot: &Bot,
    msg: &Message,
    client: &RemoveBgClient,
) -> Result<Bytes, WorkflowError> {
    // Telegram orders photo variants by resolution, largest last
    let photo = msg.photo().and_then(|sizes| sizes.last()).ok_or_else(|| {
        WorkflowError::Download("message contains no photo variants".to_string())
    })?;
    debug!(file_id = ?photo.file.id, "Selected largest photo variant");

    let file = bot
        .get_file(photo.file.id.clone())
        .await
        .map_err(|e| WorkflowError::Download(e.to_string()))?;

    let mut buffer = Vec::new();
    bot.download_file(&file.path, &mut buffer)
        .await
        .map_err(|e| WorkflowError::Download(e.to_string()))?;
    debug!(bytes = buffer.len(), "Downloaded image");

    let mime_type = mime_from_path(&file.path);
    if !removal::is_supported_format(&mime_type) {
        return Err(WorkflowError::UnsupportedFormat(mime_type));
    }

    client
        .remove_background(buffer)
        .await
        .ok_or(WorkflowError::Upstream)
}

/// Derive a MIME type hint from a file path suffix.
///
/// Lower-cased substring after the last `.`; a path without a dot yields
/// the whole path as the hint. Purely suffix-based, no byte sniffing.
fn mime_from_path(path: &str) -> String {
    let suffix = path.rsplit('.').next().unwrap_or(path);
    format!("image/{}", suffix.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path("photos/file_0.png"), "image/png");
        assert_eq!(mime_from_path("photos/file_1.PNG"), "image/png");
        assert_eq!(mime_from_path("a/b/photo.JPg"), "image/jpg");
        assert_eq!(mime_from_path("archive.tar.gz"), "image/gz");
        // No extension: the whole path becomes the hint (and fails validation)
        assert_eq!(mime_from_path("noext"), "image/noext");
    }

    #[test]
    fn test_png_path_passes_validation() {
        assert!(removal::is_supported_format(&mime_from_path("photo.png")));
        assert!(removal::is_supported_format(&mime_from_path("photo.jpg")));
    }

    #[test]
    fn test_bmp_path_fails_validation() {
        assert!(!removal::is_supported_format(&mime_from_path("photo.bmp")));
    }

    #[test]
    fn test_user_text_mapping() {
        let unsupported = WorkflowError::UnsupportedFormat("image/bmp".to_string());
        assert_eq!(unsupported.user_text(), UNSUPPORTED_FORMAT_MESSAGE);

        let download = WorkflowError::Download("file gone".to_string());
        assert_eq!(download.user_text(), PROCESSING_ERROR_MESSAGE);

        assert_eq!(WorkflowError::Upstream.user_text(), PROCESSING_ERROR_MESSAGE);
    }

    #[test]
    fn test_command_parsing() {
        assert!(matches!(Command::parse("/start", "testbot"), Ok(Command::Start)));
        assert!(matches!(Command::parse("/help", "testbot"), Ok(Command::Help)));
        assert!(Command::parse("/unknown", "testbot").is_err());
    }
}
