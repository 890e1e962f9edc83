//! Replied-to attachment extraction.
//!
//! Downloads the attachment of a replied-to message into a scoped
//! temporary file, classifies it, and produces a typed outcome. No
//! error leaves this module: failures are logged and degrade to an
//! unusable-media outcome.

pub mod extract;

pub use extract::{classify_file, sanitize_filename};

use std::path::{Path, PathBuf};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Maximum attachment size accepted for inline upload (20 MB)
const MAX_FILE_SIZE: u32 = 20 * 1024 * 1024;

/// Inline media ready for a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    /// Base64-encoded content
    pub data: String,
    /// Detected MIME type; `None` means the attachment type is unknown
    /// and the payload will not be attached to the request
    pub mime_type: Option<String>,
}

impl MediaPayload {
    /// Whether this payload is plain text extracted from a document.
    #[must_use]
    pub fn is_plain_text(&self) -> bool {
        self.mime_type.as_deref() == Some("text/plain")
    }
}

/// Why an attachment could not be turned into a payload.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Telegram file download failed
    #[error("attachment download failed: {0}")]
    Download(String),
    /// Local file I/O failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// PDF page text could not be extracted
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    /// DOCX paragraph text could not be extracted
    #[error("docx extraction failed: {0}")]
    Docx(String),
    /// Text file decoded to an empty string
    #[error("text file is empty")]
    EmptyText,
    /// Attachment exceeds the inline upload limit
    #[error("attachment too large: {0} bytes")]
    TooLarge(u32),
}

/// Result of looking for media on the replied-to message.
#[derive(Debug)]
pub enum MediaOutcome {
    /// No reply, or the reply carries no attachment
    Absent,
    /// Attachment downloaded and encoded
    Extracted(MediaPayload),
    /// Attachment present but could not be converted; treated as
    /// "no usable media" downstream
    Unreadable(MediaError),
}

impl MediaOutcome {
    /// Whether extraction produced a payload.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }

    /// The extracted payload, if any.
    #[must_use]
    pub fn into_payload(self) -> Option<MediaPayload> {
        match self {
            Self::Extracted(payload) => Some(payload),
            Self::Absent | Self::Unreadable(_) => None,
        }
    }
}

struct Attachment {
    file_id: FileId,
    file_name: String,
    size: u32,
}

/// Find the downloadable attachment of a message, if any.
///
/// Photos, voice notes and videos have no Telegram filename; they get
/// fixed names whose extension carries the canonical type so that
/// classification lands in the raw-bytes branch.
fn attachment_of(msg: &Message) -> Option<Attachment> {
    if let Some(doc) = msg.document() {
        return Some(Attachment {
            file_id: doc.file.id.clone(),
            file_name: doc
                .file_name
                .clone()
                .unwrap_or_else(|| "file".to_string()),
            size: doc.file.size,
        });
    }
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return Some(Attachment {
            file_id: photo.file.id.clone(),
            file_name: "photo.jpg".to_string(),
            size: photo.file.size,
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(Attachment {
            file_id: voice.file.id.clone(),
            file_name: "voice.ogg".to_string(),
            size: voice.file.size,
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(Attachment {
            file_id: audio.file.id.clone(),
            file_name: audio
                .file_name
                .clone()
                .unwrap_or_else(|| "audio.mp3".to_string()),
            size: audio.file.size,
        });
    }
    if let Some(video) = msg.video() {
        return Some(Attachment {
            file_id: video.file.id.clone(),
            file_name: video
                .file_name
                .clone()
                .unwrap_or_else(|| "video.mp4".to_string()),
            size: video.file.size,
        });
    }
    if let Some(animation) = msg.animation() {
        return Some(Attachment {
            file_id: animation.file.id.clone(),
            file_name: animation
                .file_name
                .clone()
                .unwrap_or_else(|| "animation.mp4".to_string()),
            size: animation.file.size,
        });
    }
    None
}

/// A downloaded attachment bound to a temporary directory.
///
/// The directory (and the file inside it) is removed when the value is
/// dropped, on every exit path.
pub struct ScopedDownload {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl ScopedDownload {
    /// Allocate a temporary location for the given attachment name.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn create(file_name: &str) -> Result<Self, MediaError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(sanitize_filename(file_name));
        Ok(Self { _dir: dir, path })
    }

    /// Location of the downloaded file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn download_to(bot: &Bot, attachment: &Attachment, dest: &Path) -> Result<(), MediaError> {
    let file = bot
        .get_file(attachment.file_id.clone())
        .await
        .map_err(|e| MediaError::Download(e.to_string()))?;

    let mut out = tokio::fs::File::create(dest).await?;
    bot.download_file(&file.path, &mut out)
        .await
        .map_err(|e| MediaError::Download(e.to_string()))?;
    out.flush().await?;
    Ok(())
}

async fn fetch_and_classify(bot: &Bot, attachment: &Attachment) -> Result<MediaPayload, MediaError> {
    if attachment.size > MAX_FILE_SIZE {
        return Err(MediaError::TooLarge(attachment.size));
    }

    let scoped = ScopedDownload::create(&attachment.file_name)?;
    download_to(bot, attachment, scoped.path()).await?;
    classify_file(scoped.path())
    // `scoped` drops here: the temporary file is gone before the caller
    // sees the result, success or failure
}

/// Extract inline media from the message the command replied to.
///
/// Never fails: download, I/O and parse errors are logged and reported
/// as [`MediaOutcome::Unreadable`].
pub async fn extract_reply_media(bot: &Bot, msg: &Message) -> MediaOutcome {
    let Some(reply) = msg.reply_to_message() else {
        return MediaOutcome::Absent;
    };
    let Some(attachment) = attachment_of(reply) else {
        return MediaOutcome::Absent;
    };

    match fetch_and_classify(bot, &attachment).await {
        Ok(payload) => MediaOutcome::Extracted(payload),
        Err(e) => {
            warn!(file_name = %attachment.file_name, "media extraction failed: {e}");
            MediaOutcome::Unreadable(e)
        }
    }
}
