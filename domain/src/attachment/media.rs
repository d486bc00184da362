//! Media types and the inline-vs-upload delivery policy.

/// Declared type for extensions missing from the table.
pub const GENERIC_BINARY: &str = "application/octet-stream";

/// Declared type used for markdown, which the endpoint does not accept natively.
pub const PLAIN_TEXT: &str = "text/plain";

/// Files above this size are always uploaded (20 MiB).
pub const DEFAULT_INLINE_LIMIT_BYTES: u64 = 20 * 1024 * 1024;

/// Extensions that need server-side preprocessing and are never inlined.
pub const MUST_UPLOAD_EXTENSIONS: &[&str] = &["pdf"];

/// Extensions always re-declared as [`PLAIN_TEXT`].
const PLAIN_TEXT_OVERRIDES: &[&str] = &["md", "markdown"];

const MEDIA_TYPES: &[(&str, &str)] = &[
    // Text and code
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("xml", "text/xml"),
    ("rtf", "text/rtf"),
    ("js", "text/javascript"),
    ("ts", "text/plain"),
    ("py", "text/x-python"),
    ("rs", "text/plain"),
    ("json", "application/json"),
    // Documents
    ("pdf", "application/pdf"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("aac", "audio/aac"),
    ("m4a", "audio/mp4"),
    // Video
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
];

/// Media type for a (lowercase) extension, [`GENERIC_BINARY`] when unknown.
pub fn media_type_for_extension(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return GENERIC_BINARY;
    };
    MEDIA_TYPES
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(GENERIC_BINARY)
}

/// Media type to declare to the endpoint, with the markdown override applied.
pub fn declared_media_type(extension: Option<&str>) -> &'static str {
    if let Some(ext) = extension
        && PLAIN_TEXT_OVERRIDES.iter().any(|o| o.eq_ignore_ascii_case(ext))
    {
        return PLAIN_TEXT;
    }
    media_type_for_extension(extension)
}

/// How one attachment reaches the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Bytes read locally and embedded base64-encoded.
    Inline,
    /// Uploaded to the Directory Service and referenced by URI.
    Upload,
}

/// What the policy needs to know about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    pub extension: Option<String>,
    pub size_bytes: u64,
}

impl FileFacts {
    pub fn new(extension: Option<String>, size_bytes: u64) -> Self {
        Self {
            extension,
            size_bytes,
        }
    }
}

/// Size/type thresholds deciding inline vs upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPolicy {
    pub inline_limit_bytes: u64,
    pub must_upload: Vec<String>,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            inline_limit_bytes: DEFAULT_INLINE_LIMIT_BYTES,
            must_upload: MUST_UPLOAD_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MediaPolicy {
    pub fn with_inline_limit(mut self, bytes: u64) -> Self {
        self.inline_limit_bytes = bytes;
        self
    }

    /// Delivery for a single file considered on its own.
    pub fn delivery_for(&self, file: &FileFacts) -> Delivery {
        let oversized = file.size_bytes > self.inline_limit_bytes;
        let must_upload = file
            .extension
            .as_deref()
            .is_some_and(|ext| self.must_upload.iter().any(|m| m.eq_ignore_ascii_case(ext)));

        if oversized || must_upload {
            Delivery::Upload
        } else {
            Delivery::Inline
        }
    }

    /// Delivery shared by every file of one turn.
    ///
    /// If any file needs uploading, all of them are uploaded, so a turn never
    /// mixes inline and remote parts.
    pub fn delivery_for_batch<'a>(&self, files: impl IntoIterator<Item = &'a FileFacts>) -> Delivery {
        if files
            .into_iter()
            .any(|f| self.delivery_for(f) == Delivery::Upload)
        {
            Delivery::Upload
        } else {
            Delivery::Inline
        }
    }
}

/// Formats the endpoint accepts, for actionable unsupported-type messages.
pub fn accepted_formats_hint() -> &'static str {
    "PDF, TXT, MD, CSV, JSON, PNG, JPG, GIF, WEBP, MP3, WAV, OGG, MP4"
}
