//! Attachment path resolution and content classification.
//!
//! The store records attachment paths as the Messages app saw them (usually
//! `~/Library/Messages/Attachments/xx/yy/<GUID>/<name>`). [`AttachmentResolver`] maps them onto
//! the configured attachments root; [`classify`] decides which collaborator handles the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use relay_core::ContentKind;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Suffix the Messages app gives the payload attachment of a shared link.
pub const URL_PAYLOAD_SUFFIX: &str = ".pluginPayloadAttachment";

/// Voice memos are always `.caf`, which some mime tables leave unknown.
const VOICE_MEMO_EXTENSION: &str = ".caf";

/// Path segments that locate a file under the attachments root (`xx/yy/<GUID>/<name>`).
const TAIL_SEGMENTS: usize = 4;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "heic", "webp", "bmp", "tiff", "tif"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf", "odt", "pages", "xlsx", "xls"];
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "m4a", "aac", "flac", "ogg", "caf", "aiff", "aif", "amr", "3gp", "opus", "wma",
    "alac", "ape", "au", "mid", "midi",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "wmv", "flv", "mkv", "webm"];

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Directory depth for the basename search under the root.
    pub max_search_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_search_depth: 6 }
    }
}

/// Maps stored attachment paths to files on disk. Only successful lookups are cached.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    root: PathBuf,
    config: ResolverConfig,
    cache: HashMap<String, PathBuf>,
}

impl AttachmentResolver {
    pub fn new(root: impl Into<PathBuf>, config: ResolverConfig) -> Self {
        Self {
            root: root.into(),
            config,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `stored` in order: cache, last four segments under the root, direct join,
    /// basename search.
    pub fn resolve(&mut self, stored: &str) -> Option<PathBuf> {
        let stored = stored.trim();
        if stored.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.get(stored) {
            debug!(attachment = %stored, path = %hit.display(), "Attachment path cache hit");
            return Some(hit.clone());
        }

        let found = self
            .tail_join(stored)
            .or_else(|| self.direct_join(stored))
            .or_else(|| self.search_by_name(stored));

        match found {
            Some(path) => {
                debug!(attachment = %stored, path = %path.display(), "Resolved attachment path");
                self.cache.insert(stored.to_string(), path.clone());
                Some(path)
            }
            None => {
                warn!(attachment = %stored, root = %self.root.display(), "Could not find attachment");
                None
            }
        }
    }

    /// Drops all cached resolutions; returns how many there were.
    pub fn clear_cache(&mut self) -> usize {
        let cleared = self.cache.len();
        self.cache.clear();
        info!(cleared, "Cleared attachment path cache");
        cleared
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn tail_join(&self, stored: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = stored.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < TAIL_SEGMENTS {
            return None;
        }
        let path = segments[segments.len() - TAIL_SEGMENTS..]
            .iter()
            .fold(self.root.clone(), |acc, seg| acc.join(seg));
        path.is_file().then_some(path)
    }

    fn direct_join(&self, stored: &str) -> Option<PathBuf> {
        let path = match stored.strip_prefix("~/") {
            Some(rest) => dirs_next::home_dir()?.join(rest),
            None => self.root.join(stored),
        };
        path.is_file().then_some(path)
    }

    fn search_by_name(&self, stored: &str) -> Option<PathBuf> {
        let name = Path::new(stored).file_name()?;
        WalkDir::new(&self.root)
            .max_depth(self.config.max_search_depth)
            .into_iter()
            .filter_map(Result::ok)
            .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
            .map(|entry| entry.into_path())
    }
}

/// True when `name` is the payload attachment of a shared link.
pub fn is_url_payload(name: &str) -> bool {
    name.trim_end().ends_with(URL_PAYLOAD_SUFFIX)
}

/// Classifies an attachment by extension, then by mime type.
///
/// `filename` is the name as stored; a voice-memo container there forces `Audio` whatever the
/// resolved path looks like.
pub fn classify(path: &Path, mime_type: Option<&str>, filename: &str) -> ContentKind {
    if filename.to_ascii_lowercase().ends_with(VOICE_MEMO_EXTENSION) {
        return ContentKind::Audio;
    }

    let extension = path
        .extension()
        .or_else(|| Path::new(filename).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    if let Some(kind) = extension.as_deref().and_then(kind_for_extension) {
        return kind;
    }

    mime_type
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .and_then(|mime| kind_for_mime(&mime))
        .unwrap_or(ContentKind::Unknown)
}

fn kind_for_extension(ext: &str) -> Option<ContentKind> {
    let tables: [(&[&str], ContentKind); 4] = [
        (IMAGE_EXTENSIONS, ContentKind::Image),
        (DOCUMENT_EXTENSIONS, ContentKind::Document),
        (AUDIO_EXTENSIONS, ContentKind::Audio),
        (VIDEO_EXTENSIONS, ContentKind::Video),
    ];
    tables
        .into_iter()
        .find(|(table, _)| table.contains(&ext))
        .map(|(_, kind)| kind)
}

fn kind_for_mime(mime: &str) -> Option<ContentKind> {
    if mime.starts_with("image/") {
        Some(ContentKind::Image)
    } else if mime.starts_with("audio/") {
        Some(ContentKind::Audio)
    } else if mime.starts_with("video/") {
        Some(ContentKind::Video)
    } else if DOCUMENT_MIME_TYPES.contains(&mime) {
        Some(ContentKind::Document)
    } else {
        None
    }
}
