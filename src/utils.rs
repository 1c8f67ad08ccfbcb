//! Utility functions shared by path resolution and extraction

/// Path fragment identifying the extensionless stylesheet delivery endpoint
/// (Google Fonts CSS API). It is admitted without an allow-listed extension
/// and always stored as `.css`.
pub const STYLESHEET_ENDPOINT: &str = "googleapis.com/css";

/// Image extensions (stored under `images/` in script/generic layout)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

/// Audio and video extensions (stored under `media/` in script/generic layout)
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "m4a", "flac", "mid", "mp4", "webm", "mov", "avi",
];

/// Fonts, styles, scripts and data formats (stored under `assets/`)
pub const ASSET_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf", "css", "js", "json", "txt"];

/// Storage bucket of a resource in the script/generic layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceClass {
    /// Raster and vector images
    Image,
    /// Audio and video
    Media,
    /// Everything else (fonts, styles, scripts, data)
    Asset,
}

impl ResourceClass {
    /// Classify a lowercase extension (without the leading dot)
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext {
            Some(e) if IMAGE_EXTENSIONS.contains(&e) => ResourceClass::Image,
            Some(e) if MEDIA_EXTENSIONS.contains(&e) => ResourceClass::Media,
            _ => ResourceClass::Asset,
        }
    }

    /// Subdirectory name below the output root
    pub fn dir_name(self) -> &'static str {
        match self {
            ResourceClass::Image => "images",
            ResourceClass::Media => "media",
            ResourceClass::Asset => "assets",
        }
    }
}

/// Whether a lowercase extension (without the leading dot) is allow-listed
pub fn is_allowed_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext) || MEDIA_EXTENSIONS.contains(&ext) || ASSET_EXTENSIONS.contains(&ext)
}

/// Whether a URL points at the extensionless stylesheet endpoint
pub fn is_stylesheet_endpoint(url: &str) -> bool {
    url.contains(STYLESHEET_ENDPOINT)
}

/// Final segment of a URL path (empty for paths ending in `/`)
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Extension of a file name as written, without the leading dot
///
/// Dotfiles (`.bashrc`) and trailing dots (`name.`) have no extension.
pub fn file_suffix(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// Lowercase extension of the last segment of a URL path
pub fn path_extension(path: &str) -> Option<String> {
    file_suffix(last_segment(path)).map(str::to_ascii_lowercase)
}

/// Reduce an owner name to characters that are safe in a URL path segment
///
/// Keeps alphanumerics, spaces, `_` and `-`, then trims trailing whitespace.
///
/// # Examples
///
/// ```
/// use asset_localizer::utils::sanitize_owner_name;
///
/// assert_eq!(sanitize_owner_name("Alice: the <Brave>!"), "Alice the Brave");
/// ```
pub fn sanitize_owner_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    kept.trim_end().to_string()
}
