//! Deterministic storage layout for fetched resources
//!
//! Resources discovered in markup or stylesheets are stored flat under the output
//! root with a hashed name: those URLs are often anonymous or carry query strings.
//! Resources discovered in scripts or generic data keep their own file name and are
//! bucketed into `images/`, `media/` or `assets/`.
//!
//! The mapping is a pure function of `(url, dialect)`, so a second run against the
//! same output root finds every file where the first run left it.

use crate::config::Config;
use crate::types::{Dialect, ResourcePaths};
use crate::utils::{ResourceClass, file_suffix, is_stylesheet_endpoint, last_segment};
use sha1::{Digest, Sha1};
use std::path::PathBuf;

/// Number of hex characters kept from the URL digest
pub const HASH_LEN: usize = 12;

/// Extension used when a URL path has none
const FALLBACK_EXTENSION: &str = "dat";

/// First [`HASH_LEN`] hex characters of the SHA-1 digest of `url`
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_LEN].to_string()
}

/// Maps URLs to local files and web paths
#[derive(Clone, Debug)]
pub struct PathResolver {
    output_dir: PathBuf,
    web_base: String,
}

impl PathResolver {
    /// Create a resolver writing below `output_dir` and publishing under
    /// `<web_root>/<owner>`
    pub fn new(output_dir: impl Into<PathBuf>, web_root: &str, owner: &str) -> Self {
        let root = web_root.trim_end_matches('/');
        let web_base = if owner.is_empty() {
            root.to_string()
        } else {
            format!("{}/{}", root, owner)
        };
        Self {
            output_dir: output_dir.into(),
            web_base,
        }
    }

    /// Create a resolver from the pipeline configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output_dir, &config.web_root, &config.owner_name())
    }

    /// Output root
    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Resolve the storage location and public address of `url`
    ///
    /// Returns `None` if the URL cannot be parsed.
    pub fn resolve(&self, url: &str, dialect: Dialect) -> Option<ResourcePaths> {
        let parsed = url::Url::parse(url).ok()?;
        let path = parsed.path();

        if dialect.uses_hashed_layout() {
            let ext = if is_stylesheet_endpoint(url) {
                "css"
            } else {
                file_suffix(last_segment(path)).unwrap_or(FALLBACK_EXTENSION)
            };
            let filename = format!("{}.{}", url_hash(url), ext);

            return Some(ResourcePaths {
                local_path: self.output_dir.join(&filename),
                web_path: format!("{}/{}", self.web_base, filename),
            });
        }

        let segment = last_segment(path);
        let filename = if segment.is_empty() {
            format!("{}.{}", url_hash(url), FALLBACK_EXTENSION)
        } else {
            segment.to_string()
        };

        let ext = file_suffix(&filename).map(str::to_ascii_lowercase);
        let bucket = ResourceClass::from_extension(ext.as_deref()).dir_name();

        Some(ResourcePaths {
            local_path: self.output_dir.join(bucket).join(&filename),
            web_path: format!("{}/{}/{}", self.web_base, bucket, filename),
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/srv/public/niko/Alice", "/niko", "Alice")
    }

    #[test]
    fn test_url_hash_is_sha1_prefix() {
        // SHA-1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
        assert_eq!(url_hash("abc"), "a9993e364706");
        assert_eq!(url_hash("abc").len(), HASH_LEN);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = resolver();
        for dialect in [
            Dialect::Generic,
            Dialect::Markup,
            Dialect::Stylesheet,
            Dialect::Script,
        ] {
            let url = "https://cdn.example.com/fonts/a.woff2?v=3";
            assert_eq!(r.resolve(url, dialect), r.resolve(url, dialect));
            assert_eq!(
                r.resolve(url, dialect),
                resolver().resolve(url, dialect),
                "a fresh resolver must agree"
            );
        }
    }

    #[test]
    fn test_generic_image_goes_to_images_bucket() {
        let paths = resolver()
            .resolve("https://img.example.com/a.png", Dialect::Generic)
            .unwrap();
        assert_eq!(
            paths.local_path,
            PathBuf::from("/srv/public/niko/Alice/images/a.png")
        );
        assert_eq!(paths.web_path, "/niko/Alice/images/a.png");
    }

    #[test]
    fn test_script_media_and_assets_buckets() {
        let r = resolver();
        let media = r
            .resolve("https://x.example.com/sfx/Boom.MP3", Dialect::Script)
            .unwrap();
        assert_eq!(media.web_path, "/niko/Alice/media/Boom.MP3");

        let font = r
            .resolve("https://x.example.com/f/font.woff2", Dialect::Script)
            .unwrap();
        assert_eq!(font.web_path, "/niko/Alice/assets/font.woff2");
    }

    #[test]
    fn test_generic_empty_basename_falls_back_to_hash() {
        let url = "https://x.example.com/dir/";
        let paths = resolver().resolve(url, Dialect::Generic).unwrap();
        let expected = format!("{}.dat", url_hash(url));
        assert_eq!(paths.web_path, format!("/niko/Alice/assets/{}", expected));
    }

    #[test]
    fn test_stylesheet_layout_is_flat_and_hashed() {
        let url = "https://cdn.example.com/style.css";
        let paths = resolver().resolve(url, Dialect::Stylesheet).unwrap();
        let filename = format!("{}.css", url_hash(url));
        assert_eq!(
            paths.local_path,
            PathBuf::from("/srv/public/niko/Alice").join(&filename)
        );
        assert_eq!(paths.web_path, format!("/niko/Alice/{}", filename));
    }

    #[test]
    fn test_markup_keeps_extension_case_and_defaults_to_dat() {
        let r = resolver();
        let upper = "https://cdn.example.com/Logo.PNG";
        assert!(
            r.resolve(upper, Dialect::Markup)
                .unwrap()
                .web_path
                .ends_with(".PNG")
        );

        let bare = "https://cdn.example.com/blob";
        assert!(
            r.resolve(bare, Dialect::Markup)
                .unwrap()
                .web_path
                .ends_with(".dat")
        );
    }

    #[test]
    fn test_stylesheet_endpoint_forced_to_css() {
        let url = "https://fonts.googleapis.com/css2?family=Inter:wght@400";
        let paths = resolver().resolve(url, Dialect::Markup).unwrap();
        assert!(paths.web_path.ends_with(".css"));
        assert_eq!(paths.local_path.extension().unwrap(), "css");
    }

    #[test]
    fn test_dialect_changes_layout_for_same_url() {
        let r = resolver();
        let url = "https://cdn.example.com/style.css";
        let generic = r.resolve(url, Dialect::Generic).unwrap();
        let markup = r.resolve(url, Dialect::Markup).unwrap();
        assert_eq!(generic.web_path, "/niko/Alice/assets/style.css");
        assert_ne!(generic, markup);
    }

    #[test]
    fn test_unparseable_url_is_rejected() {
        assert!(resolver().resolve("not a url", Dialect::Generic).is_none());
    }

    #[test]
    fn test_web_root_trailing_slash_is_normalized() {
        let r = PathResolver::new("/out", "/public/", "Bob");
        let paths = r
            .resolve("https://x.example.com/a.gif", Dialect::Generic)
            .unwrap();
        assert_eq!(paths.web_path, "/public/Bob/images/a.gif");
    }
}
