// src/services/classifier.rs

//! Link classification.
//!
//! Maps a raw post URL to the shape that decides how the meme is enriched
//! and formatted. Classification is pure and total: every string lands in
//! some [`LinkKind`], with [`LinkKind::Generic`] as the fallback.

use std::sync::LazyLock;

use regex::Regex;

/// Hosts that serve the image file itself.
const DIRECT_HOSTS: [&str; 2] = ["i.imgur.com/", "i.redd.it/"];

static ALBUM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"imgur\.com/(?:a|album)/").expect("valid album pattern")
});

static GALLERY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"imgur\.com/(?:g|gallery)/").expect("valid gallery pattern")
});

static GIF_SERVICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"giphy\.com/gifs/").expect("valid gif pattern")
});

/// Shape of a meme link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Direct link to an image file
    Direct,
    /// Imgur single-image entry point, needs resolution
    Image,
    /// Imgur album
    Album,
    /// Imgur gallery post
    Gallery,
    /// Giphy page
    GifService,
    /// Anything else, posted as-is
    Generic,
}

/// Classify a link. First matching rule wins.
pub fn classify(link: &str) -> LinkKind {
    if DIRECT_HOSTS.iter().any(|host| link.contains(host)) {
        LinkKind::Direct
    } else if ALBUM_PATTERN.is_match(link) {
        LinkKind::Album
    } else if GALLERY_PATTERN.is_match(link) {
        LinkKind::Gallery
    } else if GIF_SERVICE_PATTERN.is_match(link) {
        LinkKind::GifService
    } else if link.contains("imgur.com/") {
        LinkKind::Image
    } else {
        LinkKind::Generic
    }
}
