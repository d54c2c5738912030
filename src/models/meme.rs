//! Meme data structure and its post formatting.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{AppError, Result};
use crate::services::ImageHost;
use crate::services::classifier::{LinkKind, classify};

/// Hashtags every non-text post starts with; the source subreddit is appended.
const HASHTAGS: &str = "#memes #dankmemes #funny";

/// Image-host details resolved for a container or ambiguous link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDigest {
    /// Images in the container; 0 for a single image
    pub image_count: u32,
    /// Direct link to the first (or only) image
    pub first_image_link: String,
}

impl ImageDigest {
    pub fn single(link: impl Into<String>) -> Self {
        Self {
            image_count: 0,
            first_image_link: link.into(),
        }
    }
}

/// Link shape of a meme together with its variant payload.
///
/// `Image`, `Album` and `Gallery` carry `None` until digested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemeKind {
    Direct,
    Image(Option<ImageDigest>),
    Album(Option<ImageDigest>),
    Gallery(Option<ImageDigest>),
    GifService,
    Text { body: String },
    Generic,
}

impl MemeKind {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            MemeKind::Direct => "direct",
            MemeKind::Image(_) => "image",
            MemeKind::Album(_) => "album",
            MemeKind::Gallery(_) => "gallery",
            MemeKind::GifService => "gif",
            MemeKind::Text { .. } => "text",
            MemeKind::Generic => "generic",
        }
    }
}

impl From<LinkKind> for MemeKind {
    fn from(kind: LinkKind) -> Self {
        match kind {
            LinkKind::Direct => MemeKind::Direct,
            LinkKind::Image => MemeKind::Image(None),
            LinkKind::Album => MemeKind::Album(None),
            LinkKind::Gallery => MemeKind::Gallery(None),
            LinkKind::GifService => MemeKind::GifService,
            LinkKind::Generic => MemeKind::Generic,
        }
    }
}

/// Caption and optional media link ready for the posting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    pub caption: String,
    pub media_link: Option<String>,
}

/// A candidate post discovered in a subreddit listing.
///
/// Identity is the `(link, source)` pair.
#[derive(Debug, Clone)]
pub struct Meme {
    /// Canonical source URL
    pub link: String,

    /// Subreddit the meme came from
    pub source: String,

    pub kind: MemeKind,
}

impl Meme {
    /// Build a meme from a link, classifying its shape.
    pub fn new(link: impl Into<String>, source: impl Into<String>) -> Self {
        let link = link.into();
        let kind = classify(&link).into();
        Self {
            link,
            source: source.into(),
            kind,
        }
    }

    /// Build a text-only meme.
    pub fn text(body: impl Into<String>, link: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            source: source.into(),
            kind: MemeKind::Text { body: body.into() },
        }
    }

    /// Whether the meme can be formatted without the generic fallback.
    pub fn is_digested(&self) -> bool {
        match &self.kind {
            MemeKind::Image(digest) | MemeKind::Album(digest) | MemeKind::Gallery(digest) => {
                digest.is_some()
            }
            _ => true,
        }
    }

    /// Resolve container and ambiguous image links through the image host.
    ///
    /// No-op for variants that need no enrichment or are already digested.
    /// On failure the meme is left untouched.
    pub async fn digest(&mut self, host: &dyn ImageHost) -> Result<()> {
        let resolved = match &self.kind {
            MemeKind::Image(None) => host.image(image_id(&self.link)).await?,
            MemeKind::Album(None) => host.album(album_id(&self.link)).await?,
            MemeKind::Gallery(None) => host.gallery_item(gallery_id(&self.link)).await?,
            _ => return Ok(()),
        };

        log::debug!(
            "Digested {} meme {}: {} image(s), first {}",
            self.kind.name(),
            self.link,
            resolved.image_count,
            resolved.first_image_link
        );

        if let MemeKind::Image(slot) | MemeKind::Album(slot) | MemeKind::Gallery(slot) =
            &mut self.kind
        {
            *slot = Some(resolved);
        }
        Ok(())
    }

    /// Caption for link-based posts.
    pub fn generic_caption(&self) -> String {
        format!("{} #{}", HASHTAGS, self.source)
    }

    /// Format the meme for the posting API.
    ///
    /// Fails with [`AppError::NotDigested`] for an undigested image-host link.
    pub fn format_for_post(&self) -> Result<PostContent> {
        let not_digested = || AppError::NotDigested {
            link: self.link.clone(),
        };

        let content = match &self.kind {
            MemeKind::Direct => PostContent {
                caption: self.generic_caption(),
                media_link: Some(strip_video_suffix(&self.link)),
            },
            MemeKind::Image(digest) => {
                let digest = digest.as_ref().ok_or_else(not_digested)?;
                PostContent {
                    caption: self.generic_caption(),
                    media_link: Some(strip_video_suffix(&digest.first_image_link)),
                }
            }
            MemeKind::Album(digest) | MemeKind::Gallery(digest) => {
                let digest = digest.as_ref().ok_or_else(not_digested)?;
                let mut caption = self.generic_caption();
                if digest.image_count > 1 {
                    caption.push_str(&format!(
                        "\n{} more at {}",
                        digest.image_count - 1,
                        self.link
                    ));
                }
                PostContent {
                    caption,
                    media_link: Some(strip_video_suffix(&digest.first_image_link)),
                }
            }
            MemeKind::GifService => PostContent {
                caption: self.generic_caption(),
                media_link: Some(giphy_media_link(&self.link)),
            },
            MemeKind::Text { body } => PostContent {
                caption: body.clone(),
                media_link: None,
            },
            MemeKind::Generic => PostContent {
                caption: self.generic_caption(),
                media_link: Some(self.link.clone()),
            },
        };
        Ok(content)
    }

    /// Format the meme, falling back to the generic caption and raw link.
    pub fn format_or_fallback(&self) -> PostContent {
        self.format_for_post().unwrap_or_else(|e| {
            log::warn!("Formatting {} fell back to generic caption: {}", self, e);
            PostContent {
                caption: self.generic_caption(),
                media_link: Some(self.link.clone()),
            }
        })
    }
}

impl PartialEq for Meme {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link && self.source == other.source
    }
}

impl Eq for Meme {}

impl Hash for Meme {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
        self.source.hash(state);
    }
}

impl fmt::Display for Meme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {}: {}", self.source, self.link)
    }
}

/// `.gifv` is a video container; the `.gif` rendition sits at the same path.
fn strip_video_suffix(link: &str) -> String {
    let (path, rest) = link.split_at(link.find(['?', '#']).unwrap_or(link.len()));
    match path.strip_suffix(".gifv") {
        Some(stem) => format!("{stem}.gif{rest}"),
        None => link.to_string(),
    }
}

/// Example: `http://giphy.com/gifs/funny-lol-gif-fJIZa8yIfiEFi`
fn giphy_media_link(link: &str) -> String {
    let segment = last_segment(link_path(link));
    let hash = segment.rsplit('-').next().unwrap_or(segment);
    format!("https://media.giphy.com/media/{hash}/giphy.gif")
}

/// `imgur.com/{image_id}` or `imgur.com/{image_id}.{ext}`
fn image_id(link: &str) -> &str {
    let last = last_segment(link_path(link));
    last.split('.').next().unwrap_or(last)
}

/// `imgur.com/a/{album_id}` or `imgur.com/a/{album_id}#{image_id}`
fn album_id(link: &str) -> &str {
    last_segment(link_path(link))
}

/// `imgur.com/gallery/{post_id}` or `imgur.com/gallery/{post_id}/new`
fn gallery_id(link: &str) -> &str {
    let path = link_path(link);
    last_segment(path.strip_suffix("/new").unwrap_or(path))
}

/// Link without query, fragment or trailing slashes.
fn link_path(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.trim_end_matches('/')
}

fn last_segment(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::FakeImageHost;

    #[test]
    fn direct_meme_formats_with_source_hashtag() {
        let meme = Meme::new("https://i.imgur.com/abc123.jpg", "pics");
        assert_eq!(meme.kind, MemeKind::Direct);

        let content = meme.format_for_post().unwrap();
        assert_eq!(content.caption, "#memes #dankmemes #funny #pics");
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://i.imgur.com/abc123.jpg")
        );
    }

    #[test]
    fn gifv_links_point_at_gif_rendition() {
        let meme = Meme::new("https://i.imgur.com/abc123.gifv", "gifs");
        let content = meme.format_for_post().unwrap();
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://i.imgur.com/abc123.gif")
        );
    }

    #[test]
    fn digested_album_mentions_remaining_images() {
        let mut meme = Meme::new("https://imgur.com/a/XYZ789", "funny");
        assert!(matches!(meme.kind, MemeKind::Album(None)));

        meme.kind = MemeKind::Album(Some(ImageDigest {
            image_count: 3,
            first_image_link: "https://i.imgur.com/first.jpg".into(),
        }));

        let content = meme.format_for_post().unwrap();
        assert_eq!(
            content.caption,
            "#memes #dankmemes #funny #funny\n2 more at https://imgur.com/a/XYZ789"
        );
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://i.imgur.com/first.jpg")
        );
    }

    #[test]
    fn single_image_gallery_has_plain_caption() {
        let mut meme = Meme::new("https://imgur.com/gallery/Qw3rty", "memes");
        meme.kind = MemeKind::Gallery(Some(ImageDigest::single("https://i.imgur.com/q.png")));

        let content = meme.format_for_post().unwrap();
        assert_eq!(content.caption, "#memes #dankmemes #funny #memes");
        assert_eq!(content.media_link.as_deref(), Some("https://i.imgur.com/q.png"));
    }

    #[test]
    fn fresh_imgur_variants_refuse_to_format() {
        for link in [
            "https://imgur.com/a/XYZ789",
            "https://imgur.com/gallery/XYZ789",
            "https://imgur.com/XYZ789",
        ] {
            let meme = Meme::new(link, "funny");
            assert!(!meme.is_digested());
            assert!(matches!(
                meme.format_for_post(),
                Err(AppError::NotDigested { .. })
            ));
        }
    }

    #[test]
    fn fallback_uses_generic_caption_and_raw_link() {
        let meme = Meme::new("https://imgur.com/a/XYZ789", "funny");
        let content = meme.format_or_fallback();
        assert_eq!(content.caption, "#memes #dankmemes #funny #funny");
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://imgur.com/a/XYZ789")
        );
    }

    #[test]
    fn giphy_links_are_rewritten_to_media_host() {
        let meme = Meme::new("http://giphy.com/gifs/funny-lol-gif-fJIZa8yIfiEFi", "gifs");
        assert_eq!(meme.kind, MemeKind::GifService);

        let content = meme.format_for_post().unwrap();
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://media.giphy.com/media/fJIZa8yIfiEFi/giphy.gif")
        );
    }

    #[test]
    fn giphy_links_without_slug_keep_only_the_hash() {
        let meme = Meme::new("https://giphy.com/gifs/fJIZa8yIfiEFi", "gifs");
        assert_eq!(meme.kind, MemeKind::GifService);

        let content = meme.format_for_post().unwrap();
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://media.giphy.com/media/fJIZa8yIfiEFi/giphy.gif")
        );
        assert_eq!(
            giphy_media_link("https://giphy.com/gifs/funny-fJIZa8yIfiEFi/?utm_source=x"),
            "https://media.giphy.com/media/fJIZa8yIfiEFi/giphy.gif"
        );
    }

    #[test]
    fn gifv_suffix_is_matched_on_the_path() {
        assert_eq!(
            strip_video_suffix("https://i.imgur.com/abc.gifv?1"),
            "https://i.imgur.com/abc.gif?1"
        );
        assert_eq!(
            strip_video_suffix("https://example.com/x.png?f=.gifv"),
            "https://example.com/x.png?f=.gifv"
        );
    }

    #[test]
    fn text_meme_posts_body_without_media() {
        let meme = Meme::text(
            "Sleep is a free trial of death",
            "https://www.reddit.com/r/Showerthoughts/comments/abc/",
            "Showerthoughts",
        );
        assert!(meme.is_digested());

        let content = meme.format_for_post().unwrap();
        assert_eq!(content.caption, "Sleep is a free trial of death");
        assert!(content.media_link.is_none());
    }

    #[test]
    fn generic_meme_posts_raw_link() {
        let meme = Meme::new("https://example.com/meme.png", "memes");
        let content = meme.format_for_post().unwrap();
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://example.com/meme.png")
        );
    }

    #[test]
    fn equality_uses_link_and_source_only() {
        let mut a = Meme::new("https://imgur.com/a/XYZ789", "funny");
        let b = Meme::new("https://imgur.com/a/XYZ789", "funny");
        let c = Meme::new("https://imgur.com/a/XYZ789", "memes");
        a.kind = MemeKind::Album(Some(ImageDigest::single("https://i.imgur.com/x.jpg")));

        assert_eq!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn identifiers_are_extracted_from_entry_points() {
        assert_eq!(image_id("https://imgur.com/AbC12.jpg"), "AbC12");
        assert_eq!(album_id("https://imgur.com/a/XYZ789#img1"), "XYZ789");
        assert_eq!(gallery_id("https://imgur.com/gallery/G4ll3ry/new"), "G4ll3ry");
        assert_eq!(gallery_id("https://imgur.com/gallery/G4ll3ry/"), "G4ll3ry");
        assert_eq!(gallery_id("https://imgur.com/gallery/newAbc"), "newAbc");
        assert_eq!(gallery_id("https://imgur.com/gallery/newAbc/new"), "newAbc");
        assert_eq!(image_id("https://imgur.com/AbC12?r"), "AbC12");
    }

    #[tokio::test]
    async fn digest_resolves_album_through_host() {
        let host = FakeImageHost::default().with_album(
            "XYZ789",
            ImageDigest {
                image_count: 3,
                first_image_link: "https://i.imgur.com/first.jpg".into(),
            },
        );
        let mut meme = Meme::new("https://imgur.com/a/XYZ789", "funny");

        meme.digest(&host).await.unwrap();

        assert!(meme.is_digested());
        assert_eq!(host.calls(), 1);
    }

    #[tokio::test]
    async fn digest_resolves_image_through_host() {
        let host = FakeImageHost::default()
            .with_image("AbC12", ImageDigest::single("https://i.imgur.com/AbC12.gifv"));
        let mut meme = Meme::new("https://imgur.com/AbC12.jpg", "gifs");
        assert_eq!(meme.kind, MemeKind::Image(None));

        meme.digest(&host).await.unwrap();

        assert_eq!(
            meme.kind,
            MemeKind::Image(Some(ImageDigest::single("https://i.imgur.com/AbC12.gifv")))
        );
        let content = meme.format_for_post().unwrap();
        assert_eq!(content.caption, "#memes #dankmemes #funny #gifs");
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://i.imgur.com/AbC12.gif")
        );
    }

    #[tokio::test]
    async fn digest_resolves_gallery_through_host() {
        let host = FakeImageHost::default()
            .with_gallery("G4ll3ry", ImageDigest::single("https://i.imgur.com/g1.png"));
        let mut meme = Meme::new("https://imgur.com/gallery/G4ll3ry/new", "pics");
        assert_eq!(meme.kind, MemeKind::Gallery(None));

        meme.digest(&host).await.unwrap();

        let content = meme.format_for_post().unwrap();
        assert_eq!(content.caption, "#memes #dankmemes #funny #pics");
        assert_eq!(
            content.media_link.as_deref(),
            Some("https://i.imgur.com/g1.png")
        );
        assert_eq!(host.calls(), 1);
    }

    #[tokio::test]
    async fn failed_digest_leaves_meme_fresh() {
        let host = FakeImageHost::default();
        let mut meme = Meme::new("https://imgur.com/Missing", "funny");

        assert!(meme.digest(&host).await.is_err());
        assert!(!meme.is_digested());
    }

    #[tokio::test]
    async fn direct_meme_needs_no_host_call() {
        let host = FakeImageHost::default();
        let mut meme = Meme::new("https://i.imgur.com/abc123.jpg", "pics");

        meme.digest(&host).await.unwrap();
        assert_eq!(host.calls(), 0);
    }
}
