// src/services/imgur.rs

//! Imgur API client used to digest image-host links.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{ImageDigest, ImgurConfig};
use crate::services::ImageHost;
use crate::utils::http::ensure_success;

const BASE_URL: &str = "https://api.imgur.com/3";

/// Envelope wrapped around every Imgur response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    link: String,
}

#[derive(Debug, Deserialize)]
struct AlbumData {
    #[serde(default)]
    images_count: u32,
    #[serde(default)]
    images: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct GalleryItemData {
    #[serde(default)]
    is_album: bool,
    #[serde(default)]
    images_count: u32,
    #[serde(default)]
    images: Vec<ImageData>,
    #[serde(default)]
    link: String,
}

/// Imgur client authenticated with an application client id.
pub struct ImgurClient {
    client: Client,
    credentials: ImgurConfig,
}

impl ImgurClient {
    pub fn new(client: Client, credentials: ImgurConfig) -> Self {
        Self {
            client,
            credentials,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{BASE_URL}/{path}");
        let response = self
            .client
            .get(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Client-ID {}", self.credentials.client_id),
            )
            .send()
            .await?;
        let body = ensure_success("imgur", response).await?.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ImageHost for ImgurClient {
    async fn image(&self, id: &str) -> Result<ImageDigest> {
        let image: ImageData = self.get(&format!("image/{id}")).await?;
        Ok(ImageDigest::single(image.link))
    }

    async fn album(&self, id: &str) -> Result<ImageDigest> {
        let album: AlbumData = self.get(&format!("album/{id}")).await?;
        album_digest(id, album.images_count, album.images)
    }

    async fn gallery_item(&self, id: &str) -> Result<ImageDigest> {
        let item: GalleryItemData = self.get(&format!("gallery/{id}")).await?;
        gallery_digest(id, item)
    }
}

fn album_digest(id: &str, images_count: u32, images: Vec<ImageData>) -> Result<ImageDigest> {
    let first = images
        .into_iter()
        .next()
        .ok_or_else(|| AppError::digest(id, "album has no images"))?;
    Ok(ImageDigest {
        image_count: images_count,
        first_image_link: first.link,
    })
}

fn gallery_digest(id: &str, item: GalleryItemData) -> Result<ImageDigest> {
    if item.is_album {
        return album_digest(id, item.images_count, item.images);
    }
    if item.link.is_empty() {
        return Err(AppError::digest(id, "gallery item has no link"));
    }
    Ok(ImageDigest::single(item.link))
}
