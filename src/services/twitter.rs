// src/services/twitter.rs

//! Twitter posting client.
//!
//! Media is downloaded from the meme's media link, uploaded through the
//! v1.1 media endpoint and attached to a post created through the v2 API.
//! Both calls are signed with the account's OAuth 1.0a user credentials.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{PostContent, TwitterConfig};
use crate::services::Publisher;
use crate::utils::http::ensure_success;
use crate::utils::oauth;

const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
const CREATE_POST_URL: &str = "https://api.twitter.com/2/tweets";

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Debug, Serialize)]
struct PostRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<PostMedia>,
}

#[derive(Debug, Serialize)]
struct PostMedia {
    media_ids: Vec<String>,
}

/// Twitter client posting on behalf of one account.
pub struct TwitterClient {
    client: Client,
    credentials: TwitterConfig,
}

impl TwitterClient {
    pub fn new(client: Client, credentials: TwitterConfig) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Download a media link and upload it, returning the media id.
    async fn upload_media(&self, media_link: &str) -> Result<String> {
        let download = self.client.get(media_link).send().await?;
        let bytes = ensure_success("media host", download).await?.bytes().await?;
        log::debug!("Downloaded {} bytes from {}", bytes.len(), media_link);

        let file_name = media_link
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("media")
            .to_string();
        let form = Form::new().part("media", Part::bytes(bytes.to_vec()).file_name(file_name));

        let auth = oauth::authorization_header("POST", MEDIA_UPLOAD_URL, &[], &self.credentials)?;
        let response = self
            .client
            .post(MEDIA_UPLOAD_URL)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?;

        let uploaded: MediaUploadResponse = check_publish(response).await?.json().await?;
        Ok(uploaded.media_id_string)
    }

    async fn create_post(&self, text: &str, media_ids: Vec<String>) -> Result<()> {
        let request = PostRequest {
            text,
            media: (!media_ids.is_empty()).then_some(PostMedia { media_ids }),
        };

        let auth = oauth::authorization_header("POST", CREATE_POST_URL, &[], &self.credentials)?;
        let response = self
            .client
            .post(CREATE_POST_URL)
            .header(AUTHORIZATION, auth)
            .json(&request)
            .send()
            .await?;
        check_publish(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for TwitterClient {
    async fn post(&self, content: &PostContent) -> Result<()> {
        let media_ids = match &content.media_link {
            Some(link) => vec![self.upload_media(link).await?],
            None => Vec::new(),
        };
        self.create_post(&content.caption, media_ids).await
    }
}

/// Map a rejected posting-service call to [`AppError::Publish`].
async fn check_publish(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::publish(status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_request_with_media() {
        let request = PostRequest {
            text: "#memes #dankmemes #funny #pics",
            media: Some(PostMedia {
                media_ids: vec!["1455952740635586573".into()],
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "#memes #dankmemes #funny #pics");
        assert_eq!(json["media"]["media_ids"][0], "1455952740635586573");
    }

    #[test]
    fn test_text_post_omits_media() {
        let request = PostRequest {
            text: "Sleep is a free trial of death",
            media: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"text":"Sleep is a free trial of death"}"#);
    }

    #[test]
    fn test_media_upload_response() {
        let uploaded: MediaUploadResponse = serde_json::from_str(
            r#"{"media_id": 710511363345354753, "media_id_string": "710511363345354753",
                "size": 11065, "expires_after_secs": 86400}"#,
        )
        .unwrap();
        assert_eq!(uploaded.media_id_string, "710511363345354753");
    }
}
