//! Flickr upload transport.
//!
//! The upload endpoint takes a multipart POST with the signed oauth_*
//! parameters as ordinary form fields and the image bytes as the
//! `photo` part, and answers with a small XML document. The REST
//! endpoint speaks JSON and is only used for the credential preflight.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::{oauth, PhotoId, UploadCredentials, UploadError, UploadSink};

const UPLOAD_URL: &str = "https://up.flickr.com/services/upload/";
const REST_URL: &str = "https://api.flickr.com/services/rest/";

static PHOTO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<photoid>([^<]+)</photoid>").expect("valid photoid regex"));
static UPLOAD_ERR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<err code="(\d+)" msg="([^"]*)""#).expect("valid err regex"));

pub struct FlickrUploader {
    client: reqwest::Client,
    credentials: UploadCredentials,
}

impl FlickrUploader {
    pub fn new(credentials: UploadCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    /// Call `flickr.test.login` to confirm the credential set works
    /// before the mailbox watch starts. Returns the account username.
    pub async fn verify_credentials(&self) -> Result<String, UploadError> {
        let extra = vec![
            ("method".to_string(), "flickr.test.login".to_string()),
            ("format".to_string(), "json".to_string()),
            ("nojsoncallback".to_string(), "1".to_string()),
        ];
        let params = oauth::sign_request("GET", REST_URL, &extra, &self.credentials);

        let response = self
            .client
            .get(REST_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;
        let body: TestLoginResponse = response.json().await?;

        if body.stat != "ok" {
            return Err(UploadError::Rejected {
                code: body.code.unwrap_or(0),
                message: body.message.unwrap_or_else(|| "login check failed".to_string()),
            });
        }

        Ok(body
            .user
            .and_then(|u| u.username)
            .map(|c| c.content)
            .unwrap_or_default())
    }

    fn parse_upload_response(body: &str) -> Result<PhotoId, UploadError> {
        if let Some(caps) = PHOTO_ID_RE.captures(body) {
            return Ok(PhotoId(caps[1].to_string()));
        }
        if let Some(caps) = UPLOAD_ERR_RE.captures(body) {
            let code = caps[1].parse().unwrap_or(0);
            return Err(UploadError::Rejected {
                code,
                message: caps[2].to_string(),
            });
        }
        Err(UploadError::MalformedResponse(
            body.chars().take(200).collect(),
        ))
    }
}

#[async_trait]
impl UploadSink for FlickrUploader {
    async fn upload(&self, path: &Path, title: Option<&str>) -> Result<PhotoId, UploadError> {
        let data = tokio::fs::read(path).await.map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut extra = Vec::new();
        if let Some(title) = title {
            extra.push(("title".to_string(), title.to_string()));
        }
        let params = oauth::sign_request("POST", UPLOAD_URL, &extra, &self.credentials);

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());

        let mut form = reqwest::multipart::Form::new();
        for (key, value) in params {
            form = form.text(key, value);
        }
        form = form.part(
            "photo",
            reqwest::multipart::Part::bytes(data).file_name(filename),
        );

        let response = self
            .client
            .post(UPLOAD_URL)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        debug!("Upload response: {}", body.trim());

        Self::parse_upload_response(&body)
    }
}

#[derive(Deserialize)]
struct TestLoginResponse {
    stat: String,
    code: Option<u32>,
    message: Option<String>,
    user: Option<TestLoginUser>,
}

#[derive(Deserialize)]
struct TestLoginUser {
    username: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(rename = "_content")]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_response_success() {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="ok"><photoid>54321</photoid></rsp>"#;
        let id = FlickrUploader::parse_upload_response(body).unwrap();
        assert_eq!(id, PhotoId("54321".to_string()));
    }

    #[test]
    fn test_parse_upload_response_rejection() {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="fail"><err code="5" msg="Filetype was not recognised" /></rsp>"#;
        match FlickrUploader::parse_upload_response(body) {
            Err(UploadError::Rejected { code, message }) => {
                assert_eq!(code, 5);
                assert_eq!(message, "Filetype was not recognised");
            }
            other => panic!("expected Rejected, got {:?}", other.map(|p| p.0)),
        }
    }

    #[test]
    fn test_parse_upload_response_garbage() {
        match FlickrUploader::parse_upload_response("<html>502 Bad Gateway</html>") {
            Err(UploadError::MalformedResponse(_)) => {}
            other => panic!("expected MalformedResponse, got {:?}", other.map(|p| p.0)),
        }
    }

    #[test]
    fn test_login_response_deserializes() {
        let ok = r#"{"user":{"id":"12345@N01","username":{"_content":"someone"}},"stat":"ok"}"#;
        let parsed: TestLoginResponse = serde_json::from_str(ok).unwrap();
        assert_eq!(parsed.stat, "ok");
        assert_eq!(parsed.user.unwrap().username.unwrap().content, "someone");

        let fail = r#"{"stat":"fail","code":98,"message":"Invalid auth token"}"#;
        let parsed: TestLoginResponse = serde_json::from_str(fail).unwrap();
        assert_eq!(parsed.stat, "fail");
        assert_eq!(parsed.code, Some(98));
    }
}
