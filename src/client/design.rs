//! Design workspace endpoints: sections, comments, assets, notifications.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, segment};
use crate::models::{
    Asset, Comment, DesignSection, NewComment, Notification, SectionPatch, SectionType,
};

/// Where uploaded bytes are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadTarget {
    /// Multipart POST through the API server
    #[default]
    Server,
    /// Direct-to-blob PUT using a server-issued upload token
    Blob,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnsureSectionRequest<'a> {
    stage_id: &'a str,
    #[serde(rename = "type")]
    section_type: SectionType,
}

#[derive(Serialize)]
struct CompleteRequest {
    completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditCommentRequest<'a> {
    content: &'a str,
    mentions: &'a [String],
    tags: &'a [String],
}

#[derive(Serialize)]
struct CaptionRequest<'a> {
    caption: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadTokenRequest<'a> {
    section_id: &'a str,
    filename: &'a str,
    content_type: &'a str,
    size: u64,
}

/// Response from `POST /api/design/upload/token`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadToken {
    /// Absolute URL the bytes are PUT to
    upload_url: String,
    token: String,
    /// Public URL of the stored blob
    asset_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteUploadRequest<'a> {
    section_id: &'a str,
    url: &'a str,
    filename: &'a str,
    mime_type: &'a str,
    size: u64,
}

/// Guess a MIME type from the file extension.
pub(crate) fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("dwg") => "application/acad",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

async fn read_upload(path: &Path) -> Result<(String, Vec<u8>), ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok((filename, bytes))
}

impl ApiClient {
    // === Sections ===

    /// List the design sections of a stage.
    pub async fn list_sections(&self, stage_id: &str) -> Result<Vec<DesignSection>, ApiError> {
        self.get_json_query("/api/design/sections", &[("stageId", stage_id)])
            .await
    }

    /// Get the section of the given type, creating it on first use.
    pub async fn ensure_section(
        &self,
        stage_id: &str,
        section_type: SectionType,
    ) -> Result<DesignSection, ApiError> {
        let body = EnsureSectionRequest {
            stage_id,
            section_type,
        };
        self.send_json(Method::POST, "/api/design/sections", &body)
            .await
    }

    /// Update a section's notes and/or status.
    pub async fn update_section(
        &self,
        section_id: &str,
        patch: &SectionPatch,
    ) -> Result<DesignSection, ApiError> {
        let path = format!("/api/design/sections/{}", segment(section_id));
        self.send_json(Method::PATCH, &path, patch).await
    }

    /// Mark a section complete (or reopen it).
    pub async fn complete_section(
        &self,
        section_id: &str,
        completed: bool,
    ) -> Result<DesignSection, ApiError> {
        let path = format!("/api/design/sections/{}/complete", segment(section_id));
        self.send_json(Method::PATCH, &path, &CompleteRequest { completed })
            .await
    }

    // === Comments ===

    /// Flat list of a section's comments; see [`crate::models::build_comment_tree`].
    pub async fn list_comments(&self, section_id: &str) -> Result<Vec<Comment>, ApiError> {
        self.get_json_query("/api/design/comments", &[("sectionId", section_id)])
            .await
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        self.send_json(Method::POST, "/api/design/comments", comment)
            .await
    }

    pub async fn edit_comment(
        &self,
        comment_id: &str,
        content: &str,
        mentions: &[String],
        tags: &[String],
    ) -> Result<Comment, ApiError> {
        let path = format!("/api/comments/{}", segment(comment_id));
        let body = EditCommentRequest {
            content,
            mentions,
            tags,
        };
        self.send_json(Method::PATCH, &path, &body).await
    }

    pub async fn like_comment(&self, comment_id: &str) -> Result<Comment, ApiError> {
        let path = format!("/api/comments/{}/like", segment(comment_id));
        self.send_json(Method::POST, &path, &serde_json::json!({}))
            .await
    }

    /// Toggle the pinned flag on a comment.
    pub async fn pin_comment(&self, comment_id: &str) -> Result<Comment, ApiError> {
        let path = format!("/api/comments/{}/pin", segment(comment_id));
        self.send_json(Method::POST, &path, &serde_json::json!({}))
            .await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/comments/{}", segment(comment_id));
        self.send_unit::<()>(Method::DELETE, &path, None).await
    }

    // === Assets ===

    /// Upload a file to a section through the chosen target.
    pub async fn upload_asset(
        &self,
        section_id: &str,
        file: &Path,
        target: UploadTarget,
    ) -> Result<Asset, ApiError> {
        match target {
            UploadTarget::Server => self.upload_multipart(section_id, file).await,
            UploadTarget::Blob => self.upload_via_blob(section_id, file).await,
        }
    }

    async fn upload_multipart(&self, section_id: &str, file: &Path) -> Result<Asset, ApiError> {
        let (filename, bytes) = read_upload(file).await?;
        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime_for(file))?;
        let form = Form::new()
            .text("sectionId", section_id.to_string())
            .part("file", part);

        let path = "/api/design/upload";
        let response = self
            .send(self.request(Method::POST, path).multipart(form), path)
            .await?;
        Self::decode(response).await
    }

    /// Upload straight to blob storage, then register the stored blob.
    async fn upload_via_blob(&self, section_id: &str, file: &Path) -> Result<Asset, ApiError> {
        let (filename, bytes) = read_upload(file).await?;
        let mime = mime_for(file);
        let size = bytes.len() as u64;

        let token: UploadToken = self
            .send_json(
                Method::POST,
                "/api/design/upload/token",
                &UploadTokenRequest {
                    section_id,
                    filename: &filename,
                    content_type: mime,
                    size,
                },
            )
            .await?;

        // The upload URL is absolute and outside the API, so no API bearer token
        tracing::debug!(url = %token.upload_url, "blob upload");
        let response = self
            .http
            .put(&token.upload_url)
            .bearer_auth(&token.token)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code,
                message: super::error_message(code, &body),
            });
        }

        self.send_json(
            Method::POST,
            "/api/design/upload/complete",
            &CompleteUploadRequest {
                section_id,
                url: &token.asset_url,
                filename: &filename,
                mime_type: mime,
                size,
            },
        )
        .await
    }

    pub async fn update_asset_caption(&self, asset_id: &str, caption: &str) -> Result<Asset, ApiError> {
        let path = format!("/api/design/assets/{}", segment(asset_id));
        self.send_json(Method::PATCH, &path, &CaptionRequest { caption })
            .await
    }

    pub async fn delete_asset(&self, asset_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/design/assets/{}", segment(asset_id));
        self.send_unit::<()>(Method::DELETE, &path, None).await
    }

    // === Notifications ===

    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get_json("/api/design/notifications").await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/design/notifications/{}/read", segment(notification_id));
        self.send_unit::<()>(Method::PATCH, &path, None).await
    }
}
