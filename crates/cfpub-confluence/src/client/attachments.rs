//! Attachment operations for Confluence API.

use std::path::Path;

use rand::RngExt;
use tracing::info;

use super::ConfluenceClient;
use crate::api::AttachmentUpload;
use crate::error::ConfluenceError;
use crate::types::{Attachment, Page, ResultList};

impl ConfluenceClient {
    /// Find an attachment of a page by filename.
    pub(crate) fn get_attachment(
        &self,
        page: &Page,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page.id);

        info!("Looking up attachment '{}' on page {}", filename, page.id);

        let mut body = self.execute(|| {
            self.agent
                .get(&url)
                .query("filename", filename)
                .query("expand", "version")
                .header("Authorization", &self.auth_header)
                .header("X-Atlassian-Token", "nocheck")
                .header("Accept", "application/json")
                .call()
        })?;

        let attachments: ResultList<Attachment> = body.read_json()?;
        Ok(attachments.results.into_iter().next())
    }

    /// Attach a new file to a page.
    pub(crate) fn create_attachment(
        &self,
        page: &Page,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page.id);

        info!(
            "Uploading new attachment '{}' to page {}",
            upload.filename, page.id
        );

        // Response is a list for new uploads
        let response: ResultList<Attachment> = self.post_multipart(&url, upload, true)?;
        response
            .results
            .into_iter()
            .next()
            .ok_or(ConfluenceError::MissingField("results"))
    }

    /// Upload a new version of an existing attachment.
    pub(crate) fn update_attachment(
        &self,
        page: &Page,
        existing: &Attachment,
        upload: &AttachmentUpload<'_>,
    ) -> Result<Attachment, ConfluenceError> {
        let url = format!(
            "{}/content/{}/child/attachment/{}/data",
            self.api_url(),
            page.id,
            existing.id
        );

        info!(
            "Updating existing attachment '{}' (id={})",
            upload.filename, existing.id
        );

        self.post_multipart(&url, upload, false)
    }

    fn post_multipart<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        upload: &AttachmentUpload<'_>,
        allow_duplicated: bool,
    ) -> Result<T, ConfluenceError> {
        let data = std::fs::read(upload.path)?;
        let boundary = format!("----CfpubFormBoundary{:016x}", rand::rng().random::<u64>());
        let body = multipart_body(
            &boundary,
            upload.filename,
            content_type_for(upload.path),
            &data,
            upload.comment,
        );

        let mut response = self.execute(|| {
            let mut request = self.agent.post(url);
            if allow_duplicated {
                request = request.query("allowDuplicated", "true");
            }
            request
                .header("Authorization", &self.auth_header)
                .header(
                    "Content-Type",
                    &format!("multipart/form-data; boundary={boundary}"),
                )
                .header("X-Atlassian-Token", "nocheck")
                .header("Accept", "application/json")
                .send(&body[..])
        })?;

        Ok(response.read_json()?)
    }
}

/// Build a multipart form with a `file` part and an optional `comment` part.
fn multipart_body(
    boundary: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
    comment: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    if !comment.is_empty() {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"comment\"\r\n\r\n");
        body.extend_from_slice(comment.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// MIME type guessed from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multipart_body() {
        let body = multipart_body("XYZ", "pic.png", "image/png", b"DATA", "sync [vabc]");
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"pic.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            DATA\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
            sync [vabc]\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn test_multipart_body_without_comment() {
        let body = multipart_body("B", "a.bin", "application/octet-stream", b"", "");
        let text = String::from_utf8(body).unwrap();
        assert!(!text.contains("name=\"comment\""));
        assert!(text.ends_with("--B--\r\n"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("img/Photo.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("diagram.svg")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("archive")), "application/octet-stream");
    }
}
