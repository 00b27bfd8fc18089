//! `/documents` endpoints.

use docqa_protocol::{Document, DocumentId, DocumentList, ListParams};
use docqa_transport::ApiClient;
use reqwest::multipart::{Form, Part};

use crate::DocQaError;

/// A file to upload, with the metadata the backend stores alongside it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    pub fn new(
        title: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self) -> Result<(), DocQaError> {
        if self.title.trim().is_empty() {
            return Err(DocQaError::InvalidInput("title is required".into()));
        }
        if self.file_name.trim().is_empty() {
            return Err(DocQaError::InvalidInput("file name is required".into()));
        }
        Ok(())
    }

    fn into_form(self) -> Form {
        let mut form = Form::new().text("title", self.title);
        if let Some(description) =
            self.description.filter(|d| !d.trim().is_empty())
        {
            form = form.text("description", description);
        }
        form.part("file", Part::bytes(self.bytes).file_name(self.file_name))
    }
}

/// The user's documents. Every call goes through the session's decorated
/// client, so a `401` here ends the session.
#[derive(Clone)]
pub struct DocumentApi {
    client: ApiClient,
}

impl DocumentApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<DocumentList, DocQaError> {
        let list = self.client.get("documents/")?.query(params).decode().await?;
        Ok(list)
    }

    pub async fn get(&self, id: DocumentId) -> Result<Document, DocQaError> {
        let document = self
            .client
            .get(&format!("documents/{}", id.0))?
            .decode()
            .await?;
        Ok(document)
    }

    /// Uploads a file as `multipart/form-data` (`title`, `description`,
    /// `file`) and returns the created document.
    pub async fn upload(
        &self,
        request: UploadRequest,
    ) -> Result<Document, DocQaError> {
        request.validate()?;
        tracing::debug!(
            file_name = %request.file_name,
            size = request.bytes.len(),
            "uploading document"
        );

        let document: Document = self
            .client
            .post("documents/upload")?
            .multipart(request.into_form())
            .decode()
            .await?;

        tracing::info!(document = %document.id, "document uploaded");
        Ok(document)
    }

    pub async fn delete(&self, id: DocumentId) -> Result<(), DocQaError> {
        self.client
            .delete(&format!("documents/{}", id.0))?
            .execute()
            .await?;
        tracing::info!(document = %id, "document deleted");
        Ok(())
    }
}
