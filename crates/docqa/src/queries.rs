//! `/queries` endpoints: asking questions and the query history.

use docqa_protocol::{
    Query, QueryCreate, QueryId, QueryList, QueryListParams, QueryResponse,
    QueryUpdate,
};
use docqa_transport::ApiClient;

use crate::DocQaError;

#[derive(Clone)]
pub struct QueryApi {
    client: ApiClient,
}

impl QueryApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Asks a question. The answer and its citations come back in one
    /// response.
    pub async fn create(
        &self,
        query: &QueryCreate,
    ) -> Result<QueryResponse, DocQaError> {
        if query.query_text.trim().is_empty() {
            return Err(DocQaError::InvalidInput("question is empty".into()));
        }
        let response: QueryResponse =
            self.client.post("queries/")?.json(query).decode().await?;
        tracing::debug!(
            query = %response.query.id,
            citations = response.citations.len(),
            "query answered"
        );
        Ok(response)
    }

    pub async fn list(
        &self,
        params: &QueryListParams,
    ) -> Result<QueryList, DocQaError> {
        let list = self.client.get("queries/")?.query(params).decode().await?;
        Ok(list)
    }

    pub async fn get(&self, id: QueryId) -> Result<QueryResponse, DocQaError> {
        let response = self
            .client
            .get(&format!("queries/{}", id.0))?
            .decode()
            .await?;
        Ok(response)
    }

    /// Sets the favorite flag or metadata. Fields left `None` are not sent.
    pub async fn update(
        &self,
        id: QueryId,
        update: &QueryUpdate,
    ) -> Result<Query, DocQaError> {
        let query = self
            .client
            .put(&format!("queries/{}", id.0))?
            .json(update)
            .decode()
            .await?;
        Ok(query)
    }

    pub async fn delete(&self, id: QueryId) -> Result<(), DocQaError> {
        self.client
            .delete(&format!("queries/{}", id.0))?
            .execute()
            .await?;
        Ok(())
    }
}
