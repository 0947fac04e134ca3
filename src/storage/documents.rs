use serde::de::DeserializeOwned;
use serde::Serialize;

use super::repository;
use super::Database;
use crate::error::{Error, Result};

/// Collection-oriented document operations on top of the `documents` table.
impl Database {
    /// Append `document` (which must serialize to a JSON object) to `collection`.
    pub async fn insert_one<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        document: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(document)?;
        if !value.is_object() {
            return Err(Error::Other(format!(
                "documents must be JSON objects, got {value}"
            )));
        }
        let body = value.to_string();
        let collection = collection.to_string();

        let id = self
            .writer()
            .call(move |conn| repository::insert_document(conn, &collection, &body))
            .await?;
        log::debug!("Inserted document {id}");
        Ok(())
    }

    /// First stored document matching every field of `query`, oldest first.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &serde_json::Value,
    ) -> Result<Option<T>> {
        self.find(collection, query, false).await
    }

    /// Most recently stored document matching every field of `query`.
    pub async fn find_latest<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &serde_json::Value,
    ) -> Result<Option<T>> {
        self.find(collection, query, true).await
    }

    pub async fn count(&self, collection: &str) -> Result<u64> {
        let collection = collection.to_string();
        let n = self
            .reader()
            .call(move |conn| repository::count_documents(conn, &collection))
            .await?;
        Ok(n as u64)
    }

    async fn find<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &serde_json::Value,
        newest_first: bool,
    ) -> Result<Option<T>> {
        let query = query
            .as_object()
            .cloned()
            .ok_or_else(|| Error::Other(format!("query must be a JSON object, got {query}")))?;
        let collection = collection.to_string();

        let body: Option<String> = self
            .reader()
            .call(move |conn| repository::find_document(conn, &collection, &query, newest_first))
            .await?;

        match body {
            Some(b) => Ok(Some(serde_json::from_str(&b)?)),
            None => Ok(None),
        }
    }
}
