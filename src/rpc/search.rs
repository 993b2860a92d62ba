//! Elasticsearch-compatible search index writer.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use url::Url;

use super::retry::{check_status, RpcError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Post,
    Space,
}

impl IndexKind {
    fn suffix(&self) -> &'static str {
        match self {
            IndexKind::Post => "posts",
            IndexKind::Space => "spaces",
        }
    }
}

/// Summarised entity content pushed to the search index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    pub kind: IndexKind,
    pub id: String,
    pub body: JsonValue,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn push(&self, doc: &IndexDocument) -> Result<(), RpcError>;
}

pub struct ElasticClient {
    http: reqwest::Client,
    base: Url,
    prefix: String,
}

impl ElasticClient {
    pub fn new(url: &str, prefix: &str) -> Result<Self, RpcError> {
        let base = Url::parse(url).map_err(|e| RpcError::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base,
            prefix: prefix.to_string(),
        })
    }

    pub fn index_name(&self, kind: IndexKind) -> String {
        format!("{}_{}", self.prefix, kind.suffix())
    }

    fn document_url(&self, doc: &IndexDocument) -> Result<Url, RpcError> {
        self.base
            .join(&format!("{}/_doc/{}", self.index_name(doc.kind), doc.id))
            .map_err(|e| RpcError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl SearchIndex for ElasticClient {
    async fn push(&self, doc: &IndexDocument) -> Result<(), RpcError> {
        let url = self.document_url(doc)?;
        let response = self.http.put(url).json(&doc.body).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
