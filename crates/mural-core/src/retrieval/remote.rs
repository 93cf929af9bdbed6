//! HTTP client for the external retrieval model and index service.
//!
//! The encoder architecture and the quantized multi-vector index live in a
//! separate service process; this module is the only place that knows the
//! wire format. Four endpoints mirror the consumed contracts:
//!
//! ```text
//! POST /index     build (or rebuild) the passage index
//! POST /searcher  open a searcher over an existing index
//! POST /encode    encode one query batch into multi-vector embeddings
//! POST /search    retrieve ranked passages for a batch of embeddings
//! ```
//!
//! A single `reqwest` blocking client is reused for connection pooling. No
//! request timeout is set: encode and index calls legitimately run long,
//! and the pipeline has no retry or partial-result mode - a transport
//! failure is fatal for the run.

use super::{
    IndexParams, MultiVectorEmbedding, PassageIndexer, PassageSearcher, QueryEncoder,
    SearcherParams,
};
use crate::encoding::{EncoderInput, ImageShape};
use crate::error::RetrievalError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Client for the retrieval model service.
///
/// Implements [`QueryEncoder`] and [`PassageIndexer`] directly; searchers
/// are opened per run via [`RemoteBackend::open_searcher`] and hold the
/// service-side searcher id.
pub struct RemoteBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RemoteBackend {
    /// Connects to a service at `base_url` (e.g. `http://localhost:5000`).
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError::Http` if the client cannot be constructed.
    pub fn connect(base_url: &str) -> Result<Self, RetrievalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(RetrievalError::from)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> Result<Resp, RetrievalError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    /// Opens a searcher over an existing index.
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError::Http` on transport failures or when the
    /// service rejects the index.
    pub fn open_searcher(&self, params: &SearcherParams) -> Result<RemoteSearcher, RetrievalError> {
        info!(
            "opening searcher over index '{}/{}'",
            params.index_root, params.index_name
        );
        let response: OpenSearcherResponse = self.post("searcher", params)?;

        Ok(RemoteSearcher {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            searcher_id: response.searcher_id,
            search_batch_size: params.search_batch_size,
        })
    }
}

impl QueryEncoder for RemoteBackend {
    fn encode_batch(
        &self,
        input: &EncoderInput,
    ) -> Result<Vec<MultiVectorEmbedding>, RetrievalError> {
        debug!("encoding batch of {} queries", input.len());
        let request = EncodeRequest {
            input_ids: &input.input_ids,
            attention_mask: &input.attention_mask,
            pixel_values: &input.pixel_values,
            image_shape: input.image_shape,
        };
        let response: EncodeResponse = self
            .post("encode", &request)
            .map_err(|e| RetrievalError::Encode(e.to_string()))?;
        Ok(response.embeddings)
    }
}

impl PassageIndexer for RemoteBackend {
    fn build_index(
        &self,
        passages: &[String],
        params: &IndexParams,
    ) -> Result<String, RetrievalError> {
        info!(
            "indexing {} passages into '{}/{}'",
            passages.len(),
            params.index_root,
            params.index_name
        );
        let request = BuildIndexRequest { passages, params };
        let response: BuildIndexResponse = self
            .post("index", &request)
            .map_err(|e| RetrievalError::Index(e.to_string()))?;
        Ok(response.index_path)
    }
}

/// Searcher handle bound to one service-side searcher.
pub struct RemoteSearcher {
    client: reqwest::blocking::Client,
    base_url: String,
    searcher_id: String,
    search_batch_size: Option<usize>,
}

impl PassageSearcher for RemoteSearcher {
    fn search(
        &self,
        query_ids: &[String],
        embeddings: &[MultiVectorEmbedding],
        k: usize,
    ) -> Result<HashMap<String, Vec<(usize, f32)>>, RetrievalError> {
        let request = SearchRequest {
            searcher_id: &self.searcher_id,
            query_ids,
            embeddings,
            k,
            search_batch_size: self.search_batch_size,
        };
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| RetrievalError::Search(e.to_string()))?;
        let response: SearchResponse = response
            .json()
            .map_err(|e| RetrievalError::Search(e.to_string()))?;
        Ok(response.rankings)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct EncodeRequest<'a> {
    input_ids: &'a [Vec<u32>],
    attention_mask: &'a [Vec<u32>],
    pixel_values: &'a [Vec<f32>],
    image_shape: ImageShape,
}

#[derive(Deserialize)]
struct EncodeResponse {
    embeddings: Vec<MultiVectorEmbedding>,
}

#[derive(Serialize)]
struct BuildIndexRequest<'a> {
    passages: &'a [String],
    #[serde(flatten)]
    params: &'a IndexParams,
}

#[derive(Deserialize)]
struct BuildIndexResponse {
    index_path: String,
}

#[derive(Deserialize)]
struct OpenSearcherResponse {
    searcher_id: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    searcher_id: &'a str,
    query_ids: &'a [String],
    embeddings: &'a [MultiVectorEmbedding],
    k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_batch_size: Option<usize>,
}

#[derive(Deserialize)]
struct SearchResponse {
    rankings: HashMap<String, Vec<(usize, f32)>>,
}
