use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// Width of `nomic-embed-text-v1`, the model the stored corpora were built with.
pub const DEFAULT_DIMENSION: usize = 768;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/v1/embeddings";
const DEFAULT_MODEL: &str = "nomic-embed-text";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns text into a fixed-width vector.
///
/// Implementations may be slow (model inference, network round trips). The store holds its lock
/// across these calls, so a provider should not call back into the store.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize;

    /// Short backend identifier for logs
    fn name(&self) -> &str;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    Stub,
    Http,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "http" => Ok(Self::Http),
            other => Err(VectorStoreError::invalid_input(format!(
                "Unsupported RAGDB_EMBEDDING_MODE '{other}' (expected 'stub' or 'http')"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Http => "http",
        }
    }
}

/// How to build the process-wide [`EmbeddingProvider`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub dimension: usize,
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            dimension: DEFAULT_DIMENSION,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl EmbeddingConfig {
    /// Defaults overridden by `RAGDB_EMBEDDING_*` variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("RAGDB_EMBEDDING_MODE") {
            config.mode = EmbeddingMode::parse(&raw)?;
        }
        if let Ok(raw) = env::var("RAGDB_EMBEDDING_DIM") {
            config.dimension = parse_dimension(&raw)?;
        }
        if let Ok(url) = env::var("RAGDB_EMBEDDING_URL") {
            config.endpoint = url;
        }
        if let Ok(model) = env::var("RAGDB_EMBEDDING_MODEL") {
            config.model = model;
        }
        config.api_key = env::var("RAGDB_EMBEDDING_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        Ok(config)
    }

    pub fn build_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        if self.dimension == 0 {
            return Err(VectorStoreError::invalid_input(
                "embedding dimension must be > 0",
            ));
        }
        log::debug!(
            "Embedding backend: {} (dimension {})",
            self.mode.as_str(),
            self.dimension
        );
        match self.mode {
            EmbeddingMode::Stub => Ok(Arc::new(StubEmbedder::new(self.dimension))),
            EmbeddingMode::Http => Ok(Arc::new(HttpEmbedder::new(self)?)),
        }
    }
}

pub(crate) fn parse_dimension(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(dim) if dim > 0 => Ok(dim),
        _ => Err(VectorStoreError::invalid_input(format!(
            "Invalid embedding dimension '{raw}' (expected a positive integer)"
        ))),
    }
}

/// Offline deterministic embedder.
///
/// Feature hashing: every lower-cased word seeds a pseudo-random unit vector, the document vector
/// is their L2-normalized sum. Identical texts map to identical vectors and texts sharing words
/// land close together, which is enough for tests and offline demos.
#[derive(Clone, Debug)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut acc = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if token.is_empty() {
                continue;
            }
            for (slot, value) in acc.iter_mut().zip(token_vector(&token, self.dimension)) {
                *slot += value;
            }
        }
        if acc.iter().all(|v| *v == 0.0) {
            // No words: fall back to hashing the raw text so distinct inputs still differ.
            acc = token_vector(text, self.dimension);
        }
        normalize(&mut acc);
        acc
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_sync(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn token_vector(token: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(token.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint (OpenAI, Ollama, vLLM, TEI...).
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| VectorStoreError::embedding(format!("http client: {e}")))?;
        Self::with_client(config, client)
    }

    fn with_client(config: &EmbeddingConfig, client: reqwest::Client) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(VectorStoreError::invalid_input(
                "RAGDB_EMBEDDING_URL must not be empty",
            ));
        }
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| VectorStoreError::embedding("Empty embedding result"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        log::debug!(
            "Embedding {} text(s) via {} ({})",
            texts.len(),
            self.endpoint,
            self.model
        );

        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VectorStoreError::embedding(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorStoreError::embedding(format!(
                "{} returned {status}: {body}",
                self.endpoint
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::embedding(format!("failed to parse response: {e}")))?;
        if parsed.data.len() != texts.len() {
            return Err(VectorStoreError::embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "http"
    }
}
