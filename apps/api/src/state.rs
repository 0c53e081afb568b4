use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The Drive document store is deliberately absent: it is constructed per
/// request from the caller's access token, so no session or token state lives
/// in the process.
#[derive(Clone)]
pub struct AppState {
    /// HTTP client shared by per-request Drive stores.
    pub http: reqwest::Client,
    pub llm: LlmClient,
    /// Runtime configuration, kept for handlers that grow to need it.
    #[allow(dead_code)]
    pub config: Config,
}
