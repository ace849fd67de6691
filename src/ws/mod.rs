pub mod hub;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsError {
    #[error("websocket connection failed: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {0} header value")]
    Header(&'static str),
    #[error("subscription request failed: {0}")]
    Rest(#[from] crate::api::ApiError),
}
