use reqwest::StatusCode;
use thiserror::Error;
use types::primitives::Slot;
use url::Url;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to request {url}")]
    Transport {
        url: Url,
        source: reqwest::Error,
    },
    #[error("beacon node responded to {url} with status {status}: {body}")]
    HttpStatus {
        url: Url,
        status: StatusCode,
        body: String,
    },
    #[error("failed to decode response from {url}")]
    Decode {
        url: Url,
        source: reqwest::Error,
    },
    #[error("invalid request path {path:?}")]
    InvalidPath {
        path: String,
        source: url::ParseError,
    },
    #[error(
        "fork choice data is not updated for slot {slot} yet \
         (the node reported no committees for it)"
    )]
    ForkChoiceNotUpdated { slot: Slot },
}
