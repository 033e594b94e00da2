use core_model::PageNumber;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page {page}: request failed")]
    Transport {
        page: PageNumber,
        #[source]
        error: reqwest::Error,
    },
    #[error("page {page}: server answered with status {status}")]
    Status { page: PageNumber, status: u16 },
    #[error("page {page}: response was not valid page JSON")]
    Decode {
        page: PageNumber,
        #[source]
        error: serde_json::Error,
    },
}

impl FetchError {
    pub fn page(&self) -> PageNumber {
        match self {
            FetchError::Transport { page, .. }
            | FetchError::Status { page, .. }
            | FetchError::Decode { page, .. } => *page,
        }
    }
}
