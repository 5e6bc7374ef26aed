// Tri-state result exposed to consumers
// Author: kelexine (https://github.com/kelexine)

use crate::error::{ProxyError, Result};

/// What a consumer renders: a pending request, a failure message, or data.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Error(String),
    Data(T),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchState::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchState<U> {
        match self {
            FetchState::Loading => FetchState::Loading,
            FetchState::Error(message) => FetchState::Error(message),
            FetchState::Data(data) => FetchState::Data(f(data)),
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Loading
    }
}

/// GraphQL and gateway failures keep the server's message text verbatim.
impl<T> From<Result<T>> for FetchState<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => FetchState::Data(data),
            Err(ProxyError::GraphQl(message)) => FetchState::Error(message),
            Err(e) => FetchState::Error(e.to_string()),
        }
    }
}
