//! Response envelopes of the control surface
//!
//! Every operation answers with `result: true` and its payload, or
//! `result: false` and a user-facing error message.

use crate::output::stats::IndexStatistics;
use crate::search::SearchResult;
use crate::SitelexError;
use serde::Serialize;

/// Outcome of an operation without a payload
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            result: true,
            error: None,
        }
    }

    pub fn failed(error: &SitelexError) -> Self {
        Self {
            result: false,
            error: Some(error.public_message()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<SearchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn failed(error: &SitelexError) -> Self {
        Self {
            result: false,
            count: None,
            data: None,
            error: Some(error.public_message()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<IndexStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatisticsResponse {
    pub fn failed(error: &SitelexError) -> Self {
        Self {
            result: false,
            statistics: None,
            error: Some(error.public_message()),
        }
    }
}
