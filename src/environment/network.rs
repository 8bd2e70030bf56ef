//! Network boundary: the request sent for a query and the response expected.

use std::error::Error;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::selection::Variables;

/// Body of a query request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRequest {
    /// Query document text.
    pub query: String,
    #[serde(default)]
    pub variables: Variables,
}

/// Body of a query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkResponse {
    /// Nested data matching the query's selections.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,
}

impl NetworkResponse {
    pub fn data(data: Value) -> Self {
        NetworkResponse {
            data: Some(data),
            errors: Vec::new(),
        }
    }
}

/// Performs a query request. Supplied by the host application.
pub trait NetworkFunction: Send + Sync {
    fn execute(
        &self,
        request: &NetworkRequest,
    ) -> Result<NetworkResponse, Box<dyn Error + Send + Sync>>;
}

impl<F> NetworkFunction for F
where
    F: Fn(&NetworkRequest) -> Result<NetworkResponse, Box<dyn Error + Send + Sync>> + Send + Sync,
{
    fn execute(
        &self,
        request: &NetworkRequest,
    ) -> Result<NetworkResponse, Box<dyn Error + Send + Sync>> {
        self(request)
    }
}
