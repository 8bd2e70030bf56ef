//! Shared fixtures: a scripted network and a small pets schema.

#![allow(dead_code)]

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use normalized_cache::{
    Entrypoint, NetworkFunction, NetworkRequest, NetworkResponse, SelectionNode, Variables,
};
use serde_json::{json, Value};

pub const PETS_QUERY: &str = "query Pets($first: Int!) { pets(first: $first) { id name tags owner { name } } }";

/// Answers each query text with a canned response and records every request.
#[derive(Clone, Default)]
pub struct ScriptedNetwork {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    requests: Arc<Mutex<Vec<NetworkRequest>>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, query: &str, data: Value) -> &Self {
        self.responses.lock().unwrap().insert(query.to_string(), data);
        self
    }

    pub fn requests(&self) -> Vec<NetworkRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl NetworkFunction for ScriptedNetwork {
    fn execute(
        &self,
        request: &NetworkRequest,
    ) -> Result<NetworkResponse, Box<dyn Error + Send + Sync>> {
        self.requests.lock().unwrap().push(request.clone());
        let data = self
            .responses
            .lock()
            .unwrap()
            .get(&request.query)
            .cloned()
            .ok_or_else(|| format!("no response scripted for {}", request.query))?;
        Ok(NetworkResponse::data(data))
    }
}

pub fn vars(value: Value) -> Variables {
    match value {
        Value::Object(map) => map,
        other => panic!("variables must be an object, got {}", other),
    }
}

pub fn pet_selections() -> Vec<SelectionNode> {
    vec![
        SelectionNode::scalar("id"),
        SelectionNode::scalar("name"),
        SelectionNode::scalar("tags"),
        SelectionNode::linked("owner", vec![SelectionNode::scalar("name")]),
    ]
}

pub fn pets_selections() -> Vec<SelectionNode> {
    vec![SelectionNode::linked("pets", pet_selections())
        .with_argument("first", normalized_cache::ArgumentValue::Variable("first".into()))]
}

pub fn pets_entrypoint() -> Entrypoint {
    Entrypoint::new("Pets", PETS_QUERY, pets_selections())
}

pub fn pets_response() -> Value {
    json!({
        "pets": [
            {"id": "0", "name": "Rex", "tags": ["good", "loud"], "owner": {"name": "Ann"}},
            {"id": "1", "name": "Tom", "tags": [], "owner": null}
        ]
    })
}
