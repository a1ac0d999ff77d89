//! Canned HTTP responses for contract outbound requests.

use std::collections::HashMap;

/// `url → (status, body)`. Unknown urls answer 404 with an empty body.
#[derive(Debug, Clone, Default)]
pub struct HttpFixtures {
    responses: HashMap<String, (u16, Vec<u8>)>,
}

impl HttpFixtures {
    pub fn insert(&mut self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) {
        self.responses.insert(url.into(), (status, body.into()));
    }

    pub fn get(&self, url: &str) -> (u16, &[u8]) {
        match self.responses.get(url) {
            Some((status, body)) => (*status, body.as_slice()),
            None => (404, &[]),
        }
    }
}
