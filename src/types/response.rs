// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A recorded signal: sample times and the value captured at each time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trace {
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
}

impl Trace {
    pub fn new(time: Vec<f64>, voltage: Vec<f64>) -> Self {
        Self { time, voltage }
    }

    /// Number of samples in the trace
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Outcome for a single recording of a run.
///
/// `Absent` is an explicit "no valid trace for this run" marker. A run whose
/// simulation diverged still reports every declared recording, each as
/// `Absent`, so downstream scoring sees the full key set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Trace(Trace),
    Absent,
}

impl Response {
    pub fn is_absent(&self) -> bool {
        matches!(self, Response::Absent)
    }

    pub fn trace(&self) -> Option<&Trace> {
        match self {
            Response::Trace(trace) => Some(trace),
            Response::Absent => None,
        }
    }
}

impl From<Trace> for Response {
    fn from(trace: Trace) -> Self {
        Response::Trace(trace)
    }
}

/// Newtype wrapper for the response map of a protocol run, keyed by recording name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Responses(pub HashMap<String, Response>);

impl Responses {
    /// Create a new empty response map
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Map every given recording name to `Response::Absent`
    pub fn absent<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| (name.to_string(), Response::Absent))
                .collect(),
        )
    }

    /// Insert a response, returning the one it replaced
    pub fn insert(&mut self, name: String, response: Response) -> Option<Response> {
        self.0.insert(name, response)
    }

    pub fn get(&self, name: &str) -> Option<&Response> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every entry is `Absent` (vacuously true for an empty map)
    pub fn all_absent(&self) -> bool {
        self.0.values().all(Response::is_absent)
    }

    /// Merge `other` into `self`, last write wins.
    ///
    /// Returns the names whose earlier value was replaced.
    pub fn merge(&mut self, other: Responses) -> Vec<String> {
        let mut overwritten = Vec::new();
        for (name, response) in other.0 {
            if self.0.contains_key(&name) {
                overwritten.push(name.clone());
            }
            self.0.insert(name, response);
        }
        overwritten.sort();
        overwritten
    }
}

impl From<HashMap<String, Response>> for Responses {
    fn from(map: HashMap<String, Response>) -> Self {
        Self(map)
    }
}

impl From<Responses> for HashMap<String, Response> {
    fn from(responses: Responses) -> Self {
        responses.0
    }
}

impl FromIterator<(String, Response)> for Responses {
    fn from_iter<T: IntoIterator<Item = (String, Response)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(v: f64) -> Response {
        Response::Trace(Trace::new(vec![0.0, 1.0], vec![v, v]))
    }

    #[test]
    fn absent_covers_every_name() {
        let responses = Responses::absent(["soma.v", "dend.v"]);
        assert_eq!(responses.len(), 2);
        assert!(responses.all_absent());
        assert_eq!(responses.get("soma.v"), Some(&Response::Absent));
    }

    #[test]
    fn merge_is_last_write_wins() {
        let mut first: Responses = [("v".to_string(), trace(1.0))].into_iter().collect();
        let second: Responses = [
            ("v".to_string(), trace(2.0)),
            ("i".to_string(), Response::Absent),
        ]
        .into_iter()
        .collect();

        let overwritten = first.merge(second);

        assert_eq!(overwritten, vec!["v".to_string()]);
        assert_eq!(first.len(), 2);
        assert_eq!(first.get("v"), Some(&trace(2.0)));
    }

    #[test]
    fn absent_has_no_trace() {
        assert!(Response::Absent.trace().is_none());
        assert_eq!(trace(3.0).trace().map(Trace::len), Some(2));
    }
}
