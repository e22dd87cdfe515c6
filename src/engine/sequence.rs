// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::errors::ProtocolError;
use crate::observability::messages::protocol::ResponseOverwritten;
use crate::observability::messages::StructuredLog;
use crate::traits::{CellModel, Protocol, Simulator};
use crate::types::{ParamValues, Responses};

/// A protocol made of other protocols, run strictly in declared order.
///
/// Every step gets the same cell model, parameter values, simulator and
/// isolation flag. Response maps are merged last-write-wins: a later step that
/// reports a name already present replaces the earlier value. Errors from a
/// step stop the sequence and propagate unchanged.
pub struct SequenceProtocol {
    name: String,
    protocols: Vec<Box<dyn Protocol>>,
}

impl SequenceProtocol {
    pub fn new(name: impl Into<String>, protocols: Vec<Box<dyn Protocol>>) -> Self {
        Self {
            name: name.into(),
            protocols,
        }
    }

    pub fn protocols(&self) -> &[Box<dyn Protocol>] {
        &self.protocols
    }
}

impl Protocol for SequenceProtocol {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &self,
        cell_model: &mut dyn CellModel,
        param_values: &ParamValues,
        simulator: &mut dyn Simulator,
        isolate: Option<bool>,
    ) -> Result<Responses, ProtocolError> {
        let mut responses = Responses::new();

        for protocol in &self.protocols {
            let step = protocol.run(cell_model, param_values, simulator, isolate)?;
            let overwritten = responses.merge(step);
            if !overwritten.is_empty() {
                ResponseOverwritten {
                    sequence: &self.name,
                    protocol: protocol.name(),
                    names: &overwritten,
                }
                .log();
            }
        }

        Ok(responses)
    }
}

impl fmt::Display for SequenceProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for protocol in &self.protocols {
            for line in protocol.to_string().lines() {
                writeln!(f, "  {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{Counters, StubCellModel, StubSimulator};
    use crate::types::{Response, Trace};
    use std::sync::Mutex;

    /// Returns canned responses and records the order it was run in
    struct Canned {
        name: String,
        responses: Responses,
        log: std::sync::Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Canned {
        fn new(name: &str, entries: &[(&str, f64)], log: &std::sync::Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                responses: entries
                    .iter()
                    .map(|(key, v)| {
                        (
                            key.to_string(),
                            Response::Trace(Trace::new(vec![0.0], vec![*v])),
                        )
                    })
                    .collect(),
                log: log.clone(),
                fail: false,
            }
        }
    }

    impl fmt::Display for Canned {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "{}:", self.name)?;
            writeln!(f, "  canned")
        }
    }

    impl Protocol for Canned {
        fn name(&self) -> &str {
            &self.name
        }

        fn run(
            &self,
            _cell_model: &mut dyn CellModel,
            _param_values: &ParamValues,
            _simulator: &mut dyn Simulator,
            isolate: Option<bool>,
        ) -> Result<Responses, ProtocolError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{:?}", self.name, isolate));
            if self.fail {
                return Err(ProtocolError::ExecutionFailed {
                    protocol: self.name.clone(),
                    diagnostic: "boom".into(),
                });
            }
            Ok(self.responses.clone())
        }
    }

    fn run(sequence: &SequenceProtocol, isolate: Option<bool>) -> Result<Responses, ProtocolError> {
        let mut model = StubCellModel::new(Counters::default());
        let mut simulator = StubSimulator::succeeding();
        sequence.run(&mut model, &ParamValues::new(), &mut simulator, isolate)
    }

    #[test]
    fn later_step_wins_on_collision() {
        let log = Default::default();
        let sequence = SequenceProtocol::new(
            "steps",
            vec![
                Box::new(Canned::new("first", &[("v", 1.0), ("i", 5.0)], &log)),
                Box::new(Canned::new("second", &[("v", 2.0)], &log)),
            ],
        );

        let responses = run(&sequence, None).unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(
            responses.get("v").and_then(Response::trace).unwrap().voltage,
            vec![2.0]
        );
        assert_eq!(
            responses.get("i").and_then(Response::trace).unwrap().voltage,
            vec![5.0]
        );
    }

    #[test]
    fn steps_run_in_order_with_the_same_isolation_flag() {
        let log: std::sync::Arc<Mutex<Vec<String>>> = Default::default();
        let sequence = SequenceProtocol::new(
            "steps",
            vec![
                Box::new(Canned::new("a", &[("a.v", 1.0)], &log)),
                Box::new(Canned::new("b", &[("b.v", 1.0)], &log)),
                Box::new(Canned::new("c", &[("c.v", 1.0)], &log)),
            ],
        );

        run(&sequence, Some(false)).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:Some(false)", "b:Some(false)", "c:Some(false)"]
        );
    }

    #[test]
    fn step_error_stops_the_sequence() {
        let log: std::sync::Arc<Mutex<Vec<String>>> = Default::default();
        let mut failing = Canned::new("b", &[], &log);
        failing.fail = true;
        let sequence = SequenceProtocol::new(
            "steps",
            vec![
                Box::new(Canned::new("a", &[("a.v", 1.0)], &log)),
                Box::new(failing),
                Box::new(Canned::new("c", &[("c.v", 1.0)], &log)),
            ],
        );

        let error = run(&sequence, None).unwrap_err();

        assert_eq!(
            error,
            ProtocolError::ExecutionFailed {
                protocol: "b".into(),
                diagnostic: "boom".into()
            }
        );
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_sequence_returns_empty_map() {
        let sequence = SequenceProtocol::new("nothing", vec![]);
        assert!(run(&sequence, None).unwrap().is_empty());
    }

    #[test]
    fn display_indents_steps() {
        let log = Default::default();
        let sequence = SequenceProtocol::new("steps", vec![Box::new(Canned::new("a", &[], &log))]);
        assert_eq!(sequence.to_string(), "steps:\n  a:\n    canned\n");
    }
}
