// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Current-step protocols on a single-compartment passive membrane.
//!
//! The toy engine below keeps its state in a process-global `WORLD`, the way
//! real compartmental simulators do. Every run therefore goes through a
//! `SweepProtocol`, which instantiates into the world and tears down again.
//!
//! ```text
//! RUST_LOG=sweepwood=debug cargo run --example passive_membrane
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use sweepwood::config::{parse_config, RuntimeBuilder};
use sweepwood::engine::{SequenceProtocol, SimulationContext, SweepProtocol};
use sweepwood::errors::SimulationError;
use sweepwood::traits::{
    Attachment, CellHandle, CellModel, Probe, Protocol, Recording, Simulator, Stimulus,
};
use sweepwood::types::{ParamValues, Response, Responses, Trace};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
isolation:
  enabled: true
  worker: fork
batch:
  max_concurrency: 4
  failure_strategy: continue_on_error
"#;

/// Membrane potential beyond which the integration is considered diverged, in mV
const DIVERGENCE_LIMIT: f64 = 1.0e4;

#[derive(Default)]
struct World {
    cell: Option<Membrane>,
    clamps: HashMap<u64, Clamp>,
    probes: HashMap<u64, Vec<(f64, f64)>>,
    next_id: u64,
}

impl World {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

static WORLD: Mutex<Option<World>> = Mutex::new(None);

fn world() -> MutexGuard<'static, Option<World>> {
    WORLD.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_world<T>(f: impl FnOnce(&mut World) -> T) -> T {
    let mut guard = world();
    f(guard.get_or_insert_with(World::default))
}

#[derive(Clone, Copy)]
struct Membrane {
    /// µF/cm²
    c_m: f64,
    /// mS/cm²
    g_leak: f64,
    /// mV
    e_leak: f64,
    v: f64,
}

#[derive(Clone, Copy)]
struct Clamp {
    delay: f64,
    duration: f64,
    amplitude: f64,
}

impl Clamp {
    fn current_at(&self, t: f64) -> f64 {
        if t >= self.delay && t < self.delay + self.duration {
            self.amplitude
        } else {
            0.0
        }
    }
}

/// Passive cell with free parameters `c_m`, `g_leak` and `e_leak`.
struct PassiveCell {
    frozen: Option<Membrane>,
    handle: Option<CellHandle>,
}

impl PassiveCell {
    fn new() -> Self {
        Self {
            frozen: None,
            handle: None,
        }
    }
}

impl CellModel for PassiveCell {
    fn freeze(&mut self, param_values: &ParamValues) -> anyhow::Result<()> {
        let get = |name: &str| {
            param_values
                .get(name)
                .with_context(|| format!("parameter '{}' has no value", name))
        };
        let e_leak = get("e_leak")?;
        self.frozen = Some(Membrane {
            c_m: get("c_m")?,
            g_leak: get("g_leak")?,
            e_leak,
            v: e_leak,
        });
        Ok(())
    }

    fn unfreeze(&mut self, _param_names: &[String]) {
        self.frozen = None;
    }

    fn instantiate(&mut self, _simulator: &mut dyn Simulator) -> anyhow::Result<CellHandle> {
        let membrane = self.frozen.context("cell instantiated before freeze")?;
        let id = with_world(|world| {
            world.cell = Some(membrane);
            world.allocate()
        });
        let handle = CellHandle::new(id, "soma");
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    fn destroy(&mut self) {
        with_world(|world| world.cell = None);
        self.handle = None;
    }

    fn instantiated_handle(&self) -> Option<&CellHandle> {
        self.handle.as_ref()
    }
}

/// Engine object registered in the world under `id`.
struct Registered {
    id: u64,
}

impl Attachment for Registered {
    fn destroy(&mut self) {
        with_world(|world| {
            world.clamps.remove(&self.id);
            world.probes.remove(&self.id);
        });
    }
}

impl Probe for Registered {
    fn response(&self) -> anyhow::Result<Trace> {
        with_world(|world| {
            let samples = world
                .probes
                .get(&self.id)
                .with_context(|| format!("probe {} is not registered", self.id))?;
            let (time, voltage) = samples.iter().copied().unzip();
            Ok(Trace::new(time, voltage))
        })
    }
}

struct SquarePulse {
    delay: f64,
    duration: f64,
    amplitude: f64,
    total_duration: f64,
}

impl fmt::Display for SquarePulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "square pulse {} nA from {} ms for {} ms",
            self.amplitude, self.delay, self.duration
        )
    }
}

impl Stimulus for SquarePulse {
    fn total_duration(&self) -> f64 {
        self.total_duration
    }

    fn instantiate(
        &self,
        _simulator: &mut dyn Simulator,
        _cell: &CellHandle,
    ) -> anyhow::Result<Box<dyn Attachment>> {
        let clamp = Clamp {
            delay: self.delay,
            duration: self.duration,
            amplitude: self.amplitude,
        };
        let id = with_world(|world| {
            let id = world.allocate();
            world.clamps.insert(id, clamp);
            id
        });
        Ok(Box::new(Registered { id }))
    }
}

struct VoltageProbe {
    name: String,
}

impl fmt::Display for VoltageProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: soma v", self.name)
    }
}

impl Recording for VoltageProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(
        &self,
        _simulator: &mut dyn Simulator,
        cell: &CellHandle,
    ) -> anyhow::Result<Box<dyn Probe>> {
        let id = with_world(|world| {
            anyhow::ensure!(world.cell.is_some(), "cell '{}' is not instantiated", cell.name());
            let id = world.allocate();
            world.probes.insert(id, Vec::new());
            Ok(id)
        })?;
        Ok(Box::new(Registered { id }))
    }
}

/// Forward Euler on the world's membrane.
struct EulerSimulator {
    dt: f64,
}

impl Simulator for EulerSimulator {
    fn run(&mut self, duration: f64, _cvode_active: Option<bool>) -> Result<(), SimulationError> {
        with_world(|world| {
            let mut cell = world
                .cell
                .ok_or_else(|| anyhow::anyhow!("no cell instantiated"))?;
            let clamps: Vec<Clamp> = world.clamps.values().copied().collect();
            let steps = (duration / self.dt).ceil() as usize;

            for step in 0..=steps {
                let t = step as f64 * self.dt;
                for samples in world.probes.values_mut() {
                    samples.push((t, cell.v));
                }
                let injected: f64 = clamps.iter().map(|clamp| clamp.current_at(t)).sum();
                let dv = (-cell.g_leak * (cell.v - cell.e_leak) + injected) / cell.c_m;
                cell.v += dv * self.dt;
                if !cell.v.is_finite() || cell.v.abs() > DIVERGENCE_LIMIT {
                    return Err(SimulationError::runtime(format!(
                        "membrane potential diverged at t={:.3} ms",
                        t
                    )));
                }
            }

            world.cell = Some(cell);
            Ok(())
        })
    }
}

fn step_sweep(name: &str, amplitude: f64) -> SweepProtocol {
    SweepProtocol::new(
        name,
        vec![Box::new(SquarePulse {
            delay: 20.0,
            duration: 100.0,
            amplitude,
            total_duration: 150.0,
        })],
        vec![Box::new(VoltageProbe {
            name: format!("{}.soma.v", name),
        })],
        None,
    )
}

fn summarize(responses: &Responses) {
    let mut names: Vec<_> = responses.keys().collect();
    names.sort();
    for name in names {
        match responses.get(name) {
            Some(Response::Trace(trace)) => {
                let peak = trace.voltage.iter().copied().fold(f64::MIN, f64::max);
                println!("    {:<22} {} samples, peak {:.2} mV", name, trace.len(), peak);
            }
            Some(Response::Absent) | None => println!("    {:<22} absent", name),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sweepwood=info")),
        )
        .init();

    let config = parse_config(CONFIG)?;
    let (worker, isolate_by_default, batch) = RuntimeBuilder::from_config(&config)?;

    let sweeps: Vec<Box<dyn Protocol>> = [("small_step", 0.1), ("large_step", 0.5)]
        .into_iter()
        .map(|(name, amplitude)| {
            Box::new(
                step_sweep(name, amplitude)
                    .with_worker(worker.clone())
                    .with_default_isolation(isolate_by_default),
            ) as Box<dyn Protocol>
        })
        .collect();
    let protocol: Arc<dyn Protocol> = Arc::new(SequenceProtocol::new("steps", sweeps));
    println!("{}", protocol);

    let param_sets: Vec<ParamValues> = [
        (1.0, 0.1, -65.0),
        (1.0, 0.3, -65.0),
        (2.0, 0.1, -70.0),
        // Negative leak with a coarse step runs away.
        (0.01, -50.0, -65.0),
    ]
    .into_iter()
    .map(|(c_m, g_leak, e_leak)| {
        [("c_m", c_m), ("g_leak", g_leak), ("e_leak", e_leak)]
            .into_iter()
            .collect()
    })
    .collect();

    let entries = batch
        .evaluate(
            protocol,
            || {
                Ok(SimulationContext::new(
                    Box::new(PassiveCell::new()),
                    Box::new(EulerSimulator { dt: 0.025 }),
                ))
            },
            param_sets,
        )
        .await?;

    for entry in &entries {
        println!("  {}", entry.params);
        match &entry.outcome {
            Ok(responses) => summarize(responses),
            Err(error) => println!("    failed: {}", error),
        }
    }

    Ok(())
}
