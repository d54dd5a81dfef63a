//! Wall-clock driver for the simulation.
//!
//! RULE: One mutex guards one engine. The ticker thread and every
//! command source lock the same `SharedEngine`, so ticks, commands,
//! saves and loads never interleave.

use crate::engine::SimEngine;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub type SharedEngine = Arc<Mutex<SimEngine>>;

pub fn share(engine: SimEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// Lock the engine, ignoring poisoning.
pub fn lock(shared: &SharedEngine) -> MutexGuard<'_, SimEngine> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct RealtimeDriver {
    running: Arc<AtomicBool>,
    handle:  Option<JoinHandle<()>>,
}

impl RealtimeDriver {
    /// Every `interval` of wall time, advance the engine by its clock's
    /// units-per-real-second. The engine's own phase decides whether
    /// anything happens.
    pub fn spawn(shared: SharedEngine, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                let mut engine = lock(&shared);
                let units = engine.clock().units_per_real_second() as u64;
                if let Err(e) = engine.advance_time(units) {
                    log::error!("Realtime tick failed: {e}");
                }
            }
            log::debug!("Realtime driver stopped");
        });
        Self { running, handle: Some(handle) }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the ticker and wait for its thread to exit.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Realtime driver thread panicked");
            }
        }
    }
}

impl Drop for RealtimeDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
