//! Synthetic sample generator
//!
//! Bounded random walk over realistic envelopes. Needs no hardware, never
//! fails, and serves as the development and last-resort source.

use crate::control::lock_handle;
use crate::domain::MonitoringSample;
use crate::error::MonitorError;
use crate::monitoring::traits::{CancelToken, SampleSource};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// A channel's envelope and per-step bound
#[derive(Debug, Clone, Copy)]
struct Walk {
    min: f32,
    max: f32,
    step: f32,
}

const CPU_TEMP: Walk = Walk { min: 35.0, max: 95.0, step: 2.0 };
const GPU_TEMP: Walk = Walk { min: 35.0, max: 90.0, step: 2.0 };
const LOAD: Walk = Walk { min: 0.0, max: 100.0, step: 8.0 };
const CORE_CLOCK: Walk = Walk { min: 800.0, max: 4800.0, step: 200.0 };
const VRAM: Walk = Walk { min: 256.0, max: 8192.0, step: 128.0 };
const FAN: Walk = Walk { min: 1200.0, max: 5200.0, step: 150.0 };
const SSD_TEMP: Walk = Walk { min: 30.0, max: 70.0, step: 1.0 };
const DISK: Walk = Walk { min: 10.0, max: 95.0, step: 0.5 };

const RAM_TOTAL_MB: u64 = 16384;
const RAM: Walk = Walk { min: 2048.0, max: RAM_TOTAL_MB as f32, step: 256.0 };

impl Walk {
    fn next(&self, rng: &mut StdRng, current: f32) -> f32 {
        let delta = rng.gen_range(-self.step..=self.step);
        (current + delta).clamp(self.min, self.max)
    }

    fn midpoint(&self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

struct WalkState {
    rng: StdRng,
    cpu_temp: f32,
    cpu_load: f32,
    clocks: Vec<f32>,
    gpu_temp: f32,
    gpu_load: f32,
    vram: f32,
    ram: f32,
    fan: f32,
    ssd_temp: f32,
    disk: f32,
}

impl WalkState {
    fn new(rng: StdRng, cores: usize) -> Self {
        Self {
            rng,
            cpu_temp: 50.0,
            cpu_load: 15.0,
            clocks: vec![CORE_CLOCK.midpoint(); cores],
            gpu_temp: 45.0,
            gpu_load: 5.0,
            vram: 1024.0,
            ram: 6144.0,
            fan: 2200.0,
            ssd_temp: 38.0,
            disk: 55.0,
        }
    }

    fn step(&mut self) -> MonitoringSample {
        let rng = &mut self.rng;
        self.cpu_temp = CPU_TEMP.next(rng, self.cpu_temp);
        self.cpu_load = LOAD.next(rng, self.cpu_load);
        for clock in &mut self.clocks {
            *clock = CORE_CLOCK.next(rng, *clock);
        }
        self.gpu_temp = GPU_TEMP.next(rng, self.gpu_temp);
        self.gpu_load = LOAD.next(rng, self.gpu_load);
        self.vram = VRAM.next(rng, self.vram);
        self.ram = RAM.next(rng, self.ram);
        self.fan = FAN.next(rng, self.fan);
        self.ssd_temp = SSD_TEMP.next(rng, self.ssd_temp);
        self.disk = DISK.next(rng, self.disk);

        MonitoringSample {
            timestamp: SystemTime::now(),
            cpu_temp: self.cpu_temp,
            cpu_load: self.cpu_load,
            core_clocks_mhz: self.clocks.iter().map(|c| c.round() as u32).collect(),
            gpu_temp: self.gpu_temp,
            gpu_load: self.gpu_load,
            vram_used_mb: self.vram as u64,
            ram_used_mb: self.ram as u64,
            ram_total_mb: RAM_TOTAL_MB,
            fan_rpm: self.fan as u32,
            ssd_temp: self.ssd_temp,
            disk_usage: self.disk,
        }
    }
}

/// Random-walk sample source
pub struct SyntheticSource {
    state: Mutex<WalkState>,
}

impl SyntheticSource {
    pub const DEFAULT_CORES: usize = 8;

    /// Entropy-seeded generator
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy(), Self::DEFAULT_CORES)
    }

    /// Deterministic generator
    pub fn with_seed(seed: u64, cores: usize) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), cores)
    }

    fn from_rng(rng: StdRng, cores: usize) -> Self {
        Self {
            state: Mutex::new(WalkState::new(rng, cores.max(1))),
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn read_sample(&self, cancel: &CancelToken) -> Result<Arc<MonitoringSample>, MonitorError> {
        cancel.check()?;
        Ok(Arc::new(lock_handle(&self.state).step()))
    }

    fn try_restart(&self) -> bool {
        true
    }
}
