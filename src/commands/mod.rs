//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod cpu;
pub mod ec;
pub mod monitor;
pub mod power;
pub mod thermal;
pub mod undervolt;

pub use cpu::run_cpu;
pub use ec::run_ec;
pub use monitor::{run_monitor, run_temps};
pub use power::run_power;
pub use thermal::run_thermal;
pub use undervolt::run_undervolt;

use crate::config::Config;
use crate::control::{MsrAccess, RegisterChannel};
use crate::error::{HwError, Result};

use std::sync::Arc;

/// Open the EC channel described by `config`
pub(crate) fn open_channel(config: &Config) -> Result<Arc<RegisterChannel>> {
    let channel = RegisterChannel::new(config.driver.kind).with_settle(config.ec.settle());
    let path = config.driver.ec_path();
    if !channel.initialize(&path) {
        return Err(HwError::NotReady.into());
    }
    log::debug!("EC channel open on {}", path.display());
    Ok(Arc::new(channel))
}

/// Open MSR access described by `config`
pub(crate) fn open_msr(config: &Config) -> Result<MsrAccess> {
    let access = MsrAccess::new(config.driver.kind, config.msr);
    let path = config.driver.msr_path();
    if !access.initialize(&path) {
        return Err(HwError::NotReady.into());
    }
    log::debug!("MSR access open on {}", path.display());
    Ok(access)
}
