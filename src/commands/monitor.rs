//! Monitor and temps command implementation

use crate::cli::args::{MonitorArgs, OutputFormat};
use crate::cli::output::{print_output, TemperatureList};
use crate::config::Config;
use crate::error::Result;
use crate::monitoring::{self, CancelToken, WaitBudget};

use std::thread;
use std::time::Duration;

/// Print `count` samples from the selected source
pub fn run_monitor(args: &MonitorArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let stack = monitoring::from_config(&config.monitor);
    let cancel = CancelToken::new();

    for i in 0..args.count {
        if i > 0 {
            thread::sleep(Duration::from_millis(args.interval_ms));
        }
        match stack.source.read_sample(&cancel) {
            Ok(sample) => print_output(&*sample, format)?,
            Err(e) => {
                log::warn!("{} sample failed: {}", stack.source.name(), e);
                if !stack.source.try_restart() {
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}

/// Print the fallback chain's temperatures
pub fn run_temps(background: bool, config: &Config, format: OutputFormat) -> Result<()> {
    let stack = monitoring::from_config(&config.monitor);
    let budget = if background {
        WaitBudget::background()
    } else {
        config.monitor.latency_budget()
    };

    let readings = stack.chain.read_temperatures(budget);
    print_output(&TemperatureList { readings }, format)?;
    Ok(())
}
