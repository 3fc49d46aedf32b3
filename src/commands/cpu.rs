//! CPU command implementation

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, CpuReport};
use crate::cpu::SystemIdentity;
use crate::error::Result;

/// Show identity, family, capability flags and SMU addresses
pub fn run_cpu(format: OutputFormat) -> Result<()> {
    let report = CpuReport::new(SystemIdentity::current());
    print_output(&report, format)?;
    Ok(())
}
