//! CPU identification
//!
//! A `SystemIdentity` is computed once from an `IdentitySource` and passed
//! explicitly to whatever needs it.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Raw identification fields as reported by the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuSignature {
    pub vendor: String,
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
    pub brand: String,
}

impl CpuSignature {
    /// `"<vendor> Family <f> Model <m> Stepping <s>"`
    pub fn description(&self) -> String {
        let vendor = match self.vendor.as_str() {
            "AuthenticAMD" => "AMD64",
            "GenuineIntel" => "Intel64",
            other => other,
        };
        format!(
            "{} Family {} Model {} Stepping {}",
            vendor, self.family, self.model, self.stepping
        )
    }
}

/// Somewhere CPU identification can be read from
pub trait IdentitySource {
    fn signature(&self) -> io::Result<CpuSignature>;
}

/// `CPUID` instruction via `raw-cpuid`
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Debug, Default)]
pub struct CpuidSource;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl IdentitySource for CpuidSource {
    fn signature(&self) -> io::Result<CpuSignature> {
        use raw_cpuid::CpuId;

        let cpuid = CpuId::new();
        let unsupported = |what: &str| {
            io::Error::new(
                io::ErrorKind::Unsupported,
                format!("CPUID {what} leaf unavailable"),
            )
        };

        let vendor = cpuid.get_vendor_info().ok_or_else(|| unsupported("vendor"))?;
        let features = cpuid.get_feature_info().ok_or_else(|| unsupported("feature"))?;
        let brand = cpuid
            .get_processor_brand_string()
            .map(|b| b.as_str().trim().to_string())
            .unwrap_or_default();

        Ok(CpuSignature {
            vendor: vendor.as_str().to_string(),
            family: features.family_id() as u32,
            model: features.model_id() as u32,
            stepping: features.stepping_id() as u32,
            brand,
        })
    }
}

/// `/proc/cpuinfo`, first processor block
#[derive(Debug, Clone)]
pub struct ProcCpuinfoSource {
    path: PathBuf,
}

impl ProcCpuinfoSource {
    pub fn new() -> Self {
        Self::with_path("/proc/cpuinfo")
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcCpuinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySource for ProcCpuinfoSource {
    fn signature(&self) -> io::Result<CpuSignature> {
        let content = fs::read_to_string(&self.path)?;
        let field = |key: &str| {
            content
                .lines()
                .take_while(|line| !line.trim().is_empty())
                .filter_map(|line| line.split_once(':'))
                .find(|(k, _)| k.trim() == key)
                .map(|(_, v)| v.trim().to_string())
        };
        let number = |key: &str| -> io::Result<u32> {
            field(key)
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("missing '{key}'"))
                })
        };

        Ok(CpuSignature {
            vendor: field("vendor_id").unwrap_or_default(),
            family: number("cpu family")?,
            model: number("model")?,
            stepping: number("stepping").unwrap_or(0),
            brand: field("model name").unwrap_or_default(),
        })
    }
}

/// Fixed identification, for tests and overrides
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub CpuSignature);

impl IdentitySource for StaticIdentity {
    fn signature(&self) -> io::Result<CpuSignature> {
        Ok(self.0.clone())
    }
}

/// Immutable identity of the machine's CPU
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemIdentity {
    /// Display name, e.g. "AMD Ryzen 7 5800H with Radeon Graphics"
    pub name: String,
    /// Family/model string, e.g. "AMD64 Family 25 Model 80 Stepping 0"
    pub description: String,
}

impl SystemIdentity {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Query `source` once. A failed query yields a blank identity.
    pub fn detect(source: &dyn IdentitySource) -> Self {
        match source.signature() {
            Ok(sig) => Self {
                description: sig.description(),
                name: sig.brand,
            },
            Err(e) => {
                log::warn!("CPU identification failed: {e}");
                Self::default()
            }
        }
    }

    /// Process-wide identity, detected on first use
    pub fn current() -> &'static SystemIdentity {
        static IDENTITY: OnceLock<SystemIdentity> = OnceLock::new();
        IDENTITY.get_or_init(|| {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            {
                let identity = Self::detect(&CpuidSource);
                if !identity.is_blank() {
                    return identity;
                }
            }
            Self::detect(&ProcCpuinfoSource::new())
        })
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.description.is_empty()
    }
}
