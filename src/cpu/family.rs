//! CPU microarchitecture classification
//!
//! Static rule table mapping the family/model numbers from the identity
//! description to a named variant. Rules are evaluated in order and the
//! first match wins.

use crate::cpu::identity::SystemIdentity;

use serde::Serialize;
use std::fmt;

/// Known microarchitecture variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CpuFamily {
    // Zen / Zen+ / Zen 2 (family 17h)
    SummitRidge,
    PinnacleRidge,
    RavenRidge,
    Dali,
    Picasso,
    Matisse,
    Renoir,
    Lucienne,
    VanGogh,
    Mendocino,
    // Zen 3 / Zen 4 (family 19h)
    Vermeer,
    CezanneBarcelo,
    Rembrandt,
    Raphael,
    DragonRange,
    Phoenix,
    HawkPoint,
    // Zen 5 (family 1Ah)
    StrixPoint,
    KrackanPoint,
    StrixHalo,
    GraniteRidge,
    FireRange,
    Unknown,
}

impl CpuFamily {
    pub fn is_known(self) -> bool {
        self != CpuFamily::Unknown
    }
}

impl fmt::Display for CpuFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuFamily::SummitRidge => "Summit Ridge",
            CpuFamily::PinnacleRidge => "Pinnacle Ridge",
            CpuFamily::RavenRidge => "Raven Ridge",
            CpuFamily::Dali => "Dali",
            CpuFamily::Picasso => "Picasso",
            CpuFamily::Matisse => "Matisse",
            CpuFamily::Renoir => "Renoir",
            CpuFamily::Lucienne => "Lucienne",
            CpuFamily::VanGogh => "Van Gogh",
            CpuFamily::Mendocino => "Mendocino",
            CpuFamily::Vermeer => "Vermeer",
            CpuFamily::CezanneBarcelo => "Cezanne/Barcelo",
            CpuFamily::Rembrandt => "Rembrandt",
            CpuFamily::Raphael => "Raphael",
            CpuFamily::DragonRange => "Dragon Range",
            CpuFamily::Phoenix => "Phoenix",
            CpuFamily::HawkPoint => "Hawk Point",
            CpuFamily::StrixPoint => "Strix Point",
            CpuFamily::KrackanPoint => "Krackan Point",
            CpuFamily::StrixHalo => "Strix Halo",
            CpuFamily::GraniteRidge => "Granite Ridge",
            CpuFamily::FireRange => "Fire Range",
            CpuFamily::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// One classification rule
struct FamilyRule {
    family: u32,
    models: &'static [u32],
    /// Case-insensitive substring the display name must contain
    marker: Option<&'static str>,
    result: CpuFamily,
}

const fn rule(family: u32, models: &'static [u32], result: CpuFamily) -> FamilyRule {
    FamilyRule {
        family,
        models,
        marker: None,
        result,
    }
}

const fn marked(
    family: u32,
    models: &'static [u32],
    marker: &'static str,
    result: CpuFamily,
) -> FamilyRule {
    FamilyRule {
        family,
        models,
        marker: Some(marker),
        result,
    }
}

// Marker rules precede the unmarked rule for the same model.
static FAMILY_RULES: &[FamilyRule] = &[
    rule(23, &[1], CpuFamily::SummitRidge),
    rule(23, &[8], CpuFamily::PinnacleRidge),
    rule(23, &[17], CpuFamily::RavenRidge),
    rule(23, &[24], CpuFamily::Picasso),
    rule(23, &[32], CpuFamily::Dali),
    rule(23, &[71, 113], CpuFamily::Matisse),
    rule(23, &[96], CpuFamily::Renoir),
    rule(23, &[104], CpuFamily::Lucienne),
    rule(23, &[144], CpuFamily::VanGogh),
    rule(23, &[160], CpuFamily::Mendocino),
    rule(25, &[33], CpuFamily::Vermeer),
    rule(25, &[63, 68], CpuFamily::Rembrandt),
    rule(25, &[80], CpuFamily::CezanneBarcelo),
    marked(25, &[97], "hx", CpuFamily::DragonRange),
    rule(25, &[97], CpuFamily::Raphael),
    rule(25, &[116, 120], CpuFamily::Phoenix),
    rule(25, &[117], CpuFamily::HawkPoint),
    rule(26, &[36], CpuFamily::StrixPoint),
    marked(26, &[68], "hx", CpuFamily::FireRange),
    rule(26, &[68], CpuFamily::GraniteRidge),
    rule(26, &[96], CpuFamily::KrackanPoint),
    rule(26, &[112], CpuFamily::StrixHalo),
];

/// Number following `key` in a description like "Family 25 Model 80"
///
/// Token-exact: "Model 8" is not found in "Model 80".
fn numeric_field(description: &str, key: &str) -> Option<u32> {
    let mut tokens = description.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case(key) {
            return tokens.next()?.parse().ok();
        }
    }
    None
}

/// Classify a description/name pair
pub fn classify(description: &str, name: &str) -> CpuFamily {
    let (Some(family), Some(model)) = (
        numeric_field(description, "Family"),
        numeric_field(description, "Model"),
    ) else {
        return CpuFamily::Unknown;
    };
    let name = name.to_ascii_lowercase();

    FAMILY_RULES
        .iter()
        .find(|r| {
            r.family == family
                && r.models.contains(&model)
                && r.marker.map_or(true, |m| name.contains(m))
        })
        .map_or(CpuFamily::Unknown, |r| r.result)
}

const AMD_MARKERS: &[&str] = &["amd", "authenticamd", "ryzen", "athlon"];

/// Intel Core generations 4 through 10, where undervolting is still exposed
const UNDERVOLT_MARKERS: &[&str] = &[
    "i3-4", "i5-4", "i7-4", "i3-5", "i5-5", "i7-5", "i3-6", "i5-6", "i7-6", "i3-7", "i5-7",
    "i7-7", "i3-8", "i5-8", "i7-8", "i9-8", "i3-9", "i5-9", "i7-9", "i9-9", "i3-10", "i5-10",
    "i7-10", "i9-10",
];

const IGPU_MARKERS: &[&str] = &["radeon", "vega"];

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    let haystack = haystack.to_ascii_lowercase();
    markers.iter().any(|m| haystack.contains(m))
}

impl SystemIdentity {
    pub fn is_amd(&self) -> bool {
        contains_any(&self.name, AMD_MARKERS) || contains_any(&self.description, AMD_MARKERS)
    }

    /// Best-effort: Intel parts whose voltage planes are known to be writable
    pub fn supports_undervolt(&self) -> bool {
        !self.is_amd() && contains_any(&self.name, UNDERVOLT_MARKERS)
    }

    /// Best-effort: AMD parts with an integrated Radeon GPU
    pub fn supports_igpu_undervolt(&self) -> bool {
        self.is_amd() && contains_any(&self.name, IGPU_MARKERS)
    }

    pub fn family(&self) -> CpuFamily {
        classify(&self.description, &self.name)
    }
}
