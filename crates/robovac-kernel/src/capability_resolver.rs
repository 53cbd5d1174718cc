//! [`CapabilityResolver`] – model prefix to capability profile.
//!
//! Families are described by [`FamilyTable`] literals.  Supporting a new model
//! means adding its prefix to one table; the resolution logic never branches
//! on a family.
//!
//! Resolution is total: a model that matches no prefix gets the minimal
//! profile (single `"Standard"` fan speed, no features, empty control
//! surface).  When several prefixes match, the longest one wins.

use std::collections::BTreeSet;

use robovac_types::{
    CapabilityProfile, DeviceFamily, DeviceModelId, RoboVacFeature, VacuumFeature,
};
use tracing::debug;

/// Fan-speed vocabulary for models outside every known family.
pub const DEFAULT_FAN_SPEEDS: &[&str] = &["Standard"];

/// Declarative description of one device family.
#[derive(Debug)]
pub struct FamilyTable {
    pub family: DeviceFamily,
    pub prefixes: &'static [&'static str],
    pub fan_speeds: &'static [&'static str],
    pub features: &'static [RoboVacFeature],
    pub control_surface: &'static [VacuumFeature],
}

impl FamilyTable {
    fn profile(&self) -> CapabilityProfile {
        CapabilityProfile {
            family: Some(self.family),
            fan_speeds: self.fan_speeds.iter().map(|s| s.to_string()).collect(),
            features: self.features.iter().copied().collect(),
            control_surface: self.control_surface.iter().copied().collect(),
        }
    }

    /// Length of the longest prefix of this table that `model` starts with.
    fn match_len(&self, model: &str) -> Option<usize> {
        self.prefixes
            .iter()
            .filter(|prefix| model.starts_with(*prefix))
            .map(|prefix| prefix.len())
            .max()
    }
}

const STANDARD_SURFACE: &[VacuumFeature] = &[
    VacuumFeature::Battery,
    VacuumFeature::CleanSpot,
    VacuumFeature::FanSpeed,
    VacuumFeature::Locate,
    VacuumFeature::Pause,
    VacuumFeature::ReturnHome,
    VacuumFeature::SendCommand,
    VacuumFeature::Start,
    VacuumFeature::State,
    VacuumFeature::Stop,
];

const MAPPING_SURFACE: &[VacuumFeature] = &[
    VacuumFeature::Battery,
    VacuumFeature::CleanSpot,
    VacuumFeature::FanSpeed,
    VacuumFeature::Locate,
    VacuumFeature::Map,
    VacuumFeature::Pause,
    VacuumFeature::ReturnHome,
    VacuumFeature::SendCommand,
    VacuumFeature::Start,
    VacuumFeature::State,
    VacuumFeature::Stop,
];

/// Built-in family tables.  Keep in lock-step with shipped firmware.
pub static FAMILY_TABLES: &[FamilyTable] = &[
    FamilyTable {
        family: DeviceFamily::CSeries,
        prefixes: &[
            "T2103", "T2117", "T2118", "T2119", "T2120", "T2123", "T2128", "T2130",
        ],
        fan_speeds: &["No Suction", "Standard", "Boost IQ", "Max"],
        features: &[RoboVacFeature::Edge, RoboVacFeature::SmallRoom],
        control_surface: STANDARD_SURFACE,
    },
    FamilyTable {
        family: DeviceFamily::GSeries,
        prefixes: &["T1250", "T2250", "T2251", "T2252", "T2253", "T2150", "T2255"],
        fan_speeds: &["Standard", "Turbo", "Max", "Boost IQ"],
        features: &[
            RoboVacFeature::CleaningTime,
            RoboVacFeature::CleaningArea,
            RoboVacFeature::DoNotDisturb,
            RoboVacFeature::AutoReturn,
            RoboVacFeature::Consumables,
        ],
        control_surface: STANDARD_SURFACE,
    },
    FamilyTable {
        family: DeviceFamily::XSeries,
        prefixes: &["T2262", "T2262A", "T2261", "T2261A"],
        fan_speeds: &["Pure", "Standard", "Turbo", "Max"],
        features: &[
            RoboVacFeature::CleaningTime,
            RoboVacFeature::CleaningArea,
            RoboVacFeature::DoNotDisturb,
            RoboVacFeature::AutoReturn,
            RoboVacFeature::Consumables,
            RoboVacFeature::Room,
            RoboVacFeature::Zone,
            RoboVacFeature::Map,
            RoboVacFeature::BoostIq,
        ],
        control_surface: MAPPING_SURFACE,
    },
];

/// Resolves [`CapabilityProfile`]s from a set of [`FamilyTable`]s.
///
/// # Example
///
/// ```
/// use robovac_kernel::capability_resolver::CapabilityResolver;
/// use robovac_types::{DeviceFamily, RoboVacFeature};
///
/// let resolver = CapabilityResolver::default();
/// let profile = resolver.resolve(&"T2251".into());
///
/// assert_eq!(profile.family, Some(DeviceFamily::GSeries));
/// assert!(profile.has_feature(RoboVacFeature::Consumables));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CapabilityResolver {
    tables: &'static [FamilyTable],
}

impl Default for CapabilityResolver {
    fn default() -> Self {
        Self::new(FAMILY_TABLES)
    }
}

impl CapabilityResolver {
    /// Create a resolver over custom family tables.
    pub fn new(tables: &'static [FamilyTable]) -> Self {
        Self { tables }
    }

    /// Find the table whose longest matching prefix is the longest overall.
    /// Ties go to the table listed first.
    pub fn family_table(&self, model: &DeviceModelId) -> Option<&'static FamilyTable> {
        let mut best: Option<(usize, &'static FamilyTable)> = None;
        for table in self.tables {
            if let Some(len) = table.match_len(model.as_str())
                && best.is_none_or(|(best_len, _)| len > best_len)
            {
                best = Some((len, table));
            }
        }
        best.map(|(_, table)| table)
    }

    /// Resolve the profile for `model`.  Never fails.
    pub fn resolve(&self, model: &DeviceModelId) -> CapabilityProfile {
        match self.family_table(model) {
            Some(table) => table.profile(),
            None => {
                debug!(model = %model, "unrecognized model prefix, using minimal profile");
                minimal_profile()
            }
        }
    }
}

/// Profile for models outside every known family.
pub fn minimal_profile() -> CapabilityProfile {
    CapabilityProfile {
        family: None,
        fan_speeds: DEFAULT_FAN_SPEEDS.iter().map(|s| s.to_string()).collect(),
        features: BTreeSet::new(),
        control_surface: BTreeSet::new(),
    }
}

/// Resolve `model` against the built-in family tables.
pub fn resolve(model: &DeviceModelId) -> CapabilityProfile {
    CapabilityResolver::default().resolve(model)
}
