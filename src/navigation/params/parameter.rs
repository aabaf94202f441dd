use crate::prelude::{Carrier, Constellation, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic type of an estimated [Parameter]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParameterKind {
    /// ECEF X coordinate (m)
    CoordinateX,
    /// ECEF Y coordinate (m)
    CoordinateY,
    /// ECEF Z coordinate (m)
    CoordinateZ,
    /// Receiver clock offset (m), in the reference timescale
    Clock,
    /// Zenith wet delay (m)
    TroposphereWet,
    /// Slant ionosphere delay on the primary frequency (m), one per satellite
    Ionosphere,
    /// Inter system bias (m) of this [Constellation] with respect to the reference one
    InterSystemBias(Constellation),
    /// Inter frequency bias (m) of this secondary [Carrier]
    InterFrequencyBias(Constellation, Carrier),
}

/// Parameters sharing one stochastic behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterClass {
    Coordinates,
    Clock,
    Troposphere,
    Ionosphere,
    InterSystemBias,
    InterFrequencyBias,
}

impl ParameterKind {
    /// [ParameterClass] of this kind
    pub fn class(&self) -> ParameterClass {
        match self {
            Self::CoordinateX | Self::CoordinateY | Self::CoordinateZ => {
                ParameterClass::Coordinates
            },
            Self::Clock => ParameterClass::Clock,
            Self::TroposphereWet => ParameterClass::Troposphere,
            Self::Ionosphere => ParameterClass::Ionosphere,
            Self::InterSystemBias(_) => ParameterClass::InterSystemBias,
            Self::InterFrequencyBias(..) => ParameterClass::InterFrequencyBias,
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::CoordinateX => write!(f, "CRD-X"),
            Self::CoordinateY => write!(f, "CRD-Y"),
            Self::CoordinateZ => write!(f, "CRD-Z"),
            Self::Clock => write!(f, "CLK"),
            Self::TroposphereWet => write!(f, "ZWD"),
            Self::Ionosphere => write!(f, "ION"),
            Self::InterSystemBias(c) => write!(f, "ISB({})", c),
            Self::InterFrequencyBias(c, carrier) => write!(f, "IFB({}/{})", c, carrier),
        }
    }
}

/// One estimated state [Parameter]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// [ParameterKind]
    pub kind: ParameterKind,
    /// Owning site
    pub site: String,
    /// Owning satellite, for satellite dependent parameters
    pub sv: Option<SV>,
    /// 1-based position in the state vector, null until indexed
    pub(crate) index: usize,
    /// Current value
    pub value: f64,
    /// A-priori value
    pub apriori: f64,
}

impl Parameter {
    /// Creates new (non indexed) [Parameter], with value set to its a-priori value
    pub fn new(kind: ParameterKind, site: &str, sv: Option<SV>, apriori: f64) -> Self {
        Self {
            kind,
            sv,
            apriori,
            index: 0,
            value: apriori,
            site: site.to_string(),
        }
    }

    /// 1-based index in the state vector
    pub fn index(&self) -> usize {
        self.index
    }

    /// True when this [Parameter] matches the lookup key
    pub(crate) fn matches(&self, site: &str, kind: ParameterKind, sv: Option<SV>) -> bool {
        self.kind == kind && self.sv == sv && self.site == site
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.sv {
            Some(sv) => write!(f, "#{} {}:{}({})", self.index, self.site, self.kind, sv),
            None => write!(f, "#{} {}:{}", self.index, self.site, self.kind),
        }
    }
}
