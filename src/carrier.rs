use crate::prelude::Constellation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Carrier {
    /// L1 (GPS/QZSS/SBAS) same frequency as E1
    #[default]
    L1,
    /// L2 (GPS/QZSS)
    L2,
    /// L5 (GPS/QZSS/SBAS) same frequency as E5a
    L5,
    /// E1 (Galileo)
    E1,
    /// E5a (Galileo)
    E5a,
    /// E5b (Galileo) same frequency as B2I
    E5b,
    /// B1I (BDS)
    B1I,
    /// B2I (BDS)
    B2I,
    /// B3 (BDS)
    B3,
    /// G1 (Glonass, FDMA channel 0)
    G1,
    /// G2 (Glonass, FDMA channel 0)
    G2,
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::L2 => write!(f, "L2"),
            Self::L5 => write!(f, "L5"),
            Self::E1 => write!(f, "E1"),
            Self::E5a => write!(f, "E5a"),
            Self::E5b => write!(f, "E5b"),
            Self::B1I => write!(f, "B1I"),
            Self::B2I => write!(f, "B2I"),
            Self::B3 => write!(f, "B3"),
            Self::G1 => write!(f, "G1"),
            Self::G2 => write!(f, "G2"),
        }
    }
}

impl Carrier {
    /// Returns carrier frequency in Hz
    pub fn frequency_hz(&self) -> f64 {
        match self {
            Self::L1 | Self::E1 => 1575.42E6_f64,
            Self::L2 => 1227.60E6_f64,
            Self::L5 | Self::E5a => 1176.45E6_f64,
            Self::E5b | Self::B2I => 1207.140E6_f64,
            Self::B1I => 1561.098E6_f64,
            Self::B3 => 1268.52E6_f64,
            Self::G1 => 1602.0E6_f64,
            Self::G2 => 1246.0E6_f64,
        }
    }

    /// Returns wavelength in meters
    pub fn wavelength_m(&self) -> f64 {
        crate::constants::SPEED_OF_LIGHT_M_S / self.frequency_hz()
    }

    /// Ionospheric delay scaling factor (f_ref/f)², with respect
    /// to a delay expressed on the reference frequency.
    pub fn iono_scaling(&self, reference: Carrier) -> f64 {
        (reference.frequency_hz() / self.frequency_hz()).powi(2)
    }

    /// Reference signal of said [Constellation]: the receiver clock,
    /// inter frequency biases and slant ionosphere delays are expressed on it.
    pub fn reference(constellation: Constellation) -> Self {
        match constellation {
            Constellation::Galileo => Self::E1,
            Constellation::BeiDou => Self::B1I,
            Constellation::Glonass => Self::G1,
            _ => Self::L1,
        }
    }

    /// Returns true if this [Carrier] may be transmitted by said [Constellation].
    pub fn is_compatible(&self, constellation: Constellation) -> bool {
        match constellation {
            Constellation::GPS | Constellation::QZSS => {
                matches!(self, Self::L1 | Self::L2 | Self::L5)
            },
            Constellation::Galileo => matches!(self, Self::E1 | Self::E5a | Self::E5b),
            Constellation::BeiDou => matches!(self, Self::B1I | Self::B2I | Self::B3),
            Constellation::Glonass => matches!(self, Self::G1 | Self::G2),
            _ => matches!(self, Self::L1 | Self::L5),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Carrier;
    use crate::prelude::Constellation;

    #[test]
    fn iono_scaling() {
        assert_eq!(Carrier::L1.iono_scaling(Carrier::L1), 1.0);
        let l2 = Carrier::L2.iono_scaling(Carrier::L1);
        assert!((l2 - 1.6469).abs() < 1.0E-4, "L2 scaling is {}", l2);
    }

    #[test]
    fn compatibility() {
        assert!(Carrier::L1.is_compatible(Constellation::GPS));
        assert!(Carrier::E5a.is_compatible(Constellation::Galileo));
        assert!(!Carrier::E5a.is_compatible(Constellation::GPS));
        assert!(!Carrier::L2.is_compatible(Constellation::BeiDou));
    }

    #[test]
    fn reference_signals() {
        for constellation in [
            Constellation::GPS,
            Constellation::Galileo,
            Constellation::BeiDou,
            Constellation::Glonass,
            Constellation::QZSS,
        ] {
            let reference = Carrier::reference(constellation);
            assert!(reference.is_compatible(constellation), "{}", constellation);
        }
        assert_eq!(Carrier::reference(Constellation::GPS), Carrier::L1);
        assert_eq!(Carrier::reference(Constellation::Galileo), Carrier::E1);
    }
}
