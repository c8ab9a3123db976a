// Energy source, grouping and unit enums used across the preparation steps
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::utils::error::PrepError;

/// Operating mode of a conventional unit, derived from its `type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatingMode {
    Other = 0,
    IndependentPowerProducer = 1,
    CombinedHeatPower = 2,
}

impl OperatingMode {
    pub fn from_type(unit_type: &str) -> Self {
        match unit_type {
            "ipp" => OperatingMode::IndependentPowerProducer,
            "chp" => OperatingMode::CombinedHeatPower,
            _ => OperatingMode::Other,
        }
    }

    pub fn code(&self) -> i64 {
        *self as i64
    }
}

/// Which attribute partitions units before clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    Fuel,     // units of the same fuel bus
    TechFuel, // units of the same technology-fuel combination
}

impl GroupingMode {
    pub fn column(&self) -> &'static str {
        match self {
            GroupingMode::Fuel => "from",
            GroupingMode::TechFuel => "tech_fuel",
        }
    }
}

impl FromStr for GroupingMode {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fuel" => Ok(GroupingMode::Fuel),
            "tech_fuel" => Ok(GroupingMode::TechFuel),
            _ => Err(PrepError::InvalidConfiguration(format!(
                "grouping option '{}' not defined, must be one of 'fuel' and 'tech_fuel'",
                s
            ))),
        }
    }
}

/// Renewable sources handled by the market premium preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnergySource {
    WindOnshore,
    WindOffshore,
    Solar,
}

impl EnergySource {
    pub const ALL: [EnergySource; 3] = [
        EnergySource::WindOnshore,
        EnergySource::WindOffshore,
        EnergySource::Solar,
    ];

    /// Name used in the raw plant register
    pub fn raw_name(&self) -> &'static str {
        match self {
            EnergySource::WindOnshore => "Wind_Onshore",
            EnergySource::WindOffshore => "Wind_Offshore",
            EnergySource::Solar => "Solar",
        }
    }

    /// Name used for buses and labels in the model
    pub fn model_name(&self) -> &'static str {
        match self {
            EnergySource::WindOnshore => "windonshore",
            EnergySource::WindOffshore => "windoffshore",
            EnergySource::Solar => "solarPV",
        }
    }

    pub fn from_model_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.model_name() == name)
    }
}

impl FromStr for EnergySource {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|source| source.raw_name() == s || source.model_name() == s)
            .ok_or_else(|| PrepError::InvalidConfiguration(format!("unknown energy source: {}", s)))
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.raw_name())
    }
}

/// Column of the expansion table holding the annual capacity addition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityColumn {
    #[serde(rename = "capacity")]
    Capacity,
    #[serde(rename = "capacity_awarded")]
    CapacityAwarded,
    #[serde(rename = "MP")]
    MarketPremium,
}

impl CapacityColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityColumn::Capacity => "capacity",
            CapacityColumn::CapacityAwarded => "capacity_awarded",
            CapacityColumn::MarketPremium => "MP",
        }
    }
}

impl FromStr for CapacityColumn {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capacity" => Ok(CapacityColumn::Capacity),
            "capacity_awarded" => Ok(CapacityColumn::CapacityAwarded),
            "MP" => Ok(CapacityColumn::MarketPremium),
            _ => Err(PrepError::InvalidConfiguration(format!(
                "unsupported capacity column '{}'",
                s
            ))),
        }
    }
}

/// Unit of every `value_applied` handed to the model
pub const MODEL_COST_UNIT: EnergyCostUnit = EnergyCostUnit::EurPerMwh;

/// Currency per energy conventions for cost figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyCostUnit {
    EurPerKwh,
    CtPerKwh,
    EurPerMwh,
}

impl EnergyCostUnit {
    /// Multiplier that expresses one unit of `self` in EUR/MWh
    fn eur_per_mwh(&self) -> f64 {
        match self {
            EnergyCostUnit::EurPerKwh => 1000.0,
            EnergyCostUnit::CtPerKwh => 10.0,
            EnergyCostUnit::EurPerMwh => 1.0,
        }
    }

    pub fn factor_to(&self, target: EnergyCostUnit) -> f64 {
        self.eur_per_mwh() / target.eur_per_mwh()
    }

    pub fn convert(&self, value: f64, target: EnergyCostUnit) -> f64 {
        value * self.factor_to(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operating_mode_codes() {
        assert_eq!(OperatingMode::from_type("ipp").code(), 1);
        assert_eq!(OperatingMode::from_type("chp").code(), 2);
        assert_eq!(OperatingMode::from_type("emb").code(), 0);
    }

    #[test]
    fn grouping_mode_rejects_unknown_option() {
        assert_eq!("fuel".parse::<GroupingMode>().unwrap().column(), "from");
        assert_eq!("tech_fuel".parse::<GroupingMode>().unwrap().column(), "tech_fuel");
        assert!(matches!(
            "country".parse::<GroupingMode>(),
            Err(PrepError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn energy_source_names_round_trip() {
        for source in EnergySource::ALL {
            assert_eq!(source.raw_name().parse::<EnergySource>().unwrap(), source);
            assert_eq!(EnergySource::from_model_name(source.model_name()), Some(source));
        }
        assert!("Biomass".parse::<EnergySource>().is_err());
    }

    #[test]
    fn capacity_column_keys() {
        assert_eq!("MP".parse::<CapacityColumn>().unwrap(), CapacityColumn::MarketPremium);
        assert!(matches!(
            "capacity_total".parse::<CapacityColumn>(),
            Err(PrepError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn cost_unit_factors() {
        assert!((EnergyCostUnit::EurPerKwh.factor_to(EnergyCostUnit::CtPerKwh) - 100.0).abs() < 1e-12);
        assert!((EnergyCostUnit::CtPerKwh.factor_to(EnergyCostUnit::EurPerMwh) - 10.0).abs() < 1e-12);
        assert!((EnergyCostUnit::EurPerKwh.factor_to(EnergyCostUnit::EurPerMwh) - 1000.0).abs() < 1e-12);
        assert!((EnergyCostUnit::EurPerMwh.convert(53.0, EnergyCostUnit::CtPerKwh) - 5.3).abs() < 1e-12);
    }
}
