//! Present value and levelised cost formulas.
//!
//! Results carry the units of their inputs: capex in EUR/kW with full load
//! hours in h gives EUR/kWh. Conversion to the downstream convention is
//! done explicitly through [`EnergyCostUnit`].

use crate::config::energy_source::EnergyCostUnit;
use crate::utils::error::{PrepError, PrepResult};

/// Present value factor of a constant annual payment over `lifetime` years.
pub fn annuity_factor(wacc: f64, lifetime: u32) -> PrepResult<f64> {
    if wacc == 0.0 {
        return Err(PrepError::ZeroDiscountRate);
    }
    if !wacc.is_finite() || wacc <= -1.0 {
        return Err(PrepError::InvalidConfiguration(format!(
            "discount rate must be finite and above -100 %, got {}",
            wacc
        )));
    }
    if lifetime == 0 {
        return Err(PrepError::InvalidConfiguration("lifetime must be at least one year".to_string()));
    }
    let compounded = (1.0 + wacc).powi(lifetime as i32);
    Ok((compounded - 1.0) / (compounded * wacc))
}

/// Inputs of a levelised cost calculation with absolute opex figures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LcoeInputs {
    pub capex: f64,
    pub opex_fix: f64,
    pub opex_var: f64,
    pub flh: f64,
    pub wacc: f64,
    pub lifetime: u32,
    pub capacity: f64,
}

impl LcoeInputs {
    pub fn new(capex: f64, opex_fix: f64, opex_var: f64, flh: f64, wacc: f64, lifetime: u32) -> Self {
        Self { capex, opex_fix, opex_var, flh, wacc, lifetime, capacity: 1.0 }
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }
}

/// LCOE with fixed and variable opex given as absolute figures.
pub fn lcoe_fix_var(inputs: &LcoeInputs) -> PrepResult<f64> {
    let ppv = annuity_factor(inputs.wacc, inputs.lifetime)?;
    let annual_output = inputs.flh * inputs.capacity;
    if !(annual_output > 0.0) {
        return Err(PrepError::InvalidConfiguration(format!(
            "annual output must be positive, got flh={} capacity={}",
            inputs.flh, inputs.capacity
        )));
    }
    Ok((inputs.capex + inputs.opex_fix * ppv + annual_output * inputs.opex_var * ppv) / (annual_output * ppv))
}

/// LCOE with fixed opex given as a percentage of capex per year.
pub fn lcoe_pct_capex(inputs: &LcoeInputs, opex_fix_pct: f64) -> PrepResult<f64> {
    let absolute = LcoeInputs {
        opex_fix: inputs.capex * opex_fix_pct / 100.0,
        ..*inputs
    };
    lcoe_fix_var(&absolute)
}

/// How the fixed operating cost of [`LcoeInputs`] is given
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixedOpex {
    Absolute,             // `opex_fix` as is
    PercentOfCapex(f64),  // `opex_fix` ignored, percent of capex per year instead
}

pub fn lcoe(inputs: &LcoeInputs, opex: FixedOpex) -> PrepResult<f64> {
    match opex {
        FixedOpex::Absolute => lcoe_fix_var(inputs),
        FixedOpex::PercentOfCapex(pct) => lcoe_pct_capex(inputs, pct),
    }
}

/// LCOE of either variant expressed in `target` instead of `input_unit`.
pub fn lcoe_in_unit(
    inputs: &LcoeInputs,
    opex: FixedOpex,
    input_unit: EnergyCostUnit,
    target: EnergyCostUnit,
) -> PrepResult<f64> {
    Ok(input_unit.convert(lcoe(inputs, opex)?, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PPV_5_20: f64 = 12.462210342539992;
    const LCOE_FIXTURE: f64 = 5.300808623968971;

    fn fixture() -> LcoeInputs {
        LcoeInputs::new(1_000_000.0, 10_000.0, 5.0, 3000.0, 0.05, 20).with_capacity(100.0)
    }

    #[test]
    fn annuity_factor_reference_value() {
        let ppv = annuity_factor(0.05, 20).unwrap();
        assert!((ppv - PPV_5_20).abs() < 1e-9);
        assert!((ppv - 12.4622).abs() < 1e-4);
    }

    #[test]
    fn zero_discount_rate_fails() {
        assert!(matches!(annuity_factor(0.0, 20), Err(PrepError::ZeroDiscountRate)));
        assert!(matches!(lcoe_fix_var(&LcoeInputs { wacc: 0.0, ..fixture() }), Err(PrepError::ZeroDiscountRate)));
    }

    #[test]
    fn single_year_factor_discounts_once() {
        assert!((annuity_factor(0.1, 1).unwrap() - 1.0 / 1.1).abs() < 1e-12);
        assert!(annuity_factor(0.05, 0).is_err());
    }

    #[test]
    fn lcoe_regression_fixture() {
        let lcoe = lcoe_fix_var(&fixture()).unwrap();
        assert!((lcoe - LCOE_FIXTURE).abs() < 1e-9);
        // Decomposition: annualised capex + fixed opex per output + variable opex
        let expected = 1_000_000.0 / (300_000.0 * PPV_5_20) + 10_000.0 / 300_000.0 + 5.0;
        assert!((lcoe - expected).abs() < 1e-9);
    }

    #[test]
    fn percentage_opex_matches_absolute() {
        let base = fixture();
        let pct = lcoe_pct_capex(&base, 1.0).unwrap();
        assert!((pct - LCOE_FIXTURE).abs() < 1e-9);
    }

    #[test]
    fn absolute_opex_unit_conversion() {
        let inputs = LcoeInputs::new(1200.0, 25.0, 0.0, 2000.0, 0.04, 25);
        let eur_per_kwh = lcoe_fix_var(&inputs).unwrap();
        let ct = lcoe_in_unit(&inputs, FixedOpex::Absolute, EnergyCostUnit::EurPerKwh, EnergyCostUnit::CtPerKwh).unwrap();
        let mwh = lcoe_in_unit(&inputs, FixedOpex::Absolute, EnergyCostUnit::EurPerKwh, EnergyCostUnit::EurPerMwh).unwrap();
        assert!((ct - eur_per_kwh * 100.0).abs() < 1e-12);
        assert!((mwh - eur_per_kwh * 1000.0).abs() < 1e-9);
        // ~0.05 EUR/kWh for a typical onshore wind cost set
        assert!(eur_per_kwh > 0.04 && eur_per_kwh < 0.06);
    }

    #[test]
    fn percent_of_capex_unit_conversion() {
        // opex_fix is ignored in favour of 2 % of capex = 24 EUR/kW/a
        let inputs = LcoeInputs::new(1200.0, 999.0, 0.0, 2000.0, 0.04, 25);
        let eur_per_kwh = lcoe_pct_capex(&inputs, 2.0).unwrap();
        let absolute = lcoe_fix_var(&LcoeInputs { opex_fix: 24.0, ..inputs }).unwrap();
        assert!((eur_per_kwh - absolute).abs() < 1e-12);

        let opex = FixedOpex::PercentOfCapex(2.0);
        let ct = lcoe_in_unit(&inputs, opex, EnergyCostUnit::EurPerKwh, EnergyCostUnit::CtPerKwh).unwrap();
        let mwh = lcoe_in_unit(&inputs, opex, EnergyCostUnit::EurPerKwh, EnergyCostUnit::EurPerMwh).unwrap();
        assert!((ct - eur_per_kwh * 100.0).abs() < 1e-12);
        assert!((mwh - eur_per_kwh * 1000.0).abs() < 1e-9);
        assert!((mwh / ct - 10.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_or_total_loss_rates_are_rejected() {
        for wacc in [-1.0, -1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(annuity_factor(wacc, 20), Err(PrepError::InvalidConfiguration(_))),
                "wacc {} accepted",
                wacc
            );
        }
        let nan_rate = LcoeInputs { wacc: f64::NAN, ..fixture() };
        assert!(matches!(lcoe_fix_var(&nan_rate), Err(PrepError::InvalidConfiguration(_))));
        // a small negative real rate is still a finite factor
        assert!(annuity_factor(-0.01, 20).unwrap().is_finite());
    }

    #[test]
    fn zero_output_is_rejected() {
        let inputs = LcoeInputs { flh: 0.0, ..fixture() };
        assert!(matches!(lcoe_fix_var(&inputs), Err(PrepError::InvalidConfiguration(_))));
    }
}
