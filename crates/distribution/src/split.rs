use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult};

/// Tolerance for money comparisons.
///
/// Splits are scaled by arbitrary payment fractions, so equality checks are
/// always within this epsilon.
pub const EPSILON: f64 = 1e-6;

/// Compare two amounts within [`EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// The three-way division of a sale's revenue.
///
/// `boveda_monte` recovers the purchase cost, `fletes` the freight, and
/// `utilidades` is what remains. Invariant: the three buckets always sum to
/// the revenue they were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GyaSplit {
    pub boveda_monte: f64,
    pub fletes: f64,
    pub utilidades: f64,
}

impl GyaSplit {
    pub fn new(boveda_monte: f64, fletes: f64, utilidades: f64) -> Self {
        Self {
            boveda_monte,
            fletes,
            utilidades,
        }
    }

    /// Sum of the three buckets.
    pub fn total(&self) -> f64 {
        self.boveda_monte + self.fletes + self.utilidades
    }

    /// Bucket-wise addition.
    pub fn plus(&self, other: &GyaSplit) -> GyaSplit {
        GyaSplit {
            boveda_monte: self.boveda_monte + other.boveda_monte,
            fletes: self.fletes + other.fletes,
            utilidades: self.utilidades + other.utilidades,
        }
    }

    /// Bucket-wise subtraction.
    pub fn minus(&self, other: &GyaSplit) -> GyaSplit {
        GyaSplit {
            boveda_monte: self.boveda_monte - other.boveda_monte,
            fletes: self.fletes - other.fletes,
            utilidades: self.utilidades - other.utilidades,
        }
    }

    /// True when every bucket is within [`EPSILON`] of the other's.
    pub fn approx_eq(&self, other: &GyaSplit) -> bool {
        approx_eq(self.boveda_monte, other.boveda_monte)
            && approx_eq(self.fletes, other.fletes)
            && approx_eq(self.utilidades, other.utilidades)
    }
}

fn ensure_amount(value: f64, field: &str) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!("{field} must be finite")));
    }
    if value < 0.0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

/// Compute the GYA split for `quantity` units.
///
/// `total = quantity × unit_sale_price`, cost and freight scale the same way,
/// and `utilidades = total − cost − freight`. A sale priced below cost plus
/// freight is rejected here, before any row is written.
pub fn distribute(
    quantity: u32,
    unit_sale_price: f64,
    unit_cost_price: f64,
    unit_freight: f64,
) -> DomainResult<GyaSplit> {
    if quantity == 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    ensure_amount(unit_sale_price, "unit sale price")?;
    ensure_amount(unit_cost_price, "unit cost price")?;
    ensure_amount(unit_freight, "unit freight")?;
    if unit_sale_price <= 0.0 {
        return Err(DomainError::validation("unit sale price must be positive"));
    }

    let qty = f64::from(quantity);
    let total = qty * unit_sale_price;
    let boveda_monte = qty * unit_cost_price;
    let fletes = qty * unit_freight;
    let utilidades = total - boveda_monte - fletes;

    if utilidades < -EPSILON {
        return Err(DomainError::validation(format!(
            "sale price below cost plus freight (margin {utilidades:.2})"
        )));
    }

    Ok(GyaSplit {
        boveda_monte,
        fletes,
        // Clamp the sub-epsilon negatives a zero-margin sale can produce.
        utilidades: utilidades.max(0.0),
    })
}

/// Scale each bucket of `split` by `paid_fraction`.
///
/// Reused identically for the initial capital of a sale, for every abono, and
/// for the reversal amounts of a devolución (where the fraction is the share
/// of quantity returned or of money collected).
pub fn proportional(split: &GyaSplit, paid_fraction: f64) -> DomainResult<GyaSplit> {
    if !paid_fraction.is_finite() {
        return Err(DomainError::validation("paid fraction must be finite"));
    }
    if !(-EPSILON..=1.0 + EPSILON).contains(&paid_fraction) {
        return Err(DomainError::validation(format!(
            "paid fraction must be between 0 and 1 (got {paid_fraction})"
        )));
    }

    let f = paid_fraction.clamp(0.0, 1.0);
    Ok(GyaSplit {
        boveda_monte: split.boveda_monte * f,
        fletes: split.fletes * f,
        utilidades: split.utilidades * f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_the_worked_example() {
        // qty=3, sale=28000, cost=20000, freight=500
        let split = distribute(3, 28_000.0, 20_000.0, 500.0).unwrap();
        assert!(approx_eq(split.total(), 84_000.0));
        assert!(approx_eq(split.boveda_monte, 60_000.0));
        assert!(approx_eq(split.fletes, 1_500.0));
        assert!(approx_eq(split.utilidades, 22_500.0));
    }

    #[test]
    fn rejects_below_cost_sale() {
        let err = distribute(2, 100.0, 90.0, 20.0).unwrap_err();
        assert!(matches!(err, gyaledger_core::DomainError::Validation(_)));
    }

    #[test]
    fn zero_margin_is_allowed() {
        let split = distribute(1, 110.0, 100.0, 10.0).unwrap();
        assert!(approx_eq(split.utilidades, 0.0));
    }

    #[test]
    fn rejects_zero_quantity() {
        assert!(distribute(0, 100.0, 50.0, 0.0).is_err());
    }

    #[test]
    fn proportional_rejects_out_of_range_fraction() {
        let split = GyaSplit::new(60.0, 10.0, 30.0);
        assert!(proportional(&split, 1.5).is_err());
        assert!(proportional(&split, -0.2).is_err());
        assert!(proportional(&split, f64::NAN).is_err());
    }

    #[test]
    fn half_payment_halves_every_bucket() {
        let split = distribute(3, 28_000.0, 20_000.0, 500.0).unwrap();
        let half = proportional(&split, 0.5).unwrap();
        assert!(approx_eq(half.boveda_monte, 30_000.0));
        assert!(approx_eq(half.fletes, 750.0));
        assert!(approx_eq(half.utilidades, 11_250.0));
    }

    proptest! {
        /// Property: buckets always sum to qty × sale price.
        #[test]
        fn buckets_sum_to_total(
            qty in 1u32..1_000,
            sale in 1.0f64..100_000.0,
            cost_frac in 0.0f64..1.0,
            freight_frac in 0.0f64..0.5,
        ) {
            // Derive cost/freight from the sale price so the margin is never negative.
            let cost = sale * cost_frac * 0.6;
            let freight = sale * freight_frac * 0.4;
            let split = distribute(qty, sale, cost, freight).unwrap();
            let total = f64::from(qty) * sale;
            prop_assert!((split.total() - total).abs() <= total.abs() * 1e-9 + EPSILON);
        }

        /// Property: a proportional split preserves the bucket ratios.
        #[test]
        fn proportional_scales_every_bucket(
            qty in 1u32..1_000,
            sale in 1.0f64..100_000.0,
            fraction in 0.0f64..1.0,
        ) {
            let split = distribute(qty, sale, sale * 0.5, sale * 0.1).unwrap();
            let scaled = proportional(&split, fraction).unwrap();
            prop_assert!((scaled.total() - split.total() * fraction).abs()
                <= split.total().abs() * 1e-9 + EPSILON);
            prop_assert!((scaled.boveda_monte - split.boveda_monte * fraction).abs() <= EPSILON.max(split.boveda_monte * 1e-9));
        }
    }
}
