use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult, Entity, EntityId, Versioned};
use gyaledger_distribution::{approx_eq, distribute, proportional, GyaSplit, EPSILON};
use gyaledger_parties::ClientId;
use gyaledger_products::ProductId;
use gyaledger_purchasing::PurchaseOrderId;

use crate::abono::{Abono, AbonoId};
use crate::devolucion::{Devolucion, DevolucionId};

/// Sale identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub EntityId);

impl SaleId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SaleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Payment lifecycle of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pendiente,
    Parcial,
    Completo,
    /// Logically closed by a full return; never physically deleted except
    /// through the admin delete, which reverses all side effects first.
    Devuelta,
}

/// A sale on credit.
///
/// Invariants held at every instant (until a reversal event):
/// - `historic.total() == precio_total_venta`
/// - `capital == historic × (monto_pagado / precio_total_venta)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub client_id: ClientId,
    pub purchase_order_id: PurchaseOrderId,
    pub product_id: Option<ProductId>,
    pub cantidad: u32,
    pub precio_venta_unidad: f64,
    pub precio_compra_unidad: f64,
    pub precio_flete_unidad: f64,
    pub precio_total_venta: f64,
    pub monto_pagado: f64,
    pub monto_restante: f64,
    pub estado_pago: PaymentStatus,
    /// Full committed distribution, booked at creation.
    pub historico: GyaSplit,
    /// Realized portion of `historico`, proportional to `monto_pagado`.
    pub capital: GyaSplit,
    pub created_at: DateTime<Utc>,
    version: u64,
}

impl Sale {
    /// Create a sale, computing its GYA split and the capital realized by
    /// the initial payment. Rejects below-cost pricing and payments larger
    /// than the sale total.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: SaleId,
        client_id: ClientId,
        purchase_order_id: PurchaseOrderId,
        product_id: Option<ProductId>,
        cantidad: u32,
        precio_venta_unidad: f64,
        precio_compra_unidad: f64,
        precio_flete_unidad: f64,
        monto_pagado: f64,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let historico = distribute(
            cantidad,
            precio_venta_unidad,
            precio_compra_unidad,
            precio_flete_unidad,
        )?;
        let precio_total_venta = historico.total();

        if !monto_pagado.is_finite() || monto_pagado < 0.0 {
            return Err(DomainError::validation("monto_pagado must be a non-negative amount"));
        }
        if monto_pagado > precio_total_venta + EPSILON {
            return Err(DomainError::validation(format!(
                "initial payment {monto_pagado:.2} exceeds sale total {precio_total_venta:.2}"
            )));
        }

        let paid_fraction = if precio_total_venta > 0.0 {
            monto_pagado / precio_total_venta
        } else {
            0.0
        };
        let capital = proportional(&historico, paid_fraction)?;

        let monto_restante = (precio_total_venta - monto_pagado).max(0.0);
        let estado_pago = if monto_restante <= EPSILON {
            PaymentStatus::Completo
        } else if monto_pagado > EPSILON {
            PaymentStatus::Parcial
        } else {
            PaymentStatus::Pendiente
        };

        Ok(Self {
            id,
            client_id,
            purchase_order_id,
            product_id,
            cantidad,
            precio_venta_unidad,
            precio_compra_unidad,
            precio_flete_unidad,
            precio_total_venta,
            monto_pagado,
            monto_restante,
            estado_pago,
            historico,
            capital,
            created_at,
            version: 0,
        })
    }

    pub fn is_devuelta(&self) -> bool {
        self.estado_pago == PaymentStatus::Devuelta
    }

    /// Fraction of the sale that has been collected, 0.0–1.0.
    pub fn paid_fraction(&self) -> f64 {
        if self.precio_total_venta > 0.0 {
            (self.monto_pagado / self.precio_total_venta).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Register an installment payment against this sale.
    ///
    /// The payment's sub-split is computed against the **original total**
    /// so it mirrors the sale's overall GYA ratios. Returns the append-only
    /// `Abono` record; the caller credits the banks with its split.
    pub fn register_abono(
        &mut self,
        abono_id: AbonoId,
        monto: f64,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Abono> {
        if self.is_devuelta() {
            return Err(DomainError::invariant("cannot register an abono on a returned sale"));
        }
        if !monto.is_finite() || monto <= 0.0 {
            return Err(DomainError::validation("monto must be positive"));
        }
        if monto > self.monto_restante + EPSILON {
            return Err(DomainError::validation(format!(
                "abono {monto:.2} exceeds remaining balance {:.2}",
                self.monto_restante
            )));
        }

        let proportion = monto / self.precio_total_venta;
        let split = proportional(&self.historico, proportion)?;

        self.monto_pagado += monto;
        self.monto_restante = (self.precio_total_venta - self.monto_pagado).max(0.0);
        self.capital = self.capital.plus(&split);
        self.estado_pago = if self.monto_restante <= EPSILON {
            PaymentStatus::Completo
        } else {
            PaymentStatus::Parcial
        };

        Ok(Abono {
            id: abono_id,
            sale_id: self.id,
            monto,
            monto_pagado_acumulado: self.monto_pagado,
            split,
            occurred_at,
        })
    }

    /// Reverse part or all of this sale's quantity.
    ///
    /// `proportion = cantidad_devuelta / cantidad`; reversal amounts are
    /// `historico × proportion`, and the reembolso owed back to the client
    /// is only the fraction of the reversal actually collected. The sale
    /// shrinks in place; a full return flips the state to `devuelta`.
    pub fn process_return(
        &mut self,
        devolucion_id: DevolucionId,
        cantidad_devuelta: u32,
        motivo: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Devolucion> {
        if self.is_devuelta() {
            return Err(DomainError::invariant("sale has already been fully returned"));
        }
        if cantidad_devuelta == 0 {
            return Err(DomainError::validation("cantidad_devuelta must be positive"));
        }
        if cantidad_devuelta > self.cantidad {
            return Err(DomainError::validation(format!(
                "cannot return {cantidad_devuelta} units from a sale of {}",
                self.cantidad
            )));
        }

        let proportion = f64::from(cantidad_devuelta) / f64::from(self.cantidad);
        let reversal = proportional(&self.historico, proportion)?;
        let paid_fraction = self.paid_fraction();
        // The realized share of the reversal comes back out of the banks;
        // its total is exactly the reembolso owed to the client.
        let capital_reversal = proportional(&reversal, paid_fraction)?;
        let reembolso = capital_reversal.total();
        let es_total = cantidad_devuelta == self.cantidad;

        self.cantidad -= cantidad_devuelta;
        self.historico = self.historico.minus(&reversal);
        self.capital = self.capital.minus(&capital_reversal);
        self.precio_total_venta -= reversal.total();
        self.monto_pagado -= reembolso;
        self.monto_restante = (self.precio_total_venta - self.monto_pagado).max(0.0);

        if es_total {
            self.estado_pago = PaymentStatus::Devuelta;
            // Clear the sub-epsilon residue so a fully returned sale reads as zero.
            self.precio_total_venta = 0.0;
            self.monto_pagado = 0.0;
            self.monto_restante = 0.0;
            self.historico = GyaSplit::default();
            self.capital = GyaSplit::default();
        } else if self.monto_restante <= EPSILON {
            self.estado_pago = PaymentStatus::Completo;
        } else if self.monto_pagado > EPSILON {
            self.estado_pago = PaymentStatus::Parcial;
        } else {
            self.estado_pago = PaymentStatus::Pendiente;
        }

        Ok(Devolucion {
            id: devolucion_id,
            sale_id: self.id,
            cantidad_devuelta,
            motivo: motivo.into(),
            reversal,
            capital_reversal,
            reembolso,
            es_total,
            occurred_at,
        })
    }

    /// Admin override of the historic split (GYA correction). The capital
    /// amounts are re-derived from the current paid fraction so the
    /// proportionality invariant keeps holding.
    pub fn correct_split(&mut self, historico: GyaSplit) -> DomainResult<()> {
        if self.is_devuelta() {
            return Err(DomainError::invariant("cannot correct a returned sale"));
        }
        if !approx_eq(historico.total(), self.precio_total_venta) {
            return Err(DomainError::invariant(format!(
                "corrected split must sum to the sale total {:.2} (got {:.2})",
                self.precio_total_venta,
                historico.total()
            )));
        }
        let paid_fraction = self.paid_fraction();
        self.historico = historico;
        self.capital = proportional(&historico, paid_fraction)?;
        Ok(())
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Sale {
    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids() -> (SaleId, ClientId, PurchaseOrderId) {
        (
            SaleId::new(EntityId::new()),
            ClientId::new(EntityId::new()),
            PurchaseOrderId::new(EntityId::new()),
        )
    }

    fn worked_sale(monto_pagado: f64) -> Sale {
        let (sale_id, client_id, oc_id) = ids();
        Sale::create(
            sale_id,
            client_id,
            oc_id,
            None,
            3,
            28_000.0,
            20_000.0,
            500.0,
            monto_pagado,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn fully_paid_sale_realizes_the_whole_split() {
        let sale = worked_sale(84_000.0);
        assert!(approx_eq(sale.precio_total_venta, 84_000.0));
        assert!(approx_eq(sale.historico.boveda_monte, 60_000.0));
        assert!(approx_eq(sale.historico.fletes, 1_500.0));
        assert!(approx_eq(sale.historico.utilidades, 22_500.0));
        assert!(sale.capital.approx_eq(&sale.historico));
        assert_eq!(sale.estado_pago, PaymentStatus::Completo);
    }

    #[test]
    fn unpaid_sale_has_zero_capital() {
        let sale = worked_sale(0.0);
        assert_eq!(sale.estado_pago, PaymentStatus::Pendiente);
        assert!(approx_eq(sale.capital.total(), 0.0));
        assert!(approx_eq(sale.monto_restante, 84_000.0));
    }

    #[test]
    fn below_cost_sale_is_rejected() {
        let (sale_id, client_id, oc_id) = ids();
        let err = Sale::create(
            sale_id, client_id, oc_id, None, 3, 20_000.0, 20_000.0, 500.0, 0.0,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn initial_payment_cannot_exceed_total() {
        let (sale_id, client_id, oc_id) = ids();
        let err = Sale::create(
            sale_id, client_id, oc_id, None, 1, 100.0, 50.0, 0.0, 200.0,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn half_abono_realizes_half_of_each_bucket() {
        let mut sale = worked_sale(0.0);
        let abono = sale
            .register_abono(AbonoId::new(EntityId::new()), 42_000.0, Utc::now())
            .unwrap();

        assert!(approx_eq(abono.split.boveda_monte, 30_000.0));
        assert!(approx_eq(abono.split.fletes, 750.0));
        assert!(approx_eq(abono.split.utilidades, 11_250.0));
        assert!(approx_eq(abono.monto_pagado_acumulado, 42_000.0));

        assert_eq!(sale.estado_pago, PaymentStatus::Parcial);
        assert!(approx_eq(sale.capital.total(), 42_000.0));
        assert!(approx_eq(sale.monto_restante, 42_000.0));
    }

    #[test]
    fn abono_beyond_remaining_balance_is_rejected_without_mutation() {
        let mut sale = worked_sale(80_000.0);
        let before = sale.clone();
        let err = sale
            .register_abono(AbonoId::new(EntityId::new()), 5_000.0, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(sale, before);
    }

    #[test]
    fn abono_completes_the_sale() {
        let mut sale = worked_sale(0.0);
        sale.register_abono(AbonoId::new(EntityId::new()), 42_000.0, Utc::now())
            .unwrap();
        sale.register_abono(AbonoId::new(EntityId::new()), 42_000.0, Utc::now())
            .unwrap();
        assert_eq!(sale.estado_pago, PaymentStatus::Completo);
        assert!(sale.capital.approx_eq(&sale.historico));
    }

    #[test]
    fn full_return_zeroes_the_sale() {
        let mut sale = worked_sale(84_000.0);
        let dev = sale
            .process_return(DevolucionId::new(EntityId::new()), 3, "producto dañado", Utc::now())
            .unwrap();

        assert!(dev.es_total);
        assert!(approx_eq(dev.reversal.total(), 84_000.0));
        assert!(approx_eq(dev.reembolso, 84_000.0));
        assert_eq!(sale.estado_pago, PaymentStatus::Devuelta);
        assert!(approx_eq(sale.precio_total_venta, 0.0));
        assert!(approx_eq(sale.capital.total(), 0.0));
    }

    #[test]
    fn partial_return_on_unpaid_sale_refunds_nothing() {
        let mut sale = worked_sale(0.0);
        let dev = sale
            .process_return(DevolucionId::new(EntityId::new()), 1, "ajuste", Utc::now())
            .unwrap();

        assert!(!dev.es_total);
        assert!(approx_eq(dev.reembolso, 0.0));
        assert!(approx_eq(dev.reversal.total(), 28_000.0));
        assert_eq!(sale.cantidad, 2);
        assert!(approx_eq(sale.precio_total_venta, 56_000.0));
        assert_eq!(sale.estado_pago, PaymentStatus::Pendiente);
    }

    #[test]
    fn return_of_more_than_sold_is_rejected() {
        let mut sale = worked_sale(84_000.0);
        assert!(sale
            .process_return(DevolucionId::new(EntityId::new()), 4, "x", Utc::now())
            .is_err());
    }

    #[test]
    fn correction_must_preserve_the_total() {
        let mut sale = worked_sale(42_000.0);
        let bad = GyaSplit::new(1.0, 2.0, 3.0);
        assert!(sale.correct_split(bad).is_err());

        let good = GyaSplit::new(59_000.0, 2_500.0, 22_500.0);
        sale.correct_split(good).unwrap();
        assert!(sale.historico.approx_eq(&good));
        // Capital re-derived at the same paid fraction.
        assert!(approx_eq(sale.capital.total(), 42_000.0));
    }

    proptest! {
        /// Property: after any sequence of valid abonos,
        /// `capital == historico × (monto_pagado / precio_total_venta)`.
        #[test]
        fn capital_stays_proportional_to_payments(
            qty in 1u32..50,
            sale_price in 100.0f64..50_000.0,
            payments in prop::collection::vec(0.01f64..1.0, 1..8),
        ) {
            let (sale_id, client_id, oc_id) = ids();
            let mut sale = Sale::create(
                sale_id, client_id, oc_id, None, qty,
                sale_price, sale_price * 0.6, sale_price * 0.05, 0.0,
                Utc::now(),
            ).unwrap();

            for frac in payments {
                let monto = sale.monto_restante * frac;
                if monto <= 0.0 {
                    break;
                }
                sale.register_abono(AbonoId::new(EntityId::new()), monto, Utc::now()).unwrap();

                let expected = proportional(&sale.historico, sale.paid_fraction()).unwrap();
                let tolerance = sale.precio_total_venta * 1e-9 + EPSILON;
                prop_assert!((sale.capital.boveda_monte - expected.boveda_monte).abs() <= tolerance);
                prop_assert!((sale.capital.fletes - expected.fletes).abs() <= tolerance);
                prop_assert!((sale.capital.utilidades - expected.utilidades).abs() <= tolerance);
            }
        }

        /// Property: a partial return preserves the paid fraction, so the
        /// proportionality invariant survives returns too.
        #[test]
        fn returns_preserve_the_paid_fraction(
            qty in 2u32..50,
            sale_price in 100.0f64..50_000.0,
            paid_frac in 0.0f64..1.0,
        ) {
            let (sale_id, client_id, oc_id) = ids();
            let total = f64::from(qty) * sale_price;
            let mut sale = Sale::create(
                sale_id, client_id, oc_id, None, qty,
                sale_price, sale_price * 0.5, sale_price * 0.1, total * paid_frac,
                Utc::now(),
            ).unwrap();

            let fraction_before = sale.paid_fraction();
            sale.process_return(DevolucionId::new(EntityId::new()), qty / 2, "qa", Utc::now()).unwrap();
            prop_assert!((sale.paid_fraction() - fraction_before).abs() <= 1e-6);
        }
    }
}
