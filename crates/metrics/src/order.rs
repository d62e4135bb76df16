use chrono::{DateTime, Utc};

use gyaledger_purchasing::{Efficiency, PurchaseOrder, RotationMetrics};

/// Recompute a purchase order's rotation statistics.
///
/// Efficiency buckets by average days per unit sold: ≤7 excelente, ≤15
/// buena, ≤30 normal, ≤60 lenta, else muy lenta. An order with nothing sold
/// yet is given a week of grace before it reads as muy lenta.
pub fn recompute_order(order: &PurchaseOrder, now: DateTime<Utc>) -> RotationMetrics {
    let dias_desde_compra = (now - order.created_at).num_days().max(0);
    let sold = order.units_sold();
    let porcentaje_vendido = f64::from(sold) / f64::from(order.cantidad) * 100.0;

    let eficiencia = if sold == 0 {
        if dias_desde_compra <= 7 {
            Efficiency::Normal
        } else {
            Efficiency::MuyLenta
        }
    } else {
        let days_per_unit = dias_desde_compra as f64 / f64::from(sold);
        if days_per_unit <= 7.0 {
            Efficiency::Excelente
        } else if days_per_unit <= 15.0 {
            Efficiency::Buena
        } else if days_per_unit <= 30.0 {
            Efficiency::Normal
        } else if days_per_unit <= 60.0 {
            Efficiency::Lenta
        } else {
            Efficiency::MuyLenta
        }
    };

    RotationMetrics {
        dias_desde_compra,
        porcentaje_vendido,
        eficiencia,
        computed_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gyaledger_core::EntityId;
    use gyaledger_parties::DistributorId;
    use gyaledger_purchasing::PurchaseOrderId;

    fn order(cantidad: u32, sold: u32, days_ago: i64, now: DateTime<Utc>) -> PurchaseOrder {
        let mut oc = PurchaseOrder::new(
            PurchaseOrderId::new(EntityId::new()),
            DistributorId::new(EntityId::new()),
            None,
            cantidad,
            10_000.0,
            now - Duration::days(days_ago),
        )
        .unwrap();
        if sold > 0 {
            oc.consume_stock(sold).unwrap();
        }
        oc
    }

    #[test]
    fn fast_sellthrough_is_excelente() {
        let now = Utc::now();
        // 10 units in 20 days: 2 days per unit.
        let m = recompute_order(&order(20, 10, 20, now), now);
        assert_eq!(m.eficiencia, Efficiency::Excelente);
        assert_eq!(m.porcentaje_vendido, 50.0);
        assert_eq!(m.dias_desde_compra, 20);
    }

    #[test]
    fn buckets_follow_days_per_unit() {
        let now = Utc::now();
        assert_eq!(recompute_order(&order(10, 2, 20, now), now).eficiencia, Efficiency::Buena);
        assert_eq!(recompute_order(&order(10, 2, 50, now), now).eficiencia, Efficiency::Normal);
        assert_eq!(recompute_order(&order(10, 2, 100, now), now).eficiencia, Efficiency::Lenta);
        assert_eq!(recompute_order(&order(10, 2, 200, now), now).eficiencia, Efficiency::MuyLenta);
    }

    #[test]
    fn stale_order_with_no_sales_is_muy_lenta() {
        let now = Utc::now();
        assert_eq!(recompute_order(&order(10, 0, 3, now), now).eficiencia, Efficiency::Normal);
        assert_eq!(recompute_order(&order(10, 0, 30, now), now).eficiencia, Efficiency::MuyLenta);
    }
}
