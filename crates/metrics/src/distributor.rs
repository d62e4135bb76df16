use chrono::{DateTime, Utc};
use std::collections::HashSet;

use gyaledger_parties::{Distributor, DistributorMetrics};
use gyaledger_purchasing::PurchaseOrder;
use gyaledger_sales::Sale;

/// Recompute a distributor's derived statistics from their purchase orders
/// and the sales traced back to those orders.
pub fn recompute_distributor(
    distributor: &Distributor,
    orders: &[PurchaseOrder],
    sales: &[Sale],
    now: DateTime<Utc>,
) -> DistributorMetrics {
    let own: Vec<&PurchaseOrder> = orders
        .iter()
        .filter(|o| o.distributor_id == distributor.id)
        .collect();

    let total_ordenado: f64 = own.iter().map(|o| o.costo_total).sum();
    let total_pagado: f64 = own.iter().map(|o| o.monto_pagado).sum();
    let total_pendiente: f64 = own.iter().map(|o| o.remaining_balance()).sum();
    let stock_total: u64 = own.iter().map(|o| u64::from(o.available_stock())).sum();

    let order_ids: HashSet<_> = own.iter().map(|o| o.id).collect();
    let linked: Vec<&Sale> = sales
        .iter()
        .filter(|s| order_ids.contains(&s.purchase_order_id))
        .collect();

    // Realized profit: only the collected share of the utilidades bucket.
    let utilidad_realizada: f64 = linked.iter().map(|s| s.capital.utilidades).sum();

    let margins: Vec<f64> = linked
        .iter()
        .filter(|s| s.precio_total_venta > 0.0)
        .map(|s| s.historico.utilidades / s.precio_total_venta * 100.0)
        .collect();
    let margen_promedio_pct = if margins.is_empty() {
        0.0
    } else {
        margins.iter().sum::<f64>() / margins.len() as f64
    };

    DistributorMetrics {
        total_ordenado,
        total_pagado,
        total_pendiente,
        stock_total,
        utilidad_realizada,
        margen_promedio_pct,
        computed_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyaledger_core::EntityId;
    use gyaledger_parties::{ClientId, DistributorId};
    use gyaledger_purchasing::PurchaseOrderId;
    use gyaledger_sales::SaleId;

    #[test]
    fn aggregates_orders_and_linked_sales() {
        let dist = Distributor::new(DistributorId::new(EntityId::new()), "Central", Utc::now());
        let mut order = PurchaseOrder::new(
            PurchaseOrderId::new(EntityId::new()),
            dist.id,
            None,
            10,
            200_000.0,
            Utc::now(),
        )
        .unwrap();
        order.register_payment(50_000.0).unwrap();
        order.consume_stock(3).unwrap();

        let sale = Sale::create(
            SaleId::new(EntityId::new()),
            ClientId::new(EntityId::new()),
            order.id,
            None,
            3,
            28_000.0,
            20_000.0,
            500.0,
            84_000.0,
            Utc::now(),
        )
        .unwrap();

        let m = recompute_distributor(&dist, &[order], &[sale], Utc::now());
        assert_eq!(m.total_ordenado, 200_000.0);
        assert_eq!(m.total_pagado, 50_000.0);
        assert_eq!(m.total_pendiente, 150_000.0);
        assert_eq!(m.stock_total, 7);
        // Fully paid sale: realized profit equals the whole utilidades bucket.
        assert!((m.utilidad_realizada - 22_500.0).abs() < 1e-6);
        assert!(m.margen_promedio_pct > 26.0 && m.margen_promedio_pct < 27.0);
    }

    #[test]
    fn unrelated_orders_do_not_count() {
        let dist = Distributor::new(DistributorId::new(EntityId::new()), "Central", Utc::now());
        let other = PurchaseOrder::new(
            PurchaseOrderId::new(EntityId::new()),
            DistributorId::new(EntityId::new()),
            None,
            5,
            50_000.0,
            Utc::now(),
        )
        .unwrap();

        let m = recompute_distributor(&dist, &[other], &[], Utc::now());
        assert_eq!(m.total_ordenado, 0.0);
    }
}
