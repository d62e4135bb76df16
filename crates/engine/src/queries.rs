//! Read-model queries for the dashboard surface.
//!
//! Joins sale rows with client/product/order display fields and nests the
//! split the way the UI consumes it. Pure reads; the api crate layers its
//! TTL cache on top.

use serde::Serialize;

use gyaledger_distribution::GyaSplit;
use gyaledger_purchasing::PurchaseOrderId;
use gyaledger_sales::{PaymentStatus, SaleId};

use crate::store::LedgerStore;

/// Profitability block nested under each sale record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rentabilidad {
    pub utilidad: f64,
    pub margen_bruto_pct: f64,
    pub margen_neto_pct: f64,
}

/// One joined sale row as served by `GET /sales`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub venta_id: SaleId,
    pub cliente: String,
    pub producto: Option<String>,
    pub oc_relacionada: PurchaseOrderId,
    pub cantidad: u32,
    pub precio_venta_unidad: f64,
    pub total_venta: f64,
    pub monto_pagado: f64,
    pub monto_restante: f64,
    pub estado_pago: PaymentStatus,
    #[serde(rename = "distribucionGYA")]
    pub distribucion_gya: GyaSplit,
    pub capital: GyaSplit,
    pub rentabilidad: Rentabilidad,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A page of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// Paginated, newest-first sale records with display joins.
pub fn list_sales(store: &LedgerStore, page: u32, per_page: u32) -> Page<SaleRecord> {
    let mut sales = store.list_sales();
    sales.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));

    let total = sales.len() as u64;
    let per_page = per_page.clamp(1, 200);
    let page = page.max(1);
    let start = (page as usize - 1).saturating_mul(per_page as usize);

    let items = sales
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(|sale| {
            let cliente = store
                .client(sale.client_id)
                .map(|c| c.nombre)
                .unwrap_or_else(|| sale.client_id.to_string());
            let producto = sale
                .product_id
                .and_then(|id| store.product(id))
                .map(|p| p.nombre);

            let total_venta = sale.precio_total_venta;
            let utilidad = sale.historico.utilidades;
            let rentabilidad = Rentabilidad {
                utilidad,
                margen_bruto_pct: if total_venta > 0.0 {
                    (total_venta - sale.historico.boveda_monte) / total_venta * 100.0
                } else {
                    0.0
                },
                margen_neto_pct: if total_venta > 0.0 {
                    utilidad / total_venta * 100.0
                } else {
                    0.0
                },
            };

            SaleRecord {
                venta_id: sale.id,
                cliente,
                producto,
                oc_relacionada: sale.purchase_order_id,
                cantidad: sale.cantidad,
                precio_venta_unidad: sale.precio_venta_unidad,
                total_venta,
                monto_pagado: sale.monto_pagado,
                monto_restante: sale.monto_restante,
                estado_pago: sale.estado_pago,
                distribucion_gya: sale.historico,
                capital: sale.capital,
                rentabilidad,
                created_at: sale.created_at,
            }
        })
        .collect();

    Page {
        items,
        page,
        per_page,
        total,
    }
}

/// All banks with their derived health metrics, stable order by name.
pub fn bank_overview(store: &LedgerStore) -> Vec<gyaledger_banks::Bank> {
    let mut banks = store.list_banks();
    banks.sort_by(|a, b| a.nombre.cmp(&b.nombre));
    banks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gyaledger_core::EntityId;
    use gyaledger_parties::{Client, ClientId, DistributorId};
    use gyaledger_purchasing::PurchaseOrder;
    use gyaledger_sales::Sale;
    use std::sync::Arc;

    fn seeded_store(sale_count: u32) -> Arc<LedgerStore> {
        let store = Arc::new(LedgerStore::new());
        let client_id = ClientId::new(EntityId::new());
        store.insert_client(Client::new(client_id, "Cliente Uno", Utc::now()));
        let order_id =
            gyaledger_purchasing::PurchaseOrderId::new(EntityId::new());
        store.insert_order(
            PurchaseOrder::new(
                order_id,
                DistributorId::new(EntityId::new()),
                None,
                1_000,
                1_000_000.0,
                Utc::now(),
            )
            .unwrap(),
        );

        for _ in 0..sale_count {
            let sale = Sale::create(
                SaleId::new(EntityId::new()),
                client_id,
                order_id,
                None,
                1,
                2_000.0,
                1_000.0,
                100.0,
                2_000.0,
                Utc::now(),
            )
            .unwrap();
            store
                .commit(crate::store::StagedWrites {
                    sales: vec![sale],
                    ..Default::default()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn pagination_splits_and_counts() {
        let store = seeded_store(5);
        let page = list_sales(&store, 1, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);

        let page3 = list_sales(&store, 3, 2);
        assert_eq!(page3.items.len(), 1);

        let beyond = list_sales(&store, 9, 2);
        assert!(beyond.items.is_empty());
    }

    #[test]
    fn records_join_display_fields_and_nest_the_split() {
        let store = seeded_store(1);
        let page = list_sales(&store, 1, 10);
        let record = &page.items[0];

        assert_eq!(record.cliente, "Cliente Uno");
        assert_eq!(record.estado_pago, PaymentStatus::Completo);
        assert!((record.rentabilidad.margen_neto_pct - 45.0).abs() < 1e-9);

        let json = serde_json::to_value(record).unwrap();
        assert!(json.get("distribucionGYA").is_some());
        assert!(json.get("rentabilidad").is_some());
        assert!(json.get("ventaId").is_some());
    }
}
