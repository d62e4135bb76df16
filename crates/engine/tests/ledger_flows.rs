//! End-to-end flows: operations, bus-fed metrics recomputation, alerts.

use std::sync::Arc;

use chrono::Utc;

use gyaledger_alerts::AlertConfig;
use gyaledger_audit::{AuditLog, InMemoryAuditLog};
use gyaledger_banks::{Bank, BankKind};
use gyaledger_core::EntityId;
use gyaledger_distribution::approx_eq;
use gyaledger_engine::{
    AlertScanner, CreateSaleInput, LedgerEngine, LedgerEvent, LedgerStore, MetricsPipeline,
};
use gyaledger_events::{EventBus, EventEnvelope, EventHandler, InMemoryEventBus, Subscription};
use gyaledger_parties::{Client, ClientId, Distributor, DistributorId};
use gyaledger_products::{Product, ProductId};
use gyaledger_purchasing::{PurchaseOrder, PurchaseOrderId};
use gyaledger_sales::PaymentStatus;

type Bus = Arc<InMemoryEventBus<EventEnvelope<LedgerEvent>>>;

struct World {
    engine: LedgerEngine<Bus>,
    store: Arc<LedgerStore>,
    audit: Arc<InMemoryAuditLog>,
    pipeline: MetricsPipeline,
    subscription: Subscription<EventEnvelope<LedgerEvent>>,
    client_id: ClientId,
    product_id: ProductId,
    order_id: PurchaseOrderId,
}

fn world() -> World {
    let store = Arc::new(LedgerStore::new());
    store.provision_default_banks();

    let client_id = ClientId::new(EntityId::new());
    store.insert_client(Client::new(client_id, "Comercial del Valle", Utc::now()));

    let distributor_id = DistributorId::new(EntityId::new());
    store.insert_distributor(Distributor::new(distributor_id, "Mayorista Centro", Utc::now()));

    let product_id = ProductId::new(EntityId::new());
    store.insert_product(Product::new(product_id, "Costal 50kg", 50, Utc::now()));

    let order_id = PurchaseOrderId::new(EntityId::new());
    store.insert_order(
        PurchaseOrder::new(order_id, distributor_id, Some(product_id), 20, 400_000.0, Utc::now())
            .unwrap(),
    );

    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let subscription = bus.subscribe();
    let audit = Arc::new(InMemoryAuditLog::new());
    let engine = LedgerEngine::new(store.clone(), audit.clone(), bus);
    let pipeline = MetricsPipeline::new(store.clone());

    World {
        engine,
        store,
        audit,
        pipeline,
        subscription,
        client_id,
        product_id,
        order_id,
    }
}

impl World {
    fn sale_input(&self, cantidad: u32, monto_pagado: f64) -> CreateSaleInput {
        CreateSaleInput {
            client_id: self.client_id,
            purchase_order_id: self.order_id,
            product_id: Some(self.product_id),
            cantidad,
            precio_venta_unidad: 28_000.0,
            precio_compra_unidad: Some(20_000.0),
            precio_flete_unidad: Some(500.0),
            monto_pagado: Some(monto_pagado),
            actor: Some("vendedor".to_string()),
        }
    }

    /// Drain the bus into the pipeline, the way the worker thread would.
    fn drain_events(&self) {
        while let Ok(envelope) = self.subscription.try_recv() {
            self.pipeline.handle(&envelope).unwrap();
        }
    }

    fn gya_snapshot(&self) -> [Bank; 3] {
        self.store.gya_banks().unwrap()
    }
}

#[test]
fn sale_then_half_abono_then_full_return_round_trips_the_banks() {
    let w = world();
    let pre = w.gya_snapshot();

    // Unpaid sale books historic only.
    let created = w.engine.create_sale(w.sale_input(3, 0.0)).unwrap();
    assert_eq!(created.estado_pago, PaymentStatus::Pendiente);

    let mid = w.gya_snapshot();
    assert!(approx_eq(mid[0].historico_ingresos, 60_000.0));
    assert!(approx_eq(mid[0].capital_actual, 0.0));

    // 50% abono: capital is exactly half of each historic bucket.
    let abono = w.engine.register_abono(created.sale_id, 42_000.0, None).unwrap();
    assert_eq!(abono.estado_pago, PaymentStatus::Parcial);
    let mid = w.gya_snapshot();
    assert!(approx_eq(mid[0].capital_actual, 30_000.0));
    assert!(approx_eq(mid[1].capital_actual, 750.0));
    assert!(approx_eq(mid[2].capital_actual, 11_250.0));

    // Full return: banks back to their pre-sale values, historic included.
    let ret = w
        .engine
        .process_return(created.sale_id, 3, "cambio de pedido", true, None)
        .unwrap();
    assert!(ret.es_total);
    assert!(approx_eq(ret.reembolso, 42_000.0));

    let post = w.gya_snapshot();
    for (before, after) in pre.iter().zip(post.iter()) {
        assert!(approx_eq(before.capital_actual, after.capital_actual));
        assert!(approx_eq(before.historico_ingresos, after.historico_ingresos));
    }

    let client = w.store.client(w.client_id).unwrap();
    assert!(approx_eq(client.saldo_pendiente, 0.0));
    assert!(approx_eq(client.total_compras, 0.0));
    assert_eq!(w.store.order(w.order_id).unwrap().available_stock(), 20);
}

#[test]
fn events_drive_the_metrics_pipeline() {
    let w = world();

    let created = w.engine.create_sale(w.sale_input(3, 42_000.0)).unwrap();
    w.drain_events();

    let client = w.store.client(w.client_id).unwrap();
    assert!(approx_eq(client.metrics.total_comprado, 84_000.0));
    assert!(approx_eq(client.metrics.total_pagado, 42_000.0));
    assert!(approx_eq(client.metrics.saldo_pendiente, 42_000.0));
    assert_eq!(client.metrics.dias_sin_comprar, Some(0));

    let product = w.store.product(w.product_id).unwrap();
    assert_eq!(product.metrics.unidades_vendidas, 3);
    assert!(approx_eq(product.metrics.ingresos_mes, 84_000.0));

    let order = w.store.order(w.order_id).unwrap();
    assert!(approx_eq(order.metrics.porcentaje_vendido, 15.0));

    let distributor = w.store.distributor(order.distributor_id).unwrap();
    assert!(approx_eq(distributor.metrics.total_ordenado, 400_000.0));
    assert!(approx_eq(distributor.metrics.utilidad_realizada, 11_250.0));

    let [monte, _, _] = w.gya_snapshot();
    assert!(monte.metrics.computed_at.is_some());
    assert!(approx_eq(monte.metrics.hoy.ingresos, 30_000.0));

    // A second drain with no new events changes nothing (idempotence).
    let before = w.store.client(w.client_id).unwrap().metrics.clone();
    w.engine.register_abono(created.sale_id, 10_000.0, None).unwrap();
    w.drain_events();
    let after = w.store.client(w.client_id).unwrap().metrics;
    assert!(approx_eq(after.total_pagado, before.total_pagado + 10_000.0));
}

#[test]
fn recompute_all_visits_every_entity() {
    let w = world();
    w.engine.create_sale(w.sale_input(2, 56_000.0)).unwrap();

    // No event drain: the sweep alone must populate every metrics block.
    let now = Utc::now();
    w.pipeline.recompute_all(now);

    assert!(w.store.client(w.client_id).unwrap().metrics.computed_at.is_some());
    assert!(w.store.product(w.product_id).unwrap().metrics.computed_at.is_some());
    assert!(w.store.order(w.order_id).unwrap().metrics.computed_at.is_some());
    for bank in w.store.list_banks() {
        assert!(bank.metrics.computed_at.is_some());
    }
}

#[test]
fn audit_trail_records_every_operation() {
    let w = world();
    let created = w.engine.create_sale(w.sale_input(3, 84_000.0)).unwrap();
    w.engine
        .process_return(created.sale_id, 1, "unidad defectuosa", false, None)
        .unwrap();

    let monte = w.store.bank_by_kind(BankKind::BovedaMonte).unwrap();
    let ahorro = w.store.bank_by_kind(BankKind::Ahorro).unwrap();
    w.engine.transfer(monte.id, ahorro.id, 1_000.0, Some("tesorería".to_string())).unwrap();
    w.engine.pay_distributor(w.order_id, 20_000.0, monte.id, None).unwrap();

    let actions: Vec<String> = w.audit.entries().iter().map(|e| e.action.clone()).collect();
    assert_eq!(
        actions,
        vec![
            "venta.crear".to_string(),
            "venta.devolucion".to_string(),
            "banco.transferencia".to_string(),
            "orden.pago".to_string(),
        ]
    );

    // Snapshots captured for the sale mutations.
    let entries = w.audit.entries();
    assert!(entries[0].after.is_some());
    assert!(entries[1].before.is_some());
    assert_eq!(entries[0].affected_banks.len(), 3);
}

#[test]
fn low_stock_raised_by_scanner_after_sales() {
    let w = world();
    // Sell 17 of 20: stock at 15%, below the 20% threshold.
    w.engine.create_sale(w.sale_input(17, 0.0)).unwrap();

    let scanner = AlertScanner::new(w.store.clone(), AlertConfig::default());
    let opened = scanner.run_once(Utc::now());
    assert_eq!(opened, 1);

    let alerts = w.store.active_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].entity_id, w.order_id.0);

    // Returning stock clears the condition on the next scan.
    let sale = w.store.list_sales().pop().unwrap();
    w.engine.process_return(sale.id, 10, "sobró", true, None).unwrap();
    scanner.run_once(Utc::now());
    assert!(w.store.active_alerts().is_empty());
}

mod reversal_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: a full devolución followed by an identical re-sale
        /// leaves the banks exactly where the first sale left them.
        #[test]
        fn return_then_identical_sale_restores_bank_state(
            qty in 1u32..10,
            sale_price in 100.0f64..50_000.0,
            paid_frac in 0.0f64..=1.0,
        ) {
            let w = world();
            let total = f64::from(qty) * sale_price;
            let input = CreateSaleInput {
                client_id: w.client_id,
                purchase_order_id: w.order_id,
                product_id: Some(w.product_id),
                cantidad: qty,
                precio_venta_unidad: sale_price,
                precio_compra_unidad: Some(sale_price * 0.6),
                precio_flete_unidad: Some(sale_price * 0.05),
                monto_pagado: Some(total * paid_frac),
                actor: None,
            };

            let created = w.engine.create_sale(input.clone()).unwrap();
            let after_sale = w.gya_snapshot();

            w.engine.process_return(created.sale_id, qty, "qa", true, None).unwrap();
            w.engine.create_sale(input).unwrap();

            let after_resale = w.gya_snapshot();
            for (a, b) in after_sale.iter().zip(after_resale.iter()) {
                prop_assert!((a.capital_actual - b.capital_actual).abs() <= 1e-6);
                prop_assert!((a.historico_ingresos - b.historico_ingresos).abs() <= 1e-6);
            }
        }
    }
}

#[test]
fn deleting_a_sale_replays_into_clean_metrics() {
    let w = world();
    let created = w.engine.create_sale(w.sale_input(4, 50_000.0)).unwrap();
    w.drain_events();

    w.engine.delete_sale(created.sale_id, Some("admin".to_string())).unwrap();
    w.drain_events();

    let client = w.store.client(w.client_id).unwrap();
    assert!(approx_eq(client.metrics.total_comprado, 0.0));
    assert!(approx_eq(client.saldo_pendiente, 0.0));

    let product = w.store.product(w.product_id).unwrap();
    assert_eq!(product.metrics.unidades_vendidas, 0);

    let [monte, fletes, utilidades] = w.gya_snapshot();
    for bank in [&monte, &fletes, &utilidades] {
        assert!(approx_eq(bank.capital_actual, 0.0));
        assert!(approx_eq(bank.historico_ingresos, 0.0));
        // Movements were dropped with the sale, so flows read zero again.
        assert!(approx_eq(bank.metrics.mes.ingresos, 0.0));
    }
}
