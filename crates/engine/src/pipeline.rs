//! Derived-metrics pipeline: consumes ledger events, recomputes statistics.
//!
//! Runs outside the transactional write path, fed by the bus. Each entity's
//! recompute is independent: a failure is logged and never aborts the rest,
//! and every recompute is a pure function of current store state, so
//! redelivery or replay converges on the same values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};

use gyaledger_banks::BankId;
use gyaledger_core::{DomainError, DomainResult};
use gyaledger_events::{EventEnvelope, EventHandler, Subscription};
use gyaledger_metrics::{
    recompute_bank, recompute_client, recompute_distributor, recompute_order, recompute_product,
};
use gyaledger_parties::{ClientId, DistributorId};
use gyaledger_products::ProductId;
use gyaledger_purchasing::PurchaseOrderId;

use crate::events::LedgerEvent;
use crate::store::LedgerStore;

/// Recomputes derived statistics for the entities a ledger event touched.
pub struct MetricsPipeline {
    store: Arc<LedgerStore>,
}

impl MetricsPipeline {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    fn refresh_client(&self, id: ClientId, now: DateTime<Utc>) -> DomainResult<()> {
        let client = self.store.client(id).ok_or(DomainError::NotFound)?;
        let sales = self.store.sales_by_client(id);
        let metrics = recompute_client(&client, &sales, now);
        self.store.set_client_metrics(id, metrics)
    }

    fn refresh_distributor(&self, id: DistributorId, now: DateTime<Utc>) -> DomainResult<()> {
        let distributor = self.store.distributor(id).ok_or(DomainError::NotFound)?;
        let orders = self.store.list_orders();
        let sales = self.store.list_sales();
        let metrics = recompute_distributor(&distributor, &orders, &sales, now);
        self.store.set_distributor_metrics(id, metrics)
    }

    fn refresh_product(&self, id: ProductId, now: DateTime<Utc>) -> DomainResult<()> {
        let product = self.store.product(id).ok_or(DomainError::NotFound)?;
        let sales = self.store.list_sales();
        let metrics = recompute_product(&product, &sales, now);
        self.store.set_product_metrics(id, metrics)
    }

    fn refresh_order(&self, id: PurchaseOrderId, now: DateTime<Utc>) -> DomainResult<()> {
        let order = self.store.order(id).ok_or(DomainError::NotFound)?;
        let metrics = recompute_order(&order, now);
        self.store.set_order_metrics(id, metrics)?;
        // The order's sell-through feeds its distributor's aggregates too.
        self.refresh_distributor(order.distributor_id, now)
    }

    fn refresh_bank(&self, id: BankId, now: DateTime<Utc>) -> DomainResult<()> {
        let bank = self.store.bank(id).ok_or(DomainError::NotFound)?;
        let movements = self.store.movements_by_bank(id);
        let metrics = recompute_bank(&bank, &movements, now);
        self.store.set_bank_metrics(id, metrics)
    }

    fn guarded(&self, what: &str, result: DomainResult<()>) {
        if let Err(err) = result {
            tracing::warn!(entity = what, error = %err, "metrics recompute failed; other entities continue");
        }
    }

    /// One sale-shaped fan-out: client, product, order (+ its distributor),
    /// and the three GYA banks.
    fn refresh_sale_entities(
        &self,
        client_id: ClientId,
        product_id: Option<ProductId>,
        order_id: PurchaseOrderId,
        bank_ids: [BankId; 3],
        now: DateTime<Utc>,
    ) {
        self.guarded("client", self.refresh_client(client_id, now));
        if let Some(product_id) = product_id {
            self.guarded("product", self.refresh_product(product_id, now));
        }
        self.guarded("order", self.refresh_order(order_id, now));
        for bank_id in bank_ids {
            self.guarded("bank", self.refresh_bank(bank_id, now));
        }
    }

    /// Recompute exactly the entities `event` names.
    pub fn recompute_for(&self, event: &LedgerEvent, now: DateTime<Utc>) {
        match event {
            LedgerEvent::SaleCreated(e) => {
                self.refresh_sale_entities(e.client_id, e.product_id, e.purchase_order_id, e.bank_ids, now);
            }
            LedgerEvent::AbonoRegistered(e) => {
                self.refresh_sale_entities(e.client_id, e.product_id, e.purchase_order_id, e.bank_ids, now);
            }
            LedgerEvent::ReturnProcessed(e) => {
                self.refresh_sale_entities(e.client_id, e.product_id, e.purchase_order_id, e.bank_ids, now);
            }
            LedgerEvent::SaleCorrected(e) => {
                self.refresh_sale_entities(e.client_id, e.product_id, e.purchase_order_id, e.bank_ids, now);
            }
            LedgerEvent::SaleDeleted(e) => {
                self.refresh_sale_entities(e.client_id, e.product_id, e.purchase_order_id, e.bank_ids, now);
            }
            LedgerEvent::TransferExecuted(e) => {
                self.guarded("bank", self.refresh_bank(e.origen, now));
                self.guarded("bank", self.refresh_bank(e.destino, now));
            }
            LedgerEvent::DistributorPaid(e) => {
                self.guarded("distributor", self.refresh_distributor(e.distributor_id, now));
                self.guarded("order", self.refresh_order(e.purchase_order_id, now));
                self.guarded("bank", self.refresh_bank(e.bank_id, now));
            }
        }
    }

    /// Visit every entity. Init/audit/correction path — slow by design and
    /// explicitly off the request-latency path.
    pub fn recompute_all(&self, now: DateTime<Utc>) {
        for client in self.store.list_clients() {
            self.guarded("client", self.refresh_client(client.id, now));
        }
        for product in self.store.list_products() {
            self.guarded("product", self.refresh_product(product.id, now));
        }
        for order in self.store.list_orders() {
            self.guarded("order", self.refresh_order(order.id, now));
        }
        for distributor in self.store.list_distributors() {
            self.guarded("distributor", self.refresh_distributor(distributor.id, now));
        }
        for bank in self.store.list_banks() {
            self.guarded("bank", self.refresh_bank(bank.id, now));
        }
    }
}

impl EventHandler<EventEnvelope<LedgerEvent>> for MetricsPipeline {
    type Error = DomainError;

    fn handle(&self, message: &EventEnvelope<LedgerEvent>) -> Result<(), Self::Error> {
        self.recompute_for(message.payload(), Utc::now());
        Ok(())
    }
}

/// Drive a pipeline off a bus subscription on a dedicated thread.
///
/// Polls with a short timeout so the shutdown flag is honored promptly;
/// exits when the bus is dropped.
pub fn spawn_worker(
    pipeline: Arc<MetricsPipeline>,
    subscription: Subscription<EventEnvelope<LedgerEvent>>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            match subscription.recv_timeout(Duration::from_millis(200)) {
                Ok(envelope) => {
                    let _ = pipeline.handle(&envelope);
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}
