//! Scheduled alert scanning over current ledger state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use gyaledger_alerts::{scan_clients, scan_stock, AlertConfig, ScanOutcome};

use crate::store::LedgerStore;

/// Applies the stateless alert rules to the store on a schedule (or after
/// writes). Idempotent: already-open alerts are never duplicated, recovered
/// entities get their alerts resolved.
pub struct AlertScanner {
    store: Arc<LedgerStore>,
    config: AlertConfig,
}

impl AlertScanner {
    pub fn new(store: Arc<LedgerStore>, config: AlertConfig) -> Self {
        Self { store, config }
    }

    fn apply(&self, outcome: ScanOutcome, now: DateTime<Utc>) -> usize {
        let mut changes = 0;
        for alert in outcome.open {
            tracing::info!(kind = ?alert.kind, entity = %alert.entity_id, "alert opened");
            self.store.insert_alert(alert);
            changes += 1;
        }
        for id in outcome.resolve {
            match self.store.resolve_alert(id, now) {
                Ok(()) => changes += 1,
                Err(err) => {
                    tracing::warn!(alert = %id, error = %err, "alert resolution failed");
                }
            }
        }
        changes
    }

    /// Run both scans once; returns the number of alerts opened/resolved.
    pub fn run_once(&self, now: DateTime<Utc>) -> usize {
        let orders = self.store.list_orders();
        let clients = self.store.list_clients();
        let active = self.store.active_alerts();

        let stock = scan_stock(&orders, &active, &self.config, now);
        let delinquency = scan_clients(&clients, &active, &self.config, now);

        self.apply(stock, now) + self.apply(delinquency, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gyaledger_core::EntityId;
    use gyaledger_parties::{Client, ClientId, DistributorId};
    use gyaledger_purchasing::{PurchaseOrder, PurchaseOrderId};

    #[test]
    fn rerunning_the_scan_never_duplicates_alerts() {
        let store = Arc::new(LedgerStore::new());

        let mut order = PurchaseOrder::new(
            PurchaseOrderId::new(EntityId::new()),
            DistributorId::new(EntityId::new()),
            None,
            100,
            100_000.0,
            Utc::now(),
        )
        .unwrap();
        order.consume_stock(90).unwrap();
        store.insert_order(order);

        let mut client = Client::new(ClientId::new(EntityId::new()), "Moroso", Utc::now());
        client.saldo_pendiente = 5_000.0;
        client.metrics.dias_sin_comprar = Some(40);
        store.insert_client(client);

        let scanner = AlertScanner::new(store.clone(), AlertConfig::default());
        let now = Utc::now();

        assert_eq!(scanner.run_once(now), 2);
        assert_eq!(store.active_alerts().len(), 2);

        // Second run: same state, no new alerts.
        assert_eq!(scanner.run_once(now + Duration::minutes(5)), 0);
        assert_eq!(store.active_alerts().len(), 2);
    }
}
