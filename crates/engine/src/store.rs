//! In-memory relational store with staged atomic commits.
//!
//! Operations read cloned rows, mutate the clones, and hand the full set of
//! staged writes to [`LedgerStore::commit`], which applies them under one
//! write lock. Version checks run before anything is touched, so a commit
//! either lands wholesale or leaves the store exactly as it was.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use gyaledger_alerts::{Alert, AlertId};
use gyaledger_banks::{Bank, BankId, BankKind, BankMetrics, Movement, MovementId};
use gyaledger_core::{DomainError, DomainResult, EntityId, ExpectedVersion, Versioned};
use gyaledger_parties::{
    Client, ClientId, ClientMetrics, Distributor, DistributorId, DistributorMetrics,
};
use gyaledger_products::{Product, ProductId, ProductMetrics};
use gyaledger_purchasing::{PurchaseOrder, PurchaseOrderId, RotationMetrics};
use gyaledger_sales::{Abono, AbonoId, Devolucion, DevolucionId, Sale, SaleId};

#[derive(Default)]
struct Tables {
    banks: HashMap<BankId, Bank>,
    clients: HashMap<ClientId, Client>,
    distributors: HashMap<DistributorId, Distributor>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<PurchaseOrderId, PurchaseOrder>,
    sales: HashMap<SaleId, Sale>,
    abonos: HashMap<AbonoId, Abono>,
    devoluciones: HashMap<DevolucionId, Devolucion>,
    movements: HashMap<MovementId, Movement>,
    alerts: HashMap<AlertId, Alert>,
}

/// The writes one operation wants applied atomically.
///
/// Versioned tables (sales, banks, clients, distributors, products, orders)
/// are upserts checked against the stored row version; the append-only
/// tables (abonos, devoluciones, movements) are plain inserts.
#[derive(Default)]
pub struct StagedWrites {
    pub sales: Vec<Sale>,
    pub banks: Vec<Bank>,
    pub clients: Vec<Client>,
    pub distributors: Vec<Distributor>,
    pub products: Vec<Product>,
    pub orders: Vec<PurchaseOrder>,
    pub abonos: Vec<Abono>,
    pub devoluciones: Vec<Devolucion>,
    pub movements: Vec<Movement>,
    /// Admin delete: removes the sale and cascades to its abonos,
    /// devoluciones and movements.
    pub delete_sale: Option<SaleId>,
}

fn check_versions<K, V>(map: &HashMap<K, V>, staged: &[V], key: impl Fn(&V) -> K) -> DomainResult<()>
where
    K: Eq + core::hash::Hash,
    V: Versioned,
{
    for row in staged {
        if let Some(existing) = map.get(&key(row)) {
            ExpectedVersion::Exact(existing.version()).check(row.version())?;
        }
    }
    Ok(())
}

fn apply_upserts<K, V>(map: &mut HashMap<K, V>, staged: Vec<V>, key: impl Fn(&V) -> K)
where
    K: Eq + core::hash::Hash,
    V: Versioned,
{
    for mut row in staged {
        row.bump_version();
        map.insert(key(&row), row);
    }
}

/// The single shared store behind the transaction engine.
#[derive(Default)]
pub struct LedgerStore {
    inner: RwLock<Tables>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let tables = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&tables)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut tables)
    }

    /// Apply a set of staged writes all-or-nothing.
    ///
    /// All version checks run before the first row is written; a stale row
    /// fails the whole commit with `Conflict` and the caller retries from a
    /// fresh snapshot.
    pub fn commit(&self, writes: StagedWrites) -> DomainResult<()> {
        self.write(|t| {
            check_versions(&t.sales, &writes.sales, |s| s.id)?;
            check_versions(&t.banks, &writes.banks, |b| b.id)?;
            check_versions(&t.clients, &writes.clients, |c| c.id)?;
            check_versions(&t.distributors, &writes.distributors, |d| d.id)?;
            check_versions(&t.products, &writes.products, |p| p.id)?;
            check_versions(&t.orders, &writes.orders, |o| o.id)?;

            apply_upserts(&mut t.sales, writes.sales, |s| s.id);
            apply_upserts(&mut t.banks, writes.banks, |b| b.id);
            apply_upserts(&mut t.clients, writes.clients, |c| c.id);
            apply_upserts(&mut t.distributors, writes.distributors, |d| d.id);
            apply_upserts(&mut t.products, writes.products, |p| p.id);
            apply_upserts(&mut t.orders, writes.orders, |o| o.id);

            for abono in writes.abonos {
                t.abonos.insert(abono.id, abono);
            }
            for dev in writes.devoluciones {
                t.devoluciones.insert(dev.id, dev);
            }
            for movement in writes.movements {
                t.movements.insert(movement.id, movement);
            }

            if let Some(sale_id) = writes.delete_sale {
                t.sales.remove(&sale_id);
                t.abonos.retain(|_, a| a.sale_id != sale_id);
                t.devoluciones.retain(|_, d| d.sale_id != sale_id);
                t.movements.retain(|_, m| m.related != Some(sale_id.0));
            }

            Ok(())
        })
    }

    // ---- seeding ---------------------------------------------------------

    pub fn insert_bank(&self, bank: Bank) {
        self.write(|t| {
            t.banks.insert(bank.id, bank);
        });
    }

    pub fn insert_client(&self, client: Client) {
        self.write(|t| {
            t.clients.insert(client.id, client);
        });
    }

    pub fn insert_distributor(&self, distributor: Distributor) {
        self.write(|t| {
            t.distributors.insert(distributor.id, distributor);
        });
    }

    pub fn insert_product(&self, product: Product) {
        self.write(|t| {
            t.products.insert(product.id, product);
        });
    }

    pub fn insert_order(&self, order: PurchaseOrder) {
        self.write(|t| {
            t.orders.insert(order.id, order);
        });
    }

    /// Create the five standard ledgers (the three GYA destinations plus the
    /// independent savings/investment accounts).
    pub fn provision_default_banks(&self) {
        let banks = [
            ("Bóveda Monte", BankKind::BovedaMonte),
            ("Fletes", BankKind::Fletes),
            ("Utilidades", BankKind::Utilidades),
            ("Ahorro", BankKind::Ahorro),
            ("Inversión", BankKind::Inversion),
        ];
        for (nombre, kind) in banks {
            if self.bank_by_kind(kind).is_none() {
                self.insert_bank(Bank::new(BankId::new(EntityId::new()), nombre, kind));
            }
        }
    }

    // ---- reads -----------------------------------------------------------

    pub fn bank(&self, id: BankId) -> Option<Bank> {
        self.read(|t| t.banks.get(&id).cloned())
    }

    pub fn bank_by_kind(&self, kind: BankKind) -> Option<Bank> {
        self.read(|t| t.banks.values().find(|b| b.kind == kind).cloned())
    }

    /// The three GYA banks in split order, or an invariant error if the
    /// ledger has not been provisioned.
    pub fn gya_banks(&self) -> DomainResult<[Bank; 3]> {
        let [monte, fletes, utilidades] = BankKind::gya();
        Ok([
            self.bank_by_kind(monte)
                .ok_or_else(|| DomainError::invariant("bóveda monte bank not provisioned"))?,
            self.bank_by_kind(fletes)
                .ok_or_else(|| DomainError::invariant("fletes bank not provisioned"))?,
            self.bank_by_kind(utilidades)
                .ok_or_else(|| DomainError::invariant("utilidades bank not provisioned"))?,
        ])
    }

    pub fn list_banks(&self) -> Vec<Bank> {
        self.read(|t| t.banks.values().cloned().collect())
    }

    pub fn client(&self, id: ClientId) -> Option<Client> {
        self.read(|t| t.clients.get(&id).cloned())
    }

    pub fn list_clients(&self) -> Vec<Client> {
        self.read(|t| t.clients.values().cloned().collect())
    }

    pub fn distributor(&self, id: DistributorId) -> Option<Distributor> {
        self.read(|t| t.distributors.get(&id).cloned())
    }

    pub fn list_distributors(&self) -> Vec<Distributor> {
        self.read(|t| t.distributors.values().cloned().collect())
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.read(|t| t.products.get(&id).cloned())
    }

    pub fn list_products(&self) -> Vec<Product> {
        self.read(|t| t.products.values().cloned().collect())
    }

    pub fn order(&self, id: PurchaseOrderId) -> Option<PurchaseOrder> {
        self.read(|t| t.orders.get(&id).cloned())
    }

    pub fn list_orders(&self) -> Vec<PurchaseOrder> {
        self.read(|t| t.orders.values().cloned().collect())
    }

    pub fn sale(&self, id: SaleId) -> Option<Sale> {
        self.read(|t| t.sales.get(&id).cloned())
    }

    pub fn list_sales(&self) -> Vec<Sale> {
        self.read(|t| t.sales.values().cloned().collect())
    }

    pub fn sales_by_client(&self, client_id: ClientId) -> Vec<Sale> {
        self.read(|t| {
            t.sales
                .values()
                .filter(|s| s.client_id == client_id)
                .cloned()
                .collect()
        })
    }

    pub fn abonos_by_sale(&self, sale_id: SaleId) -> Vec<Abono> {
        self.read(|t| {
            let mut abonos: Vec<Abono> = t
                .abonos
                .values()
                .filter(|a| a.sale_id == sale_id)
                .cloned()
                .collect();
            abonos.sort_by_key(|a| a.occurred_at);
            abonos
        })
    }

    pub fn devoluciones_by_sale(&self, sale_id: SaleId) -> Vec<Devolucion> {
        self.read(|t| {
            t.devoluciones
                .values()
                .filter(|d| d.sale_id == sale_id)
                .cloned()
                .collect()
        })
    }

    pub fn list_movements(&self) -> Vec<Movement> {
        self.read(|t| t.movements.values().cloned().collect())
    }

    pub fn movements_by_bank(&self, bank_id: BankId) -> Vec<Movement> {
        self.read(|t| {
            let mut movements: Vec<Movement> = t
                .movements
                .values()
                .filter(|m| m.bank_id == bank_id)
                .cloned()
                .collect();
            movements.sort_by_key(|m| m.occurred_at);
            movements
        })
    }

    pub fn movements_related(&self, related: EntityId) -> Vec<Movement> {
        self.read(|t| {
            t.movements
                .values()
                .filter(|m| m.related == Some(related))
                .cloned()
                .collect()
        })
    }

    // ---- metrics (pipeline-owned writes) ---------------------------------
    //
    // Derived fields are not business state; the pipeline overwrites them in
    // place without touching row versions, so a metrics refresh can never
    // conflict with a transactional write.

    pub fn set_client_metrics(&self, id: ClientId, metrics: ClientMetrics) -> DomainResult<()> {
        self.write(|t| {
            let client = t.clients.get_mut(&id).ok_or(DomainError::NotFound)?;
            client.metrics = metrics;
            Ok(())
        })
    }

    pub fn set_distributor_metrics(
        &self,
        id: DistributorId,
        metrics: DistributorMetrics,
    ) -> DomainResult<()> {
        self.write(|t| {
            let distributor = t.distributors.get_mut(&id).ok_or(DomainError::NotFound)?;
            distributor.metrics = metrics;
            Ok(())
        })
    }

    pub fn set_product_metrics(&self, id: ProductId, metrics: ProductMetrics) -> DomainResult<()> {
        self.write(|t| {
            let product = t.products.get_mut(&id).ok_or(DomainError::NotFound)?;
            product.metrics = metrics;
            Ok(())
        })
    }

    pub fn set_order_metrics(
        &self,
        id: PurchaseOrderId,
        metrics: RotationMetrics,
    ) -> DomainResult<()> {
        self.write(|t| {
            let order = t.orders.get_mut(&id).ok_or(DomainError::NotFound)?;
            order.metrics = metrics;
            Ok(())
        })
    }

    pub fn set_bank_metrics(&self, id: BankId, metrics: BankMetrics) -> DomainResult<()> {
        self.write(|t| {
            let bank = t.banks.get_mut(&id).ok_or(DomainError::NotFound)?;
            bank.metrics = metrics;
            Ok(())
        })
    }

    // ---- alerts ----------------------------------------------------------

    pub fn insert_alert(&self, alert: Alert) {
        self.write(|t| {
            t.alerts.insert(alert.id, alert);
        });
    }

    pub fn list_alerts(&self) -> Vec<Alert> {
        self.read(|t| t.alerts.values().cloned().collect())
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.read(|t| t.alerts.values().filter(|a| a.is_active()).cloned().collect())
    }

    pub fn resolve_alert(&self, id: AlertId, now: DateTime<Utc>) -> DomainResult<()> {
        self.write(|t| {
            let alert = t.alerts.get_mut(&id).ok_or(DomainError::NotFound)?;
            alert.resolve(now)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_rejects_stale_versions_without_applying_anything() {
        let store = LedgerStore::new();
        store.provision_default_banks();
        let bank = store.bank_by_kind(BankKind::Utilidades).unwrap();

        // First writer lands and bumps the version.
        let mut first = bank.clone();
        first.collect_capital(100.0).unwrap();
        store
            .commit(StagedWrites {
                banks: vec![first],
                ..Default::default()
            })
            .unwrap();

        // Second writer still holds the old snapshot.
        let mut stale = bank;
        stale.collect_capital(50.0).unwrap();
        let err = store
            .commit(StagedWrites {
                banks: vec![stale],
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let stored = store.bank_by_kind(BankKind::Utilidades).unwrap();
        assert_eq!(stored.capital_actual, 100.0);
    }

    #[test]
    fn provisioning_is_idempotent() {
        let store = LedgerStore::new();
        store.provision_default_banks();
        store.provision_default_banks();
        assert_eq!(store.list_banks().len(), 5);
    }
}
