use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::EntityId;
use gyaledger_parties::Client;
use gyaledger_purchasing::{OrderStatus, PurchaseOrder};

use crate::alert::{Alert, AlertId, AlertKind, AlertSeverity, AlertStatus};

/// Thresholds for the alert rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Open a stock alert at or below this fraction of the ordered quantity.
    pub stock_threshold_pct: f64,
    /// Escalate the stock alert to critical at or below this fraction.
    pub stock_critical_pct: f64,
    /// Days without purchases before an indebted client is flagged.
    pub overdue_days: i64,
    /// Days without purchases before the flag escalates to critical.
    pub critical_days: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            stock_threshold_pct: 0.20,
            stock_critical_pct: 0.05,
            overdue_days: 30,
            critical_days: 60,
        }
    }
}

/// What a scan decided: alerts to open and active alerts to resolve.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub open: Vec<Alert>,
    pub resolve: Vec<AlertId>,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.resolve.is_empty()
    }
}

fn has_active(active: &[Alert], entity_id: EntityId, kind: AlertKind) -> Option<AlertId> {
    active
        .iter()
        .find(|a| a.estado == AlertStatus::Activa && a.entity_id == entity_id && a.kind == kind)
        .map(|a| a.id)
}

/// Stock scan over open purchase orders.
///
/// Safe to re-run on a schedule: an order already alerted stays alerted (no
/// duplicate), an order back above the threshold gets its alert resolved.
pub fn scan_stock(
    orders: &[PurchaseOrder],
    active: &[Alert],
    config: &AlertConfig,
    now: DateTime<Utc>,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for order in orders {
        if order.estado != OrderStatus::Abierta {
            continue;
        }
        let fraction = order.stock_fraction();
        let existing = has_active(active, order.id.0, AlertKind::StockBajo);

        if fraction <= config.stock_threshold_pct {
            if existing.is_none() {
                let severity = if fraction <= config.stock_critical_pct {
                    AlertSeverity::Critica
                } else {
                    AlertSeverity::Alta
                };
                outcome.open.push(Alert::open(
                    AlertKind::StockBajo,
                    severity,
                    order.id.0,
                    format!(
                        "orden de compra al {:.0}% de stock ({} de {} unidades)",
                        fraction * 100.0,
                        order.available_stock(),
                        order.cantidad
                    ),
                    now,
                ));
            }
        } else if let Some(id) = existing {
            outcome.resolve.push(id);
        }
    }

    outcome
}

/// Delinquency scan over clients.
///
/// A client owes money and has not bought in `overdue_days` → alert; past
/// `critical_days` the severity escalates. Clients that paid up or bought
/// again get their active alert resolved.
pub fn scan_clients(
    clients: &[Client],
    active: &[Alert],
    config: &AlertConfig,
    now: DateTime<Utc>,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for client in clients {
        let idle_days = client.metrics.dias_sin_comprar.unwrap_or(0);
        let overdue = client.saldo_pendiente > 0.0 && idle_days > config.overdue_days;
        let existing = has_active(active, client.id.0, AlertKind::ClienteMoroso);

        if overdue {
            if existing.is_none() {
                let severity = if idle_days > config.critical_days {
                    AlertSeverity::Critica
                } else {
                    AlertSeverity::Alta
                };
                outcome.open.push(Alert::open(
                    AlertKind::ClienteMoroso,
                    severity,
                    client.id.0,
                    format!(
                        "{} debe {:.2} y lleva {} días sin comprar",
                        client.nombre, client.saldo_pendiente, idle_days
                    ),
                    now,
                ));
            }
        } else if let Some(id) = existing {
            outcome.resolve.push(id);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyaledger_parties::{ClientId, DistributorId};
    use gyaledger_purchasing::PurchaseOrderId;

    fn order_with_stock(cantidad: u32, sold: u32) -> PurchaseOrder {
        let mut oc = PurchaseOrder::new(
            PurchaseOrderId::new(EntityId::new()),
            DistributorId::new(EntityId::new()),
            None,
            cantidad,
            1_000.0,
            Utc::now(),
        )
        .unwrap();
        if sold > 0 {
            oc.consume_stock(sold).unwrap();
        }
        oc
    }

    fn indebted_client(idle_days: i64, saldo: f64) -> Client {
        let mut c = Client::new(ClientId::new(EntityId::new()), "Cliente", Utc::now());
        c.saldo_pendiente = saldo;
        c.metrics.dias_sin_comprar = Some(idle_days);
        c
    }

    #[test]
    fn low_stock_opens_one_alert() {
        let orders = vec![order_with_stock(100, 85)];
        let cfg = AlertConfig::default();
        let outcome = scan_stock(&orders, &[], &cfg, Utc::now());
        assert_eq!(outcome.open.len(), 1);
        assert_eq!(outcome.open[0].severity, AlertSeverity::Alta);

        // Re-running with the alert now active opens nothing new.
        let rerun = scan_stock(&orders, &outcome.open, &cfg, Utc::now());
        assert!(rerun.is_empty());
    }

    #[test]
    fn depleted_stock_is_critical() {
        let orders = vec![order_with_stock(100, 97)];
        let outcome = scan_stock(&orders, &[], &AlertConfig::default(), Utc::now());
        assert_eq!(outcome.open[0].severity, AlertSeverity::Critica);
    }

    #[test]
    fn restocked_order_resolves_its_alert() {
        let orders = vec![order_with_stock(100, 10)];
        let active = vec![Alert::open(
            AlertKind::StockBajo,
            AlertSeverity::Alta,
            orders[0].id.0,
            "viejo",
            Utc::now(),
        )];
        let outcome = scan_stock(&orders, &active, &AlertConfig::default(), Utc::now());
        assert_eq!(outcome.resolve, vec![active[0].id]);
    }

    #[test]
    fn delinquency_escalates_past_sixty_days() {
        let cfg = AlertConfig::default();
        let clients = vec![indebted_client(45, 1_000.0)];
        let outcome = scan_clients(&clients, &[], &cfg, Utc::now());
        assert_eq!(outcome.open[0].severity, AlertSeverity::Alta);

        let clients = vec![indebted_client(75, 1_000.0)];
        let outcome = scan_clients(&clients, &[], &cfg, Utc::now());
        assert_eq!(outcome.open[0].severity, AlertSeverity::Critica);
    }

    #[test]
    fn client_without_debt_is_never_flagged() {
        let clients = vec![indebted_client(120, 0.0)];
        let outcome = scan_clients(&clients, &[], &AlertConfig::default(), Utc::now());
        assert!(outcome.open.is_empty());
    }
}
