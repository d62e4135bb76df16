//! The five atomic ledger operations plus the admin delete.
//!
//! Each operation follows the same shape: load a snapshot, validate and
//! compute on clones (no write can happen past this point if anything is
//! wrong), stage every row the operation touches, commit them in one shot,
//! then audit (best-effort) and publish the ledger event.

use std::sync::Arc;

use chrono::Utc;

use gyaledger_audit::{record_best_effort, AuditLog, AuditLogEntry};
use gyaledger_banks::{Bank, BankId, Movement, MovementId, MovementKind};
use gyaledger_core::{DomainError, DomainResult, EntityId};
use gyaledger_distribution::GyaSplit;
use gyaledger_events::{EventBus, EventEnvelope};
use gyaledger_parties::ClientId;
use gyaledger_products::ProductId;
use gyaledger_purchasing::PurchaseOrderId;
use gyaledger_sales::{AbonoId, DevolucionId, PaymentStatus, Sale, SaleId};

use crate::events::{
    AbonoRegistered, DistributorPaid, LedgerEvent, ReturnProcessed, SaleCorrected, SaleCreated,
    SaleDeleted, TransferExecuted,
};
use crate::store::{LedgerStore, StagedWrites};

/// Request to create a sale.
#[derive(Debug, Clone)]
pub struct CreateSaleInput {
    pub client_id: ClientId,
    pub purchase_order_id: PurchaseOrderId,
    pub product_id: Option<ProductId>,
    pub cantidad: u32,
    pub precio_venta_unidad: f64,
    /// Defaults to the purchase order's unit cost.
    pub precio_compra_unidad: Option<f64>,
    /// Defaults to zero.
    pub precio_flete_unidad: Option<f64>,
    /// Initial payment; defaults to zero (sale fully on credit).
    pub monto_pagado: Option<f64>,
    pub actor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSaleOutcome {
    pub sale_id: SaleId,
    pub distribucion: GyaSplit,
    pub total_venta: f64,
    pub estado_pago: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbonoOutcome {
    pub abono_id: AbonoId,
    pub split: GyaSplit,
    pub monto_pagado: f64,
    pub monto_restante: f64,
    pub estado_pago: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOutcome {
    pub devolucion_id: DevolucionId,
    pub monto_revertido: f64,
    pub reembolso: f64,
    pub es_total: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub movimiento_salida: MovementId,
    pub movimiento_entrada: MovementId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayDistributorOutcome {
    pub saldo_orden: f64,
    pub capital_restante: f64,
}

fn buckets(split: &GyaSplit) -> [f64; 3] {
    [split.boveda_monte, split.fletes, split.utilidades]
}

/// The transactional ledger engine.
pub struct LedgerEngine<B> {
    store: Arc<LedgerStore>,
    audit: Arc<dyn AuditLog>,
    bus: B,
}

impl<B> LedgerEngine<B>
where
    B: EventBus<EventEnvelope<LedgerEvent>>,
{
    pub fn new(store: Arc<LedgerStore>, audit: Arc<dyn AuditLog>, bus: B) -> Self {
        Self { store, audit, bus }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Publish after commit; a failure here never affects the write.
    fn publish(&self, event: LedgerEvent) {
        if let Err(err) = self.bus.publish(EventEnvelope::wrap(event)) {
            tracing::warn!(error = ?err, "event publish failed; read models catch up on the next sweep");
        }
    }

    fn gya_movements(
        banks: &[Bank; 3],
        kind: MovementKind,
        cash: [f64; 3],
        historic: Option<[f64; 3]>,
        related: EntityId,
        descripcion: &str,
        occurred_at: chrono::DateTime<Utc>,
    ) -> Vec<Movement> {
        banks
            .iter()
            .enumerate()
            .map(|(i, bank)| {
                Movement::new(
                    MovementId::new(EntityId::new()),
                    bank.id,
                    kind,
                    cash[i],
                    historic.map(|h| h[i]),
                    Some(related),
                    format!("{descripcion} — {}", bank.nombre),
                    occurred_at,
                )
            })
            .collect()
    }

    /// Create a sale: validate client/order/stock, compute the GYA split,
    /// book the banks (historic in full, capital by the paid fraction),
    /// decrement stock, and grow the client balance by the unpaid remainder.
    pub fn create_sale(&self, input: CreateSaleInput) -> DomainResult<CreateSaleOutcome> {
        let now = Utc::now();

        let mut client = self.store.client(input.client_id).ok_or(DomainError::NotFound)?;
        let mut order = self
            .store
            .order(input.purchase_order_id)
            .ok_or(DomainError::NotFound)?;
        let mut product = match input.product_id {
            Some(id) => Some(self.store.product(id).ok_or(DomainError::NotFound)?),
            None => None,
        };

        let precio_compra = input.precio_compra_unidad.unwrap_or_else(|| order.unit_cost());
        let precio_flete = input.precio_flete_unidad.unwrap_or(0.0);
        let monto_pagado = input.monto_pagado.unwrap_or(0.0);

        // Rejects zero quantity, below-cost pricing and oversized payments.
        let sale = Sale::create(
            SaleId::new(EntityId::new()),
            input.client_id,
            input.purchase_order_id,
            input.product_id,
            input.cantidad,
            input.precio_venta_unidad,
            precio_compra,
            precio_flete,
            monto_pagado,
            now,
        )?;

        // Initializes the order's stock tracking lazily and rejects
        // quantities beyond what the order still holds.
        order.consume_stock(input.cantidad)?;
        if let Some(p) = product.as_mut() {
            p.consume_stock(input.cantidad)?;
        }

        client.add_purchase(sale.precio_total_venta, sale.monto_restante)?;

        let mut banks = self.store.gya_banks()?;
        let historic = buckets(&sale.historico);
        let capital = buckets(&sale.capital);
        for (i, bank) in banks.iter_mut().enumerate() {
            bank.book_distribution(historic[i], capital[i])?;
        }

        let movements = Self::gya_movements(
            &banks,
            MovementKind::DistribucionGya,
            capital,
            Some(historic),
            sale.id.0,
            &format!("distribución GYA venta {}", sale.id),
            now,
        );

        let bank_ids = [banks[0].id, banks[1].id, banks[2].id];
        self.store.commit(StagedWrites {
            sales: vec![sale.clone()],
            banks: banks.to_vec(),
            clients: vec![client],
            products: product.into_iter().collect(),
            orders: vec![order.clone()],
            movements,
            ..Default::default()
        })?;

        record_best_effort(
            self.audit.as_ref(),
            AuditLogEntry::new(
                "venta.crear",
                "venta",
                sale.id.to_string(),
                input.actor,
                None,
                serde_json::to_value(&sale).ok(),
                format!(
                    "venta de {} unidades por {:.2} ({:?})",
                    sale.cantidad, sale.precio_total_venta, sale.estado_pago
                ),
                Some(sale.precio_total_venta),
                bank_ids.iter().map(|b| b.0).collect(),
                now,
            ),
        );

        self.publish(LedgerEvent::SaleCreated(SaleCreated {
            sale_id: sale.id,
            client_id: sale.client_id,
            product_id: sale.product_id,
            purchase_order_id: sale.purchase_order_id,
            distributor_id: order.distributor_id,
            bank_ids,
            total: sale.precio_total_venta,
            monto_pagado: sale.monto_pagado,
            occurred_at: now,
        }));

        Ok(CreateSaleOutcome {
            sale_id: sale.id,
            distribucion: sale.historico,
            total_venta: sale.precio_total_venta,
            estado_pago: sale.estado_pago,
        })
    }

    /// Register an installment payment. The payment's split is proportional
    /// to the sale's **original total**, so every abono mirrors the sale's
    /// GYA ratios; banks only gain capital, never historic totals.
    pub fn register_abono(
        &self,
        sale_id: SaleId,
        monto: f64,
        actor: Option<String>,
    ) -> DomainResult<AbonoOutcome> {
        let now = Utc::now();

        let mut sale = self.store.sale(sale_id).ok_or(DomainError::NotFound)?;
        let before = serde_json::to_value(&sale).ok();
        let mut client = self.store.client(sale.client_id).ok_or(DomainError::NotFound)?;

        let abono = sale.register_abono(AbonoId::new(EntityId::new()), monto, now)?;
        client.register_payment(monto)?;

        let mut banks = self.store.gya_banks()?;
        let cash = buckets(&abono.split);
        for (i, bank) in banks.iter_mut().enumerate() {
            bank.collect_capital(cash[i])?;
        }

        let movements = Self::gya_movements(
            &banks,
            MovementKind::Abono,
            cash,
            None,
            sale.id.0,
            &format!("abono venta {}", sale.id),
            now,
        );

        let bank_ids = [banks[0].id, banks[1].id, banks[2].id];
        self.store.commit(StagedWrites {
            sales: vec![sale.clone()],
            banks: banks.to_vec(),
            clients: vec![client],
            abonos: vec![abono.clone()],
            movements,
            ..Default::default()
        })?;

        record_best_effort(
            self.audit.as_ref(),
            AuditLogEntry::new(
                "venta.abono",
                "venta",
                sale.id.to_string(),
                actor,
                before,
                serde_json::to_value(&sale).ok(),
                format!("abono de {monto:.2}; pagado {:.2} de {:.2}", sale.monto_pagado, sale.precio_total_venta),
                Some(monto),
                bank_ids.iter().map(|b| b.0).collect(),
                now,
            ),
        );

        self.publish(LedgerEvent::AbonoRegistered(AbonoRegistered {
            sale_id: sale.id,
            client_id: sale.client_id,
            product_id: sale.product_id,
            purchase_order_id: sale.purchase_order_id,
            bank_ids,
            monto,
            occurred_at: now,
        }));

        Ok(AbonoOutcome {
            abono_id: abono.id,
            split: abono.split,
            monto_pagado: sale.monto_pagado,
            monto_restante: sale.monto_restante,
            estado_pago: sale.estado_pago,
        })
    }

    /// Reverse part or all of a sale: historic totals come back out of the
    /// banks, capital by the collected fraction only, and the client is owed
    /// the reembolso. Stock optionally returns to the order and warehouse.
    pub fn process_return(
        &self,
        sale_id: SaleId,
        cantidad_devuelta: u32,
        motivo: impl Into<String>,
        return_stock: bool,
        actor: Option<String>,
    ) -> DomainResult<ReturnOutcome> {
        let now = Utc::now();

        let mut sale = self.store.sale(sale_id).ok_or(DomainError::NotFound)?;
        let before = serde_json::to_value(&sale).ok();
        let mut client = self.store.client(sale.client_id).ok_or(DomainError::NotFound)?;
        let mut order = self
            .store
            .order(sale.purchase_order_id)
            .ok_or(DomainError::NotFound)?;
        let mut product = match sale.product_id {
            Some(id) => Some(self.store.product(id).ok_or(DomainError::NotFound)?),
            None => None,
        };

        let dev = sale.process_return(
            DevolucionId::new(EntityId::new()),
            cantidad_devuelta,
            motivo,
            now,
        )?;

        let reversal_total = dev.reversal.total();
        // The unpaid share of the reversal is debt the client no longer owes.
        let balance_reduction = (reversal_total - dev.reembolso).max(0.0);
        client.reverse_purchase(reversal_total, balance_reduction)?;

        let mut banks = self.store.gya_banks()?;
        let historic = buckets(&dev.reversal);
        let capital = buckets(&dev.capital_reversal);
        for (i, bank) in banks.iter_mut().enumerate() {
            bank.reverse_distribution(historic[i], capital[i])?;
        }

        let movements = Self::gya_movements(
            &banks,
            MovementKind::DevolucionGya,
            [-capital[0], -capital[1], -capital[2]],
            Some([-historic[0], -historic[1], -historic[2]]),
            sale.id.0,
            &format!("devolución venta {}", sale.id),
            now,
        );

        if return_stock {
            order.restore_stock(cantidad_devuelta);
            if let Some(p) = product.as_mut() {
                p.restore_stock(cantidad_devuelta);
            }
        }

        let bank_ids = [banks[0].id, banks[1].id, banks[2].id];
        self.store.commit(StagedWrites {
            sales: vec![sale.clone()],
            banks: banks.to_vec(),
            clients: vec![client],
            orders: vec![order],
            products: product.into_iter().collect(),
            devoluciones: vec![dev.clone()],
            movements,
            ..Default::default()
        })?;

        record_best_effort(
            self.audit.as_ref(),
            AuditLogEntry::new(
                "venta.devolucion",
                "venta",
                sale.id.to_string(),
                actor,
                before,
                serde_json::to_value(&sale).ok(),
                format!(
                    "devolución de {cantidad_devuelta} unidades; revertido {reversal_total:.2}, reembolso {:.2}",
                    dev.reembolso
                ),
                Some(reversal_total),
                bank_ids.iter().map(|b| b.0).collect(),
                now,
            ),
        );

        self.publish(LedgerEvent::ReturnProcessed(ReturnProcessed {
            sale_id: sale.id,
            client_id: sale.client_id,
            product_id: sale.product_id,
            purchase_order_id: sale.purchase_order_id,
            bank_ids,
            monto_revertido: reversal_total,
            reembolso: dev.reembolso,
            es_total: dev.es_total,
            occurred_at: now,
        }));

        Ok(ReturnOutcome {
            devolucion_id: dev.id,
            monto_revertido: reversal_total,
            reembolso: dev.reembolso,
            es_total: dev.es_total,
        })
    }

    /// Move capital between two ledgers.
    pub fn transfer(
        &self,
        origen_id: BankId,
        destino_id: BankId,
        monto: f64,
        actor: Option<String>,
    ) -> DomainResult<TransferOutcome> {
        let now = Utc::now();

        if origen_id == destino_id {
            return Err(DomainError::validation(
                "origin and destination banks must differ",
            ));
        }

        let mut origen = self.store.bank(origen_id).ok_or(DomainError::NotFound)?;
        let mut destino = self.store.bank(destino_id).ok_or(DomainError::NotFound)?;

        origen.transfer_out(monto)?;
        destino.transfer_in(monto)?;

        let transfer_ref = EntityId::new();
        let salida = Movement::new(
            MovementId::new(EntityId::new()),
            origen.id,
            MovementKind::TransferenciaSalida,
            -monto,
            None,
            Some(transfer_ref),
            format!("transferencia a {}", destino.nombre),
            now,
        );
        let entrada = Movement::new(
            MovementId::new(EntityId::new()),
            destino.id,
            MovementKind::TransferenciaEntrada,
            monto,
            None,
            Some(transfer_ref),
            format!("transferencia desde {}", origen.nombre),
            now,
        );
        let outcome = TransferOutcome {
            movimiento_salida: salida.id,
            movimiento_entrada: entrada.id,
        };

        self.store.commit(StagedWrites {
            banks: vec![origen.clone(), destino.clone()],
            movements: vec![salida, entrada],
            ..Default::default()
        })?;

        record_best_effort(
            self.audit.as_ref(),
            AuditLogEntry::new(
                "banco.transferencia",
                "banco",
                origen.id.to_string(),
                actor,
                None,
                None,
                format!("transferencia de {monto:.2} de {} a {}", origen.nombre, destino.nombre),
                Some(monto),
                vec![origen.id.0, destino.id.0],
                now,
            ),
        );

        self.publish(LedgerEvent::TransferExecuted(TransferExecuted {
            origen: origen.id,
            destino: destino.id,
            monto,
            occurred_at: now,
        }));

        Ok(outcome)
    }

    /// Pay a distributor against a purchase order from one bank's capital.
    pub fn pay_distributor(
        &self,
        purchase_order_id: PurchaseOrderId,
        monto: f64,
        bank_id: BankId,
        actor: Option<String>,
    ) -> DomainResult<PayDistributorOutcome> {
        let now = Utc::now();

        let mut order = self.store.order(purchase_order_id).ok_or(DomainError::NotFound)?;
        let mut distributor = self
            .store
            .distributor(order.distributor_id)
            .ok_or(DomainError::NotFound)?;
        let mut bank = self.store.bank(bank_id).ok_or(DomainError::NotFound)?;

        order.register_payment(monto)?;
        bank.pay_out(monto)?;
        distributor.register_payment(monto)?;

        let movement = Movement::new(
            MovementId::new(EntityId::new()),
            bank.id,
            MovementKind::Pago,
            -monto,
            None,
            Some(order.id.0),
            format!("pago a {} por orden {}", distributor.nombre, order.id),
            now,
        );

        let outcome = PayDistributorOutcome {
            saldo_orden: order.remaining_balance(),
            capital_restante: bank.capital_actual,
        };

        self.store.commit(StagedWrites {
            banks: vec![bank.clone()],
            orders: vec![order.clone()],
            distributors: vec![distributor.clone()],
            movements: vec![movement],
            ..Default::default()
        })?;

        record_best_effort(
            self.audit.as_ref(),
            AuditLogEntry::new(
                "orden.pago",
                "orden_compra",
                order.id.to_string(),
                actor,
                None,
                serde_json::to_value(&order).ok(),
                format!("pago de {monto:.2} a {}", distributor.nombre),
                Some(monto),
                vec![bank.id.0],
                now,
            ),
        );

        self.publish(LedgerEvent::DistributorPaid(DistributorPaid {
            purchase_order_id: order.id,
            distributor_id: distributor.id,
            bank_id: bank.id,
            monto,
            occurred_at: now,
        }));

        Ok(outcome)
    }

    /// Admin override of a sale's historic split. Banks move by the delta
    /// between the old and the corrected buckets; capital is re-derived at
    /// the sale's current paid fraction.
    pub fn correct_sale_split(
        &self,
        sale_id: SaleId,
        historico: GyaSplit,
        actor: Option<String>,
    ) -> DomainResult<()> {
        let now = Utc::now();

        let mut sale = self.store.sale(sale_id).ok_or(DomainError::NotFound)?;
        let before = serde_json::to_value(&sale).ok();
        let old_historic = buckets(&sale.historico);
        let old_capital = buckets(&sale.capital);

        sale.correct_split(historico)?;
        let new_historic = buckets(&sale.historico);
        let new_capital = buckets(&sale.capital);

        let mut banks = self.store.gya_banks()?;
        for (i, bank) in banks.iter_mut().enumerate() {
            bank.reverse_distribution(old_historic[i], old_capital[i])?;
            bank.book_distribution(new_historic[i], new_capital[i])?;
        }

        let bank_ids = [banks[0].id, banks[1].id, banks[2].id];
        self.store.commit(StagedWrites {
            sales: vec![sale.clone()],
            banks: banks.to_vec(),
            ..Default::default()
        })?;

        record_best_effort(
            self.audit.as_ref(),
            AuditLogEntry::new(
                "venta.corregir",
                "venta",
                sale.id.to_string(),
                actor,
                before,
                serde_json::to_value(&sale).ok(),
                "corrección administrativa de la distribución GYA",
                Some(sale.precio_total_venta),
                bank_ids.iter().map(|b| b.0).collect(),
                now,
            ),
        );

        self.publish(LedgerEvent::SaleCorrected(SaleCorrected {
            sale_id: sale.id,
            client_id: sale.client_id,
            product_id: sale.product_id,
            purchase_order_id: sale.purchase_order_id,
            bank_ids,
            occurred_at: now,
        }));

        Ok(())
    }

    /// Admin full reversal: undo whatever the sale booked (historic and
    /// capital, proportional to what was paid), restore the client balance
    /// and the order/warehouse stock, then drop the sale and its dependent
    /// abono/devolución/movement rows.
    pub fn delete_sale(&self, sale_id: SaleId, actor: Option<String>) -> DomainResult<()> {
        let now = Utc::now();

        let sale = self.store.sale(sale_id).ok_or(DomainError::NotFound)?;
        let before = serde_json::to_value(&sale).ok();
        let mut client = self.store.client(sale.client_id).ok_or(DomainError::NotFound)?;
        let mut order = self
            .store
            .order(sale.purchase_order_id)
            .ok_or(DomainError::NotFound)?;
        let mut product = match sale.product_id {
            Some(id) => Some(self.store.product(id).ok_or(DomainError::NotFound)?),
            None => None,
        };

        let historic = buckets(&sale.historico);
        let capital = buckets(&sale.capital);
        let mut banks = self.store.gya_banks()?;
        for (i, bank) in banks.iter_mut().enumerate() {
            bank.reverse_distribution(historic[i], capital[i])?;
        }
        tracing::info!(sale = %sale.id, "delete: bank deltas reversed");

        client.reverse_purchase(sale.precio_total_venta, sale.monto_restante)?;
        tracing::info!(sale = %sale.id, "delete: client balance restored");

        if sale.cantidad > 0 {
            order.restore_stock(sale.cantidad);
            if let Some(p) = product.as_mut() {
                p.restore_stock(sale.cantidad);
            }
            tracing::info!(sale = %sale.id, units = sale.cantidad, "delete: stock restored");
        }

        let bank_ids = [banks[0].id, banks[1].id, banks[2].id];
        self.store.commit(StagedWrites {
            banks: banks.to_vec(),
            clients: vec![client],
            orders: vec![order],
            products: product.into_iter().collect(),
            delete_sale: Some(sale.id),
            ..Default::default()
        })?;
        tracing::info!(sale = %sale.id, "delete: sale and dependent rows removed");

        record_best_effort(
            self.audit.as_ref(),
            AuditLogEntry::new(
                "venta.eliminar",
                "venta",
                sale.id.to_string(),
                actor,
                before,
                None,
                format!("eliminación administrativa; revertido {:.2}", sale.precio_total_venta),
                Some(sale.precio_total_venta),
                bank_ids.iter().map(|b| b.0).collect(),
                now,
            ),
        );

        self.publish(LedgerEvent::SaleDeleted(SaleDeleted {
            sale_id: sale.id,
            client_id: sale.client_id,
            product_id: sale.product_id,
            purchase_order_id: sale.purchase_order_id,
            bank_ids,
            occurred_at: now,
        }));

        Ok(())
    }
}
