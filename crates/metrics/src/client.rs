use chrono::{DateTime, Duration, Utc};

use gyaledger_parties::{Client, ClientCategory, ClientMetrics};
use gyaledger_sales::{PaymentStatus, Sale};

const SIX_MONTHS_DAYS: i64 = 183;

/// Recompute a client's derived statistics from their sales.
///
/// Category precedence: moroso > inactivo > vip > frecuente > nuevo >
/// ocasional. The weighted score is 40% payment punctuality, 30%
/// debt-to-purchases, 30% purchase frequency.
pub fn recompute_client(client: &Client, sales: &[Sale], now: DateTime<Utc>) -> ClientMetrics {
    let own: Vec<&Sale> = sales.iter().filter(|s| s.client_id == client.id).collect();
    let countable: Vec<&&Sale> = own
        .iter()
        .filter(|s| s.estado_pago != PaymentStatus::Devuelta)
        .collect();

    let total_comprado: f64 = countable.iter().map(|s| s.precio_total_venta).sum();
    let total_pagado: f64 = countable.iter().map(|s| s.monto_pagado).sum();
    let saldo_pendiente: f64 = countable.iter().map(|s| s.monto_restante).sum();
    let utilidad_generada: f64 = countable.iter().map(|s| s.historico.utilidades).sum();

    let ticket_promedio = if countable.is_empty() {
        0.0
    } else {
        total_comprado / countable.len() as f64
    };

    let dias_sin_comprar = own
        .iter()
        .map(|s| s.created_at)
        .max()
        .map(|last| (now - last).num_days().max(0));

    let six_months_ago = now - Duration::days(SIX_MONTHS_DAYS);
    let recent = own.iter().filter(|s| s.created_at >= six_months_ago).count();
    let frecuencia_compra = recent as f64 / 6.0;

    // No countable sales is treated as a clean record, not a bad one.
    let pago_puntual_pct = if countable.is_empty() {
        100.0
    } else {
        let on_time = countable
            .iter()
            .filter(|s| s.estado_pago == PaymentStatus::Completo)
            .count();
        on_time as f64 / countable.len() as f64 * 100.0
    };

    let debt_score = if total_comprado > 0.0 {
        ((1.0 - saldo_pendiente / total_comprado).clamp(0.0, 1.0)) * 100.0
    } else {
        100.0
    };
    let freq_score = (frecuencia_compra / 2.0).clamp(0.0, 1.0) * 100.0;
    let score = 0.4 * pago_puntual_pct + 0.3 * debt_score + 0.3 * freq_score;

    let idle = dias_sin_comprar.unwrap_or(0);
    let categoria = if saldo_pendiente > 0.0 && idle > 30 {
        ClientCategory::Moroso
    } else if dias_sin_comprar.is_some() && idle > 90 {
        ClientCategory::Inactivo
    } else if score >= 80.0 && frecuencia_compra >= 2.0 && utilidad_generada >= 50_000.0 {
        ClientCategory::Vip
    } else if score >= 60.0 && frecuencia_compra >= 1.0 {
        ClientCategory::Frecuente
    } else if frecuencia_compra < 0.5 {
        ClientCategory::Nuevo
    } else {
        ClientCategory::Ocasional
    };

    ClientMetrics {
        total_comprado,
        total_pagado,
        saldo_pendiente,
        ticket_promedio,
        dias_sin_comprar,
        frecuencia_compra,
        pago_puntual_pct,
        score,
        utilidad_generada,
        categoria,
        computed_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyaledger_core::EntityId;
    use gyaledger_parties::ClientId;
    use gyaledger_purchasing::PurchaseOrderId;
    use gyaledger_sales::SaleId;

    fn client() -> Client {
        Client::new(ClientId::new(EntityId::new()), "Abarrotes La Luz", Utc::now())
    }

    fn sale_for(
        client_id: ClientId,
        total_units: u32,
        unit_price: f64,
        paid: f64,
        created_at: DateTime<Utc>,
    ) -> Sale {
        Sale::create(
            SaleId::new(EntityId::new()),
            client_id,
            PurchaseOrderId::new(EntityId::new()),
            None,
            total_units,
            unit_price,
            unit_price * 0.6,
            unit_price * 0.02,
            paid,
            created_at,
        )
        .unwrap()
    }

    #[test]
    fn fresh_client_is_nuevo() {
        let c = client();
        let m = recompute_client(&c, &[], Utc::now());
        assert_eq!(m.categoria, ClientCategory::Nuevo);
        assert_eq!(m.dias_sin_comprar, None);
        assert_eq!(m.total_comprado, 0.0);
    }

    #[test]
    fn indebted_idle_client_is_moroso() {
        let c = client();
        let now = Utc::now();
        let old = now - Duration::days(45);
        let sales = vec![sale_for(c.id, 10, 1_000.0, 0.0, old)];

        let m = recompute_client(&c, &sales, now);
        assert_eq!(m.categoria, ClientCategory::Moroso);
        assert_eq!(m.dias_sin_comprar, Some(45));
        assert!(m.saldo_pendiente > 0.0);
    }

    #[test]
    fn long_idle_client_without_debt_is_inactivo() {
        let c = client();
        let now = Utc::now();
        let old = now - Duration::days(120);
        let sales = vec![sale_for(c.id, 1, 1_000.0, 1_000.0, old)];

        let m = recompute_client(&c, &sales, now);
        assert_eq!(m.categoria, ClientCategory::Inactivo);
    }

    #[test]
    fn heavy_punctual_buyer_reaches_vip() {
        let c = client();
        let now = Utc::now();
        // Twelve fully-paid sales over the last six months, big profits.
        let sales: Vec<Sale> = (0..12)
            .map(|i| {
                sale_for(
                    c.id,
                    10,
                    5_000.0,
                    50_000.0,
                    now - Duration::days(10 + i * 12),
                )
            })
            .collect();

        let m = recompute_client(&c, &sales, now);
        assert!(m.frecuencia_compra >= 2.0);
        assert!(m.score >= 80.0);
        assert!(m.utilidad_generada >= 50_000.0);
        assert_eq!(m.categoria, ClientCategory::Vip);
    }

    #[test]
    fn recompute_is_idempotent() {
        let c = client();
        let now = Utc::now();
        let sales = vec![sale_for(c.id, 3, 28_000.0, 42_000.0, now - Duration::days(3))];

        let first = recompute_client(&c, &sales, now);
        let second = recompute_client(&c, &sales, now);
        assert_eq!(first, second);
    }

    #[test]
    fn other_clients_sales_are_ignored() {
        let c = client();
        let stranger = ClientId::new(EntityId::new());
        let sales = vec![sale_for(stranger, 5, 1_000.0, 5_000.0, Utc::now())];

        let m = recompute_client(&c, &sales, Utc::now());
        assert_eq!(m.total_comprado, 0.0);
    }
}
