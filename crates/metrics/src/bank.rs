use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use gyaledger_banks::{Bank, BankMetrics, FlowWindow, HealthLabel, Movement, Trend};

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

fn flow(movements: &[&Movement], from: DateTime<Utc>, to: DateTime<Utc>) -> FlowWindow {
    let mut window = FlowWindow::default();
    for m in movements {
        if m.occurred_at >= from && m.occurred_at < to {
            if m.monto >= 0.0 {
                window.ingresos += m.monto;
            } else {
                window.gastos += -m.monto;
            }
        }
    }
    window
}

/// Recompute a bank's derived statistics from its movements.
///
/// Flow windows use realized cash deltas (the `monto` column). The trend
/// compares this month's inflow with the previous month's at a ±10%
/// threshold; projections extrapolate the current month's net flow.
pub fn recompute_bank(bank: &Bank, movements: &[Movement], now: DateTime<Utc>) -> BankMetrics {
    let own: Vec<&Movement> = movements.iter().filter(|m| m.bank_id == bank.id).collect();

    let today_start = now - Duration::days(1);
    let week_start = now - Duration::days(WEEK_DAYS);
    let month_start = now - Duration::days(MONTH_DAYS);
    let prev_month_start = now - Duration::days(2 * MONTH_DAYS);

    let hoy = flow(&own, today_start, now);
    let semana = flow(&own, week_start, now);
    let mes = flow(&own, month_start, now);
    let mes_anterior = flow(&own, prev_month_start, month_start);

    // Share of this month's inflow by movement kind.
    let mut by_kind: BTreeMap<&'static str, f64> = BTreeMap::new();
    for m in &own {
        if m.occurred_at >= month_start && m.monto > 0.0 {
            *by_kind.entry(m.kind.as_str()).or_insert(0.0) += m.monto;
        }
    }
    let fuentes_ingreso_pct: Vec<(String, f64)> = if mes.ingresos > 0.0 {
        by_kind
            .into_iter()
            .map(|(kind, amount)| (kind.to_string(), amount / mes.ingresos * 100.0))
            .collect()
    } else {
        Vec::new()
    };

    let tendencia = if mes_anterior.ingresos > 0.0 {
        let ratio = mes.ingresos / mes_anterior.ingresos;
        if ratio > 1.10 {
            Trend::Subiendo
        } else if ratio < 0.90 {
            Trend::Bajando
        } else {
            Trend::Estable
        }
    } else if mes.ingresos > 0.0 {
        Trend::Subiendo
    } else {
        Trend::Estable
    };

    let neto_mes = mes.neto();
    let proyeccion_30d = bank.capital_actual + neto_mes;
    let proyeccion_90d = bank.capital_actual + 3.0 * neto_mes;

    let dias_para_agotamiento = if neto_mes < 0.0 && bank.capital_actual > 0.0 {
        Some(bank.capital_actual * MONTH_DAYS as f64 / -neto_mes)
    } else {
        None
    };

    // Three 0–100 sub-scores: months of expense cover, trend, inflow share.
    let capital_score = if mes.gastos > 0.0 {
        ((bank.capital_actual / mes.gastos) / 3.0).clamp(0.0, 1.0) * 100.0
    } else if bank.capital_actual > 0.0 {
        100.0
    } else {
        0.0
    };
    let trend_score = match tendencia {
        Trend::Subiendo => 100.0,
        Trend::Estable => 60.0,
        Trend::Bajando => 20.0,
    };
    let volume = mes.ingresos + mes.gastos;
    let flow_score = if volume > 0.0 {
        mes.ingresos / volume * 100.0
    } else {
        50.0
    };

    let health_score = (capital_score + trend_score + flow_score) / 3.0;
    let salud = if health_score >= 80.0 {
        HealthLabel::Excelente
    } else if health_score >= 60.0 {
        HealthLabel::Saludable
    } else if health_score >= 40.0 {
        HealthLabel::Regular
    } else {
        HealthLabel::Critico
    };

    BankMetrics {
        hoy,
        semana,
        mes,
        mes_anterior,
        fuentes_ingreso_pct,
        tendencia,
        proyeccion_30d,
        proyeccion_90d,
        dias_para_agotamiento,
        health_score,
        salud,
        computed_at: Some(now),
    }
}
