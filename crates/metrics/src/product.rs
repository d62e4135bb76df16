use chrono::{DateTime, Duration, Utc};

use gyaledger_products::{AbcClass, Product, ProductMetrics, ProductScores};
use gyaledger_sales::Sale;

const MONTH_DAYS: i64 = 30;
const QUARTER_DAYS: i64 = 90;

/// Recompute a product's derived statistics from its sales.
///
/// The ABC class comes from the mean of three 0–100 sub-scores:
/// - rentabilidad: net margin, where a 50% margin earns full marks
/// - rotación: annualized inventory turns, full marks at 12/year
/// - demanda: units moved this month, full marks at one per day
///
/// Cutoffs: A at a mean of 70 or above, B at 40, else C.
pub fn recompute_product(product: &Product, sales: &[Sale], now: DateTime<Utc>) -> ProductMetrics {
    let own: Vec<&Sale> = sales
        .iter()
        .filter(|s| s.product_id == Some(product.id))
        .collect();

    let month_start = now - Duration::days(MONTH_DAYS);
    let quarter_start = now - Duration::days(QUARTER_DAYS);

    let in_window = |start: DateTime<Utc>| own.iter().filter(move |s| s.created_at >= start);

    let ingresos_mes: f64 = in_window(month_start).map(|s| s.precio_total_venta).sum();
    let utilidad_mes: f64 = in_window(month_start).map(|s| s.historico.utilidades).sum();
    let ingresos_trimestre: f64 = in_window(quarter_start).map(|s| s.precio_total_venta).sum();
    let utilidad_trimestre: f64 = in_window(quarter_start).map(|s| s.historico.utilidades).sum();

    let unidades_vendidas: u64 = own.iter().map(|s| u64::from(s.cantidad)).sum();
    let unidades_mes: u64 = in_window(month_start).map(|s| u64::from(s.cantidad)).sum();
    let unidades_trimestre: u64 = in_window(quarter_start).map(|s| u64::from(s.cantidad)).sum();

    let total_revenue: f64 = own.iter().map(|s| s.precio_total_venta).sum();
    let total_cost: f64 = own.iter().map(|s| s.historico.boveda_monte).sum();
    let total_profit: f64 = own.iter().map(|s| s.historico.utilidades).sum();

    let precio_venta_promedio = if unidades_vendidas > 0 {
        total_revenue / unidades_vendidas as f64
    } else {
        0.0
    };
    let precio_compra_promedio = if unidades_vendidas > 0 {
        total_cost / unidades_vendidas as f64
    } else {
        0.0
    };

    let margen_bruto_pct = if total_revenue > 0.0 {
        (total_revenue - total_cost) / total_revenue * 100.0
    } else {
        0.0
    };
    let margen_neto_pct = if total_revenue > 0.0 {
        total_profit / total_revenue * 100.0
    } else {
        0.0
    };

    // Demand over the trailing quarter, annualized against current stock.
    let daily_demand = unidades_trimestre as f64 / QUARTER_DAYS as f64;
    let annualized_units = daily_demand * 365.0;
    let rotacion_anual = annualized_units / f64::from(product.stock.max(1));

    let dias_stock_restante = if daily_demand > 0.0 {
        Some(f64::from(product.stock) / daily_demand)
    } else {
        None
    };

    let scores = ProductScores {
        rentabilidad: (margen_neto_pct * 2.0).clamp(0.0, 100.0),
        rotacion: (rotacion_anual / 12.0).clamp(0.0, 1.0) * 100.0,
        demanda: (unidades_mes as f64 / MONTH_DAYS as f64).clamp(0.0, 1.0) * 100.0,
    };
    let mean = scores.mean();
    let clasificacion = if mean >= 70.0 {
        AbcClass::A
    } else if mean >= 40.0 {
        AbcClass::B
    } else {
        AbcClass::C
    };

    ProductMetrics {
        ingresos_mes,
        utilidad_mes,
        ingresos_trimestre,
        utilidad_trimestre,
        unidades_vendidas,
        precio_venta_promedio,
        precio_compra_promedio,
        margen_bruto_pct,
        margen_neto_pct,
        rotacion_anual,
        dias_stock_restante,
        scores,
        clasificacion,
        computed_at: Some(now),
    }
}
