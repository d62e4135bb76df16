use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult, Entity, EntityId, Versioned};
use gyaledger_distribution::EPSILON;

/// Bank (ledger account) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(pub EntityId);

impl BankId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for BankId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The category of funds a bank accumulates.
///
/// The first three receive the GYA split; savings/investment ledgers only
/// move through transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankKind {
    BovedaMonte,
    Fletes,
    Utilidades,
    Ahorro,
    Inversion,
}

impl BankKind {
    /// The three GYA destinations, in split order.
    pub fn gya() -> [BankKind; 3] {
        [BankKind::BovedaMonte, BankKind::Fletes, BankKind::Utilidades]
    }
}

/// Month-over-month flow direction, from a ±10% threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Subiendo,
    #[default]
    Estable,
    Bajando,
}

/// Composite health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLabel {
    Excelente,
    Saludable,
    #[default]
    Regular,
    Critico,
}

/// Inflow/outflow over one time window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowWindow {
    pub ingresos: f64,
    pub gastos: f64,
}

impl FlowWindow {
    pub fn neto(&self) -> f64 {
        self.ingresos - self.gastos
    }
}

/// Derived bank statistics. Pipeline-owned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BankMetrics {
    pub hoy: FlowWindow,
    pub semana: FlowWindow,
    pub mes: FlowWindow,
    pub mes_anterior: FlowWindow,
    /// Share of this month's inflow by movement kind, percentages.
    pub fuentes_ingreso_pct: Vec<(String, f64)>,
    pub tendencia: Trend,
    pub proyeccion_30d: f64,
    pub proyeccion_90d: f64,
    /// Days until capital runs out at the current burn rate; `None` while
    /// flow is non-negative.
    pub dias_para_agotamiento: Option<f64>,
    pub health_score: f64,
    pub salud: HealthLabel,
    pub computed_at: Option<DateTime<Utc>>,
}

/// A purpose-bound ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub nombre: String,
    pub kind: BankKind,
    /// Spendable balance; moves only as cash is actually realized.
    pub capital_actual: f64,
    /// Cumulative lifetime inflow, booked in full at sale time; only
    /// reversals decrease it.
    pub historico_ingresos: f64,
    /// Cumulative lifetime outflow.
    pub historico_gastos: f64,
    pub transferencias_entrada: f64,
    pub transferencias_salida: f64,
    pub metrics: BankMetrics,
    version: u64,
}

impl Bank {
    pub fn new(id: BankId, nombre: impl Into<String>, kind: BankKind) -> Self {
        Self {
            id,
            nombre: nombre.into(),
            kind,
            capital_actual: 0.0,
            historico_ingresos: 0.0,
            historico_gastos: 0.0,
            transferencias_entrada: 0.0,
            transferencias_salida: 0.0,
            metrics: BankMetrics::default(),
            version: 0,
        }
    }

    fn ensure_amount(amount: f64) -> DomainResult<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::validation("amount must be a non-negative number"));
        }
        Ok(())
    }

    /// Book a sale's distribution: the historic total moves by the full
    /// committed amount, capital only by the realized (paid) portion.
    pub fn book_distribution(&mut self, historic: f64, capital: f64) -> DomainResult<()> {
        Self::ensure_amount(historic)?;
        Self::ensure_amount(capital)?;
        if capital > historic + EPSILON {
            return Err(DomainError::invariant(
                "realized capital cannot exceed the booked historic amount",
            ));
        }
        self.historico_ingresos += historic;
        self.capital_actual += capital;
        Ok(())
    }

    /// An abono realizes cash that was already booked historically.
    pub fn collect_capital(&mut self, amount: f64) -> DomainResult<()> {
        Self::ensure_amount(amount)?;
        self.capital_actual += amount;
        Ok(())
    }

    /// Reverse a distribution (devolución or admin delete): undo `historic`
    /// from the lifetime inflow and `capital` from the realized balance.
    pub fn reverse_distribution(&mut self, historic: f64, capital: f64) -> DomainResult<()> {
        Self::ensure_amount(historic)?;
        Self::ensure_amount(capital)?;
        self.historico_ingresos -= historic;
        self.capital_actual -= capital;
        Ok(())
    }

    /// Debit side of an inter-ledger transfer.
    pub fn transfer_out(&mut self, amount: f64) -> DomainResult<()> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(DomainError::validation("transfer amount must be positive"));
        }
        if amount > self.capital_actual + EPSILON {
            return Err(DomainError::validation(format!(
                "insufficient capital in {}: {:.2} available, {:.2} requested",
                self.nombre, self.capital_actual, amount
            )));
        }
        self.capital_actual -= amount;
        self.transferencias_salida += amount;
        Ok(())
    }

    /// Credit side of an inter-ledger transfer.
    pub fn transfer_in(&mut self, amount: f64) -> DomainResult<()> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(DomainError::validation("transfer amount must be positive"));
        }
        self.capital_actual += amount;
        self.transferencias_entrada += amount;
        Ok(())
    }

    /// An outbound payment (e.g. to a distributor).
    pub fn pay_out(&mut self, amount: f64) -> DomainResult<()> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(DomainError::validation("payment must be positive"));
        }
        if amount > self.capital_actual + EPSILON {
            return Err(DomainError::validation(format!(
                "insufficient capital in {}: {:.2} available, {:.2} requested",
                self.nombre, self.capital_actual, amount
            )));
        }
        self.capital_actual -= amount;
        self.historico_gastos += amount;
        Ok(())
    }
}

impl Entity for Bank {
    type Id = BankId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Bank {
    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}
