//! `gyaledger-sales` — sales on credit and their payment lifecycle.
//!
//! A sale books its full GYA split the moment it is created; the capital
//! amounts track the realized portion as abonos come in, and devoluciones
//! reverse both proportionally. All split arithmetic goes through
//! `gyaledger-distribution`.

pub mod abono;
pub mod devolucion;
pub mod sale;

pub use abono::{Abono, AbonoId};
pub use devolucion::{Devolucion, DevolucionId};
pub use sale::{PaymentStatus, Sale, SaleId};
