//! Request extractors and middleware for condo-billing-service.

pub mod complex;
pub mod metrics;

pub use complex::{ComplexContext, COMPLEX_ID_HEADER};
pub use metrics::metrics_middleware;
