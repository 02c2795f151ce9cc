//! Domain models for condo-billing-service.

mod catalog;
mod invoice;
mod unit;
mod unit_service;

pub use catalog::{CatalogService, CreateCatalogService};
pub use invoice::{Invoice, InvoiceItem, InvoiceStatus, InvoiceWithItems, NewInvoice, NewInvoiceItem};
pub use unit::{CreateUnit, Unit};
pub use unit_service::{AssignService, BillableSubscription, UnitService, UnitServiceStatus};
