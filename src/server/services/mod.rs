mod chart_service;
mod document_service;
mod values_service;

pub use chart_service::ChartService;
pub use document_service::{Document, DocumentService};
pub use values_service::ValuesService;
