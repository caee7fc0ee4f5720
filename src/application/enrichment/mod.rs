//! Domain enrichment
//!
//! The immutable domain registry, the coordinator that fans out over it
//! each turn, and the built-in goals domain.

mod coordinator;
pub mod goals;
mod registry;

pub use coordinator::{
    EnrichmentCoordinator, EnrichmentError, EnrichmentOutcome, EnrichmentRequest,
    EnrichmentSettings,
};
pub use registry::{
    load_definitions, parse_definitions, DomainPlugin, DomainRegistry, DomainRegistryBuilder,
    RegistryError,
};
