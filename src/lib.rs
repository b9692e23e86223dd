//! Availability and conflict resolution for rental units ("Mietfächer").
//!
//! Given a unit and a requested date range the [`engine::Engine`] decides
//! whether the unit is free, lists the live contracts that conflict and can
//! search for the next free window of the same length. Batch calls fan the
//! same evaluation out over many units concurrently.
//!
//! Contracts come from an external store behind [`gateway::ContractGateway`].

pub mod cache;
pub mod engine;
pub mod gateway;
pub mod limits;
pub mod model;
pub mod observability;

pub use cache::CachingGateway;
pub use engine::{Engine, EngineConfig, EngineError};
pub use gateway::{ContractGateway, GatewayError, InMemoryGateway};
