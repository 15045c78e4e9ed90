//! Core vocabulary for the eaten-meal synchronization engine
//!
//! This crate provides the shared types and trait seams the engine is built
//! against:
//! - `EatenMealKey` / `PendingOperation`: the data model
//! - `StoreError`: the error taxonomy for store collaborators
//! - `LocalEatenMealsStore` / `RemoteEatenMealsStore`: the two stores
//! - `ConnectivityMonitor` / `PeriodicScheduler`: the ambient collaborators
//!
//! Concrete store implementations live with their hosts (device storage,
//! backend client); the engine only ever sees these traits.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, StoreError};
pub use traits::{
    ConnectivityMonitor, LocalEatenMealsStore, MealSetStream, PeriodicScheduler, RecurringJob,
    RemoteEatenMealsStore,
};
pub use types::{EatenMealKey, OperationKind, PendingOperation};
