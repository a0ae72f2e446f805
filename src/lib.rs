#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Assignment Core
//!
//! Work-item assignment and lifecycle engine for a property-management back
//! office.
//!
//! ## Overview
//!
//! Tasks, maintenance requests, work orders, leases, invoices and rental
//! applications each move through a fixed status graph. The engine decides who
//! owns an item when it is created, keeps an auditable chain of assignment
//! records as ownership changes hands, and rejects any status change the graph
//! does not allow.
//!
//! ## Module Organization
//!
//! - [`models`] - Work items, users, assignment rules and records
//! - [`state_machine`] - Per-type status enums, transition table and validator
//! - [`services`] - Rule evaluation, candidate strategies, workload counts, priority defaults
//! - [`orchestration`] - The [`AssignmentOrchestrator`] façade and automation triggers
//! - [`persistence`] - The [`AssignmentStore`] seam with in-memory and PostgreSQL stores
//! - [`events`] - Domain events and the notification / audit collaborators
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assignment_core::config::AssignmentConfig;
//! use assignment_core::models::{WorkItemDraft, WorkItemType};
//! use assignment_core::orchestration::AssignmentOrchestrator;
//! use assignment_core::persistence::InMemoryAssignmentStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> assignment_core::Result<()> {
//! let store = Arc::new(InMemoryAssignmentStore::new());
//! let orchestrator = AssignmentOrchestrator::new(store, &AssignmentConfig::default());
//!
//! let created = orchestrator
//!     .create_work_item(WorkItemDraft::new(WorkItemType::Task, 1, "Renew lease"), 1)
//!     .await?;
//! println!("created work item {} ({})", created.item.id, created.item.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                          # Unit and integration tests (in-memory store)
//! cargo test -- --ignored             # PostgreSQL store tests, needs DATABASE_URL
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod services;
pub mod state_machine;

pub use config::{AssignmentConfig, ConfigManager, ConfigurationError};
pub use error::{AssignmentError, Result, RuleConfigurationError, StoreError};
pub use events::{DomainEvent, EventPublisher};
pub use models::{
    AssignmentRecord, AssignmentRule, AssignmentStatus, AssignmentStrategy, AssignmentType,
    Priority, User, WorkItem, WorkItemDraft, WorkItemType,
};
pub use orchestration::{AssignmentOrchestrator, AutomationTrigger};
pub use persistence::{AssignmentStore, InMemoryAssignmentStore};
#[cfg(feature = "postgres")]
pub use persistence::PgAssignmentStore;
pub use state_machine::{StatusTransitionValidator, TransitionEvent, WorkItemStatus};
