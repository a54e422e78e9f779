//! # GMUD Board Core
//!
//! Board logic for tracking change-request (GMUD) cards through their
//! approval and execution stages, and the REST client that persists them.
//!
//! The crate has no UI. A view layer renders [`BoardController::columns`],
//! forwards drag gestures to the controller, and shows the cards' derived
//! flags (`is_overdue`, `is_completed`).

pub mod auth;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use auth::AuthClient;
pub use config::ClientConfig;
pub use controller::{BoardController, ColumnView, DropOutcome};
pub use domain::{
    approver::{Approver, ApproverId, ApproverPatch, ApproverRef, NewApprover},
    board::{BoardConfig, Column, Stage},
    card::{Card, CardId, CardPatch, CardStatus, ExecutionTeam, NewCard},
    filter::FilterState,
};
pub use error::{BoardError, Result};
pub use session::{Credentials, GoogleProfile, Session, User, UserType};
pub use storage::{MemoryStorage, RestStorage, SnapshotStore, Storage};
pub use sync::{CardSource, SyncCoordinator};
