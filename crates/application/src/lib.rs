//! Application services and ports.

#![forbid(unsafe_code)]

mod access_gate_service;
mod role_admin_service;
mod role_store;
mod session_service;

pub use access_gate_service::{AccessGateService, QueryGateway, QueryRequest, QueryVerdict};
pub use role_admin_service::{GrantOutcome, RoleAdminService, RoleListing};
pub use role_store::RoleStore;
pub use session_service::{IdentityVerifier, Session, SessionService};
