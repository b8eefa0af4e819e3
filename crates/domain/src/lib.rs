//! # careops-domain
//!
//! Pure domain model for the CareOps multi-tenant service-business backend.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Users** and their phone verification lifecycle
//! - Define **Workspaces** (tenants) and the activation guard
//! - Define **Staff** membership and the capability-based permission check
//! - Define **Contacts**, **Conversations** and **Messages**
//! - Define **Bookings**, **Forms** with their submissions, and **Inventory**
//! - Define the **Dashboard** aggregate and its alert rules
//! - Define the outbound **notification** messages and their templates
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod booking;
pub mod contact;
pub mod conversation;
pub mod dashboard;
pub mod form;
pub mod inventory;
pub mod notification;
pub mod permission;
pub mod staff;
pub mod user;
pub mod workspace;
