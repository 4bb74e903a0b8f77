//! teamup-admin - form controllers for teamup team messaging and publishing
//!
//! Validation, recipient/team selection and the remote submission lifecycle
//! behind the plugin's administrative dialogs, plus the ajax transport that
//! carries their requests.

pub mod config;
pub mod error;
pub mod rpc;
pub mod state;
