//! Form controller state
//!
//! Everything here is pure state: no I/O, no clocks. Hosts feed in user
//! edits, request completions and the current time.

mod forms;
mod selection;
mod submission;
mod team;
mod validation;

pub use forms::*;
pub use selection::*;
pub use submission::*;
pub use team::*;
pub use validation::*;
