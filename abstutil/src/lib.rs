//! Utilities shared by every crate in the workspace: logging setup, a hierarchical timer for
//! long-running passes, and serde helpers.

#[macro_use]
extern crate log;

mod io;
pub mod logger;
mod time;

pub use crate::io::{
    deserialize_btreemap, from_binary, from_json, serialize_btreemap, to_binary, to_json,
};
pub use crate::time::{elapsed_seconds, prettyprint_time, Timer};
