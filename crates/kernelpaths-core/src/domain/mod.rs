//! Domain types shared by the resolver, the aggregator and the service.

mod context;
mod os;
mod path_entry;

use std::collections::HashMap;

pub use context::{InterpreterInfo, SearchContext};
pub use os::OsFamily;
pub use path_entry::PathEntry;

/// A snapshot of environment variables.
pub type EnvVars = HashMap<String, String>;

/// Look up a variable, treating an empty value the same as an unset one.
pub fn env_value<'a>(env: &'a EnvVars, key: &str) -> Option<&'a str> {
    env.get(key).map(String::as_str).filter(|value| !value.is_empty())
}
