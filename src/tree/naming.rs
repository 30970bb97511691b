//! File naming conventions of a route tree.
//!
//! | Entry | Meaning |
//! |---|---|
//! | `app.sv.toml` | app definition of the directory |
//! | `index.sv.toml` | index route of the directory |
//! | `<name>.sv.toml` | leaf route mounted at `/<name>` |
//! | `<name>.mod.toml` | unit definition |
//! | name without `.` | directory candidate |

/// Suffix of route definition files.
pub const ROUTE_SUFFIX: &str = ".sv.toml";

/// Suffix of unit definition files.
pub const MODULE_SUFFIX: &str = ".mod.toml";

pub const INDEX_FILE: &str = "index.sv.toml";
pub const APP_FILE: &str = "app.sv.toml";

/// How a directory entry takes part in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryClass {
    App,
    Index,
    /// Leaf route; carries the name it is mounted under.
    Route(String),
    Module,
    DirectoryCandidate,
    /// Anything else, e.g. static assets.
    Other,
}

/// Classify a directory entry by its file name.
pub fn classify(file_name: &str) -> EntryClass {
    if file_name == APP_FILE {
        return EntryClass::App;
    }
    if file_name == INDEX_FILE {
        return EntryClass::Index;
    }
    if let Some(name) = route_name(file_name) {
        return EntryClass::Route(name.to_string());
    }
    if is_module_file(file_name) {
        return EntryClass::Module;
    }
    if !file_name.contains('.') {
        return EntryClass::DirectoryCandidate;
    }
    EntryClass::Other
}

/// Strip the route suffix. `None` if the name is not a route file.
pub fn route_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(ROUTE_SUFFIX)
        .filter(|stem| !stem.is_empty())
}

pub fn is_route_file(name: &str) -> bool {
    route_name(name).is_some()
}

pub fn is_module_file(name: &str) -> bool {
    name.strip_suffix(MODULE_SUFFIX)
        .is_some_and(|stem| !stem.is_empty())
}

/// True if `name` can be nested as a literal router path segment.
///
/// axum reads a leading `:` or `*` and any brace as route syntax.
pub fn is_mountable_segment(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(':')
        && !name.starts_with('*')
        && !name.contains(['{', '}'])
}
