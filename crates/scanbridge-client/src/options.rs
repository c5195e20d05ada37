//! Foreign object options.
//!
//! A foreign server carries the connection options and a foreign table names
//! the engine table it maps to:
//!
//! | Context | Option | Required |
//! |---------|--------|----------|
//! | server | `config_file_path` | yes |
//! | server | `max_heap_size` | no |
//! | foreign table | `namespace` | yes |
//! | foreign table | `table_name` | yes |

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use scanbridge_storage::TableIdentifier;

use crate::error::{BridgeError, BridgeResult};

/// Server option naming the engine configuration file.
pub const CONFIG_FILE_PATH: &str = "config_file_path";
/// Server option carrying the heap size of the engine client.
pub const MAX_HEAP_SIZE: &str = "max_heap_size";
/// Table option naming the namespace.
pub const NAMESPACE: &str = "namespace";
/// Table option naming the engine table.
pub const TABLE_NAME: &str = "table_name";

/// Object an option list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionContext {
    /// Foreign server.
    Server,
    /// Foreign table.
    ForeignTable,
    /// User mapping. Accepts no options.
    UserMapping,
}

impl OptionContext {
    /// Returns the options accepted in this context.
    pub fn valid_options(self) -> &'static [&'static str] {
        match self {
            OptionContext::Server => &[CONFIG_FILE_PATH, MAX_HEAP_SIZE],
            OptionContext::ForeignTable => &[NAMESPACE, TABLE_NAME],
            OptionContext::UserMapping => &[],
        }
    }

    /// Returns the options that must be present in this context.
    pub fn required_options(self) -> &'static [&'static str] {
        match self {
            OptionContext::Server => &[CONFIG_FILE_PATH],
            OptionContext::ForeignTable => &[NAMESPACE, TABLE_NAME],
            OptionContext::UserMapping => &[],
        }
    }

    fn hint(self) -> String {
        let valid = self.valid_options();
        if valid.is_empty() {
            "There are no valid options in this context.".to_string()
        } else {
            format!("Valid options in this context are: {}", valid.join(", "))
        }
    }
}

impl fmt::Display for OptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionContext::Server => write!(f, "foreign server"),
            OptionContext::ForeignTable => write!(f, "foreign table"),
            OptionContext::UserMapping => write!(f, "user mapping"),
        }
    }
}

/// Validates an option list of `context`.
pub fn validate_options<'a, I>(context: OptionContext, options: I) -> BridgeResult<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut seen = Vec::new();
    for (name, _) in options {
        if !context.valid_options().contains(&name) {
            return Err(BridgeError::InvalidOption {
                option: name.to_string(),
                hint: context.hint(),
            });
        }
        seen.push(name);
    }

    for required in context.required_options() {
        if !seen.contains(required) {
            return Err(BridgeError::MissingOption {
                option: required.to_string(),
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

/// Options resolved for one foreign table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignTableOptions {
    /// Engine configuration file.
    pub config_file_path: PathBuf,
    /// Heap size of the engine client, passed through unmodified.
    pub max_heap_size: Option<String>,
    /// Engine table.
    pub table: TableIdentifier,
}

impl ForeignTableOptions {
    /// Validates the server and table option lists and merges them.
    ///
    /// When an option appears more than once, the last occurrence wins.
    pub fn from_layers(server: &[(&str, &str)], table: &[(&str, &str)]) -> BridgeResult<Self> {
        validate_options(OptionContext::Server, server.iter().copied())?;
        validate_options(OptionContext::ForeignTable, table.iter().copied())?;

        let merged: BTreeMap<&str, &str> = server.iter().chain(table).copied().collect();
        let get = |name: &str, context: OptionContext| {
            merged
                .get(name)
                .map(|v| v.to_string())
                .ok_or_else(|| BridgeError::MissingOption {
                    option: name.to_string(),
                    context: context.to_string(),
                })
        };

        Ok(Self {
            config_file_path: PathBuf::from(get(CONFIG_FILE_PATH, OptionContext::Server)?),
            max_heap_size: merged.get(MAX_HEAP_SIZE).map(|v| v.to_string()),
            table: TableIdentifier::new(
                get(NAMESPACE, OptionContext::ForeignTable)?,
                get(TABLE_NAME, OptionContext::ForeignTable)?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_options() {
        validate_options(
            OptionContext::Server,
            [("config_file_path", "/etc/x.toml"), ("max_heap_size", "1g")],
        )
        .unwrap();
        validate_options(
            OptionContext::ForeignTable,
            [("namespace", "ns"), ("table_name", "t")],
        )
        .unwrap();
        validate_options(OptionContext::UserMapping, []).unwrap();
    }

    #[test]
    fn test_invalid_option_hint() {
        match validate_options(OptionContext::Server, [("namespace", "ns")]) {
            Err(BridgeError::InvalidOption { option, hint }) => {
                assert_eq!(option, "namespace");
                assert_eq!(
                    hint,
                    "Valid options in this context are: config_file_path, max_heap_size"
                );
            }
            other => panic!("unexpected: {:?}", other),
        }

        match validate_options(OptionContext::UserMapping, [("user", "x")]) {
            Err(BridgeError::InvalidOption { hint, .. }) => {
                assert_eq!(hint, "There are no valid options in this context.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_option() {
        match validate_options(OptionContext::ForeignTable, [("namespace", "ns")]) {
            Err(BridgeError::MissingOption { option, context }) => {
                assert_eq!(option, "table_name");
                assert_eq!(context, "foreign table");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            validate_options(OptionContext::Server, [("max_heap_size", "1g")]),
            Err(BridgeError::MissingOption { .. })
        ));
    }

    #[test]
    fn test_from_layers() {
        let options = ForeignTableOptions::from_layers(
            &[("config_file_path", "/a.toml"), ("config_file_path", "/b.toml")],
            &[("namespace", "ns"), ("table_name", "t")],
        )
        .unwrap();
        assert_eq!(options.config_file_path, PathBuf::from("/b.toml"));
        assert_eq!(options.max_heap_size, None);
        assert_eq!(options.table, TableIdentifier::new("ns", "t"));

        assert!(ForeignTableOptions::from_layers(
            &[("config_file_path", "/a.toml")],
            &[("namespace", "ns"), ("table_name", "t"), ("max_heap_size", "1g")],
        )
        .is_err());
    }
}
