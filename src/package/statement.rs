// src/package/statement.rs

//! Descriptor statements
//!
//! Only `Archive` and `Resource` carry meaning for the repository engine;
//! every other variant is parsed, kept and written back untouched.

use serde::Serialize;

/// Indentation added per nesting level when unparsing
pub const INDENT: &str = "  ";

/// One directive of a package descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Statement {
    /// Compressed bundle expanded into the package directory
    Archive { url: String },
    /// Single file copied verbatim into the package directory
    Resource { url: String },
    /// Copy files referenced by a variable into a working directory
    Retrieve { variable: String, path: String },
    /// Environment variable assignment
    Set { name: String, value: String },
    /// Environment variable path append
    Append { name: String, value: String },
    /// Dependency on another package descriptor
    Include { descriptor: String },
    /// Named group of statements
    Config {
        name: String,
        statements: Vec<Statement>,
    },
}

impl Statement {
    /// Reference of an artifact-bearing statement
    pub fn artifact_reference(&self) -> Option<&str> {
        match self {
            Statement::Archive { url } | Statement::Resource { url } => Some(url.as_str()),
            _ => None,
        }
    }

    /// First artifact reference found inside a `Config` block, at any depth
    pub fn nested_artifact_reference(&self) -> Option<&str> {
        match self {
            Statement::Config { statements, .. } => statements.iter().find_map(|s| {
                s.artifact_reference()
                    .or_else(|| s.nested_artifact_reference())
            }),
            _ => None,
        }
    }

    /// Clone of this statement pointing at `reference`
    ///
    /// Statements without an artifact reference are returned unchanged.
    pub fn with_reference(&self, reference: &str) -> Statement {
        match self {
            Statement::Archive { .. } => Statement::Archive {
                url: reference.to_string(),
            },
            Statement::Resource { .. } => Statement::Resource {
                url: reference.to_string(),
            },
            other => other.clone(),
        }
    }

    /// Descriptor text for this statement, prefixed with `indent`
    pub fn unparse(&self, indent: &str) -> String {
        match self {
            Statement::Archive { url } => format!("{}archive {}", indent, url),
            Statement::Resource { url } => format!("{}resource {}", indent, url),
            Statement::Retrieve { variable, path } => {
                format!("{}retrieve {}->{}", indent, variable, path)
            }
            Statement::Set { name, value } => format!("{}set {}={}", indent, name, value),
            Statement::Append { name, value } => format!("{}append {}={}", indent, name, value),
            Statement::Include { descriptor } => format!("{}include {}", indent, descriptor),
            Statement::Config { name, statements } => {
                let inner = format!("{}{}", indent, INDENT);
                let mut lines = vec![format!("{}config {}", indent, name)];
                lines.extend(statements.iter().map(|s| s.unparse(&inner)));
                lines.push(format!("{}end", indent));
                lines.join("\n")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_reference_rewrites_artifacts_only() {
        let archive = Statement::Archive {
            url: "http://h/dist/a.tgz".to_string(),
        };
        assert_eq!(
            archive.with_reference("a.tgz"),
            Statement::Archive {
                url: "a.tgz".to_string()
            }
        );

        let set = Statement::Set {
            name: "FOO".to_string(),
            value: "bar".to_string(),
        };
        assert_eq!(set.with_reference("a.tgz"), set);
        assert_eq!(set.artifact_reference(), None);
    }

    #[test]
    fn test_nested_artifact_reference() {
        let archive = Statement::Archive {
            url: "a.tgz".to_string(),
        };
        assert_eq!(archive.nested_artifact_reference(), None);

        let config = Statement::Config {
            name: "default".to_string(),
            statements: vec![
                Statement::Set {
                    name: "FOO".to_string(),
                    value: "bar".to_string(),
                },
                Statement::Resource {
                    url: "build/lib.so".to_string(),
                },
            ],
        };
        assert_eq!(config.nested_artifact_reference(), Some("build/lib.so"));
    }

    #[test]
    fn test_unparse_config_block() {
        let config = Statement::Config {
            name: "default".to_string(),
            statements: vec![
                Statement::Set {
                    name: "FOO".to_string(),
                    value: "bar".to_string(),
                },
                Statement::Include {
                    descriptor: "bar/2.0".to_string(),
                },
            ],
        };

        assert_eq!(
            config.unparse(""),
            "config default\n  set FOO=bar\n  include bar/2.0\nend"
        );
    }

    #[test]
    fn test_unparse_indent() {
        let resource = Statement::Resource {
            url: "lib.so".to_string(),
        };
        assert_eq!(resource.unparse("    "), "    resource lib.so");
    }
}
