// src/package/parser.rs

//! Descriptor text parser
//!
//! Line-oriented grammar, one statement per line:
//!
//! ```text
//! # comment
//! archive <ref>
//! resource <ref>
//! retrieve <VAR>-><path>
//! set <NAME>=<value>
//! append <NAME>=<value>
//! include <descriptor>
//! config <name>
//!   ...
//! end
//! ```
//!
//! `archive` and `resource` are package-level and may not appear inside a
//! `config` block.

use super::{Package, PackageIdentity, Statement};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Parser for `.fig` descriptors
#[derive(Debug, Default, Clone)]
pub struct Parser;

/// An open `config` block
struct OpenConfig {
    name: String,
    line: usize,
    statements: Vec<Statement>,
}

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Parse descriptor text into a package
    ///
    /// `directory` is the base directory the descriptor was read from, or
    /// `None` for descriptors read straight from the remote repository.
    pub fn parse_package(
        &self,
        id: &PackageIdentity,
        directory: Option<&Path>,
        content: &str,
    ) -> Result<Package> {
        let statements = self.parse_statements(id, content)?;

        debug!("Parsed descriptor for {}: {} statements", id, statements.len());

        Ok(Package::new(
            id.clone(),
            directory.map(Path::to_path_buf),
            statements,
        ))
    }

    /// Parse descriptor text into its top-level statements
    pub fn parse_statements(&self, id: &PackageIdentity, content: &str) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut open: Option<OpenConfig> = None;

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (keyword, args) = match line.split_once(char::is_whitespace) {
                Some((keyword, args)) => (keyword, args.trim()),
                None => (line, ""),
            };

            match keyword {
                "config" => {
                    if let Some(config) = &open {
                        return Err(parse_error(
                            id,
                            line_no,
                            &format!("config '{}' opened inside config '{}'", args, config.name),
                        ));
                    }
                    let name = single_token(args)
                        .ok_or_else(|| parse_error(id, line_no, "config requires a name"))?;
                    open = Some(OpenConfig {
                        name: name.to_string(),
                        line: line_no,
                        statements: Vec::new(),
                    });
                }
                "end" => {
                    if !args.is_empty() {
                        return Err(parse_error(id, line_no, "end takes no arguments"));
                    }
                    let config = open
                        .take()
                        .ok_or_else(|| parse_error(id, line_no, "end without config"))?;
                    statements.push(Statement::Config {
                        name: config.name,
                        statements: config.statements,
                    });
                }
                _ => {
                    let statement = parse_statement(keyword, args)
                        .map_err(|reason| parse_error(id, line_no, &reason))?;
                    match open.as_mut() {
                        Some(config) if statement.artifact_reference().is_some() => {
                            return Err(parse_error(
                                id,
                                line_no,
                                &format!("{} is not allowed inside config '{}'", keyword, config.name),
                            ));
                        }
                        Some(config) => config.statements.push(statement),
                        None => statements.push(statement),
                    }
                }
            }
        }

        if let Some(config) = open {
            return Err(parse_error(
                id,
                config.line,
                &format!("config '{}' is missing end", config.name),
            ));
        }

        Ok(statements)
    }
}

/// Parse a single non-block statement
fn parse_statement(keyword: &str, args: &str) -> std::result::Result<Statement, String> {
    match keyword {
        "archive" => single_token(args)
            .map(|url| Statement::Archive {
                url: url.to_string(),
            })
            .ok_or_else(|| "archive requires exactly one reference".to_string()),
        "resource" => single_token(args)
            .map(|url| Statement::Resource {
                url: url.to_string(),
            })
            .ok_or_else(|| "resource requires exactly one reference".to_string()),
        "include" => single_token(args)
            .map(|descriptor| Statement::Include {
                descriptor: descriptor.to_string(),
            })
            .ok_or_else(|| "include requires exactly one descriptor".to_string()),
        "retrieve" => match args.split_once("->") {
            Some((variable, path)) if !variable.trim().is_empty() && !path.trim().is_empty() => {
                Ok(Statement::Retrieve {
                    variable: variable.trim().to_string(),
                    path: path.trim().to_string(),
                })
            }
            _ => Err("retrieve requires VAR->path".to_string()),
        },
        "set" | "append" => {
            let (name, value) = args
                .split_once('=')
                .filter(|(name, _)| single_token(name.trim()).is_some())
                .ok_or_else(|| format!("{} requires NAME=value", keyword))?;
            let name = name.trim().to_string();
            let value = value.trim().to_string();
            Ok(if keyword == "set" {
                Statement::Set { name, value }
            } else {
                Statement::Append { name, value }
            })
        }
        other => Err(format!("unknown statement '{}'", other)),
    }
}

/// `args` if it is one non-empty whitespace-free token
fn single_token(args: &str) -> Option<&str> {
    if args.is_empty() || args.contains(char::is_whitespace) {
        None
    } else {
        Some(args)
    }
}

fn parse_error(id: &PackageIdentity, line: usize, reason: &str) -> Error {
    Error::ParseError(format!("{} line {}: {}", id, line, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn id() -> PackageIdentity {
        PackageIdentity::new("foo", "1.0")
    }

    #[test]
    fn test_parse_all_statements() {
        let content = "\
# build output
archive http://h/a.tgz
resource lib/libfoo.so

retrieve LIBPATH->lib
config default
  set FOO=bar baz
  append PATH=@/bin
  include bar/2.0
end
";
        let package = Parser::new()
            .parse_package(&id(), Some(Path::new("/r/foo/1.0")), content)
            .unwrap();

        assert_eq!(package.directory, Some(PathBuf::from("/r/foo/1.0")));
        assert_eq!(package.statements.len(), 4);
        assert_eq!(package.archive_urls(), vec!["http://h/a.tgz"]);
        assert_eq!(package.resource_urls(), vec!["lib/libfoo.so"]);
        assert_eq!(
            package.statements[2],
            Statement::Retrieve {
                variable: "LIBPATH".to_string(),
                path: "lib".to_string(),
            }
        );

        match &package.statements[3] {
            Statement::Config { name, statements } => {
                assert_eq!(name, "default");
                assert_eq!(
                    statements[0],
                    Statement::Set {
                        name: "FOO".to_string(),
                        value: "bar baz".to_string(),
                    }
                );
                assert_eq!(statements.len(), 3);
            }
            other => panic!("expected config, got {:?}", other),
        }
    }

    #[test]
    fn test_unparse_is_stable() {
        let content = "archive a.tgz\n\n   set X=1  \nconfig default\ninclude bar/2.0\nend\n";
        let parser = Parser::new();
        let first = parser.parse_package(&id(), None, content).unwrap();
        let text = first.unparse();
        assert_eq!(text, "archive a.tgz\nset X=1\nconfig default\n  include bar/2.0\nend");

        let second = parser.parse_package(&id(), None, &text).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.unparse(), text);
    }

    #[test]
    fn test_empty_descriptor() {
        let package = Parser::new().parse_package(&id(), None, "").unwrap();
        assert!(package.statements.is_empty());
        assert_eq!(package.unparse(), "");
    }

    #[test]
    fn test_unknown_statement() {
        let result = Parser::new().parse_package(&id(), None, "archive a.tgz\nfrobnicate x\n");
        match result {
            Err(Error::ParseError(msg)) => {
                assert!(msg.contains("foo/1.0 line 2"), "{}", msg);
                assert!(msg.contains("frobnicate"), "{}", msg);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_arguments() {
        let parser = Parser::new();
        for content in [
            "archive",
            "archive a.tgz b.tgz",
            "resource",
            "retrieve LIBPATH",
            "set FOO",
            "set =bar",
            "include",
        ] {
            assert!(
                matches!(parser.parse_statements(&id(), content), Err(Error::ParseError(_))),
                "accepted: {}",
                content
            );
        }
    }

    #[test]
    fn test_unbalanced_config() {
        let parser = Parser::new();

        let err = parser
            .parse_statements(&id(), "config default\nset X=1\n")
            .unwrap_err();
        assert!(err.to_string().contains("line 1"));

        assert!(parser.parse_statements(&id(), "end\n").is_err());
        assert!(
            parser
                .parse_statements(&id(), "config a\nconfig b\nend\nend\n")
                .is_err()
        );
    }

    #[test]
    fn test_artifacts_inside_config_are_rejected() {
        let parser = Parser::new();

        for content in [
            "config default\n  resource build/a.txt\nend\n",
            "config default\n  set X=1\n  archive http://h/a.tgz\nend\n",
        ] {
            match parser.parse_statements(&id(), content) {
                Err(Error::ParseError(msg)) => {
                    assert!(msg.contains("inside config 'default'"), "{}", msg)
                }
                other => panic!("expected parse error, got {:?}", other),
            }
        }

        assert!(
            parser
                .parse_statements(&id(), "resource a.txt\nconfig default\n  set X=1\nend\n")
                .is_ok()
        );
    }
}
