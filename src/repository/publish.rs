// src/repository/publish.rs

//! Publishing packages to the remote store
//!
//! Artifacts go up first, then the descriptor, which only ever refers to
//! artifacts by basename. A failed publish is not rolled back remotely;
//! publishing the same identity again overwrites what was left behind.

use super::Repository;
use crate::error::{Error, Result};
use crate::layout::{basename, is_url};
use crate::package::{PackageIdentity, Statement};
use crate::staging::Staging;
use crate::transport::Transport;
use std::path::PathBuf;
use tracing::{debug, info};

impl<T: Transport> Repository<T> {
    /// Upload a package's artifacts and descriptor, then install it locally
    ///
    /// Archive and resource references that are URLs are downloaded first;
    /// other references are local file paths. Artifacts must be package-level
    /// statements; one inside a `config` block is rejected before anything
    /// is uploaded.
    pub fn publish_package(&self, statements: &[Statement], id: &PackageIdentity) -> Result<()> {
        self.layout.check_identity(id)?;
        if let Some(reference) = statements
            .iter()
            .find_map(Statement::nested_artifact_reference)
        {
            return Err(Error::ParseError(format!(
                "{}: artifact '{}' is not allowed inside a config block",
                id, reference
            )));
        }

        let remote_descriptor = self.layout.remote_descriptor(id)?;
        let user = self.remote_user.as_deref();

        {
            let staging = Staging::new(&self.layout, id)?;
            let mut lines = Vec::with_capacity(statements.len());

            for statement in statements {
                let Some(reference) = statement.artifact_reference() else {
                    lines.push(statement.unparse(""));
                    continue;
                };

                let artifact = basename(reference);
                let local = if is_url(reference) {
                    let dest = staging.artifacts().join(artifact);
                    self.transport.download(reference, &dest)?;
                    dest
                } else {
                    PathBuf::from(reference)
                };

                let remote = self.layout.remote_artifact(id, artifact)?;
                self.transport.upload(&local, &remote, user)?;
                debug!("Published artifact {} for {}", artifact, id);

                lines.push(statement.with_reference(artifact).unparse(""));
            }

            let descriptor = staging.descriptor();
            self.transport.write(&descriptor, &lines.join("\n"))?;
            self.transport.upload(&descriptor, &remote_descriptor, user)?;
        }

        info!("Published {} to {}", id, remote_descriptor);

        self.sync_package(id, true)?;
        Ok(())
    }
}
