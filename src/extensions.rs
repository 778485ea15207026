//! The two-stage extension pipeline. Extensions are supplied by the host as
//! a static list of trait objects and run in `name()` order at each stage:
//! the content stage sees the parsed posts and pages before any collection
//! is assembled, and the target stage sees the final list of write targets
//! immediately before rendering. The stages are independent; implementing
//! one does not require implementing the other.

use thiserror::Error;

use crate::content::{Page, Post};
use crate::settings::Settings;
use crate::target::Target;

/// A host-supplied transform over the build pipeline. Both stage methods
/// default to no-ops, so an extension implements only the stage it cares
/// about.
pub trait Extension {
    /// The extension's name; extensions apply in ascending name order at
    /// each stage.
    fn name(&self) -> &str;

    /// Stage 1: transform the parsed posts and pages in place, and push any
    /// additional write targets (tag pages, category indexes) onto
    /// `extra_targets`.
    fn content_stage(
        &self,
        posts: &mut Vec<Post>,
        pages: &mut Vec<Page>,
        extra_targets: &mut Vec<Box<dyn Target>>,
        settings: &Settings,
    ) -> anyhow::Result<()> {
        let _ = (posts, pages, extra_targets, settings);
        Ok(())
    }

    /// Stage 2: transform the final write set, immediately before each
    /// target is rendered to disk.
    fn target_stage(
        &self,
        targets: &mut Vec<Box<dyn Target>>,
        settings: &Settings,
    ) -> anyhow::Result<()> {
        let _ = (targets, settings);
        Ok(())
    }
}

/// The extensions sorted into application order.
fn in_order<'a>(extensions: &'a [Box<dyn Extension>]) -> Vec<&'a dyn Extension> {
    let mut ordered: Vec<&dyn Extension> = extensions.iter().map(Box::as_ref).collect();
    ordered.sort_by_key(|extension| extension.name().to_owned());
    ordered
}

/// Runs every extension's content stage, in name order.
pub fn apply_content_stage(
    extensions: &[Box<dyn Extension>],
    posts: &mut Vec<Post>,
    pages: &mut Vec<Page>,
    extra_targets: &mut Vec<Box<dyn Target>>,
    settings: &Settings,
) -> Result<(), Error> {
    for extension in in_order(extensions) {
        extension
            .content_stage(posts, pages, extra_targets, settings)
            .map_err(|err| Error::Extension {
                name: extension.name().to_owned(),
                err,
            })?;
    }
    Ok(())
}

/// Runs every extension's target stage, in name order.
pub fn apply_target_stage(
    extensions: &[Box<dyn Extension>],
    targets: &mut Vec<Box<dyn Target>>,
    settings: &Settings,
) -> Result<(), Error> {
    for extension in in_order(extensions) {
        extension
            .target_stage(targets, settings)
            .map_err(|err| Error::Extension {
                name: extension.name().to_owned(),
                err,
            })?;
    }
    Ok(())
}

/// Represents a failure inside a host-supplied extension.
#[derive(Debug, Error)]
pub enum Error {
    #[error("extension `{name}`: {err}")]
    Extension {
        name: String,
        err: anyhow::Error,
    },
}
