//! The library code for the `stele` static site generator. A build is one
//! pass over a directory of markdown sources:
//!
//! 1. Parsing posts and pages from source files on disk ([`crate::content`])
//! 2. Assembling the post collections--the paginated front index, the
//!    archive, and the RSS and JSON feeds ([`crate::collections`])
//! 3. Rendering every target to its output file ([`crate::target`]), then
//!    writing the sitemap from the rendered files' mtimes
//!
//! Host-supplied extensions ([`crate::extensions`]) can transform the parsed
//! content before step 2 and the final write set before step 3. The whole
//! pass is driven by [`crate::build::build_site`], configured through
//! [`crate::settings`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod collections;
pub mod content;
pub mod extensions;
pub mod markdown;
pub mod settings;
pub mod slug;
pub mod target;
pub mod templates;
