//! # notepress-core
//!
//! Publishes the subset of a notes tree tagged for publication into a
//! site-content directory for a static-site generator.
//!
//! The export is a pure function of the source tree and the [`Config`]:
//! [`Selector`] picks documents whose `tags` contain the publish marker,
//! [`Normalizer`] cleans their front matter and body and resolves output
//! paths, and [`Emitter`] writes them together with a generated search page.

pub mod config;
pub mod emit;
pub mod error;
pub mod export;
pub mod frontmatter;
pub mod indexnow;
pub mod links;
pub mod normalize;
pub mod selector;
pub mod sitemap;
pub mod slug;
pub mod urls;

pub use config::Config;
pub use emit::Emitter;
pub use error::ExportError;
pub use export::{export, ExportPlan, ExportReport, Exporter};
pub use frontmatter::{FrontMatter, TagField};
pub use normalize::{Normalizer, OutputDocument};
pub use selector::{Selection, Selector, SourceDocument};
pub use slug::slugify;
