//! CLI command implementations.

pub mod check;
pub mod export;
pub mod indexnow;
pub mod init;

pub use check::check_site;
pub use export::export_site;
pub use indexnow::{indexnow_submit, indexnow_urls, SubmitOptions, UrlsOptions};
pub use init::init_project;
