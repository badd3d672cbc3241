//! Domain classification, color selection, and the sort & group engine.

mod color;
mod domain;
mod organizer;

pub use color::{ColorResolver, default_color};
pub use domain::{UNKNOWN_DOMAIN, clean_domain, full_domain};
pub use organizer::{Organizer, bucket_by_domain, sort_domains};
