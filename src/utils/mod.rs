pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{normalize_url_key, resolve_link, same_site};
