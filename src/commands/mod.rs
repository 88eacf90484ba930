pub mod config;
mod install;
mod list;
mod paths;
mod search;

pub use config::Options;
pub use install::{install, run};
pub use list::list;
pub use paths::{default_bin_root, default_store_root};
pub use search::search;
