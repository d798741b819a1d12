pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
#[cfg(feature = "server")]
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::SiteConfig;

pub use adapters::memory::InMemoryPageStore;
pub use core::{
    editor::PageEditor,
    registry::{LayoutDescriptor, LayoutRegistry},
    resolver::{PathResolver, ResolutionPolicy},
    site::{RenderedPage, Site},
};
pub use utils::error::{PageError, Result};
