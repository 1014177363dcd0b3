//! Configuration module

mod site;

pub use site::PageRoute;
pub use site::SiteConfig;
