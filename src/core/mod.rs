pub mod editor;
pub mod registry;
pub mod resolver;
pub mod site;

pub use crate::domain::model::{Capability, LayoutRef, Page, PageChanges, PageId, Status, User, Visibility};
pub use crate::domain::ports::{Authorizer, GrantedCapabilities, PageStore};
pub use crate::utils::error::Result;
