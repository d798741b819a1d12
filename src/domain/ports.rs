use crate::domain::model::{Capability, LayoutRef, Page, PageId, User};
use crate::utils::error::Result;
use async_trait::async_trait;

/// An in-place edit run by [`PageStore::update`]; an error aborts the update.
pub type PageEdit<'a> = Box<dyn FnOnce(&mut Page) -> Result<()> + Send + 'a>;

/// Read/write access to page records.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn get(&self, id: PageId) -> Result<Option<Page>>;

    /// All pages with `slug`, restricted to the ids in `within` when given.
    async fn find_by_slug(&self, slug: &str, within: Option<&[PageId]>) -> Result<Vec<Page>>;

    async fn pages_for_layout(&self, layout: &LayoutRef) -> Result<Vec<Page>>;

    /// Runs `edit` on page `id` and stores the result as one step, so the
    /// edit always sees the latest record. Store invariants are re-checked
    /// before anything is written.
    async fn update(&self, id: PageId, edit: PageEdit<'_>) -> Result<Page>;
}

/// The `can(user, action)` check handed to boundary code.
pub trait Authorizer: Send + Sync {
    fn can(&self, user: &User, capability: Capability) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&User, Capability) -> bool + Send + Sync,
{
    fn can(&self, user: &User, capability: Capability) -> bool {
        self(user, capability)
    }
}

/// Grants whatever the user record carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantedCapabilities;

impl Authorizer for GrantedCapabilities {
    fn can(&self, user: &User, capability: Capability) -> bool {
        user.has_capability(capability)
    }
}
