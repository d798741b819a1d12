use crate::domain::model::{LayoutRef, Page, PageId};
use crate::domain::ports::{PageEdit, PageStore};
use crate::utils::error::{PageError, Result};
use crate::utils::validation::validate_slug;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

/// Page store held in memory, loaded once from site configuration.
#[derive(Debug)]
pub struct InMemoryPageStore {
    pages: RwLock<BTreeMap<PageId, Page>>,
}

impl InMemoryPageStore {
    pub fn from_pages<I>(pages: I) -> Result<Self>
    where
        I: IntoIterator<Item = Page>,
    {
        let mut map = BTreeMap::new();
        for page in pages {
            let id = page.id;
            if map.insert(id, page).is_some() {
                return Err(PageError::ConfigError {
                    message: format!("page id {} is used more than once", id),
                });
            }
        }
        check_invariants(&map)?;
        tracing::debug!("Loaded {} page(s) into the in-memory store", map.len());

        Ok(Self {
            pages: RwLock::new(map),
        })
    }
}

fn check_invariants(pages: &BTreeMap<PageId, Page>) -> Result<()> {
    let mut siblings: HashSet<(Option<PageId>, &str)> = HashSet::new();
    let mut layouts: HashMap<&LayoutRef, PageId> = HashMap::new();

    for page in pages.values() {
        validate_slug(&format!("pages.{}.slug", page.id), &page.slug)?;

        if let Some(parent) = page.parent {
            if !pages.contains_key(&parent) {
                return Err(PageError::validation(format!(
                    "page {} references missing parent {}",
                    page.id, parent
                )));
            }
        }

        if !siblings.insert((page.parent, page.slug.as_str())) {
            return Err(PageError::validation(format!(
                "slug '{}' is already used by a sibling of page {}",
                page.slug, page.id
            )));
        }

        if let Some(other) = layouts.insert(&page.layout, page.id) {
            return Err(PageError::LayoutPairing {
                message: format!(
                    "layout {} is paired with pages {} and {}",
                    page.layout, other, page.id
                ),
            });
        }
    }

    for page in pages.values() {
        check_acyclic(pages, page)?;
    }
    Ok(())
}

fn check_acyclic(pages: &BTreeMap<PageId, Page>, page: &Page) -> Result<()> {
    let mut seen = HashSet::from([page.id]);
    let mut next = page.parent;
    while let Some(id) = next {
        if !seen.insert(id) {
            return Err(PageError::validation(format!(
                "page {} would become its own ancestor",
                page.id
            )));
        }
        next = pages.get(&id).and_then(|p| p.parent);
    }
    Ok(())
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn get(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.pages.read().await.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str, within: Option<&[PageId]>) -> Result<Vec<Page>> {
        let pages = self.pages.read().await;
        let found = match within {
            Some(ids) => ids
                .iter()
                .filter_map(|id| pages.get(id))
                .filter(|page| page.slug == slug)
                .cloned()
                .collect(),
            None => pages
                .values()
                .filter(|page| page.slug == slug)
                .cloned()
                .collect(),
        };
        Ok(found)
    }

    async fn pages_for_layout(&self, layout: &LayoutRef) -> Result<Vec<Page>> {
        Ok(self
            .pages
            .read()
            .await
            .values()
            .filter(|page| &page.layout == layout)
            .cloned()
            .collect())
    }

    async fn update(&self, id: PageId, edit: PageEdit<'_>) -> Result<Page> {
        // write lock held from read to commit
        let mut pages = self.pages.write().await;

        let mut page = pages
            .get(&id)
            .cloned()
            .ok_or_else(|| PageError::not_found(format!("page {}", id)))?;
        edit(&mut page)?;

        // 先在副本上檢查，通過後才寫入
        let mut staged = pages.clone();
        staged.insert(id, page.clone());
        check_invariants(&staged)?;

        *pages = staged;
        tracing::debug!("Updated page {}", id);
        Ok(page)
    }
}
