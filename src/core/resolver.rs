use crate::domain::model::{Page, PageId};
use crate::domain::ports::PageStore;
use crate::utils::error::{PageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// How much of the path must match before a page is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// Stop as soon as a single candidate is left, even if prefix
    /// segments were never compared.
    #[default]
    EarlyExit,
    /// Every segment must match and the chain must start at a root page.
    FullPath,
}

/// Splits a URL path into its non-empty slug segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

struct Candidate {
    page: Page,
    // ancestor still to be compared against the next segment
    cursor: Option<PageId>,
}

pub struct PathResolver<S: PageStore + ?Sized> {
    store: Arc<S>,
    policy: ResolutionPolicy,
}

impl<S: PageStore + ?Sized> Clone for PathResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: PageStore + ?Sized> PathResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, ResolutionPolicy::default())
    }

    pub fn with_policy(store: Arc<S>, policy: ResolutionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Resolves `path` by matching slugs from the last segment backward.
    pub async fn resolve(&self, path: &str) -> Result<Page> {
        let segments = split_path(path);
        let Some((last, prefix)) = segments.split_last() else {
            return Err(PageError::not_found(path));
        };

        let mut candidates: Vec<Candidate> = self
            .store
            .find_by_slug(last, None)
            .await?
            .into_iter()
            .map(|page| Candidate {
                cursor: page.parent,
                page,
            })
            .collect();

        for segment in prefix.iter().rev() {
            tracing::debug!(
                "Resolving '{}': {} candidate(s) before segment '{}'",
                path,
                candidates.len(),
                segment
            );

            if candidates.is_empty() {
                return Err(PageError::not_found(path));
            }
            if self.policy == ResolutionPolicy::EarlyExit && candidates.len() == 1 {
                return Ok(candidates.remove(0).page);
            }

            let mut ancestor_ids: Vec<PageId> =
                candidates.iter().filter_map(|c| c.cursor).collect();
            ancestor_ids.sort_unstable();
            ancestor_ids.dedup();

            // 只查詢候選頁面的祖先
            let matched: HashMap<PageId, Option<PageId>> = if ancestor_ids.is_empty() {
                HashMap::new()
            } else {
                self.store
                    .find_by_slug(segment, Some(&ancestor_ids))
                    .await?
                    .into_iter()
                    .map(|ancestor| (ancestor.id, ancestor.parent))
                    .collect()
            };

            candidates.retain_mut(|candidate| {
                match candidate.cursor.and_then(|id| matched.get(&id)) {
                    Some(grandparent) => {
                        candidate.cursor = *grandparent;
                        true
                    }
                    None => false,
                }
            });
        }

        self.settle(path, candidates)
    }

    // All segments consumed: pick the result deterministically.
    fn settle(&self, path: &str, mut candidates: Vec<Candidate>) -> Result<Page> {
        if self.policy == ResolutionPolicy::EarlyExit && candidates.len() == 1 {
            return Ok(candidates.remove(0).page);
        }

        candidates.retain(|candidate| candidate.cursor.is_none());
        match candidates.len() {
            1 => Ok(candidates.remove(0).page),
            0 => Err(PageError::not_found(path)),
            n => {
                tracing::warn!("Path '{}' is ambiguous: {} pages match every segment", path, n);
                Err(PageError::not_found(path))
            }
        }
    }

    /// Builds the slug path of `page` from its ancestors, e.g. `about/team`.
    pub async fn path_of(&self, page: &Page) -> Result<String> {
        let mut slugs = vec![page.slug.clone()];
        let mut seen = HashSet::from([page.id]);
        let mut next = page.parent;

        while let Some(id) = next {
            if !seen.insert(id) {
                return Err(PageError::ConfigError {
                    message: format!("page {} has a cyclic ancestry", page.id),
                });
            }
            let ancestor = self.store.get(id).await?.ok_or_else(|| PageError::ConfigError {
                message: format!("page {} references missing parent {}", page.id, id),
            })?;
            slugs.push(ancestor.slug);
            next = ancestor.parent;
        }

        slugs.reverse();
        Ok(slugs.join("/"))
    }
}
