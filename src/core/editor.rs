use crate::core::registry::LayoutRegistry;
use crate::domain::model::{Capability, LayoutRef, Page, PageChanges, PageId, User};
use crate::domain::ports::{Authorizer, PageStore};
use crate::utils::error::{PageError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_slug};
use chrono::Utc;
use std::sync::Arc;

/// Rejects users who may not see `page` because it is private or a draft.
pub fn authorize_view<A: Authorizer + ?Sized>(
    authorizer: &A,
    user: &User,
    page: &Page,
) -> Result<()> {
    if !page.is_visible() && !authorizer.can(user, Capability::ViewPrivatePages) {
        return Err(PageError::permission_denied("Can't view invisible pages."));
    }
    if !page.is_published() && !authorizer.can(user, Capability::ViewDraftPages) {
        return Err(PageError::permission_denied("Can't view unpublished pages."));
    }
    Ok(())
}

/// Rejects status or visibility changes the user holds no capability for.
/// Resubmitting the current value is not a change.
pub fn authorize_change<A: Authorizer + ?Sized>(
    authorizer: &A,
    user: &User,
    page: &Page,
    changes: &PageChanges,
) -> Result<()> {
    if let Some(status) = changes.status {
        if status != page.status && !authorizer.can(user, Capability::PublishPages) {
            return Err(PageError::permission_denied(
                "You don't have permission to change the status of this page.",
            ));
        }
    }
    if let Some(visibility) = changes.visibility {
        if visibility != page.visibility && !authorizer.can(user, Capability::ChangeVisibility) {
            return Err(PageError::permission_denied(
                "You don't have permission to change the visibility of this page.",
            ));
        }
    }
    Ok(())
}

pub struct PageEditor<S: PageStore + ?Sized, A: Authorizer + ?Sized> {
    store: Arc<S>,
    registry: Arc<LayoutRegistry>,
    authorizer: Arc<A>,
}

impl<S: PageStore + ?Sized, A: Authorizer + ?Sized> Clone for PageEditor<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            authorizer: Arc::clone(&self.authorizer),
        }
    }
}

impl<S: PageStore + ?Sized, A: Authorizer + ?Sized> PageEditor<S, A> {
    pub fn new(store: Arc<S>, registry: Arc<LayoutRegistry>, authorizer: Arc<A>) -> Self {
        Self {
            store,
            registry,
            authorizer,
        }
    }

    /// The page paired with `layout`; anything but exactly one is an error.
    pub async fn page_for_layout(&self, layout: &LayoutRef) -> Result<Page> {
        let mut pages = self.store.pages_for_layout(layout).await?;
        if pages.len() != 1 {
            return Err(PageError::LayoutPairing {
                message: format!(
                    "{} page(s) relate to layout {}, expected exactly one",
                    pages.len(),
                    layout
                ),
            });
        }
        Ok(pages.remove(0))
    }

    pub async fn edit_layout(
        &self,
        layout: &LayoutRef,
        changes: PageChanges,
        user: &User,
    ) -> Result<Page> {
        let page = self.page_for_layout(layout).await?;
        self.edit_page(page.id, changes, user).await
    }

    /// Checks and applies `changes` against the stored page in one store
    /// update, so a concurrent edit cannot slip in between.
    pub async fn edit_page(&self, id: PageId, changes: PageChanges, user: &User) -> Result<Page> {
        let authorizer = self.authorizer.as_ref();
        let registry = self.registry.as_ref();
        let page = self
            .store
            .update(
                id,
                Box::new(move |page: &mut Page| {
                    apply_changes(authorizer, registry, user, page, changes)
                }),
            )
            .await?;

        tracing::info!(
            "Page {} ('{}') changed by {}",
            page.id,
            page.slug,
            user.name
        );
        Ok(page)
    }
}

fn apply_changes<A: Authorizer + ?Sized>(
    authorizer: &A,
    registry: &LayoutRegistry,
    user: &User,
    page: &mut Page,
    changes: PageChanges,
) -> Result<()> {
    if !authorizer.can(user, Capability::ChangePages) {
        return Err(PageError::permission_denied(
            "You don't have permission to change pages.",
        ));
    }
    authorize_view(authorizer, user, page)?;
    authorize_change(authorizer, user, page, &changes)?;

    if let Some(title) = changes.title {
        validate_non_empty_string("title", &title)?;
        page.title = title;
    }
    if let Some(slug) = changes.slug {
        validate_slug("slug", &slug).map_err(|e| PageError::validation(e.to_string()))?;
        page.slug = slug;
    }
    // 父頁存在與循環由 store 的 invariant 檢查負責
    if let Some(parent) = changes.parent {
        page.parent = parent;
    }
    if let Some(content) = changes.content {
        registry.check_content(&page.layout.kind, &content)?;
        page.content = content;
    }
    if let Some(status) = changes.status {
        page.status = status;
    }
    if let Some(visibility) = changes.visibility {
        page.visibility = visibility;
    }

    page.modified = Some(Utc::now());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPageStore;
    use crate::core::registry::LayoutDescriptor;
    use crate::domain::model::{Status, Visibility};
    use crate::domain::ports::GrantedCapabilities;
    use serde_json::json;

    fn page(id: PageId, slug: &str, parent: Option<PageId>) -> Page {
        Page {
            id,
            title: slug.to_string(),
            slug: slug.to_string(),
            parent,
            status: Status::Published,
            visibility: Visibility::Public,
            layout: LayoutRef {
                kind: "article".to_string(),
                id,
            },
            content: Default::default(),
            modified: None,
        }
    }

    fn user_with(capabilities: &[Capability]) -> User {
        User {
            name: "editor".to_string(),
            capabilities: capabilities.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn writer() -> User {
        user_with(&[Capability::ChangePages])
    }

    fn editor(pages: Vec<Page>) -> PageEditor<InMemoryPageStore, GrantedCapabilities> {
        let store = Arc::new(InMemoryPageStore::from_pages(pages).unwrap());
        let registry = LayoutRegistry::from_descriptors(vec![LayoutDescriptor {
            fields: vec!["body".to_string()],
            ..LayoutDescriptor::new("article")
        }])
        .unwrap();
        PageEditor::new(store, Arc::new(registry), Arc::new(GrantedCapabilities))
    }

    fn draft(id: PageId, slug: &str) -> Page {
        Page {
            status: Status::Draft,
            ..page(id, slug, None)
        }
    }

    fn private(id: PageId, slug: &str) -> Page {
        Page {
            visibility: Visibility::Private,
            ..page(id, slug, None)
        }
    }

    #[test]
    fn test_view_gate() {
        let anon = User::anonymous();
        let auth = GrantedCapabilities;

        assert!(authorize_view(&auth, &anon, &page(1, "a", None)).is_ok());
        assert!(authorize_view(&auth, &anon, &draft(1, "a")).is_err());
        assert!(authorize_view(&auth, &anon, &private(1, "a")).is_err());

        let reviewer = user_with(&[Capability::ViewDraftPages]);
        assert!(authorize_view(&auth, &reviewer, &draft(1, "a")).is_ok());
        assert!(authorize_view(&auth, &reviewer, &private(1, "a")).is_err());
    }

    #[test]
    fn test_closure_authorizer() {
        let allow_all = |_: &User, _: Capability| true;
        assert!(authorize_view(&allow_all, &User::anonymous(), &draft(1, "a")).is_ok());
    }

    #[tokio::test]
    async fn test_status_change_requires_publish_capability() {
        let editor = editor(vec![draft(1, "news")]);
        let writer = user_with(&[Capability::ChangePages, Capability::ViewDraftPages]);
        let publish = PageChanges {
            status: Some(Status::Published),
            ..Default::default()
        };

        let err = editor.edit_page(1, publish.clone(), &writer).await.unwrap_err();
        assert!(matches!(err, PageError::PermissionDenied { .. }));

        let publisher = user_with(&[
            Capability::ChangePages,
            Capability::ViewDraftPages,
            Capability::PublishPages,
        ]);
        let updated = editor.edit_page(1, publish, &publisher).await.unwrap();
        assert!(updated.is_published());
        assert!(updated.modified.is_some());
    }

    #[tokio::test]
    async fn test_visibility_change_requires_capability() {
        let editor = editor(vec![page(1, "about", None)]);
        let hide = PageChanges {
            visibility: Some(Visibility::Private),
            ..Default::default()
        };

        let err = editor.edit_page(1, hide.clone(), &writer()).await.unwrap_err();
        assert!(matches!(err, PageError::PermissionDenied { .. }));

        let user = user_with(&[Capability::ChangePages, Capability::ChangeVisibility]);
        let updated = editor.edit_page(1, hide, &user).await.unwrap();
        assert!(!updated.is_visible());
    }

    #[tokio::test]
    async fn test_resubmitting_current_status_is_allowed() {
        let editor = editor(vec![page(1, "about", None)]);
        let changes = PageChanges {
            title: Some("About us".to_string()),
            status: Some(Status::Published),
            visibility: Some(Visibility::Public),
            ..Default::default()
        };
        let updated = editor.edit_page(1, changes, &writer()).await.unwrap();
        assert_eq!(updated.title, "About us");
    }

    #[tokio::test]
    async fn test_edit_layout_pairing() {
        let editor = editor(vec![page(1, "about", None)]);
        let changes = PageChanges {
            title: Some("About".to_string()),
            ..Default::default()
        };

        let paired = LayoutRef {
            kind: "article".to_string(),
            id: 1,
        };
        assert!(editor
            .edit_layout(&paired, changes.clone(), &writer())
            .await
            .is_ok());

        let orphan = LayoutRef {
            kind: "article".to_string(),
            id: 42,
        };
        let err = editor
            .edit_layout(&orphan, changes, &writer())
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::LayoutPairing { .. }));
    }

    #[tokio::test]
    async fn test_reparent_into_descendant_rejected() {
        let editor = editor(vec![
            page(1, "about", None),
            page(2, "team", Some(1)),
            page(3, "leads", Some(2)),
        ]);
        let changes = PageChanges {
            parent: Some(Some(3)),
            ..Default::default()
        };
        let err = editor
            .edit_page(1, changes, &writer())
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_move_to_root_and_slug_clash() {
        let editor = editor(vec![
            page(1, "about", None),
            page(2, "team", Some(1)),
            page(3, "team", None),
        ]);
        let to_root = PageChanges {
            parent: Some(None),
            ..Default::default()
        };
        // a root-level "team" already exists
        assert!(editor
            .edit_page(2, to_root, &writer())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_content_checked_against_layout() {
        let editor = editor(vec![page(1, "about", None)]);
        let bad = PageChanges {
            content: Some(json!({"sidebar": "x"}).as_object().unwrap().clone()),
            ..Default::default()
        };
        assert!(editor.edit_page(1, bad, &writer()).await.is_err());

        let good = PageChanges {
            content: Some(json!({"body": "Hello"}).as_object().unwrap().clone()),
            ..Default::default()
        };
        let updated = editor.edit_page(1, good, &writer()).await.unwrap();
        assert_eq!(updated.content["body"], "Hello");
    }

    #[tokio::test]
    async fn test_invalid_slug_rejected() {
        let editor = editor(vec![page(1, "about", None)]);
        let changes = PageChanges {
            slug: Some("About Us".to_string()),
            ..Default::default()
        };
        let err = editor
            .edit_page(1, changes, &writer())
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_missing_page() {
        let editor = editor(vec![page(1, "about", None)]);
        let err = editor
            .edit_page(9, PageChanges::default(), &writer())
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_requires_change_capability() {
        let editor = editor(vec![page(1, "about", None), page(2, "team", Some(1))]);
        let rename = PageChanges {
            title: Some("Hijacked".to_string()),
            slug: Some("hijacked".to_string()),
            parent: Some(None),
            ..Default::default()
        };

        for user in [User::anonymous(), user_with(&[Capability::ViewDraftPages])] {
            let err = editor.edit_page(2, rename.clone(), &user).await.unwrap_err();
            assert!(matches!(err, PageError::PermissionDenied { .. }));
        }

        // nothing was written
        let layout = LayoutRef {
            kind: "article".to_string(),
            id: 2,
        };
        let stored = editor.page_for_layout(&layout).await.unwrap();
        assert_eq!(stored.title, "team");
        assert_eq!(stored.parent, Some(1));
    }

    #[tokio::test]
    async fn test_reparent_under_missing_page_rejected() {
        let editor = editor(vec![page(1, "about", None)]);
        let changes = PageChanges {
            parent: Some(Some(42)),
            ..Default::default()
        };
        let err = editor.edit_page(1, changes, &writer()).await.unwrap_err();
        assert!(matches!(err, PageError::ValidationError { .. }));
    }
}
