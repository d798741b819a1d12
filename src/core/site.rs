use crate::adapters::memory::InMemoryPageStore;
use crate::config::SiteConfig;
use crate::core::editor::{authorize_view, PageEditor};
use crate::core::registry::LayoutRegistry;
use crate::core::resolver::PathResolver;
use crate::domain::model::{Page, User};
use crate::domain::ports::{Authorizer, GrantedCapabilities, PageStore};
use crate::utils::error::{PageError, Result};
use crate::utils::validation::Validate;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// What an external template renderer needs to draw a page.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub template: String,
    pub url: String,
    pub path: String,
    pub layout: LayoutSummary,
    pub page: Page,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutSummary {
    pub kind: String,
    pub name: String,
}

/// A loaded site: page store, layout registry, users and the services over them.
pub struct Site {
    name: String,
    base_url: Url,
    default_template: String,
    registry: Arc<LayoutRegistry>,
    users: Vec<User>,
    authorizer: Arc<dyn Authorizer>,
    resolver: PathResolver<dyn PageStore>,
    editor: PageEditor<dyn PageStore, dyn Authorizer>,
}

impl Site {
    pub fn from_config(config: SiteConfig) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(LayoutRegistry::from_descriptors(config.layouts.clone())?);
        let store: Arc<dyn PageStore> = Arc::new(InMemoryPageStore::from_pages(config.pages.clone())?);

        tracing::info!(
            "Loaded site '{}' with {} layout(s), {} page(s), {} user(s)",
            config.site.name,
            registry.len(),
            config.pages.len(),
            config.users.len()
        );

        Self::assemble(config, registry, store, Arc::new(GrantedCapabilities))
    }

    /// Builds a site over a caller-provided store and authorizer.
    pub fn assemble(
        config: SiteConfig,
        registry: Arc<LayoutRegistry>,
        store: Arc<dyn PageStore>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self> {
        let mut base = config.site.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| PageError::InvalidConfigValueError {
            field: "site.base_url".to_string(),
            value: config.site.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            default_template: config.default_template().to_string(),
            name: config.site.name,
            base_url,
            resolver: PathResolver::with_policy(Arc::clone(&store), config.site.resolution),
            editor: PageEditor::new(store, Arc::clone(&registry), Arc::clone(&authorizer)),
            registry,
            users: config.users,
            authorizer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &LayoutRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &PathResolver<dyn PageStore> {
        &self.resolver
    }

    pub fn editor(&self) -> &PageEditor<dyn PageStore, dyn Authorizer> {
        &self.editor
    }

    pub fn user_by_token(&self, token: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|user| user.token.as_deref() == Some(token))
    }

    pub fn user_by_name(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|user| user.name == name)
    }

    /// Resolves `path` for `user`. Pages the user may not see are reported
    /// as NotFound so their existence does not leak.
    pub async fn view(&self, path: &str, user: &User) -> Result<RenderedPage> {
        let page = self.resolver.resolve(path).await?;

        if let Err(denied) = authorize_view(self.authorizer.as_ref(), user, &page) {
            tracing::debug!("Hiding page {} from {}: {}", page.id, user.name, denied);
            return Err(PageError::not_found(path));
        }

        self.render(page).await
    }

    pub async fn render(&self, page: Page) -> Result<RenderedPage> {
        let descriptor = self.registry.descriptor_for(&page)?;
        let path = self.resolver.path_of(&page).await?;
        let url = self
            .base_url
            .join(&path)
            .map_err(|e| PageError::validation(format!("cannot build URL for '{}': {}", path, e)))?;

        Ok(RenderedPage {
            template: self
                .registry
                .template_for(&page, &self.default_template)
                .to_string(),
            url: url.to_string(),
            path,
            layout: LayoutSummary {
                kind: descriptor.kind.clone(),
                name: descriptor.display_name().to_string(),
            },
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        let config = SiteConfig::from_toml_str(
            r#"
[site]
name = "Example"
base_url = "https://example.com/site"

[[layouts]]
kind = "article"
verbose_name = "Article"
template = "layouts/article.html"

[[layouts]]
kind = "landing"

[[users]]
name = "reviewer"
token = "review-token"
capabilities = ["can_view_draft_pages"]

[[pages]]
id = 1
title = "About"
slug = "about"
status = "published"
layout = { kind = "landing", id = 1 }

[[pages]]
id = 2
title = "Team"
slug = "team"
parent = 1
status = "published"
layout = { kind = "article", id = 1 }

[[pages]]
id = 3
title = "Roadmap"
slug = "roadmap"
parent = 1
layout = { kind = "article", id = 2 }
"#,
        )
        .unwrap();
        Site::from_config(config).unwrap()
    }

    #[tokio::test]
    async fn test_view_renders_page() {
        let site = site();
        let rendered = site.view("about/team", &User::anonymous()).await.unwrap();

        assert_eq!(rendered.page.id, 2);
        assert_eq!(rendered.path, "about/team");
        assert_eq!(rendered.url, "https://example.com/site/about/team");
        assert_eq!(rendered.template, "layouts/article.html");
        assert_eq!(rendered.layout.name, "Article");
    }

    #[tokio::test]
    async fn test_default_template_for_layout_without_one() {
        let site = site();
        let rendered = site.view("about", &User::anonymous()).await.unwrap();
        assert_eq!(rendered.template, "pagemanager/page.html");
        assert_eq!(rendered.layout.name, "landing");
    }

    #[tokio::test]
    async fn test_draft_hidden_from_anonymous() {
        let site = site();
        let err = site.view("about/roadmap", &User::anonymous()).await.unwrap_err();
        assert!(matches!(err, PageError::NotFound { .. }));

        let reviewer = site.user_by_token("review-token").unwrap().clone();
        let rendered = site.view("about/roadmap", &reviewer).await.unwrap();
        assert_eq!(rendered.page.id, 3);
    }

    #[test]
    fn test_user_lookup() {
        let site = site();
        assert!(site.user_by_token("nope").is_none());
        assert_eq!(site.user_by_name("reviewer").unwrap().name, "reviewer");
    }
}
