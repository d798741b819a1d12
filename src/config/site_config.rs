use crate::core::registry::LayoutDescriptor;
use crate::core::resolver::ResolutionPolicy;
use crate::domain::model::{Page, User};
use crate::utils::error::{PageError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_unique, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_TEMPLATE: &str = "pagemanager/page.html";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site: SiteSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub layouts: Vec<LayoutDescriptor>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    pub name: String,
    pub base_url: String,
    pub default_template: Option<String>,
    #[serde(default)]
    pub resolution: ResolutionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl SiteConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PageError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value. Any unset variable is an
    /// error, so a placeholder never survives into a token or URL.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut missing: Vec<String> = Vec::new();
        let processed = ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| {
                    if !missing.iter().any(|name| name == var_name) {
                        missing.push(var_name.to_string());
                    }
                    String::new()
                })
            })
            .into_owned();

        if !missing.is_empty() {
            return Err(PageError::ConfigError {
                message: format!(
                    "environment variable(s) not set: {}",
                    missing.join(", ")
                ),
            });
        }
        Ok(processed)
    }

    pub fn default_template(&self) -> &str {
        self.site
            .default_template
            .as_deref()
            .unwrap_or(DEFAULT_TEMPLATE)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("site.name", &self.site.name)?;
        validate_url("site.base_url", &self.site.base_url)?;
        validate_non_empty_string("server.bind", &self.server.bind)?;

        validate_unique(
            "layouts.kind",
            self.layouts.iter().map(|layout| layout.kind.as_str()),
        )?;
        validate_unique("users.name", self.users.iter().map(|user| user.name.as_str()))?;
        for user in &self.users {
            if let Some(token) = &user.token {
                validate_non_empty_string(&format!("users.{}.token", user.name), token)?;
            }
        }
        validate_unique(
            "users.token",
            self.users.iter().filter_map(|user| user.token.as_deref()),
        )?;

        for page in &self.pages {
            validate_non_empty_string(&format!("pages.{}.title", page.id), &page.title)?;
            if !self.layouts.iter().any(|layout| layout.kind == page.layout.kind) {
                return Err(PageError::InvalidConfigValueError {
                    field: format!("pages.{}.layout.kind", page.id),
                    value: page.layout.kind.clone(),
                    reason: "no layout with this kind is configured".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for SiteConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
