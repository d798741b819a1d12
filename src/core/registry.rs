use crate::domain::model::Page;
use crate::utils::error::{PageError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_slug};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fieldset {
    pub title: Option<String>,
    pub fields: Vec<String>,
}

/// Per-layout overrides consumed by the generic editor and page handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub kind: String,
    pub verbose_name: Option<String>,
    pub verbose_name_plural: Option<String>,
    pub template: Option<String>,
    /// Allowed content fields; empty allows any field not excluded.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub fieldsets: Vec<Fieldset>,
}

impl LayoutDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            verbose_name: None,
            verbose_name_plural: None,
            template: None,
            fields: Vec::new(),
            exclude: Vec::new(),
            fieldsets: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.verbose_name.as_deref().unwrap_or(&self.kind)
    }

    pub fn display_name_plural(&self) -> String {
        match &self.verbose_name_plural {
            Some(plural) => plural.clone(),
            None => format!("{}s", self.display_name()),
        }
    }

    fn validate(&self) -> Result<()> {
        validate_slug("layouts.kind", &self.kind)?;
        if let Some(template) = &self.template {
            validate_non_empty_string("layouts.template", template)?;
        }
        for field in &self.exclude {
            if self.fields.contains(field) {
                return Err(PageError::InvalidConfigValueError {
                    field: format!("layouts.{}.exclude", self.kind),
                    value: field.clone(),
                    reason: "field is both allowed and excluded".to_string(),
                });
            }
        }
        for fieldset in &self.fieldsets {
            for field in &fieldset.fields {
                if self.exclude.contains(field)
                    || (!self.fields.is_empty() && !self.fields.contains(field))
                {
                    return Err(PageError::InvalidConfigValueError {
                        field: format!("layouts.{}.fieldsets", self.kind),
                        value: field.clone(),
                        reason: "fieldset references a field the layout does not allow"
                            .to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Layout types known to the site, keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, LayoutDescriptor>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = LayoutDescriptor>,
    {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: LayoutDescriptor) -> Result<()> {
        descriptor.validate()?;
        if self.layouts.contains_key(&descriptor.kind) {
            return Err(PageError::ConfigError {
                message: format!("layout '{}' is registered twice", descriptor.kind),
            });
        }
        tracing::debug!("Registered layout '{}'", descriptor.kind);
        self.layouts.insert(descriptor.kind.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<&LayoutDescriptor> {
        self.layouts.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn descriptor_for(&self, page: &Page) -> Result<&LayoutDescriptor> {
        self.get(&page.layout.kind)
            .ok_or_else(|| PageError::LayoutPairing {
                message: format!(
                    "page {} uses unregistered layout '{}'",
                    page.id, page.layout.kind
                ),
            })
    }

    /// Template for rendering `page`, falling back to the site default.
    pub fn template_for<'a>(&'a self, page: &Page, default_template: &'a str) -> &'a str {
        self.get(&page.layout.kind)
            .and_then(|d| d.template.as_deref())
            .unwrap_or(default_template)
    }

    pub fn check_content(
        &self,
        kind: &str,
        content: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        let descriptor = self.get(kind).ok_or_else(|| PageError::LayoutPairing {
            message: format!("unregistered layout '{}'", kind),
        })?;

        for key in content.keys() {
            if descriptor.exclude.contains(key) {
                return Err(PageError::validation(format!(
                    "field '{}' is excluded from layout '{}'",
                    key, kind
                )));
            }
            if !descriptor.fields.is_empty() && !descriptor.fields.contains(key) {
                return Err(PageError::validation(format!(
                    "layout '{}' has no field '{}'",
                    kind, key
                )));
            }
        }
        Ok(())
    }
}
