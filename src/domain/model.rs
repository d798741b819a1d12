use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub type PageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Points at the layout instance a page is paired with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayoutRef {
    pub kind: String,
    pub id: u64,
}

impl fmt::Display for LayoutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<PageId>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub visibility: Visibility,
    pub layout: LayoutRef,
    #[serde(default)]
    pub content: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl Page {
    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Named permissions checked at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "can_change_pages")]
    ChangePages,
    #[serde(rename = "can_view_private_pages")]
    ViewPrivatePages,
    #[serde(rename = "can_view_draft_pages")]
    ViewDraftPages,
    #[serde(rename = "can_publish_pages")]
    PublishPages,
    #[serde(rename = "can_change_visibility")]
    ChangeVisibility,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default)]
    pub superuser: bool,
    #[serde(default)]
    pub capabilities: HashSet<Capability>,
}

impl User {
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            ..Default::default()
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.superuser || self.capabilities.contains(&capability)
    }
}

/// A partial update submitted to the editor; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` moves the page to the root.
    #[serde(default, with = "double_option")]
    pub parent: Option<Option<PageId>>,
    pub status: Option<Status>,
    pub visibility: Option<Visibility>,
    pub content: Option<serde_json::Map<String, serde_json::Value>>,
}

// serde collapses `null` and "absent" for Option<Option<T>> without this
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            None => serializer.serialize_none(),
            Some(inner) => inner.serialize(serializer),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
