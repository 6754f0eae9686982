//! Content model
//!
//! A catalog item (manga, anime or movie) and the read models built around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, Category, ContentLink, LinkWithPartner, NewLinkInput};

string_enum! {
    /// Kind of catalog item
    pub enum ContentType {
        Manga => "MANGA",
        Anime => "ANIME",
        Movie => "MOVIE",
    }
}

string_enum! {
    /// Publication status. Only published items are visible publicly.
    pub enum ContentStatus {
        Published => "PUBLISHED",
        Draft => "DRAFT",
        Hidden => "HIDDEN",
    }
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Published
    }
}

/// Content entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub image_url: String,
    pub description: Option<String>,
    pub external_url: String,
    pub status: ContentStatus,
    pub direct_redirect: bool,
    /// Comma-separated tag list
    pub tags: Option<String>,
    pub rating: Option<f64>,
    pub views_total: i64,
    pub clicks_total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }

    /// Split the stored tag string into trimmed, non-empty tags
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn summary(&self) -> ContentSummary {
        ContentSummary {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            content_type: self.content_type,
            image_url: self.image_url.clone(),
        }
    }
}

/// Minimal content reference embedded in other records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub image_url: String,
}

/// Content with its categories, as listed publicly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentWithCategories {
    #[serde(flatten)]
    pub content: Content,
    pub categories: Vec<Category>,
}

/// Full admin record: content, categories and every link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminContent {
    #[serde(flatten)]
    pub content: Content,
    pub categories: Vec<Category>,
    pub links: Vec<ContentLink>,
}

/// Item shown in the "suggested" strip of a detail page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedContent {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub image_url: String,
    pub rating: Option<f64>,
}

/// Public detail view of one published item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetail {
    #[serde(flatten)]
    pub content: Content,
    pub tag_list: Vec<String>,
    pub categories: Vec<Category>,
    pub links: Vec<LinkWithPartner>,
    pub suggested: Vec<SuggestedContent>,
}

/// Sort order of the public listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSort {
    /// Title ascending
    Az,
    /// Newest first
    #[default]
    New,
    /// Most viewed first
    Views,
}

impl ContentSort {
    /// Parse a query value, falling back to newest first
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("az") => Self::Az,
            Some("views") => Self::Views,
            _ => Self::New,
        }
    }
}

/// Filters of the public catalog listing
#[derive(Debug, Clone)]
pub struct PublicContentQuery {
    pub content_type: ContentType,
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub sort: ContentSort,
    pub page: i64,
    pub page_size: i64,
}

impl PublicContentQuery {
    pub const DEFAULT_PAGE_SIZE: i64 = 24;
    pub const MAX_PAGE_SIZE: i64 = 100;

    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            category_slug: None,
            search: None,
            sort: ContentSort::default(),
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_category(mut self, slug: impl Into<String>) -> Self {
        self.category_slug = Some(slug.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, sort: ContentSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.page_size
    }
}

/// One page of the public listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedContent {
    pub items: Vec<ContentWithCategories>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Input for creating content from the admin API
///
/// Required fields are optional here so that missing values are reported
/// as a validation message rather than a body parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentInput {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub external_url: Option<String>,
    pub status: Option<ContentStatus>,
    pub direct_redirect: Option<bool>,
    pub category_ids: Option<Vec<i64>>,
    pub tags: Option<String>,
    pub rating: Option<f64>,
    pub links: Option<Vec<NewLinkInput>>,
}

impl CreateContentInput {
    pub fn new(
        title: impl Into<String>,
        content_type: ContentType,
        image_url: impl Into<String>,
        external_url: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            content_type: Some(content_type),
            image_url: Some(image_url.into()),
            external_url: Some(external_url.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_categories(mut self, category_ids: Vec<i64>) -> Self {
        self.category_ids = Some(category_ids);
        self
    }

    pub fn with_links(mut self, links: Vec<NewLinkInput>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_direct_redirect(mut self, direct_redirect: bool) -> Self {
        self.direct_redirect = Some(direct_redirect);
        self
    }
}

/// Partial update of a content record
///
/// Nullable columns use `Option<Option<T>>`: absent keeps the value,
/// `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentInput {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub external_url: Option<String>,
    pub status: Option<ContentStatus>,
    pub direct_redirect: Option<bool>,
    pub category_ids: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tags: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<f64>>,
}
