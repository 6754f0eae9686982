//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentType;

string_enum! {
    /// Which content types a category applies to
    pub enum TypeScope {
        Manga => "MANGA",
        Anime => "ANIME",
        Movie => "MOVIE",
        Universal => "UNIVERSAL",
    }
}

impl From<ContentType> for TypeScope {
    fn from(value: ContentType) -> Self {
        match value {
            ContentType::Manga => Self::Manga,
            ContentType::Anime => Self::Anime,
            ContentType::Movie => Self::Movie,
        }
    }
}

impl TypeScope {
    /// A category is listed for a type when scoped to it or universal
    pub fn applies_to(&self, content_type: ContentType) -> bool {
        *self == TypeScope::Universal || *self == TypeScope::from(content_type)
    }
}

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub type_scope: TypeScope,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    pub name: Option<String>,
    pub type_scope: Option<TypeScope>,
    pub sort_order: Option<i32>,
}

impl CreateCategoryInput {
    pub fn new(name: impl Into<String>, type_scope: TypeScope) -> Self {
        Self {
            name: Some(name.into()),
            type_scope: Some(type_scope),
            sort_order: None,
        }
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }
}

/// Partial update of a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub type_scope: Option<TypeScope>,
    pub sort_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_applies_to_matching_type_or_universal() {
        assert!(TypeScope::Universal.applies_to(ContentType::Movie));
        assert!(TypeScope::Anime.applies_to(ContentType::Anime));
        assert!(!TypeScope::Manga.applies_to(ContentType::Anime));
    }
}
