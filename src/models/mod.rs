//! Data models
//!
//! Database entities of the Bookmark directory, API request inputs and the
//! read models returned by services. JSON uses camelCase field names and
//! upper-case enum values.

// Declares a fieldless enum stored and serialized as fixed strings.
// Generates `as_str`, `ALL`, `Display` and a case-insensitive `FromStr`.
// Defined before the submodules so they can invoke it.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| format!("Invalid {}: {}", stringify!($name), s))
            }
        }
    };
}

mod ad;
mod admin;
mod bookmark;
mod category;
mod comment;
mod content;
mod link;
mod partner;
mod report;
mod settings;
mod stats;

pub use ad::{Ad, AdType, CreateAdInput, UpdateAdInput};
pub use admin::{AdminRole, AdminSession, AdminStatus, AdminUser};
pub use bookmark::{Bookmark, BookmarkWithContent};
pub use category::{Category, CreateCategoryInput, TypeScope, UpdateCategoryInput};
pub use comment::{
    AdminComment, Comment, CommentPage, CommentStatus, CreateCommentInput, PublicComment,
};
pub use content::{
    AdminContent, Content, ContentDetail, ContentSort, ContentStatus, ContentSummary,
    ContentType, ContentWithCategories, CreateContentInput, PagedContent, PublicContentQuery,
    SuggestedContent, UpdateContentInput,
};
pub use link::{
    AdminLink, ContentLink, CreateLinkInput, LinkClick, LinkStatus, LinkType, LinkWithPartner,
    NewLinkClick, NewLinkInput, PartnerSummary, UpdateLinkInput,
};
pub use partner::{CreatePartnerInput, Partner, PartnerWithLinkCount, UpdatePartnerInput};
pub use report::{ContentReport, CreateReportInput, ReportStatus, ReportWithContent};
pub use settings::{SiteSettings, UpdateSettingsInput, DEFAULT_SITE_NAME};
pub use stats::{AnalyticsOverview, DailyTotals, StatEvent, TopContent};

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: absent gives `None`, `null` gives `Some(None)`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_string_enum_parse_is_case_insensitive() {
        assert_eq!(ContentType::from_str("manga").unwrap(), ContentType::Manga);
        assert_eq!(ContentType::from_str(" MOVIE ").unwrap(), ContentType::Movie);
        assert_eq!(AdminRole::from_str("super_admin").unwrap(), AdminRole::SuperAdmin);
        assert!(ContentType::from_str("book").is_err());
    }

    #[test]
    fn test_string_enum_serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&LinkStatus::Verified).unwrap(), "\"VERIFIED\"");
        let parsed: ReportStatus = serde_json::from_str("\"DISMISSED\"").unwrap();
        assert_eq!(parsed, ReportStatus::Dismissed);
        assert!(serde_json::from_str::<ReportStatus>("\"dismissed\"").is_err());
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        let absent: UpdateAdInput = serde_json::from_str("{}").unwrap();
        assert!(absent.image_url.is_none());

        let null: UpdateAdInput = serde_json::from_str(r#"{"imageUrl": null}"#).unwrap();
        assert_eq!(null.image_url, Some(None));

        let set: UpdateAdInput = serde_json::from_str(r#"{"imageUrl": "a.png"}"#).unwrap();
        assert_eq!(set.image_url, Some(Some("a.png".to_string())));
    }
}
