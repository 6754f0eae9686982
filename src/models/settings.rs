//! Site settings model
//!
//! A single row of branding, banner, color and ad-snippet configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::double_option;

pub const DEFAULT_SITE_NAME: &str = "Bookmark";

/// Site-wide settings singleton
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub id: i64,
    pub site_name: String,
    pub logo_url: Option<String>,
    pub google_analytics_id: Option<String>,
    pub header_ad_html: Option<String>,
    pub footer_ad_html: Option<String>,
    pub banner_title: Option<String>,
    pub banner_subtitle: Option<String>,
    pub banner_description: Option<String>,
    pub banner_bg_color: Option<String>,
    pub banner_bg_image: Option<String>,
    pub banner_text_color: Option<String>,
    pub banner_btn1_text: Option<String>,
    pub banner_btn1_link: Option<String>,
    pub banner_btn1_color: Option<String>,
    pub banner_btn2_text: Option<String>,
    pub banner_btn2_link: Option<String>,
    pub banner_btn2_color: Option<String>,
    pub header_bg_color: Option<String>,
    pub header_text_color: Option<String>,
    pub footer_bg_color: Option<String>,
    pub footer_text_color: Option<String>,
    pub footer_description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Partial settings update
///
/// Absent fields keep their value. `null` clears an optional field, while
/// `siteName: null` keeps the current name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsInput {
    #[serde(default, deserialize_with = "double_option")]
    pub site_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub google_analytics_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_ad_html: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub footer_ad_html: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_bg_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_bg_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_text_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_btn1_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_btn1_link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_btn1_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_btn2_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_btn2_link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub banner_btn2_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_bg_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_text_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub footer_bg_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub footer_text_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub footer_description: Option<Option<String>>,
}

fn merge(target: &mut Option<String>, patch: Option<Option<String>>) {
    if let Some(value) = patch {
        *target = value;
    }
}

impl UpdateSettingsInput {
    /// Apply this patch on top of the current settings
    pub fn apply_to(self, mut settings: SiteSettings) -> SiteSettings {
        if let Some(Some(name)) = self.site_name {
            settings.site_name = name;
        }
        merge(&mut settings.logo_url, self.logo_url);
        merge(&mut settings.google_analytics_id, self.google_analytics_id);
        merge(&mut settings.header_ad_html, self.header_ad_html);
        merge(&mut settings.footer_ad_html, self.footer_ad_html);
        merge(&mut settings.banner_title, self.banner_title);
        merge(&mut settings.banner_subtitle, self.banner_subtitle);
        merge(&mut settings.banner_description, self.banner_description);
        merge(&mut settings.banner_bg_color, self.banner_bg_color);
        merge(&mut settings.banner_bg_image, self.banner_bg_image);
        merge(&mut settings.banner_text_color, self.banner_text_color);
        merge(&mut settings.banner_btn1_text, self.banner_btn1_text);
        merge(&mut settings.banner_btn1_link, self.banner_btn1_link);
        merge(&mut settings.banner_btn1_color, self.banner_btn1_color);
        merge(&mut settings.banner_btn2_text, self.banner_btn2_text);
        merge(&mut settings.banner_btn2_link, self.banner_btn2_link);
        merge(&mut settings.banner_btn2_color, self.banner_btn2_color);
        merge(&mut settings.header_bg_color, self.header_bg_color);
        merge(&mut settings.header_text_color, self.header_text_color);
        merge(&mut settings.footer_bg_color, self.footer_bg_color);
        merge(&mut settings.footer_text_color, self.footer_text_color);
        merge(&mut settings.footer_description, self.footer_description);
        settings.updated_at = Utc::now();
        settings
    }
}
