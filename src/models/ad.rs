//! Ad model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::double_option;

string_enum! {
    /// How an ad is rendered
    pub enum AdType {
        Image => "IMAGE",
        Script => "SCRIPT",
    }
}

/// Advertisement placed at a named position of the site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: i64,
    pub position: String,
    #[serde(rename = "type")]
    pub ad_type: AdType,
    pub image_url: Option<String>,
    pub script_code: Option<String>,
    pub target_url: Option<String>,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ad {
    /// Active and inside its optional schedule window (bounds inclusive)
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.map_or(true, |start| start <= now)
            && self.end_date.map_or(true, |end| end >= now)
    }
}

/// Input for creating an ad
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdInput {
    pub position: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<AdType>,
    pub image_url: Option<String>,
    pub script_code: Option<String>,
    pub target_url: Option<String>,
    pub is_active: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort_order: Option<i32>,
}

impl CreateAdInput {
    pub fn image(position: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            position: Some(position.into()),
            ad_type: Some(AdType::Image),
            image_url: Some(image_url.into()),
            ..Default::default()
        }
    }

    pub fn script(position: impl Into<String>, script_code: impl Into<String>) -> Self {
        Self {
            position: Some(position.into()),
            ad_type: Some(AdType::Script),
            script_code: Some(script_code.into()),
            ..Default::default()
        }
    }

    pub fn with_window(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }
}

/// Partial update of an ad
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdInput {
    pub position: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<AdType>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub script_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_url: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub sort_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ad(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, active: bool) -> Ad {
        let now = Utc::now();
        Ad {
            id: 1,
            position: "header".to_string(),
            ad_type: AdType::Image,
            image_url: Some("a.png".to_string()),
            script_code: None,
            target_url: None,
            is_active: active,
            start_date: start,
            end_date: end,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_live_window() {
        let now = Utc::now();
        let hour = Duration::hours(1);

        assert!(ad(None, None, true).is_live_at(now));
        assert!(ad(Some(now - hour), None, true).is_live_at(now));
        assert!(ad(None, Some(now + hour), true).is_live_at(now));
        assert!(ad(Some(now), Some(now), true).is_live_at(now));
        assert!(!ad(Some(now + hour), None, true).is_live_at(now));
        assert!(!ad(None, Some(now - hour), true).is_live_at(now));
        assert!(!ad(None, None, false).is_live_at(now));
    }
}
