//! Server-rendered pages
//!
//! Only the redirect interstitial is rendered on the server. Templates are
//! compiled into the binary and autoescaped by Tera because their names end
//! in `.html`.

use anyhow::Result;
use serde::Serialize;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

use crate::models::Ad;

mod error;

pub use error::PageError;

const INTERSTITIAL: &str = "interstitial.html";

/// Seconds before the interstitial navigates on its own
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Data shown on the interstitial page
#[derive(Debug, Clone, Serialize)]
pub struct InterstitialPage<'a> {
    pub title: &'a str,
    pub target_url: &'a str,
    pub source_name: &'a str,
    pub site_name: &'a str,
    pub ads: &'a [Ad],
}

/// Renders the built-in templates
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            INTERSTITIAL,
            include_str!("../../templates/interstitial.html"),
        )
        .map_err(|e| PageError::InvalidTemplate(INTERSTITIAL.to_string(), e.to_string()))?;

        Ok(Self { tera })
    }

    pub fn render_interstitial(&self, page: &InterstitialPage<'_>) -> Result<String> {
        let mut context = TeraContext::from_serialize(page)?;
        context.insert("countdown", &COUNTDOWN_SECONDS);
        context.insert("target_url_js", &script_string(page.target_url)?);

        self.render(INTERSTITIAL, &context)
    }

    fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut error_msg = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(s) = source {
                error_msg.push_str(&format!("\n  Caused by: {}", s));
                source = s.source();
            }
            PageError::TemplateError(error_msg).into()
        })
    }
}

/// JSON string literal that is safe inside a `<script>` element
fn script_string(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdType;
    use chrono::Utc;

    fn ad(ad_type: AdType, image_url: Option<&str>, script_code: Option<&str>) -> Ad {
        let now = Utc::now();
        Ad {
            id: 1,
            position: "redirect_page".to_string(),
            ad_type,
            image_url: image_url.map(String::from),
            script_code: script_code.map(String::from),
            target_url: Some("https://sponsor.example".to_string()),
            is_active: true,
            start_date: None,
            end_date: None,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_interstitial_contents() {
        let renderer = PageRenderer::new().unwrap();
        let ads = vec![
            ad(AdType::Image, Some("https://img.example/banner.png"), None),
            ad(AdType::Script, None, Some("<div id=\"slot\"></div>")),
        ];
        let html = renderer
            .render_interstitial(&InterstitialPage {
                title: "One Piece",
                target_url: "https://reader.example/one-piece",
                source_name: "Reader Hub",
                site_name: "Bookmark",
                ads: &ads,
            })
            .unwrap();

        assert!(html.contains("One Piece"));
        assert!(html.contains("Reader Hub"));
        assert!(html.contains("Go Now"));
        assert!(html.contains("Cancel"));
        assert!(html.contains("Safe redirect powered by Bookmark"));
        assert!(html.contains("<span id=\"countdown\">3</span>"));
        assert!(html.contains("https://img.example/banner.png") || html.contains("https:&#x2F;&#x2F;img.example&#x2F;banner.png"));
        assert!(html.contains("<div id=\"slot\"></div>"));
        assert!(html.contains("\"https://reader.example/one-piece\""));
    }

    #[test]
    fn test_interstitial_escapes_content() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer
            .render_interstitial(&InterstitialPage {
                title: "<b>Bold</b>",
                target_url: "https://x.example/</script><script>alert(1)</script>",
                source_name: "Src",
                site_name: "Bookmark",
                ads: &[],
            })
            .unwrap();

        assert!(!html.contains("<b>Bold</b>"));
        assert!(html.contains("&lt;b&gt;Bold&lt;&#x2F;b&gt;"));
        assert!(!html.contains("</script><script>alert(1)"));
    }

    #[test]
    fn test_script_string_encodes_markup() {
        assert_eq!(script_string("a</b>&").unwrap(), "\"a\\u003c/b\\u003e\\u0026\"");
    }
}
