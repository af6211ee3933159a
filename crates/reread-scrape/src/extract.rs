//! HTML metadata extraction.
//!
//! Pulls Open Graph and standard meta fields out of a fetched page. Each
//! field walks an ordered fallback chain; a document that matches nothing
//! still extracts cleanly with every field `None`.

use scraper::{Html, Selector};

use reread_core::PageMetadata;

/// Extract page metadata from an HTML document.
///
/// Fallback order per field, first match wins:
/// - title: `og:title` meta, then the `<title>` element text
/// - description: `og:description` meta, then `name="description"` meta
/// - image: `og:image` meta only
/// - site name: `og:site_name` meta, then `name="application-name"` meta,
///   then `name="twitter:site"` meta with any leading `@` stripped
///
/// Values are trimmed; whitespace-only content counts as missing.
pub fn extract_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = meta_property(&document, "og:title").or_else(|| title_text(&document));
    let description =
        meta_property(&document, "og:description").or_else(|| meta_name(&document, "description"));
    let image_url = meta_property(&document, "og:image");
    let site_name = meta_property(&document, "og:site_name")
        .or_else(|| meta_name(&document, "application-name"))
        .or_else(|| {
            meta_name(&document, "twitter:site")
                .map(|handle| handle.trim_start_matches('@').to_string())
                .filter(|name| !name.is_empty())
        });

    PageMetadata {
        title,
        description,
        image_url,
        site_name,
    }
}

/// First non-blank `content` of a `<meta property="...">` element.
fn meta_property(document: &Html, property: &str) -> Option<String> {
    meta_content(document, &format!(r#"meta[property="{}"]"#, property))
}

/// First non-blank `content` of a `<meta name="...">` element.
fn meta_name(document: &Html, name: &str) -> Option<String> {
    meta_content(document, &format!(r#"meta[name="{}"]"#, name))
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(ToString::to_string)
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").unwrap();
    let element = document.select(&selector).next()?;
    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
