//! Image harvesting from static HTML documents.

use super::ImageElement;
use crate::fetch::resolve_against;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("invalid selector"));

/// Lazy-load attributes that carry the full-size URL, in preference order.
const LAZY_ATTRS: &[&str] = &["data-src", "data-iurl", "data-lazy-src"];

/// Collect `<img>` elements from `html`, resolving relative URLs against
/// `base_url`.
///
/// Widths come from the `width` attribute when it is a plain integer; static
/// HTML has no rendered dimensions.
pub fn images_from_html(html: &str, base_url: &Url) -> Vec<ImageElement> {
    let document = Html::parse_document(html);

    document
        .select(&IMG_SELECTOR)
        .filter_map(|element| {
            let attrs = element.value();

            let src = attrs
                .attr("src")
                .and_then(|s| resolve_against(base_url, s))
                .map(|u| u.to_string());

            let data_src = LAZY_ATTRS
                .iter()
                .find_map(|name| attrs.attr(name).and_then(|s| resolve_against(base_url, s)))
                .map(|u| u.to_string());

            let width = attrs.attr("width").and_then(|w| w.trim().parse::<u32>().ok());

            if src.is_none() && data_src.is_none() {
                return None;
            }

            Some(ImageElement { src, data_src, width })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images_from_html_resolves_and_reads_attrs() {
        let html = r#"
            <html><body>
                <img src="/fotos/uno-1.jpg" width="640">
                <img src="data:image/gif;base64,R0lGOD" data-src="https://image.webmotors.com.br/uno-2.jpg">
                <img data-iurl="//cdn.example.com/uno-3.jpg" width="auto">
                <img alt="no source">
            </body></html>
        "#;
        let base = Url::parse("https://www.webmotors.com.br/comprar/fiat-uno").unwrap();

        let images = images_from_html(html, &base);
        assert_eq!(images.len(), 3);

        assert_eq!(images[0].src.as_deref(), Some("https://www.webmotors.com.br/fotos/uno-1.jpg"));
        assert_eq!(images[0].width, Some(640));

        assert_eq!(images[1].src, None);
        assert_eq!(images[1].data_src.as_deref(), Some("https://image.webmotors.com.br/uno-2.jpg"));

        assert_eq!(images[2].data_src.as_deref(), Some("https://cdn.example.com/uno-3.jpg"));
        assert_eq!(images[2].width, None);
    }

    #[test]
    fn test_images_from_empty_document() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(images_from_html("<html></html>", &base).is_empty());
    }
}
