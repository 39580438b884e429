//! Line map page scraping
//!
//! The line map image is not exposed by the timetable API. It is embedded in
//! the public line page as the element with id `route-map`, whose `src`
//! points at the image.

use scraper::{Html, Selector};
use url::Url;

use crate::error::PtvError;

/// Id of the element carrying the map image
pub const ROUTE_MAP_ELEMENT_ID: &str = "route-map";

/// Decode a line page body as text
///
/// The last byte of the body is not part of the document and is dropped
/// before decoding.
pub(crate) fn decode_page(body: &[u8]) -> Result<String, PtvError> {
    let (_, document) = body
        .split_last()
        .ok_or_else(|| PtvError::MapPageFormat("line page is empty".to_string()))?;

    Ok(String::from_utf8_lossy(document).into_owned())
}

/// `src` of the `route-map` element, if the page has one
pub(crate) fn route_map_src(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!("[id=\"{ROUTE_MAP_ELEMENT_ID}\"]")).ok()?;

    document
        .select(&selector)
        .next()?
        .value()
        .attr("src")
        .map(str::to_string)
}

/// Resolve the map image URL embedded in a line page
pub(crate) fn resolve_map_image_url(page_url: &Url, body: &[u8]) -> Result<Url, PtvError> {
    let html = decode_page(body)?;

    let src = route_map_src(&html).ok_or_else(|| {
        PtvError::MapPageFormat(format!(
            "no element with id \"{ROUTE_MAP_ELEMENT_ID}\" and a src attribute on {page_url}"
        ))
    })?;

    page_url
        .join(src.trim())
        .map_err(|e| PtvError::MapPageFormat(format!("invalid map image URL {src:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("http://ptv.vic.gov.au/route/view/1").unwrap()
    }

    #[test]
    fn test_decode_page_drops_last_byte() {
        assert_eq!(decode_page(b"<html></html>\0").unwrap(), "<html></html>");
        assert_eq!(decode_page(b"abc").unwrap(), "ab");
        assert_eq!(decode_page(b"x").unwrap(), "");
    }

    #[test]
    fn test_decode_empty_page() {
        assert!(matches!(
            decode_page(b""),
            Err(PtvError::MapPageFormat(_))
        ));
    }

    #[test]
    fn test_decode_page_is_lossy() {
        let body = [b'a', 0xFF, b'b', b'\n'];
        assert_eq!(decode_page(&body).unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_route_map_src() {
        let html = r#"<html><body>
            <div id="header"><img src="/logo.png"></div>
            <img id="route-map" src="http://example/img.png" alt="Map">
        </body></html>"#;
        assert_eq!(
            route_map_src(html).as_deref(),
            Some("http://example/img.png")
        );
    }

    #[test]
    fn test_route_map_src_on_non_img_element() {
        let html = r#"<iframe id="route-map" src="/maps/1.pdf"></iframe>"#;
        assert_eq!(route_map_src(html).as_deref(), Some("/maps/1.pdf"));
    }

    #[test]
    fn test_route_map_src_missing_element() {
        let html = r#"<html><body><img id="other" src="a.png"></body></html>"#;
        assert!(route_map_src(html).is_none());
    }

    #[test]
    fn test_route_map_src_missing_attribute() {
        let html = r#"<html><body><img id="route-map"></body></html>"#;
        assert!(route_map_src(html).is_none());
    }

    #[test]
    fn test_resolve_absolute_image_url() {
        let body = br#"<img id="route-map" src="http://example/img.png">X"#;
        let url = resolve_map_image_url(&page_url(), body).unwrap();
        assert_eq!(url.as_str(), "http://example/img.png");
    }

    #[test]
    fn test_resolve_relative_image_url() {
        let body = br#"<img id="route-map" src="/maps/line-1.png">X"#;
        let url = resolve_map_image_url(&page_url(), body).unwrap();
        assert_eq!(url.as_str(), "http://ptv.vic.gov.au/maps/line-1.png");
    }

    #[test]
    fn test_resolve_without_route_map() {
        let body = b"<html><body><p>Line not found</p></body></html>\n";
        let err = resolve_map_image_url(&page_url(), body).unwrap_err();
        assert!(matches!(err, PtvError::MapPageFormat(_)));
        assert!(!err.is_retryable());
    }
}
