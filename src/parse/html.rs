//! CSS selector dialect
//!
//! A field path is a CSS selector, optionally suffixed with `@attr` to read an
//! attribute instead of the node's text. Array roots select node sets; each
//! item scope is the matched node's outer HTML.

use scraper::{Html, Selector};

/// Raw text at `path`: first match's text, or its `@attr` value. An empty
/// path reads the whole scope's text.
pub fn scalar(html: &str, path: &str) -> Option<String> {
    let document = Html::parse_document(html);
    if path.is_empty() {
        return Some(document.root_element().text().collect());
    }
    let (selector, attr) = split_attr(path);
    let selector = Selector::parse(selector.trim()).ok()?;
    let element = document.select(&selector).next()?;
    match attr {
        Some(attr) => element.value().attr(attr).map(ToString::to_string),
        None => Some(element.text().collect()),
    }
}

/// Outer HTML of the first match, for nested-object scope narrowing.
pub fn scoped(html: &str, path: &str) -> Option<String> {
    let (selector, _) = split_attr(path);
    let selector = Selector::parse(selector.trim()).ok()?;
    let document = Html::parse_document(html);
    document.select(&selector).next().map(|element| element.html())
}

/// Item scopes for an array root. With an `@attr` suffix the items are the
/// attribute values themselves; otherwise each item is a node's outer HTML.
pub fn items(html: &str, root_path: &str) -> Vec<String> {
    if root_path.is_empty() {
        return vec![html.to_string()];
    }
    let (selector, attr) = split_attr(root_path);
    let Ok(selector) = Selector::parse(selector.trim()) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|element| match attr {
            Some(attr) => element.value().attr(attr).map(ToString::to_string),
            None => Some(element.html()),
        })
        .collect()
}

// `@` is not valid inside a CSS selector, so the last one always introduces
// an attribute accessor.
fn split_attr(path: &str) -> (&str, Option<&str>) {
    match path.rsplit_once('@') {
        Some((selector, attr)) if !attr.is_empty() => (selector, Some(attr)),
        _ => (path, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="listing">
            <h2 class="title">First</h2>
            <a class="link" href="/one">more</a>
          </div>
          <div class="listing">
            <h2 class="title">Second</h2>
            <a class="link" href="/two">more</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn selector_reads_text() {
        assert_eq!(scalar(PAGE, "h2.title").as_deref(), Some("First"));
    }

    #[test]
    fn attribute_accessor() {
        assert_eq!(scalar(PAGE, "a.link@href").as_deref(), Some("/one"));
    }

    #[test]
    fn missing_selector_selects_nothing() {
        assert_eq!(scalar(PAGE, "h3.absent"), None);
        assert_eq!(scalar(PAGE, "a.link@data-absent"), None);
    }

    #[test]
    fn items_select_node_sets() {
        let scopes = items(PAGE, "div.listing");
        assert_eq!(scopes.len(), 2);
        // Item scopes inherit the node as root.
        assert_eq!(scalar(&scopes[1], "h2.title").as_deref(), Some("Second"));
        assert_eq!(scalar(&scopes[1], "a.link@href").as_deref(), Some("/two"));
    }

    #[test]
    fn items_with_attribute_root() {
        let hrefs = items(PAGE, "a.link@href");
        assert_eq!(hrefs, vec!["/one".to_string(), "/two".to_string()]);
    }

    #[test]
    fn scoped_narrows_to_outer_html() {
        let scope = scoped(PAGE, "div.listing").expect("match");
        assert!(scope.starts_with("<div class=\"listing\""));
        assert_eq!(scalar(&scope, "h2.title").as_deref(), Some("First"));
    }
}
