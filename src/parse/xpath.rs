//! XPath 1.0 subset
//!
//! Supported grammar, which covers the location paths extraction models use
//! in practice:
//!
//! - `/` child steps and `//` descendant-or-self steps; a path with no
//!   leading slash searches the whole context subtree;
//! - name tests and `*`;
//! - predicates: `[n]` (1-based position), `[@attr]`, `[@attr='value']`;
//! - terminal `@attr` and `text()` selections.
//!
//! Expressions are parsed into a small AST with `nom` and evaluated by
//! walking the `scraper` tree.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{char, digit1},
    combinator::{map, opt},
    multi::many0,
    sequence::{delimited, pair, preceded},
};
use scraper::{ElementRef, Html, Node};
use ego_tree::NodeRef;

/// A parsed location path
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    steps: Vec<Step>,
    terminal: Option<Terminal>,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    HasAttr(String),
    AttrEquals(String, String),
}

#[derive(Debug, Clone, PartialEq)]
enum Terminal {
    Attr(String),
    Text,
}

/// Parse a location path. `None` for expressions outside the subset.
pub fn parse(input: &str) -> Option<Path> {
    let input = input.trim();
    let mut rest = input;
    let mut steps = Vec::new();
    let mut terminal = None;
    let mut first = true;

    while !rest.is_empty() {
        let axis = if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            Axis::DescendantOrSelf
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
            Axis::Child
        } else if first {
            // Relative paths search the context subtree.
            Axis::DescendantOrSelf
        } else {
            return None;
        };
        first = false;

        if let Ok((r, t)) = terminal_selection(rest) {
            if !r.is_empty() {
                return None;
            }
            terminal = Some(t);
            rest = r;
            break;
        }

        let (r, step) = step(axis, rest).ok()?;
        steps.push(step);
        rest = r;
    }

    Some(Path { steps, terminal })
}

fn step(axis: Axis, input: &str) -> IResult<&str, Step> {
    map(pair(name_test, many0(predicate)), move |(test, predicates)| Step {
        axis,
        test,
        predicates,
    })(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == ':')(input)
}

fn name_test(input: &str) -> IResult<&str, NameTest> {
    alt((
        map(tag("*"), |_| NameTest::Any),
        map(name, |n: &str| NameTest::Name(n.to_ascii_lowercase())),
    ))(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), is_not("'"), char('\'')),
        delimited(char('"'), is_not("\""), char('"')),
    ))(input)
}

fn predicate(input: &str) -> IResult<&str, Predicate> {
    delimited(
        char('['),
        alt((
            map(
                preceded(char('@'), pair(name, opt(preceded(char('='), quoted)))),
                |(attr, value)| match value {
                    Some(value) => Predicate::AttrEquals(attr.to_string(), value.to_string()),
                    None => Predicate::HasAttr(attr.to_string()),
                },
            ),
            map(digit1, |digits: &str| {
                Predicate::Position(digits.parse().unwrap_or(1))
            }),
        )),
        char(']'),
    )(input)
}

fn terminal_selection(input: &str) -> IResult<&str, Terminal> {
    alt((
        map(preceded(char('@'), name), |attr: &str| {
            Terminal::Attr(attr.to_string())
        }),
        map(tag("text()"), |_| Terminal::Text),
    ))(input)
}

/// Raw text at `path`: string-value or attribute of the first selected node.
/// An empty path reads the whole scope's text.
pub fn scalar(html: &str, path: &str) -> Option<String> {
    let document = Html::parse_document(html);
    if path.trim().is_empty() {
        return Some(text_content(&document.tree.root()));
    }
    let expr = parse(path)?;

    if expr.steps.is_empty() {
        // Terminal-only relative path, e.g. `@href` inside an item scope.
        return match expr.terminal? {
            Terminal::Text => Some(text_content(&document.tree.root())),
            Terminal::Attr(attr) => document
                .tree
                .root()
                .descendants()
                .filter_map(|node| ElementRef::wrap(node))
                .find_map(|element| element.value().attr(&attr).map(ToString::to_string)),
        };
    }

    let nodes = select(&document, &expr);
    let node = nodes.first()?;
    match &expr.terminal {
        None | Some(Terminal::Text) => Some(text_content(node)),
        Some(Terminal::Attr(attr)) => ElementRef::wrap(*node)
            .and_then(|element| element.value().attr(attr).map(ToString::to_string)),
    }
}

/// Outer HTML of the first selected node.
pub fn scoped(html: &str, path: &str) -> Option<String> {
    let expr = parse(path)?;
    let document = Html::parse_document(html);
    let nodes = select(&document, &expr);
    nodes
        .first()
        .and_then(|node| ElementRef::wrap(*node))
        .map(|element| element.html())
}

/// Item scopes for an array root: outer HTML per node, or the terminal
/// attribute/text values when the path ends in one.
pub fn items(html: &str, root_path: &str) -> Vec<String> {
    if root_path.trim().is_empty() {
        return vec![html.to_string()];
    }
    let Some(expr) = parse(root_path) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let nodes = select(&document, &expr);
    nodes
        .into_iter()
        .filter_map(|node| match &expr.terminal {
            None => ElementRef::wrap(node).map(|element| element.html()),
            Some(Terminal::Text) => Some(text_content(&node)),
            Some(Terminal::Attr(attr)) => ElementRef::wrap(node)
                .and_then(|element| element.value().attr(attr).map(ToString::to_string)),
        })
        .collect()
}

fn select<'a>(document: &'a Html, expr: &Path) -> Vec<NodeRef<'a, Node>> {
    let mut current: Vec<NodeRef<'a, Node>> = vec![document.tree.root()];
    for step in &expr.steps {
        let mut next: Vec<NodeRef<'a, Node>> = Vec::new();
        for context in &current {
            let candidates: Vec<NodeRef<'a, Node>> = match step.axis {
                Axis::Child => context.children().collect(),
                Axis::DescendantOrSelf => context.descendants().collect(),
            };
            let mut matched: Vec<NodeRef<'a, Node>> = candidates
                .into_iter()
                .filter(|node| matches_test(node, &step.test))
                .collect();
            for predicate in &step.predicates {
                matched = apply_predicate(matched, predicate);
            }
            next.extend(matched);
        }
        // Overlapping descendant contexts can select a node twice.
        let mut seen = std::collections::HashSet::new();
        next.retain(|node| seen.insert(node.id()));
        current = next;
    }
    current
}

fn matches_test(node: &NodeRef<'_, Node>, test: &NameTest) -> bool {
    node.value().as_element().is_some_and(|element| match test {
        NameTest::Any => true,
        NameTest::Name(name) => element.name().eq_ignore_ascii_case(name),
    })
}

fn apply_predicate<'a>(
    nodes: Vec<NodeRef<'a, Node>>,
    predicate: &Predicate,
) -> Vec<NodeRef<'a, Node>> {
    match predicate {
        Predicate::Position(position) => nodes
            .into_iter()
            .nth(position.saturating_sub(1))
            .into_iter()
            .collect(),
        Predicate::HasAttr(attr) => nodes
            .into_iter()
            .filter(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|element| element.attr(attr).is_some())
            })
            .collect(),
        Predicate::AttrEquals(attr, value) => nodes
            .into_iter()
            .filter(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|element| element.attr(attr) == Some(value))
            })
            .collect(),
    }
}

fn text_content(node: &NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        if let Some(text) = descendant.value().as_text() {
            out.push_str(text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ul id="products">
            <li data-sku="a1"><span class="name">Alpha</span></li>
            <li data-sku="b2"><span class="name">Beta</span></li>
          </ul>
          <p class="note">fine print</p>
        </body></html>
    "#;

    #[test]
    fn parses_location_paths() {
        let expr = parse("//ul[@id='products']/li/@data-sku").expect("in subset");
        assert_eq!(expr.steps.len(), 2);
        assert_eq!(expr.terminal, Some(Terminal::Attr("data-sku".to_string())));
    }

    #[test]
    fn rejects_out_of_subset_expressions() {
        assert!(parse("//a[contains(@href, 'x')]").is_none());
    }

    #[test]
    fn absolute_child_steps() {
        assert_eq!(
            scalar(PAGE, "/html/body/p").as_deref().map(str::trim),
            Some("fine print")
        );
    }

    #[test]
    fn descendant_step_with_attribute_predicate() {
        assert_eq!(
            scalar(PAGE, "//li[@data-sku='b2']/span").as_deref(),
            Some("Beta")
        );
    }

    #[test]
    fn positional_predicate_is_one_based() {
        assert_eq!(scalar(PAGE, "//li[2]/span").as_deref(), Some("Beta"));
    }

    #[test]
    fn attribute_terminal() {
        assert_eq!(scalar(PAGE, "//li/@data-sku").as_deref(), Some("a1"));
    }

    #[test]
    fn node_set_items() {
        let scopes = items(PAGE, "//ul[@id='products']/li");
        assert_eq!(scopes.len(), 2);
        assert_eq!(scalar(&scopes[0], "//span/@absent"), None);
        assert_eq!(scalar(&scopes[1], "//span").as_deref(), Some("Beta"));
    }

    #[test]
    fn attribute_items() {
        assert_eq!(
            items(PAGE, "//li/@data-sku"),
            vec!["a1".to_string(), "b2".to_string()]
        );
    }

    #[test]
    fn relative_terminal_only_path() {
        let scope = scoped(PAGE, "//li[1]").expect("scope");
        assert_eq!(scalar(&scope, "@data-sku").as_deref(), Some("a1"));
    }

    #[test]
    fn text_terminal() {
        assert_eq!(scalar(PAGE, "//p/text()").as_deref(), Some("fine print"));
    }
}
