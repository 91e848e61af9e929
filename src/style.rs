//! Inline declaration blocks and a tiny stylesheet matcher.
//!
//! This is only as much CSS as the takeover logic needs to reason about:
//! enough to snapshot and restore inline styles exactly, and to answer
//! "what is this element's `position` / `z-index` / `display`" for the
//! occlusion heuristic.

use crate::dom::Element;

/// A single `name: value [!important]` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// An ordered inline declaration block (the `style` attribute).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<Declaration>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `cssText` string. Malformed fragments are skipped.
    pub fn parse(css_text: &str) -> Self {
        let mut style = InlineStyle::new();
        for part in css_text.split(';') {
            let Some((name, value)) = part.split_once(':') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let mut value = value.trim();
            let mut important = false;
            if let Some(stripped) = value.strip_suffix("!important") {
                value = stripped.trim_end();
                important = true;
            }
            if name.is_empty() || value.is_empty() {
                continue;
            }
            style.set_declaration(Declaration {
                name,
                value: value.to_string(),
                important,
            });
        }
        style
    }

    /// Serialise back to `cssText` form.
    pub fn css_text(&self) -> String {
        self.decls
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.name, d.value)
                } else {
                    format!("{}: {};", d.name, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declaration(name).map(|d| d.value.as_str())
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.decls.iter().find(|d| d.name == name)
    }

    /// Set a normal-priority value. An empty value removes the property,
    /// matching `element.style.prop = ''`.
    pub fn set(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            self.remove(name);
            return;
        }
        self.set_declaration(Declaration {
            name: name.to_string(),
            value: value.to_string(),
            important: false,
        });
    }

    pub fn set_important(&mut self, name: &str, value: &str) {
        self.set_declaration(Declaration {
            name: name.to_string(),
            value: value.to_string(),
            important: true,
        });
    }

    /// Replace a declaration in place, or append it if absent.
    pub fn set_declaration(&mut self, decl: Declaration) {
        match self.decls.iter_mut().find(|d| d.name == decl.name) {
            Some(existing) => *existing = decl,
            None => self.decls.push(decl),
        }
    }

    /// Put back a declaration captured earlier with [`InlineStyle::declaration`].
    /// `None` means the property was absent and is removed again.
    pub fn restore_declaration(&mut self, name: &str, prior: Option<Declaration>) {
        match prior {
            Some(decl) => self.set_declaration(decl),
            None => {
                self.remove(name);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Declaration> {
        let idx = self.decls.iter().position(|d| d.name == name)?;
        Some(self.decls.remove(idx))
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter()
    }
}

/// A compound selector: `tag#id.class[attr="v"]`. No combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

impl Selector {
    /// Parse one compound selector. Returns `None` for anything this matcher
    /// does not understand (combinators, pseudo-classes, ...).
    pub fn parse(src: &str) -> Option<Self> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }
        let chars: Vec<char> = src.chars().collect();
        let mut sel = Selector {
            tag: None,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        };
        let mut i = 0;
        if chars[0] == '*' {
            i = 1;
        } else if is_ident_char(chars[0]) {
            let (tag, next) = take_ident(&chars, 0);
            sel.tag = Some(tag.to_ascii_lowercase());
            i = next;
        }
        while i < chars.len() {
            match chars[i] {
                '#' => {
                    let (id, next) = take_ident(&chars, i + 1);
                    if id.is_empty() {
                        return None;
                    }
                    sel.id = Some(id);
                    i = next;
                }
                '.' => {
                    let (class, next) = take_ident(&chars, i + 1);
                    if class.is_empty() {
                        return None;
                    }
                    sel.classes.push(class);
                    i = next;
                }
                '[' => {
                    let close = chars[i..].iter().position(|&c| c == ']')? + i;
                    let inner: String = chars[i + 1..close].iter().collect();
                    let attr = match inner.split_once('=') {
                        Some((name, value)) => (
                            name.trim().to_ascii_lowercase(),
                            Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()),
                        ),
                        None => (inner.trim().to_ascii_lowercase(), None),
                    };
                    if attr.0.is_empty() {
                        return None;
                    }
                    sel.attrs.push(attr);
                    i = close + 1;
                }
                _ => return None,
            }
        }
        Some(sel)
    }

    pub fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if el.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match (el.attr(name), value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    /// (ids, classes + attributes, tags)
    pub fn specificity(&self) -> (u32, u32, u32) {
        (
            self.id.is_some() as u32,
            (self.classes.len() + self.attrs.len()) as u32,
            self.tag.is_some() as u32,
        )
    }
}

#[derive(Debug, Clone)]
struct Rule {
    selectors: Vec<Selector>,
    declarations: InlineStyle,
}

/// Rules collected from the document's `<style>` blocks.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => rest = "",
        }
    }
    out.push_str(rest);
    out
}

impl Stylesheet {
    pub fn parse(css: &str) -> Self {
        let mut sheet = Stylesheet::default();
        sheet.add_source(css);
        sheet
    }

    /// Append the rules of another `<style>` block. At-rules are skipped
    /// wholesale, including everything nested inside them.
    pub fn add_source(&mut self, css: &str) {
        let css = strip_comments(css);
        let bytes = css.as_bytes();
        let mut pos = 0;
        while pos < css.len() {
            let Some(open_rel) = css[pos..].find('{') else {
                break;
            };
            let open = pos + open_rel;
            let prelude = css[pos..open].trim();

            let mut depth = 0usize;
            let mut close = None;
            for (i, b) in bytes[open..].iter().enumerate() {
                match b {
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(open + i);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let Some(close) = close else {
                break;
            };

            if !prelude.starts_with('@') {
                let selectors: Vec<Selector> =
                    prelude.split(',').filter_map(Selector::parse).collect();
                if !selectors.is_empty() {
                    self.rules.push(Rule {
                        selectors,
                        declarations: InlineStyle::parse(&css[open + 1..close]),
                    });
                }
            }
            pos = close + 1;
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Winning stylesheet declaration for `property` on `el`: important
    /// first, then specificity, then source order.
    pub fn lookup(&self, el: &Element, property: &str) -> Option<&Declaration> {
        let mut best: Option<((bool, (u32, u32, u32), usize), &Declaration)> = None;
        for (order, rule) in self.rules.iter().enumerate() {
            let Some(decl) = rule.declarations.declaration(property) else {
                continue;
            };
            let Some(spec) = rule
                .selectors
                .iter()
                .filter(|s| s.matches(el))
                .map(Selector::specificity)
                .max()
            else {
                continue;
            };
            let key = (decl.important, spec, order);
            if best.as_ref().map_or(true, |(k, _)| key > *k) {
                best = Some((key, decl));
            }
        }
        best.map(|(_, d)| d)
    }
}
