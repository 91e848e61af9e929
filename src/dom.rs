//! Arena-backed page model.
//!
//! The takeover core mutates a host page: it reparents the surface, injects
//! overlay elements and rewrites inline styles. `Document` is the headless
//! rendition of that page. It is built from HTML with `scraper` and keeps just
//! what the core reads and writes: the element tree, attributes, inline style
//! blocks, text, inner markup, media state and the scroll position.
//!
//! Removing an element only detaches it, so a `NodeId` held by a session
//! stays valid after the page drops the node. Nodes the takeover injected are
//! handed back with [`Document::release`] once their session ends; their slots
//! are reused by later [`Document::create_element`] calls.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::platform::MediaState;
use crate::style::{InlineStyle, Stylesheet};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// One element of the page.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    style: InlineStyle,
    text: String,
    markup: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    media: Option<MediaState>,
    released: bool,
}

impl Element {
    fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            style: InlineStyle::new(),
            text: String::new(),
            markup: String::new(),
            parent: None,
            children: Vec::new(),
            media: None,
            released: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.classes().any(|c| c == token)
    }

    pub fn style(&self) -> &InlineStyle {
        &self.style
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

fn default_display(tag: &str) -> &'static str {
    match tag {
        "head" | "style" | "script" | "meta" | "title" | "link" => "none",
        "span" | "a" | "b" | "i" | "em" | "strong" | "video" | "img" | "svg" => "inline",
        _ => "block",
    }
}

pub struct Document {
    nodes: Vec<Element>,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    scroll: (f64, f64),
    free: Vec<NodeId>,
}

impl Document {
    /// An empty `<html><head></head><body></body></html>` skeleton.
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: vec![Element::new("html")],
            html: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            scroll: (0.0, 0.0),
            free: Vec::new(),
        };
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc.link(doc.html, doc.head, None);
        doc.link(doc.html, doc.body, None);
        doc
    }

    /// Build the page model from HTML source.
    ///
    /// `<video>` elements get a paused media state. Fixtures may preload
    /// metadata with `data-duration` and a position with `data-current-time`;
    /// `autoplay` starts them playing.
    pub fn parse(source: &str) -> Result<Self> {
        let html = Html::parse_document(source);
        let mut doc = Document {
            nodes: Vec::new(),
            html: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            scroll: (0.0, 0.0),
            free: Vec::new(),
        };
        doc.html = doc.import(html.root_element(), None);

        let find = |doc: &Document, tag: &str| {
            doc.children(doc.html)
                .iter()
                .copied()
                .find(|&c| doc.nodes[c.0].tag == tag)
        };
        doc.head = find(&doc, "head").ok_or_else(|| Error::ParseError("document has no <head>".into()))?;
        doc.body = find(&doc, "body").ok_or_else(|| Error::ParseError("document has no <body>".into()))?;
        Ok(doc)
    }

    fn import(&mut self, el: ElementRef, parent: Option<NodeId>) -> NodeId {
        let mut node = Element::new(el.value().name());
        for (name, value) in el.value().attrs() {
            if name == "style" {
                node.style = InlineStyle::parse(value);
            } else {
                node.attrs.insert(name.to_ascii_lowercase(), value.to_string());
            }
        }
        if node.tag == "video" {
            let mut media = MediaState::new();
            media.paused = !node.attrs.contains_key("autoplay");
            if let Some(d) = node.attrs.get("data-duration").and_then(|v| v.parse().ok()) {
                media.duration = d;
            }
            if let Some(t) = node.attrs.get("data-current-time").and_then(|v| v.parse().ok()) {
                media.current_time = t;
            }
            node.media = Some(media);
        }
        node.parent = parent;
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);

        for child in el.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                let child_id = self.import(child_el, Some(id));
                self.nodes[id.0].children.push(child_id);
            } else if let Some(text) = child.value().as_text() {
                self.nodes[id.0].text.push_str(&**text);
            }
        }
        id
    }

    pub fn html(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0).filter(|e| !e.released)
    }

    pub fn element(&self, id: NodeId) -> Result<&Element> {
        self.get(id).ok_or(Error::NodeNotFound(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.nodes
            .get_mut(id.0)
            .filter(|e| !e.released)
            .ok_or(Error::NodeNotFound(id))
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let mut el = Element::new(tag);
        if el.tag == "video" {
            el.media = Some(MediaState::new());
        }
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = el;
            return id;
        }
        self.nodes.push(el);
        NodeId(self.nodes.len() - 1)
    }

    /// Detach `id` and recycle it together with its subtree. Handles to
    /// released nodes resolve to nothing until the slot is reused. The
    /// document skeleton is never released.
    pub fn release(&mut self, id: NodeId) {
        if self.get(id).is_none() || [self.html, self.head, self.body].contains(&id) {
            return;
        }
        self.unlink(id);
        let mut subtree = self.descendants(id);
        subtree.push(id);
        for n in subtree {
            let mut slot = Element::new("");
            slot.released = true;
            self.nodes[n.0] = slot;
            self.free.push(n);
        }
    }

    /// Number of slots in the arena, live or recycled.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|&c| c == id)?;
        siblings.get(idx + 1).copied()
    }

    /// Inclusive containment, like `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.html, id)
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.nodes[id.0].parent = None;
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        let siblings = &mut self.nodes[parent.0].children;
        let idx = before
            .and_then(|b| siblings.iter().position(|&c| c == b))
            .unwrap_or(siblings.len());
        siblings.insert(idx, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Move `child` under `parent`, before `reference` (or last when the
    /// reference is `None` or no longer a child of `parent`).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        self.element(parent)?;
        self.element(child)?;
        if self.contains(child, parent) {
            return Err(Error::Other(format!(
                "inserting {child:?} under {parent:?} would create a cycle"
            )));
        }
        self.unlink(child);
        self.link(parent, child, reference);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Detach `id` (and its subtree) from the page.
    pub fn remove(&mut self, id: NodeId) {
        if self.get(id).is_some() {
            self.unlink(id);
        }
    }

    /// Connected elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.html];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&id| self.nodes[id.0].tag == tag)
            .collect()
    }

    /// Descendants of `id` (exclusive) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            for &child in self.children(n).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Connected elements whose attribute `name` equals `value`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&id| self.nodes[id.0].attr(name) == Some(value))
            .collect()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|e| e.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(id)?.attrs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.nodes.get_mut(id.0) {
            el.attrs.remove(name);
        }
    }

    pub fn style(&self, id: NodeId) -> Option<&InlineStyle> {
        self.get(id).map(|e| &e.style)
    }

    pub fn style_mut(&mut self, id: NodeId) -> Result<&mut InlineStyle> {
        Ok(&mut self.element_mut(id)?.style)
    }

    pub fn set_style(&mut self, id: NodeId, style: InlineStyle) -> Result<()> {
        self.element_mut(id)?.style = style;
        Ok(())
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.get(id).map(|e| e.text.as_str()).unwrap_or("")
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        self.element_mut(id)?.text = text.to_string();
        Ok(())
    }

    pub fn inner_markup(&self, id: NodeId) -> &str {
        self.get(id).map(|e| e.markup.as_str()).unwrap_or("")
    }

    pub fn set_inner_markup(&mut self, id: NodeId, markup: &str) -> Result<()> {
        self.element_mut(id)?.markup = markup.to_string();
        Ok(())
    }

    pub fn media(&self, id: NodeId) -> Option<&MediaState> {
        self.get(id).and_then(|e| e.media.as_ref())
    }

    pub fn media_mut(&mut self, id: NodeId) -> Result<&mut MediaState> {
        self.element_mut(id)?
            .media
            .as_mut()
            .ok_or(Error::NotMedia(id))
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll = (x, y);
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        self.scroll
    }

    /// Rules from every connected `<style>` element, in document order.
    pub fn stylesheet(&self) -> Stylesheet {
        let mut sheet = Stylesheet::default();
        for id in self.elements_by_tag("style") {
            sheet.add_source(&self.nodes[id.0].text);
        }
        sheet
    }

    /// Resolved value of `property`, building the stylesheet on the fly.
    pub fn computed(&self, id: NodeId, property: &str) -> String {
        self.computed_with(&self.stylesheet(), id, property)
    }

    /// Resolved value of `property` against a prebuilt stylesheet: important
    /// inline, important sheet, inline, sheet, then the initial value.
    pub fn computed_with(&self, sheet: &Stylesheet, id: NodeId, property: &str) -> String {
        let Some(el) = self.get(id) else {
            return String::new();
        };
        let inline = el.style.declaration(property);
        let from_sheet = sheet.lookup(el, property);
        let winner = match (inline, from_sheet) {
            (Some(i), Some(s)) if s.important && !i.important => Some(s),
            (Some(i), _) => Some(i),
            (None, s) => s,
        };
        if let Some(decl) = winner {
            return decl.value.clone();
        }
        match property {
            "position" => "static".to_string(),
            "z-index" => "auto".to_string(),
            "display" => default_display(&el.tag).to_string(),
            "overflow" => "visible".to_string(),
            _ => String::new(),
        }
    }

    /// SHA-256 over the connected tree: structure, attributes, inline styles
    /// and markup. Equal digests mean the page is observably unchanged.
    pub fn style_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for id in self.elements() {
            let el = &self.nodes[id.0];
            hasher.update(format!("{}|{:?}|{}|", id.0, el.parent.map(|p| p.0), el.tag));
            for (k, v) in &el.attrs {
                hasher.update(format!("{k}={v};"));
            }
            hasher.update(el.style.css_text());
            hasher.update("|");
            hasher.update(&el.markup);
            hasher.update("\n");
        }
        hex::encode(hasher.finalize())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
