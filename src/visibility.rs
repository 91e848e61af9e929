//! Occlusion suppression while a surface is in fake fullscreen.
//!
//! Deciding what to hide is a pure function over a snapshot of the page
//! ([`collect_facts`] + [`is_occluder`] + [`plan_occlusions`]); hiding and
//! restoring are done by [`VisibilityGuard`], which records the prior inline
//! `display` of every element it touches.

use log::debug;

use crate::dom::{Document, NodeId};
use crate::style::Declaration;

/// Class tokens that usually mark page chrome.
pub const CHROME_CLASS_TOKENS: &[&str] = &["header", "navbar", "nav", "modal", "popup", "overlay"];

/// What the heuristic looks at for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFacts {
    pub id: NodeId,
    pub tag: String,
    pub role: Option<String>,
    pub classes: Vec<String>,
    pub position: String,
    pub z_index: String,
}

/// Parse a leading integer the way `parseInt` does; `auto` and friends give
/// `None`.
fn parse_z_index(value: &str) -> Option<i64> {
    let v = value.trim();
    let end = v
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(v.len());
    v[..end].parse().ok()
}

/// Whether an element looks like something that would cover a fullscreen
/// presentation.
pub fn is_occluder(facts: &ElementFacts, z_threshold: i64) -> bool {
    if parse_z_index(&facts.z_index).is_some_and(|z| z > z_threshold) {
        return true;
    }
    if facts.position == "fixed" || facts.position == "sticky" {
        return true;
    }
    if facts.tag == "header" || facts.tag == "nav" {
        return true;
    }
    if matches!(facts.role.as_deref(), Some("banner") | Some("navigation")) {
        return true;
    }
    facts
        .classes
        .iter()
        .any(|c| CHROME_CLASS_TOKENS.contains(&c.as_str()))
}

/// Snapshot every connected element's relevant facts, in document order.
pub fn collect_facts(doc: &Document) -> Vec<ElementFacts> {
    let sheet = doc.stylesheet();
    doc.elements()
        .into_iter()
        .filter_map(|id| {
            let el = doc.get(id)?;
            Some(ElementFacts {
                id,
                tag: el.tag().to_string(),
                role: el.attr("role").map(str::to_string),
                classes: el.classes().map(str::to_string).collect(),
                position: doc.computed_with(&sheet, id, "position"),
                z_index: doc.computed_with(&sheet, id, "z-index"),
            })
        })
        .collect()
}

/// Elements to hide: occluders that are not excluded and neither contain
/// nor sit inside an excluded element.
pub fn plan_occlusions(doc: &Document, facts: &[ElementFacts], exclude: &[NodeId], z_threshold: i64) -> Vec<NodeId> {
    facts
        .iter()
        .filter(|f| {
            !exclude
                .iter()
                .any(|&x| doc.contains(f.id, x) || doc.contains(x, f.id))
        })
        .filter(|f| is_occluder(f, z_threshold))
        .map(|f| f.id)
        .collect()
}

/// Elements hidden by one suppression pass, with the inline `display`
/// each had before.
#[derive(Debug, Default)]
pub struct HiddenElementSet {
    entries: Vec<(NodeId, Option<Declaration>)>,
}

impl HiddenElementSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.iter().any(|(e, _)| *e == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VisibilityGuard {
    z_threshold: i64,
}

impl VisibilityGuard {
    pub fn new(z_threshold: i64) -> Self {
        VisibilityGuard { z_threshold }
    }

    /// Hide every planned occluder and return exactly what was hidden.
    pub fn suppress_occlusions(&self, doc: &mut Document, exclude: &[NodeId]) -> HiddenElementSet {
        let facts = collect_facts(doc);
        let plan = plan_occlusions(doc, &facts, exclude, self.z_threshold);
        let mut hidden = HiddenElementSet::default();
        for id in plan {
            let Ok(style) = doc.style_mut(id) else {
                continue;
            };
            let prior = style.declaration("display").cloned();
            style.set_declaration(Declaration {
                name: "display".into(),
                value: "none".into(),
                important: prior.as_ref().is_some_and(|d| d.important),
            });
            hidden.entries.push((id, prior));
        }
        debug!("occlusion pass hid {} element(s)", hidden.len());
        hidden
    }

    /// Put back the prior `display` of every element in `hidden`. Consumes
    /// the set so it can only be restored once.
    pub fn restore(&self, doc: &mut Document, hidden: HiddenElementSet) {
        let count = hidden.len();
        for (id, prior) in hidden.entries {
            if let Ok(style) = doc.style_mut(id) {
                style.restore_declaration("display", prior);
            }
        }
        debug!("occlusion pass restored {} element(s)", count);
    }
}
