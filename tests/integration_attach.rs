//! Attachment, discovery and detachment

use rftakeover::controller::TAKEOVER_ATTR;
use rftakeover::overlay::{CONTROL_HOVER_BG, CONTROL_IDLE_BG, ROLE_ATTR};
use rftakeover::{Document, NodeId, Takeover, TakeoverConfig};

fn role_count(doc: &Document, role: &str) -> usize {
    doc.find_by_attr(ROLE_ATTR, role).len()
}

fn single(html: &str) -> (Takeover, NodeId) {
    let mut t = Takeover::from_html(TakeoverConfig::default(), html).expect("page parses");
    t.scan();
    let video = t.document().elements_by_tag("video")[0];
    (t, video)
}

#[test]
fn attaching_twice_installs_one_overlay() {
    let (mut t, video) = single("<html><body><div><video></video></div></body></html>");
    assert!(t.is_attached(video));
    assert!(!t.attach(video));
    assert_eq!(t.scan(), 0);
    let doc = t.document();
    assert_eq!(role_count(doc, "capture"), 1);
    assert_eq!(role_count(doc, "feedback"), 1);
    assert_eq!(role_count(doc, "control"), 1);
    assert_eq!(doc.attr(video, TAKEOVER_ATTR), Some("true"));
}

#[test]
fn overlay_is_stacked_beside_the_surface() {
    let (t, video) = single("<html><body><div id=p><video></video></div></body></html>");
    let doc = t.document();
    let parent = doc.parent(video).unwrap();
    let widgets = t.controller(video).unwrap().widgets();
    for id in [widgets.capture(), widgets.label().node(), widgets.control()] {
        assert_eq!(doc.parent(id), Some(parent));
        assert_eq!(doc.computed(id, "position"), "absolute");
    }
    assert_eq!(doc.computed(parent, "position"), "relative");
    assert!(!widgets.label().is_visible(doc));
}

#[test]
fn positioned_parent_is_left_alone() {
    let (t, video) = single(r#"<html><head><style>#p { position: absolute }</style></head><body><div id=p><video></video></div></body></html>"#);
    let doc = t.document();
    let parent = doc.parent(video).unwrap();
    assert_eq!(doc.style(parent).unwrap().get("position"), None);
    assert_eq!(doc.computed(parent, "position"), "absolute");
}

#[test]
fn parentless_surface_is_left_unmodified() {
    let mut t = Takeover::from_html(TakeoverConfig::default(), "<html><body></body></html>").unwrap();
    let video = t.document_mut().create_element("video");
    assert!(!t.attach(video));
    assert!(!t.is_attached(video));
    assert_eq!(t.document().attr(video, TAKEOVER_ATTR), None);
    assert_eq!(role_count(t.document(), "capture"), 0);
}

#[test]
fn non_media_targets_are_not_attached() {
    let (mut t, _) = single("<html><body><div id=x><video></video></div></body></html>");
    let div = t.document().find_by_attr("id", "x")[0];
    assert!(!t.attach(div));
}

#[test]
fn dynamically_added_surfaces_are_attached() {
    let mut t = Takeover::from_html(TakeoverConfig::default(), "<html><body><div id=feed></div></body></html>").unwrap();
    assert_eq!(t.scan(), 0);

    let doc = t.document_mut();
    let card = doc.create_element("div");
    let first = doc.create_element("video");
    let second = doc.create_element("video");
    let inner = doc.create_element("section");
    doc.append_child(card, first).unwrap();
    doc.append_child(inner, second).unwrap();
    doc.append_child(card, inner).unwrap();
    let feed = doc.find_by_attr("id", "feed")[0];
    doc.append_child(feed, card).unwrap();

    assert_eq!(t.nodes_added(&[card]), 2);
    assert!(t.is_attached(first));
    assert!(t.is_attached(second));
    assert_eq!(t.nodes_added(&[card, first]), 0);
    assert_eq!(role_count(t.document(), "control"), 2);
}

#[test]
fn marked_surfaces_are_skipped() {
    let (t, video) = single(r#"<html><body><div><video data-takeover="true"></video></div></body></html>"#);
    assert!(!t.is_attached(video));
    assert_eq!(role_count(t.document(), "capture"), 0);
}

#[test]
fn detach_removes_overlay_and_allows_reattach() {
    let (mut t, video) = single("<html><body><div><video></video></div></body></html>");
    let capture = t.controller(video).unwrap().widgets().capture();
    t.pointer(capture, rftakeover::PointerEvent::down(0.0));
    t.pointer(capture, rftakeover::PointerEvent::up(0.0));
    t.advance_to(100);
    t.pointer(capture, rftakeover::PointerEvent::down(0.0));
    t.pointer(capture, rftakeover::PointerEvent::up(0.0));
    assert_eq!(t.page().timers().len(), 1);

    assert!(t.detach(video));
    assert!(!t.detach(video));
    assert!(t.page().timers().is_empty());
    assert_eq!(role_count(t.document(), "capture"), 0);
    assert_eq!(t.document().attr(video, TAKEOVER_ATTR), None);

    assert!(t.attach(video));
    assert_eq!(role_count(t.document(), "capture"), 1);
}

#[test]
fn control_hover_darkens_and_restores() {
    let (mut t, video) = single("<html><body><div><video></video></div></body></html>");
    let control = t.controller(video).unwrap().widgets().control();
    t.hover(control, true);
    assert_eq!(t.document().computed(control, "background-color"), CONTROL_HOVER_BG);
    t.hover(control, false);
    assert_eq!(t.document().computed(control, "background-color"), CONTROL_IDLE_BG);
}

#[test]
fn each_surface_has_its_own_state() {
    let mut t = Takeover::from_html(
        TakeoverConfig::default(),
        "<html><body><div><video></video></div><div><video></video></div></body></html>",
    )
    .unwrap();
    assert_eq!(t.scan(), 2);
    let (a, b) = (t.surfaces()[0], t.surfaces()[1]);
    let control = t.controller(a).unwrap().widgets().control();
    t.click(control);
    assert_eq!(t.phase(a), rftakeover::FullscreenPhase::Active);
    assert_eq!(t.phase(b), rftakeover::FullscreenPhase::Inactive);
}
