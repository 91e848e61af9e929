//! Fake fullscreen lifecycle: enter, viewport upkeep, exit and restoration

use rftakeover::fullscreen::{CONTAINER_ATTR, EXIT_BUTTON_ATTR, MSG_ENTERED, MSG_EXITED, STYLE_ATTR, SURFACE_FIELDS};
use rftakeover::platform::EmulatedFullscreen;
use rftakeover::{Document, FullscreenPhase, HeadlessPlatform, NodeId, PointerEvent, Takeover, TakeoverConfig};

const PAGE: &str = r#"<html style="overflow: scroll; height: 50%">
<head><style>.sticky-bar { position: sticky; top: 0 } #ad { z-index: 900 }</style></head>
<body style="overflow: auto">
<header id="site">Site</header>
<div class="sticky-bar" id="bar">Tabs</div>
<div id="ad" style="display: flex !important">Ad</div>
<div class="popup" id="popup" style="display: block">Sign in</div>
<main id="main">
  <div id="player"><p id="before">title</p><video style="position: relative; top: 1px; left: 2px; width: 320px; height: 180px; z-index: 3; transform: scale(1)" data-duration="100"></video><p id="after">caption</p></div>
</main>
</body></html>"#;

struct Fixture {
    t: Takeover,
    video: NodeId,
    control: NodeId,
    capture: NodeId,
}

fn fixture() -> Fixture {
    let mut t = Takeover::from_html(TakeoverConfig::default(), PAGE).expect("page parses");
    assert_eq!(t.scan(), 1);
    let video = t.surfaces()[0];
    let widgets = t.controller(video).unwrap().widgets();
    let (control, capture) = (widgets.control(), widgets.capture());
    Fixture { t, video, control, capture }
}

fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.find_by_attr("id", id)[0]
}

fn hidden_elements(doc: &Document) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|&id| doc.computed(id, "display") == "none")
        .collect()
}

fn exit_button(t: &Takeover, video: NodeId) -> NodeId {
    t.controller(video).unwrap().fullscreen().unwrap().exit_button()
}

#[test]
fn control_click_enters_and_exits() {
    let Fixture { mut t, video, control, .. } = fixture();
    assert_eq!(t.phase(video), FullscreenPhase::Inactive);

    t.click(control);
    assert_eq!(t.phase(video), FullscreenPhase::Active);
    let fb = t.feedback(video).unwrap();
    assert_eq!((fb.slot, fb.visible, fb.text.as_str()), ("fullscreen", true, MSG_ENTERED));

    t.advance_to(999);
    assert!(t.feedback(video).unwrap().visible);
    t.advance_to(1000);
    assert!(!t.feedback(video).unwrap().visible);

    t.click(control);
    assert_eq!(t.phase(video), FullscreenPhase::Inactive);
    let fb = t.feedback(video).unwrap();
    assert_eq!((fb.slot, fb.visible, fb.text.as_str()), ("primary", true, MSG_EXITED));
    t.advance_to(2000);
    assert!(!t.feedback(video).unwrap().visible);
}

#[test]
fn enter_builds_the_presentation() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    let doc = t.document();
    let container = doc.find_by_attr(CONTAINER_ATTR, "true");
    assert_eq!(container.len(), 1);
    assert_eq!(doc.parent(video), Some(container[0]));
    assert_eq!(doc.parent(container[0]), Some(doc.body()));
    assert_eq!(doc.computed(container[0], "position"), "fixed");
    assert_eq!(doc.computed(container[0], "z-index"), "2147483647");

    assert_eq!(doc.computed(video, "width"), "100vh");
    assert_eq!(doc.computed(video, "height"), "100vw");
    assert_eq!(doc.computed(video, "transform-origin"), "top left");

    let style = doc.find_by_attr(STYLE_ATTR, "true");
    assert_eq!(style.len(), 1);
    assert_eq!(doc.parent(style[0]), Some(doc.head()));

    let exit = doc.find_by_attr(EXIT_BUTTON_ATTR, "true");
    assert_eq!(exit, vec![exit_button(&t, video)]);
    assert_eq!(doc.parent(exit[0]), Some(doc.body()));

    let html = doc.style(doc.html()).unwrap();
    assert_eq!(html.get("overflow"), Some("hidden"));
    assert_eq!(html.get("height"), Some("100vh"));
    assert_eq!(html.get("--vh"), Some("8.44px"));
}

#[test]
fn chrome_is_hidden_while_active() {
    let Fixture { mut t, video, control, capture } = fixture();
    t.click(control);
    let doc = t.document();
    for id in ["site", "bar", "ad", "popup"] {
        assert_eq!(doc.computed(by_id(doc, id), "display"), "none", "{id} should be hidden");
    }
    // The overlay stacked beside the surface sits above the threshold too.
    assert_eq!(doc.computed(capture, "display"), "none");
    assert_ne!(doc.computed(control, "display"), "none");
    assert_ne!(doc.computed(video, "display"), "none");
    assert_ne!(doc.computed(by_id(doc, "main"), "display"), "none");
    let container = doc.find_by_attr(CONTAINER_ATTR, "true")[0];
    assert_ne!(doc.computed(container, "display"), "none");
    assert_ne!(doc.computed(exit_button(&t, video), "display"), "none");
}

#[test]
fn round_trip_restores_page_exactly() {
    let Fixture { mut t, video, control, .. } = fixture();
    let digest = t.document().style_digest();
    let hidden_before = hidden_elements(t.document());
    let fields: Vec<Option<String>> = SURFACE_FIELDS
        .iter()
        .map(|f| t.document().style(video).unwrap().get(f).map(str::to_string))
        .collect();

    t.click(control);
    t.advance_to(600);
    t.click(control);
    t.advance_to(2000);

    let doc = t.document();
    let after: Vec<Option<String>> = SURFACE_FIELDS
        .iter()
        .map(|f| doc.style(video).unwrap().get(f).map(str::to_string))
        .collect();
    assert_eq!(fields, after);
    assert_eq!(hidden_elements(doc), hidden_before);

    let html = doc.style(doc.html()).unwrap();
    assert_eq!(html.get("overflow"), Some("scroll"));
    assert_eq!(html.get("height"), Some("50%"));
    assert_eq!(html.get("--vh"), None);
    assert_eq!(doc.style(by_id(doc, "ad")).unwrap().css_text(), "display: flex !important;");

    let player = by_id(doc, "player");
    assert_eq!(doc.parent(video), Some(player));
    assert_eq!(doc.next_sibling(by_id(doc, "before")), Some(video));
    assert_eq!(doc.next_sibling(video), Some(by_id(doc, "after")));

    assert!(doc.find_by_attr(CONTAINER_ATTR, "true").is_empty());
    assert!(doc.find_by_attr(STYLE_ATTR, "true").is_empty());
    assert!(doc.find_by_attr(EXIT_BUTTON_ATTR, "true").is_empty());
    assert_eq!(doc.style_digest(), digest);
}

#[test]
fn exit_button_exits_on_click_and_on_pointer_up() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    let exit = exit_button(&t, video);
    t.click(exit);
    assert_eq!(t.phase(video), FullscreenPhase::Inactive);

    t.click(control);
    let exit = exit_button(&t, video);
    t.pointer(exit, PointerEvent::down(0.0));
    assert_eq!(t.phase(video), FullscreenPhase::Active);
    assert_eq!(
        t.document().style(exit).unwrap().get("background-color"),
        Some(rftakeover::overlay::CONTROL_HOVER_BG)
    );
    t.pointer(exit, PointerEvent::up(0.0));
    assert_eq!(t.phase(video), FullscreenPhase::Inactive);
    assert!(!t.document().is_connected(exit));
}

#[test]
fn gestures_inside_the_container_drive_the_surface() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    let container = t.controller(video).unwrap().fullscreen().unwrap().container();
    for (at, target) in [(1500, container), (1600, video)] {
        t.advance_to(at);
        t.pointer(target, PointerEvent::down(10.0));
        t.pointer(target, PointerEvent::up(10.0));
    }
    assert!(!t.document().media(video).unwrap().paused);
    let fb = t.feedback(video).unwrap();
    assert_eq!((fb.slot, fb.text.as_str()), ("fullscreen", "播放"));

    t.pointer(container, PointerEvent::down(100.0));
    t.pointer(container, PointerEvent::moved(190.0));
    t.pointer(container, PointerEvent::up(190.0));
    assert_eq!(t.document().media(video).unwrap().current_time, 6.0);
}

#[test]
fn native_fullscreen_is_requested_and_released() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    assert_eq!(
        t.controller(video).unwrap().fullscreen().unwrap().native_entry(),
        Some("requestFullscreen")
    );
    t.click(control);
    assert_eq!(t.platform().native_fullscreen().invocations(), ["requestFullscreen", "exitFullscreen"]);
}

#[test]
fn missing_or_rejecting_native_fullscreen_degrades_silently() {
    for backend in [EmulatedFullscreen::unsupported(), {
        let mut fs = EmulatedFullscreen::with_entries(rftakeover::platform::REQUEST_ENTRIES);
        fs.set_reject(true);
        fs
    }] {
        let platform = HeadlessPlatform::default().with_fullscreen(backend);
        let doc = Document::parse(PAGE).unwrap();
        let mut t = Takeover::with_platform(TakeoverConfig::default(), doc, platform).unwrap();
        t.scan();
        let video = t.surfaces()[0];
        let control = t.controller(video).unwrap().widgets().control();
        t.click(control);
        assert_eq!(t.phase(video), FullscreenPhase::Active);
        assert_eq!(t.controller(video).unwrap().fullscreen().unwrap().native_entry(), None);
        t.click(control);
        assert_eq!(t.phase(video), FullscreenPhase::Inactive);
    }
}

#[test]
fn viewport_correction_retries_and_tracks_rotation() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    t.document_mut().scroll_to(0.0, 300.0);
    t.advance_to(100);
    assert_eq!(t.document().scroll_position(), (0.0, 0.0));

    t.orientation_change();
    let doc = t.document();
    assert_eq!(doc.style(doc.html()).unwrap().get("--vh"), Some("3.9px"));
    let container = t.controller(video).unwrap().fullscreen().unwrap().container();
    let decl = doc.style(container).unwrap().declaration("min-height").unwrap();
    assert_eq!((decl.value.as_str(), decl.important), ("100vh", true));

    t.resize(390, 844);
    let doc = t.document();
    assert_eq!(doc.style(doc.html()).unwrap().get("--vh"), Some("8.44px"));
}

#[test]
fn exit_cancels_pending_corrections() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    assert_eq!(t.page().timers().len(), 4);
    t.advance_to(50);
    t.click(control);
    // Only the "退出全屏" auto-hide remains.
    assert_eq!(t.page().timers().len(), 1);
    assert!(!t.page().has_viewport_listener(video));

    t.orientation_change();
    t.advance_to(600);
    let doc = t.document();
    assert_eq!(doc.style(doc.html()).unwrap().get("--vh"), None);
    assert_eq!(doc.style(doc.html()).unwrap().get("overflow"), Some("scroll"));
}

#[test]
fn exit_after_parent_removal_falls_back_to_body() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    let player = by_id(t.document(), "player");
    t.document_mut().remove(player);
    let exit = exit_button(&t, video);
    t.click(exit);
    let doc = t.document();
    assert_eq!(t.phase(video), FullscreenPhase::Inactive);
    assert_eq!(doc.parent(video), Some(doc.body()));
    assert_eq!(doc.style(video).unwrap().get("width"), Some("320px"));
    assert!(doc.find_by_attr(CONTAINER_ATTR, "true").is_empty());
}

#[test]
fn detach_while_active_restores_and_cancels() {
    let Fixture { mut t, video, control, .. } = fixture();
    t.click(control);
    assert!(t.detach(video));
    let doc = t.document();
    assert_eq!(doc.parent(video), Some(by_id(doc, "player")));
    assert!(doc.find_by_attr(CONTAINER_ATTR, "true").is_empty());
    assert!(t.page().timers().is_empty());
    assert_eq!(t.phase(video), FullscreenPhase::Inactive);
    assert_eq!(t.platform().native_fullscreen().invocations(), ["requestFullscreen", "exitFullscreen"]);
}

#[test]
fn repeated_sessions_reuse_injected_nodes() {
    let Fixture { mut t, video, .. } = fixture();
    let cycle = |t: &mut Takeover| {
        assert_eq!(t.toggle_fullscreen(video).unwrap(), FullscreenPhase::Active);
        assert_eq!(t.toggle_fullscreen(video).unwrap(), FullscreenPhase::Inactive);
    };
    let before = t.document().style_digest();
    cycle(&mut t);
    let len = t.document().arena_len();
    for _ in 0..100 {
        cycle(&mut t);
    }
    assert_eq!(t.document().arena_len(), len);
    t.advance_to(2000);
    assert_eq!(t.document().style_digest(), before);
    assert!(t.document().find_by_attr(CONTAINER_ATTR, "true").is_empty());
}
