use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use rftakeover::visibility::{collect_facts, plan_occlusions};
use rftakeover::{
    Document, FeedbackView, FullscreenPhase, NodeId, PointerEvent, PointerKind, Takeover, TakeoverConfig,
};

#[derive(Parser)]
#[command(author, version, about = "Replay gestures and fake-fullscreen sessions against a page")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a timed event script and print a JSON report
    Replay(ReplayArgs),
    /// List the surfaces that would be taken over and the elements fake
    /// fullscreen would hide
    Inspect {
        page: PathBuf,
    },
}

#[derive(Args)]
struct ReplayArgs {
    /// HTML page to load
    page: PathBuf,
    /// Event script (JSON)
    #[arg(short, long)]
    events: PathBuf,
    /// Takeover configuration (JSON); missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

/// Widget of a surface an event is aimed at.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Target {
    Capture,
    Control,
    Exit,
    Container,
    Surface,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Action {
    Pointer {
        #[serde(default)]
        surface: usize,
        #[serde(default = "default_target")]
        target: Target,
        kind: PointerKind,
        x: f64,
        contacts: Option<u32>,
    },
    Click {
        #[serde(default)]
        surface: usize,
        target: Target,
    },
    Hover {
        #[serde(default)]
        surface: usize,
        hovered: bool,
    },
    Resize {
        width: u32,
        height: u32,
    },
    Orientation,
    Advance,
    Metadata {
        #[serde(default)]
        surface: usize,
        duration: f64,
    },
}

fn default_target() -> Target {
    Target::Capture
}

#[derive(Debug, Deserialize)]
struct ScriptEvent {
    /// Page time of the event; defaults to the current clock.
    at: Option<u64>,
    #[serde(flatten)]
    action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Script {
    Wrapped { events: Vec<ScriptEvent> },
    Bare(Vec<ScriptEvent>),
}

impl Script {
    fn into_events(self) -> Vec<ScriptEvent> {
        match self {
            Script::Wrapped { events } | Script::Bare(events) => events,
        }
    }
}

#[derive(Debug, Serialize)]
struct SurfaceReport {
    index: usize,
    node: NodeId,
    phase: FullscreenPhase,
    paused: bool,
    current_time: f64,
    duration: Option<f64>,
    feedback: Option<FeedbackView>,
}

#[derive(Debug, Serialize)]
struct Report {
    now_ms: u64,
    style_digest: String,
    native_fullscreen_calls: Vec<String>,
    surfaces: Vec<SurfaceReport>,
}

#[derive(Serialize)]
struct Occluder {
    node: NodeId,
    tag: String,
    position: String,
    z_index: String,
}

#[derive(Serialize)]
struct Inspection {
    surfaces: Vec<NodeId>,
    occluders: Vec<Occluder>,
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn resolve<P: rftakeover::PlatformApi>(takeover: &Takeover<P>, index: usize, target: Target) -> anyhow::Result<NodeId> {
    let surfaces = takeover.surfaces();
    let surface = *surfaces
        .get(index)
        .ok_or_else(|| anyhow!("no surface #{index} (page has {})", surfaces.len()))?;
    let controller = takeover
        .controller(surface)
        .ok_or_else(|| anyhow!("surface #{index} is not attached"))?;
    let node = match target {
        Target::Surface => Some(surface),
        Target::Capture => Some(controller.widgets().capture()),
        Target::Control => Some(controller.widgets().control()),
        Target::Exit => controller.fullscreen().map(|fs| fs.exit_button()),
        Target::Container => controller.fullscreen().map(|fs| fs.container()),
    };
    node.ok_or_else(|| anyhow!("surface #{index} is not in fake fullscreen, no {target:?} to target"))
}

fn replay(args: ReplayArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => serde_json::from_str::<TakeoverConfig>(&read(path)?)
            .with_context(|| format!("parsing {}", path.display()))?,
        None => TakeoverConfig::default(),
    };
    let script: Script = serde_json::from_str(&read(&args.events)?)
        .with_context(|| format!("parsing {}", args.events.display()))?;
    let report = build_report(config, &read(&args.page)?, script)?;
    let out = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", out);
    Ok(())
}

/// Load `html`, take it over, play `script` against it and summarise the result.
fn build_report(config: TakeoverConfig, html: &str, script: Script) -> anyhow::Result<Report> {
    let mut takeover = Takeover::from_html(config, html)?;
    let attached = takeover.scan();
    log::info!("{} surface(s) attached", attached);

    for event in script.into_events() {
        if let Some(at) = event.at {
            takeover.advance_to(at);
        }
        match event.action {
            Action::Pointer { surface, target, kind, x, contacts } => {
                let node = resolve(&takeover, surface, target)?;
                let mut ev = match kind {
                    PointerKind::Down => PointerEvent::down(x),
                    PointerKind::Move => PointerEvent::moved(x),
                    PointerKind::Up => PointerEvent::up(x),
                };
                if let Some(contacts) = contacts {
                    ev = ev.with_contacts(contacts);
                }
                takeover.pointer(node, ev);
            }
            Action::Click { surface, target } => {
                let node = resolve(&takeover, surface, target)?;
                takeover.click(node);
            }
            Action::Hover { surface, hovered } => {
                let node = resolve(&takeover, surface, Target::Control)?;
                takeover.hover(node, hovered);
            }
            Action::Resize { width, height } => takeover.resize(width, height),
            Action::Orientation => takeover.orientation_change(),
            Action::Advance => {}
            Action::Metadata { surface, duration } => {
                let node = resolve(&takeover, surface, Target::Surface)?;
                takeover.load_metadata(node, duration)?;
            }
        }
    }

    let surfaces = takeover
        .surfaces()
        .into_iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let media = takeover.document().media(node)?;
            Some(SurfaceReport {
                index,
                node,
                phase: takeover.phase(node),
                paused: media.paused,
                current_time: media.current_time,
                duration: media.has_metadata().then_some(media.duration),
                feedback: takeover.feedback(node),
            })
        })
        .collect();
    Ok(Report {
        now_ms: takeover.now_ms(),
        style_digest: takeover.document().style_digest(),
        native_fullscreen_calls: takeover.platform().native_fullscreen().invocations().to_vec(),
        surfaces,
    })
}

fn inspect(page: &Path) -> anyhow::Result<()> {
    let inspection = inspect_page(&read(page)?)?;
    println!("{}", serde_json::to_string_pretty(&inspection)?);
    Ok(())
}

fn inspect_page(html: &str) -> anyhow::Result<Inspection> {
    let doc = Document::parse(html)?;
    let surfaces: Vec<NodeId> = doc
        .elements_by_tag("video")
        .into_iter()
        .filter(|&v| doc.parent(v).is_some())
        .collect();
    let config = TakeoverConfig::default();
    let facts = collect_facts(&doc);
    let plan = plan_occlusions(&doc, &facts, &surfaces, config.occlusion_z_index_threshold);
    let occluders = facts
        .into_iter()
        .filter(|f| plan.contains(&f.id))
        .map(|f| Occluder {
            node: f.id,
            tag: f.tag,
            position: f.position,
            z_index: f.z_index,
        })
        .collect();
    Ok(Inspection { surfaces, occluders })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay(args) => replay(args),
        Commands::Inspect { page } => inspect(&page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const PAGE: &str = r#"<html><body><header>Site</header><div><video data-duration="100"></video></div></body></html>"#;

    fn run(script: &str) -> Value {
        let script: Script = serde_json::from_str(script).unwrap();
        let report = build_report(TakeoverConfig::default(), PAGE, script).unwrap();
        serde_json::to_value(&report).unwrap()
    }

    #[test]
    fn replay_reports_playback_and_fullscreen() {
        let report = run(
            r#"{"events": [
                {"at": 0, "type": "pointer", "kind": "down", "x": 10},
                {"type": "pointer", "kind": "up", "x": 10},
                {"at": 100, "type": "pointer", "kind": "down", "x": 10},
                {"type": "pointer", "kind": "up", "x": 10},
                {"at": 200, "type": "click", "target": "control"},
                {"type": "metadata", "duration": 42.5}
            ]}"#,
        );
        assert_eq!(report["now_ms"], json!(200));
        assert_eq!(report["native_fullscreen_calls"], json!(["requestFullscreen"]));
        let surface = &report["surfaces"][0];
        assert_eq!(surface["phase"], json!("active"));
        assert_eq!(surface["paused"], json!(false));
        assert_eq!(surface["duration"], json!(42.5));
        assert_eq!(surface["feedback"]["slot"], json!("fullscreen"));
        assert_eq!(surface["feedback"]["text"], json!("横屏全屏"));
        assert_eq!(surface["feedback"]["visible"], json!(true));
        assert!(report["style_digest"].as_str().is_some_and(|d| !d.is_empty()));
    }

    #[test]
    fn replay_accepts_bare_event_lists() {
        let report = run(r#"[{"at": 0, "type": "click", "target": "control"}, {"at": 50, "type": "click", "target": "exit"}]"#);
        assert_eq!(report["surfaces"][0]["phase"], json!("inactive"));
        assert_eq!(report["surfaces"][0]["feedback"]["text"], json!("退出全屏"));
    }

    #[test]
    fn targeting_exit_outside_fullscreen_fails() {
        let script: Script = serde_json::from_str(r#"[{"type": "click", "target": "exit"}]"#).unwrap();
        let err = build_report(TakeoverConfig::default(), PAGE, script).unwrap_err();
        assert!(err.to_string().contains("not in fake fullscreen"));
    }

    #[test]
    fn inspect_lists_surfaces_and_chrome() {
        let inspection = serde_json::to_value(inspect_page(PAGE).unwrap()).unwrap();
        assert_eq!(inspection["surfaces"].as_array().map(Vec::len), Some(1));
        let occluders = inspection["occluders"].as_array().unwrap();
        assert_eq!(occluders.len(), 1);
        assert_eq!(occluders[0]["tag"], json!("header"));
    }
}
