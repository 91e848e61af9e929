use rftakeover::platform::{DeviceMetrics, HeadlessPlatform, PlatformApi};
use rftakeover::{Takeover, TakeoverConfig, Viewport};

#[test]
fn headless_platform_smoke() {
    let mut p = HeadlessPlatform::new(Viewport { width: 1280, height: 800 });

    // device
    assert_eq!(p.device().metrics().width, 1280);
    p.device_mut().set_metrics(DeviceMetrics {
        width: 360,
        height: 640,
        dpr: 3.0,
        touch: true,
    });
    assert_eq!(p.device().metrics().width, 360);
    p.device_mut().rotate();
    assert_eq!(p.device().metrics().width, 640);

    // native fullscreen
    assert!(p.fullscreen().supports("requestFullscreen"));
    p.fullscreen().invoke("requestFullscreen").unwrap();
    assert!(p.fullscreen().is_active());
}

#[test]
fn takeover_uses_configured_viewport() {
    let config = TakeoverConfig {
        viewport: Viewport { width: 800, height: 600 },
        ..Default::default()
    };
    let t = Takeover::from_html(config, "<html><body></body></html>").unwrap();
    assert_eq!(t.platform().device().metrics().height, 600);
    assert_eq!(t.config().viewport.width, 800);
}
