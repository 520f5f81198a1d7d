use macro_optimizer as mo;
use mo::{derive_defines, RequestHeaders, Scalar};
use pretty_assertions::assert_eq;

const TEMPLATE: &str = include_str!("fixtures/app-template.js");

fn headers(pairs: &[(&str, &str)]) -> RequestHeaders {
    pairs.iter().copied().collect()
}

#[test]
fn test_mobile_logged_in_request() {
    let h = headers(&[
        (
            "User-Agent",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 13_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.1.1 Mobile/15E148 Safari/604.1",
        ),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Cookie", "session_token=active; ab_group=B"),
        ("X-Screen-Width", "375"),
        ("X-FF-New-Profile", "true"),
    ]);
    let d = derive_defines(&h);
    let flat: Vec<(&str, String)> = d.iter().map(|(k, v)| (k, v.to_string())).collect();
    assert_eq!(
        flat,
        vec![
            ("device.isMobile", "true".to_string()),
            ("device.screenWidth", "375".to_string()),
            ("user.language", "en-US".to_string()),
            ("user.isLoggedIn", "true".to_string()),
            ("experiment.group", "B".to_string()),
            ("featureFlags.newUserProfile", "true".to_string()),
        ]
    );
    let out = mo::process(TEMPLATE, &d).unwrap();
    assert_eq!(out, include_str!("fixtures/app-mobile-logged-in.js"));
}

#[test]
fn test_desktop_guest_request() {
    let h = headers(&[
        (
            "user-agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36",
        ),
        ("accept-language", "fr-FR,fr;q=0.9"),
        ("cookie", "ab_group=A"),
        ("x-screen-width", "1920"),
        ("x-ff-new-profile", "false"),
    ]);
    let d = derive_defines(&h);
    assert_eq!(d.get("user.language"), Some(&Scalar::from("fr-FR")));
    let out = mo::process(TEMPLATE, &d).unwrap();
    assert_eq!(out, include_str!("fixtures/app-desktop-guest.js"));
}

#[test]
fn test_android_request_without_feature_flag() {
    let h = headers(&[
        (
            "user-agent",
            "Mozilla/5.0 (Linux; Android 10; SM-G975F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.152 Mobile Safari/537.36",
        ),
        ("accept-language", "es-ES,es;q=0.9"),
        ("cookie", "ab_group=A"),
        ("x-screen-width", "360"),
    ]);
    let d = derive_defines(&h);
    assert_eq!(d.get("featureFlags.newUserProfile"), Some(&Scalar::Bool(false)));
    let out = mo::process(TEMPLATE, &d).unwrap();
    assert_eq!(out, include_str!("fixtures/app-android-guest.js"));
}

#[test]
fn test_mobile_without_width_uses_mobile_default() {
    let d = derive_defines(&headers(&[("user-agent", "Some Android Phone")]));
    assert_eq!(d.get("device.screenWidth"), Some(&Scalar::from(360i64)));
    let src = "/* @if(device.isMobile && device.screenWidth < 400) */\ncompact\n/* @endif */";
    assert_eq!(mo::process(src, &d).unwrap(), "compact");
}
