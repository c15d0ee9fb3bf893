//! Best-effort user-agent classification.
//!
//! Intentionally not a full parser: first substring match against fixed
//! ordered family tables, misclassification of obscure or spoofed strings
//! accepted. A maintained device-detection library could be swapped in behind
//! [`classify`] without touching any other component.

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
        }
    }
}

/// Classification result. Family names are lowercase or [`UNKNOWN`].
#[derive(Debug, Clone)]
pub struct UaProfile {
    pub device_type: DeviceType,
    pub browser: &'static str,
    pub os: &'static str,
}

// Tablet markers are checked before mobile markers: tablet strings usually
// also match the generic mobile patterns.
const TABLET_MARKERS: &[&str] = &["ipad", "tablet", "kindle", "silk", "playbook"];

const MOBILE_MARKERS: &[&str] = &[
    "mobi",
    "iphone",
    "ipod",
    "android",
    "phone",
    "blackberry",
    "webos",
    "opera mini",
];

// Ordered: aliases and UA quirks first. Edge and Opera both embed "chrome",
// Chrome embeds "safari", so the specific tokens must win.
const BROWSER_FAMILIES: &[(&str, &str)] = &[
    ("edg", "edge"),
    ("opr", "opera"),
    ("opera", "opera"),
    ("firefox", "firefox"),
    ("fxios", "firefox"),
    ("crios", "chrome"),
    ("chrome", "chrome"),
    ("safari", "safari"),
];

// Android strings contain "linux" and iOS strings contain "like mac os x",
// so the mobile systems are listed first.
const OS_FAMILIES: &[(&str, &str)] = &[
    ("android", "android"),
    ("iphone", "ios"),
    ("ipad", "ios"),
    ("ipod", "ios"),
    ("windows", "windows"),
    ("mac", "mac"),
    ("cros", "chromeos"),
    ("linux", "linux"),
    ("x11", "linux"),
];

/// Classify a raw user-agent string.
///
/// Pure and infallible: an empty or unrecognisable string maps to the
/// desktop / unknown / unknown defaults.
pub fn classify(user_agent: &str) -> UaProfile {
    let ua = user_agent.to_ascii_lowercase();

    let device_type = if TABLET_MARKERS.iter().any(|m| ua.contains(m)) {
        DeviceType::Tablet
    } else if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    };

    UaProfile {
        device_type,
        browser: first_family(&ua, BROWSER_FAMILIES),
        os: first_family(&ua, OS_FAMILIES),
    }
}

fn first_family(ua: &str, families: &[(&str, &'static str)]) -> &'static str {
    families
        .iter()
        .find(|(token, _)| ua.contains(token))
        .map(|(_, family)| *family)
        .unwrap_or(UNKNOWN)
}
