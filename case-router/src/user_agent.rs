//! Best-effort user-agent parsing.
//!
//! Parsing is heuristic: any of the browser, OS or device may come back as `None`.
//! A missing category is never an error, it only means the request gets described
//! by its raw user-agent string as well.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Browser {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Os {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Device {
    pub vendor: String,
    pub model: Option<String>,
    pub device_type: Option<DeviceType>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Console,
    SmartTv,
}

impl DeviceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Console => "console",
            DeviceType::SmartTv => "smarttv",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub browser: Option<Browser>,
    pub os: Option<Os>,
    pub device: Option<Device>,
}

/// Extracts browser, OS and device information from a user-agent string.
pub trait UserAgentParser: Send + Sync {
    fn parse(&self, user_agent: &str) -> ParsedUserAgent;
}

/// Browser rules, most specific first. The first capture group is the version.
static BROWSER_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"\bEdg(?:e|A|iOS)?/([\d.]+)", "Edge"),
        (r"\b(?:OPR|Opera)/([\d.]+)", "Opera"),
        (r"\bSamsungBrowser/([\d.]+)", "Samsung Internet"),
        (r"\bFxiOS/([\d.]+)", "Mobile Firefox"),
        (r"\bFirefox/([\d.]+)", "Firefox"),
        (r"\bCriOS/([\d.]+)", "Mobile Chrome"),
        (r"\bChrome/([\d.]+) Mobile", "Mobile Chrome"),
        (r"\bChrome/([\d.]+)", "Chrome"),
        (r"\bVersion/([\d.]+).*Mobile/\S+ Safari/", "Mobile Safari"),
        (r"\bVersion/([\d.]+).*Safari/", "Safari"),
        (r"\bMSIE ([\d.]+)", "IE"),
        (r"\bTrident/.*rv:([\d.]+)", "IE"),
    ])
});

static WINDOWS: Lazy<Regex> = Lazy::new(|| regex(r"Windows NT ([\d.]+)"));
static IOS: Lazy<Regex> = Lazy::new(|| regex(r"(?:iPhone|CPU) OS ([\d_]+)"));
static MAC_OS: Lazy<Regex> = Lazy::new(|| regex(r"Mac OS X ([\d_.]+)"));
static ANDROID: Lazy<Regex> = Lazy::new(|| regex(r"Android ([\d.]+)"));
static CHROME_OS: Lazy<Regex> = Lazy::new(|| regex(r"CrOS \S+ ([\d.]+)"));

/// Model token of an Android user agent, e.g. `SM-G991B` in
/// `Linux; Android 13; SM-G991B Build/TP1A`.
static ANDROID_MODEL: Lazy<Regex> = Lazy::new(|| {
    regex(r"Android [\d.]+; (?:[a-z]{2}[-_][a-zA-Z]{2}; )?([^;)]+?)(?: Build/[^;)]*)?\)")
});

/// Android model prefixes and the vendor they belong to.
static ANDROID_VENDORS: &[(&str, &str)] = &[
    ("SM-", "Samsung"),
    ("GT-", "Samsung"),
    ("SAMSUNG", "Samsung"),
    ("Pixel", "Google"),
    ("Nexus", "Google"),
    ("Redmi", "Xiaomi"),
    ("Mi ", "Xiaomi"),
    ("moto", "Motorola"),
    ("ONEPLUS", "OnePlus"),
    ("HUAWEI", "Huawei"),
    ("LG-", "LG"),
    ("Nokia", "Nokia"),
];

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("user-agent patterns are valid")
}

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .map(|(pattern, name)| (regex(pattern), *name))
        .collect()
}

fn capture(re: &Regex, user_agent: &str) -> Option<String> {
    re.captures(user_agent)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Rule-based parser covering the common desktop and mobile browsers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicParser;

impl HeuristicParser {
    fn browser(user_agent: &str) -> Option<Browser> {
        BROWSER_RULES.iter().find_map(|(re, name)| {
            re.captures(user_agent).map(|caps| Browser {
                name: name.to_string(),
                version: caps.get(1).map(|m| m.as_str().to_string()),
            })
        })
    }

    fn os(user_agent: &str) -> Option<Os> {
        let os = |name: &str, version: Option<String>| {
            Some(Os {
                name: name.to_string(),
                version,
            })
        };

        if let Some(nt) = capture(&WINDOWS, user_agent) {
            return os("Windows", Some(windows_version(&nt)));
        }
        if let Some(version) = capture(&IOS, user_agent) {
            return os("iOS", Some(version.replace('_', ".")));
        }
        if let Some(version) = capture(&ANDROID, user_agent) {
            return os("Android", Some(version));
        }
        if let Some(version) = capture(&CHROME_OS, user_agent) {
            return os("Chromium OS", Some(version));
        }
        if let Some(version) = capture(&MAC_OS, user_agent) {
            return os("Mac OS", Some(version.replace('_', ".")));
        }
        if user_agent.contains("Ubuntu") {
            return os("Ubuntu", None);
        }
        if user_agent.contains("Linux") {
            return os("Linux", None);
        }
        None
    }

    fn device(user_agent: &str) -> Option<Device> {
        let apple = |model: &str, device_type: Option<DeviceType>| {
            Some(Device {
                vendor: "Apple".to_string(),
                model: Some(model.to_string()),
                device_type,
            })
        };

        if user_agent.contains("iPhone") {
            return apple("iPhone", Some(DeviceType::Mobile));
        }
        if user_agent.contains("iPad") {
            return apple("iPad", Some(DeviceType::Tablet));
        }
        if user_agent.contains("Macintosh") {
            return apple("Macintosh", None);
        }
        if user_agent.contains("PlayStation") {
            return Some(Device {
                vendor: "Sony".to_string(),
                model: Some("PlayStation".to_string()),
                device_type: Some(DeviceType::Console),
            });
        }
        if user_agent.contains("Xbox") {
            return Some(Device {
                vendor: "Microsoft".to_string(),
                model: Some("Xbox".to_string()),
                device_type: Some(DeviceType::Console),
            });
        }
        if user_agent.contains("SMART-TV") || user_agent.contains("SmartTV") {
            return Some(Device {
                vendor: "Samsung".to_string(),
                model: None,
                device_type: Some(DeviceType::SmartTv),
            });
        }

        let model = capture(&ANDROID_MODEL, user_agent)?;
        let vendor = ANDROID_VENDORS
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map(|(_, vendor)| *vendor)?;
        let device_type = if user_agent.contains("Mobile") {
            DeviceType::Mobile
        } else {
            DeviceType::Tablet
        };

        Some(Device {
            vendor: vendor.to_string(),
            model: Some(model),
            device_type: Some(device_type),
        })
    }
}

impl UserAgentParser for HeuristicParser {
    fn parse(&self, user_agent: &str) -> ParsedUserAgent {
        ParsedUserAgent {
            browser: Self::browser(user_agent),
            os: Self::os(user_agent),
            device: Self::device(user_agent),
        }
    }
}

fn windows_version(nt: &str) -> String {
    match nt {
        "10.0" => "10",
        "6.3" => "8.1",
        "6.2" => "8",
        "6.1" => "7",
        "6.0" => "Vista",
        "5.1" | "5.2" => "XP",
        other => other,
    }
    .to_string()
}
