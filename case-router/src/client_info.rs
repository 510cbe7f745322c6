use crate::config::NetworkOriginConfig;
use crate::user_agent::{Browser, Device, Os, UserAgentParser};
use hyper::header::{HeaderMap, USER_AGENT};

/// Descriptive record about where a submission came from, attached to the case comment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub country: String,
    /// Autonomous system number, 0 when the edge did not report one
    pub asn: u32,
    pub origin_pop: String,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub os: Option<String>,
    /// Only set when one of browser, device or OS could not be parsed
    pub raw_user_agent: Option<String>,
}

impl ClientInfo {
    /// Builds the record from the request headers.
    ///
    /// Network fields are taken as reported by the edge. The user agent is parsed
    /// best-effort, and the raw string is kept whenever parsing was incomplete.
    pub fn from_headers(
        headers: &HeaderMap,
        origin: &NetworkOriginConfig,
        parser: &dyn UserAgentParser,
    ) -> Self {
        let raw_user_agent = header_str(headers, USER_AGENT.as_str()).unwrap_or_default();
        let parsed = parser.parse(raw_user_agent);

        let mut info = ClientInfo {
            country: header_str(headers, &origin.country_header)
                .unwrap_or_default()
                .to_string(),
            asn: header_str(headers, &origin.asn_header)
                .and_then(parse_asn)
                .unwrap_or(0),
            origin_pop: header_str(headers, &origin.pop_header)
                .map(|value| parse_pop(&origin.pop_header, value))
                .unwrap_or_default()
                .to_string(),
            browser: parsed.browser.as_ref().map(describe_browser),
            device: parsed.device.as_ref().map(describe_device),
            os: parsed.os.as_ref().map(describe_os),
            raw_user_agent: None,
        };

        if !info.is_fully_parsed() {
            info.raw_user_agent = Some(raw_user_agent.to_string());
        }

        info
    }

    pub fn is_fully_parsed(&self) -> bool {
        self.browser.is_some() && self.device.is_some() && self.os.is_some()
    }

    /// Key/value pairs in attachment order; absent optional fields are skipped.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("Country", self.country.clone()),
            ("ASN", self.asn.to_string()),
            ("OriginPOP", self.origin_pop.clone()),
        ];

        let optional = [
            ("Browser", &self.browser),
            ("Device", &self.device),
            ("OS", &self.os),
            ("RawUserAgent", &self.raw_user_agent),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                entries.push((key, value.clone()));
            }
        }

        entries
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn parse_asn(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = value
        .strip_prefix("AS")
        .or_else(|| value.strip_prefix("as"))
        .unwrap_or(value);
    digits.parse().ok()
}

/// A `cf-ray` value looks like `8a1b2c3d4e5f6789-SJC`; the node code is the suffix.
fn parse_pop<'a>(header: &str, value: &'a str) -> &'a str {
    if header.eq_ignore_ascii_case("cf-ray") {
        return value.rsplit_once('-').map_or(value, |(_, pop)| pop);
    }
    value
}

fn join_present(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe_browser(browser: &Browser) -> String {
    join_present(&[Some(browser.name.as_str()), browser.version.as_deref()])
}

fn describe_os(os: &Os) -> String {
    join_present(&[Some(os.name.as_str()), os.version.as_deref()])
}

fn describe_device(device: &Device) -> String {
    join_present(&[
        Some(device.vendor.as_str()),
        device.model.as_deref(),
        device.device_type.map(|t| t.as_str()),
    ])
}
