//! Browser-like request headers.
//!
//! Each request gets a freshly generated desktop Chrome, Firefox or Edge
//! profile and a Google search referer for the target site.

use dashmap::DashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::{Host, Url};

/// Lowest browser major version generated.
pub const MIN_BROWSER_VERSION: u32 = 120;
const MAX_BROWSER_VERSION: u32 = 131;

const REFERER_CACHE_CAPACITY: usize = 4096;

static REFERERS: LazyLock<DashMap<String, String>> = LazyLock::new(DashMap::new);

/// Second-level labels that sit under a two-letter country code as part of
/// the public suffix (`bbc.co.uk`, `abc.net.au`).
const COUNTRY_SECOND_LEVEL: &[&str] = &["ac", "co", "com", "edu", "gov", "ne", "net", "or", "org"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Browser {
    Chrome,
    Firefox,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    fn chromium_token(self) -> &'static str {
        match self {
            Self::Windows => "Windows NT 10.0; Win64; x64",
            Self::MacOs => "Macintosh; Intel Mac OS X 10_15_7",
            Self::Linux => "X11; Linux x86_64",
        }
    }

    fn firefox_token(self) -> &'static str {
        match self {
            Self::Windows => "Windows NT 10.0; Win64; x64",
            Self::MacOs => "Macintosh; Intel Mac OS X 10.15",
            Self::Linux => "X11; Linux x86_64",
        }
    }

    fn client_hint(self) -> &'static str {
        match self {
            Self::Windows => "\"Windows\"",
            Self::MacOs => "\"macOS\"",
            Self::Linux => "\"Linux\"",
        }
    }
}

/// Generates a random desktop browser header profile.
#[must_use]
pub fn generate_headers() -> HashMap<String, String> {
    let mut rng = rand::thread_rng();
    let browser = *[Browser::Chrome, Browser::Firefox, Browser::Edge]
        .choose(&mut rng)
        .unwrap_or(&Browser::Chrome);
    let platform = *[Platform::Windows, Platform::MacOs, Platform::Linux]
        .choose(&mut rng)
        .unwrap_or(&Platform::Windows);
    let version = rng.gen_range(MIN_BROWSER_VERSION..=MAX_BROWSER_VERSION);
    profile(browser, platform, version)
}

fn profile(browser: Browser, platform: Platform, version: u32) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    let mut set = |k: &str, v: String| {
        headers.insert(k.to_string(), v);
    };

    match browser {
        Browser::Firefox => {
            set(
                "user-agent",
                format!(
                    "Mozilla/5.0 ({}; rv:{version}.0) Gecko/20100101 Firefox/{version}.0",
                    platform.firefox_token()
                ),
            );
            set(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                    .to_string(),
            );
            set("accept-language", "en-US,en;q=0.5".to_string());
        }
        Browser::Chrome | Browser::Edge => {
            let chrome = format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version}.0.0.0 Safari/537.36",
                platform.chromium_token()
            );
            let (ua, brand) = if browser == Browser::Edge {
                (format!("{chrome} Edg/{version}.0.0.0"), "Microsoft Edge")
            } else {
                (chrome, "Google Chrome")
            };
            set("user-agent", ua);
            set(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"
                    .to_string(),
            );
            set("accept-language", "en-US,en;q=0.9".to_string());
            set(
                "sec-ch-ua",
                format!(
                    "\"Chromium\";v=\"{version}\", \"Not_A Brand\";v=\"24\", \"{brand}\";v=\"{version}\""
                ),
            );
            set("sec-ch-ua-mobile", "?0".to_string());
            set("sec-ch-ua-platform", platform.client_hint().to_string());
        }
    }

    set("accept-encoding", "gzip, br".to_string());
    set("upgrade-insecure-requests", "1".to_string());
    set("sec-fetch-dest", "document".to_string());
    set("sec-fetch-mode", "navigate".to_string());
    set("sec-fetch-site", "cross-site".to_string());
    set("sec-fetch-user", "?1".to_string());
    headers
}

/// The registrable-domain label of a URL's host (`docs.rs` gives `docs`,
/// `news.bbc.co.uk` gives `bbc`). IP hosts are returned whole.
#[must_use]
pub fn site_label(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    let domain = match parsed.host() {
        Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Some(Host::Ipv4(ip)) => return ip.to_string(),
        Some(Host::Ipv6(ip)) => return ip.to_string(),
        None => return String::new(),
    };

    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    match labels.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [.., third, second, tld]
            if tld.len() == 2 && COUNTRY_SECOND_LEVEL.contains(second) =>
        {
            (*third).to_string()
        }
        [.., second, _] => (*second).to_string(),
    }
}

/// A Google search referer for the target's site, memoized per URL.
#[must_use]
pub fn referer_for(url: &str) -> String {
    if let Some(hit) = REFERERS.get(url) {
        return hit.value().clone();
    }
    let referer = format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(&site_label(url))
    );
    if REFERERS.len() >= REFERER_CACHE_CAPACITY {
        REFERERS.clear();
    }
    REFERERS.insert(url.to_string(), referer.clone());
    referer
}

/// Builds the headers for one request.
///
/// Caller headers are kept unless a generated header has the same
/// (case-insensitive) name; the referer is always set.
#[must_use]
pub fn request_headers(url: &str, caller: Option<&HashMap<String, String>>) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = caller
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect();
    headers.extend(generate_headers());
    headers.insert("referer".to_string(), referer_for(url));
    headers
}
