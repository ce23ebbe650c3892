//! Best-effort request metadata: device description and IP geolocation.
//!
//! Every lookup degrades to [`UNKNOWN`] on failure. Nothing here is allowed to
//! fail a turn.

use crate::MetadataError;
use aibot_rs_config::MetadataConfig;
use aibot_rs_protocol::{Metadata, UNKNOWN};
use async_trait::async_trait;
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// What the transport knows about the caller.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    /// Client address, e.g. the first `X-Forwarded-For` hop.
    pub client_ip: Option<String>,
}

impl RequestContext {
    pub fn new(user_agent: Option<String>, client_ip: Option<String>) -> Self {
        Self {
            user_agent,
            client_ip,
        }
    }
}

struct UserAgentRules {
    device: Vec<(Regex, &'static str)>,
    os: Vec<(Regex, &'static str)>,
    browser: Vec<(Regex, &'static str)>,
}

impl UserAgentRules {
    fn compile() -> Result<Self, regex::Error> {
        fn table(rules: &[(&str, &'static str)]) -> Result<Vec<(Regex, &'static str)>, regex::Error> {
            rules
                .iter()
                .map(|(pattern, family)| Ok((Regex::new(pattern)?, *family)))
                .collect()
        }
        Ok(Self {
            device: table(&[
                (r"(?i)bot|crawler|spider|slurp", "Spider"),
                (r"iPhone", "iPhone"),
                (r"iPad", "iPad"),
                (r"Macintosh", "Mac"),
                (r"Android.*Mobile", "Generic Smartphone"),
                (r"Android", "Generic Tablet"),
            ])?,
            os: table(&[
                (r"Windows Phone", "Windows Phone"),
                (r"(?:iPhone|CPU) OS", "iOS"),
                (r"Android", "Android"),
                (r"CrOS", "Chrome OS"),
                (r"Mac OS X", "Mac OS X"),
                (r"Windows", "Windows"),
                (r"Ubuntu", "Ubuntu"),
                (r"Fedora", "Fedora"),
                (r"FreeBSD", "FreeBSD"),
                (r"Linux", "Linux"),
            ])?,
            browser: table(&[
                (r"Googlebot", "Googlebot"),
                (r"bingbot", "bingbot"),
                (r"SamsungBrowser/", "Samsung Internet"),
                (r"YaBrowser/", "Yandex Browser"),
                (r"UCBrowser/", "UC Browser"),
                (r"Vivaldi/", "Vivaldi"),
                (r"EdgA/", "Edge Mobile"),
                (r"Edg(?:e|iOS)?/", "Edge"),
                (r"OPR/|Opera", "Opera"),
                (r"Firefox/|FxiOS/", "Firefox"),
                (r"CriOS/", "Chrome Mobile iOS"),
                (r"Chrome/.*Mobile", "Chrome Mobile"),
                (r"Chrome/", "Chrome"),
                (r"Version/.*Mobile.*Safari/", "Mobile Safari"),
                (r"Version/.*Safari/", "Safari"),
                (r"^curl/", "curl"),
                (r"^Wget/", "Wget"),
                (r"^python-requests/", "Python Requests"),
            ])?,
        })
    }

    fn family(rules: &[(Regex, &'static str)], ua: &str) -> &'static str {
        rules
            .iter()
            .find(|(regex, _)| regex.is_match(ua))
            .map_or("Other", |(_, family)| family)
    }
}

static USER_AGENT_RULES: LazyLock<Option<UserAgentRules>> = LazyLock::new(|| {
    UserAgentRules::compile()
        .inspect_err(|err| warn!("user agent rules failed to compile: {err}"))
        .ok()
});

/// Describe a user agent as `"<device> | <os> | <browser>"`.
///
/// Unrecognised families read `"Other"`; a missing or blank user agent reads
/// `"unknown"`.
pub fn describe_user_agent(user_agent: Option<&str>) -> String {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return UNKNOWN.to_string();
    };
    let Some(rules) = USER_AGENT_RULES.as_ref() else {
        return UNKNOWN.to_string();
    };
    format!(
        "{} | {} | {}",
        UserAgentRules::family(&rules.device, ua),
        UserAgentRules::family(&rules.os, ua),
        UserAgentRules::family(&rules.browser, ua)
    )
}

/// Geolocation fields for an address. Absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeoInfo {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// IP geolocation backend.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Locate `ip`, or the caller's own public address when `None`.
    async fn lookup(&self, ip: Option<&str>) -> Result<GeoInfo, MetadataError>;
}

/// ipinfo-compatible lookup (`GET <endpoint>/json`, `GET <endpoint>/<ip>/json`).
#[derive(Debug, Clone)]
pub struct IpInfoLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl IpInfoLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| MetadataError::Http(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, ip: Option<&str>) -> String {
        match ip.and_then(public_ip) {
            Some(ip) => format!("{}/{ip}/json", self.endpoint),
            None => format!("{}/json", self.endpoint),
        }
    }
}

/// Private and loopback addresses cannot be located; fall back to `/json`.
fn public_ip(raw: &str) -> Option<IpAddr> {
    let ip: IpAddr = raw.trim().parse().ok()?;
    let routable = match ip {
        IpAddr::V4(v4) => !(v4.is_private() || v4.is_loopback() || v4.is_link_local()),
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified()),
    };
    routable.then_some(ip)
}

#[async_trait]
impl GeoLookup for IpInfoLookup {
    async fn lookup(&self, ip: Option<&str>) -> Result<GeoInfo, MetadataError> {
        let url = self.url_for(ip);
        debug!("looking up geolocation (url={url})");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| MetadataError::Http(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status(status.as_u16()));
        }
        response
            .json::<GeoInfo>()
            .await
            .map_err(|err| MetadataError::Decode(err.to_string()))
    }
}

/// Builds the per-turn metadata map.
#[derive(Clone)]
pub struct MetadataCollector {
    user_agent: bool,
    geo: Option<Arc<dyn GeoLookup>>,
}

impl MetadataCollector {
    /// Collector from config; geolocation uses [`IpInfoLookup`] when enabled.
    pub fn from_config(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let geo: Option<Arc<dyn GeoLookup>> = if config.geo_lookup {
            Some(Arc::new(IpInfoLookup::new(
                config.geo_endpoint.clone(),
                Duration::from_millis(config.timeout_ms),
            )?))
        } else {
            None
        };
        Ok(Self {
            user_agent: config.user_agent,
            geo,
        })
    }

    pub fn new(user_agent: bool, geo: Option<Arc<dyn GeoLookup>>) -> Self {
        Self { user_agent, geo }
    }

    /// Collector that records only sentinels; makes no network calls.
    pub fn disabled() -> Self {
        Self::new(false, None)
    }

    /// `device`, `ip`, `city`, `region`, `country`; each `"unknown"` on failure.
    pub async fn collect(&self, request: &RequestContext) -> Metadata {
        let mut metadata = Metadata::new();
        let device = if self.user_agent {
            describe_user_agent(request.user_agent.as_deref())
        } else {
            UNKNOWN.to_string()
        };
        metadata.insert("device".to_string(), Value::String(device));

        let geo = match &self.geo {
            Some(geo) => match geo.lookup(request.client_ip.as_deref()).await {
                Ok(info) => info,
                Err(err) => {
                    warn!("geolocation lookup failed: {err}");
                    GeoInfo::default()
                }
            },
            None => GeoInfo::default(),
        };
        for (key, value) in [
            ("ip", geo.ip),
            ("city", geo.city),
            ("region", geo.region),
            ("country", geo.country),
        ] {
            let value = value
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string());
            metadata.insert(key.to_string(), Value::String(value));
        }
        metadata
    }
}
