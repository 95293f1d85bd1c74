//! # Location search — signed proxy to the Tencent LBS place search API
//!
//! The provider authenticates requests with a signature rather than a bearer
//! token: `sig = md5_hex(path + "?" + sorted raw "k=v" pairs joined by "&" + SK)`.
//! [`LocationClient::search`] builds the parameter set, signs it, forwards the
//! request and normalises the answer into [`LocationItem`]s.
//!
//! Province/city/district come from the provider's `ad_info` when present and
//! are otherwise recovered from the free-form address with [`parse_address`].
//!
//! ## Error mapping
//!
//! | [`LocationError`] | HTTP status | body `status` |
//! |-------------------|-------------|---------------|
//! | `NotConfigured` | 500 | 1 |
//! | `UpstreamStatus(code)` | `code` | 1 |
//! | `InvalidResponse` | 500 | 1 |
//! | `Provider { status, .. }` | 400 | provider status |
//! | `Transport(_)` | 500 | 1 |

use std::collections::BTreeMap;
use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;
use serde::{Deserialize, Serialize};
use store::LocationItem;
use thiserror::Error;

pub const SEARCH_PATH: &str = "/ws/place/v1/search";
pub const DEFAULT_BASE_URL: &str = "https://apis.map.qq.com";
/// Keyword used when the user has not typed anything yet.
pub const DEFAULT_KEYWORD: &str = "中国";

static PROVINCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?)[省市]").unwrap());
static CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[省自治区]+(.*?)[市地区]").unwrap());
static DISTRICT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"市(.*?)[区县]").unwrap());

/// Credentials and endpoint of the place search provider.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            key: None,
            secret: None,
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("请配置腾讯位置服务API密钥")]
    NotConfigured,
    #[error("腾讯位置服务请求失败: {0}")]
    UpstreamStatus(u16),
    #[error("解析腾讯位置服务响应失败")]
    InvalidResponse,
    #[error("{message}")]
    Provider { status: i64, message: String },
    #[error("{0}")]
    Transport(String),
}

impl LocationError {
    /// HTTP status the proxy answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            LocationError::UpstreamStatus(code) => *code,
            LocationError::Provider { .. } => 400,
            LocationError::NotConfigured
            | LocationError::InvalidResponse
            | LocationError::Transport(_) => 500,
        }
    }

    /// `status` field of the JSON body.
    pub fn body_status(&self) -> i64 {
        match self {
            LocationError::Provider { status, .. } => *status,
            _ => 1,
        }
    }

    pub fn to_response(&self) -> LocationSearchResponse {
        LocationSearchResponse {
            status: self.body_status(),
            message: Some(self.to_string()),
            data: None,
        }
    }
}

/// JSON shape returned by `GET /api/location-search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSearchResponse {
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<LocationItem>>,
}

impl LocationSearchResponse {
    pub fn ok(items: Vec<LocationItem>) -> Self {
        Self {
            status: 0,
            message: None,
            data: Some(items),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderPlace {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    ad_info: Option<AdInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct AdInfo {
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    district: Option<String>,
}

/// Region components recovered from an address string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    pub province: String,
    pub city: String,
    pub district: String,
}

/// Query parameters of a place search, before signing.
pub fn search_params(key: &str, keyword: &str) -> BTreeMap<String, String> {
    let keyword = match keyword.trim() {
        "" => DEFAULT_KEYWORD,
        k => k,
    };
    BTreeMap::from([
        ("key".to_string(), key.to_string()),
        ("keyword".to_string(), keyword.to_string()),
        ("boundary".to_string(), "region(0,0)".to_string()),
        ("page_size".to_string(), "20".to_string()),
        ("page_index".to_string(), "1".to_string()),
        ("output".to_string(), "json".to_string()),
    ])
}

/// Request signature over the raw (unencoded) parameters in key order.
pub fn sign(path: &str, params: &BTreeMap<String, String>, secret: &str) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let raw = format!("{path}?{query}{secret}");
    hex::encode(Md5::digest(raw.as_bytes()))
}

/// Best-effort split of a Chinese address into province, city and district.
///
/// Each component keeps its administrative suffix (省/市/区/县). When no city
/// can be found but the province is a municipality (ends in 市), the city
/// repeats the province.
pub fn parse_address(address: &str) -> Region {
    let mut region = Region::default();

    if let Some(m) = PROVINCE_RE.find(address) {
        region.province = m.as_str().to_string();
    }

    if let Some(caps) = CITY_RE.captures(address) {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let name = caps.get(1).map_or("", |m| m.as_str());
        let suffix = whole.chars().last().map(String::from).unwrap_or_default();
        region.city = format!("{name}{suffix}");
    }

    if region.city.is_empty() && region.province.ends_with('市') {
        region.city = region.province.clone();
    }

    if let Some(caps) = DISTRICT_RE.captures(address) {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let name = caps.get(1).map_or("", |m| m.as_str());
        let suffix = whole.chars().last().map(String::from).unwrap_or_default();
        region.district = format!("{name}{suffix}");
    }

    region
}

fn to_item(place: ProviderPlace, index: usize) -> LocationItem {
    let address = place.address.unwrap_or_default();
    let region = match place.ad_info {
        Some(ad) => Region {
            province: ad.province.unwrap_or_default(),
            city: ad.city.unwrap_or_default(),
            district: ad.district.unwrap_or_default(),
        },
        None => parse_address(&address),
    };

    LocationItem {
        id: place
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("place_{index}")),
        title: place.title.unwrap_or_default(),
        address,
        province: region.province,
        city: region.city,
        district: region.district,
    }
}

/// Normalise the provider's `data` array. Anything that is not an array yields
/// no results; malformed items are kept with empty fields.
fn format_results(data: Option<serde_json::Value>) -> Vec<LocationItem> {
    let Some(serde_json::Value::Array(items)) = data else {
        return Vec::new();
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let place = serde_json::from_value::<ProviderPlace>(item).unwrap_or_default();
            to_item(place, index)
        })
        .collect()
}

/// Client for the place search API.
#[derive(Debug, Clone)]
pub struct LocationClient {
    http: reqwest::Client,
    config: LocationConfig,
}

impl LocationClient {
    pub fn new(config: LocationConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: LocationConfig) -> Self {
        Self { http, config }
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.config.key.as_deref().filter(|k| !k.trim().is_empty())?;
        let secret = self.config.secret.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((key, secret))
    }

    /// Search places matching `keyword` (defaults to "中国" when blank).
    pub async fn search(&self, keyword: &str) -> Result<Vec<LocationItem>, LocationError> {
        let (key, secret) = self.credentials().ok_or(LocationError::NotConfigured)?;

        let mut params = search_params(key, keyword);
        let sig = sign(SEARCH_PATH, &params, secret);
        params.insert("sig".to_string(), sig);

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), SEARCH_PATH);
        let response = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Location search request failed: {}", e);
                LocationError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Location provider answered {}", status);
            return Err(LocationError::UpstreamStatus(status.as_u16()));
        }

        let body: ProviderResponse = response
            .json()
            .await
            .map_err(|_| LocationError::InvalidResponse)?;

        let provider_status = body.status.unwrap_or(1);
        if provider_status != 0 {
            return Err(LocationError::Provider {
                status: provider_status,
                message: body
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "腾讯位置服务错误".to_string()),
            });
        }

        Ok(format_results(body.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(base_url: String) -> LocationClient {
        LocationClient::new(LocationConfig {
            key: Some("KEY123".to_string()),
            secret: Some("SECRET".to_string()),
            base_url,
        })
    }

    #[test]
    fn test_sign_uses_sorted_raw_params() {
        let params = BTreeMap::from([
            ("keyword".to_string(), "西湖".to_string()),
            ("key".to_string(), "K".to_string()),
        ]);
        let expected = hex::encode(Md5::digest("/ws/place/v1/search?key=K&keyword=西湖SK".as_bytes()));
        assert_eq!(sign(SEARCH_PATH, &params, "SK"), expected);
        assert_eq!(expected.len(), 32);
    }

    #[test]
    fn test_search_params_defaults_keyword() {
        let params = search_params("K", "  ");
        assert_eq!(params["keyword"], "中国");
        assert_eq!(params["boundary"], "region(0,0)");
        assert_eq!(params["page_size"], "20");
        assert_eq!(params["page_index"], "1");
        assert_eq!(params["output"], "json");
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn test_parse_address_full() {
        let region = parse_address("浙江省杭州市西湖区文三路90号");
        assert_eq!(region.province, "浙江省");
        assert_eq!(region.city, "杭州市");
        assert_eq!(region.district, "西湖区");
    }

    #[test]
    fn test_parse_address_municipality() {
        let region = parse_address("北京市海淀区中关村大街1号");
        assert_eq!(region.province, "北京市");
        assert_eq!(region.city, "北京市");
        assert_eq!(region.district, "海淀区");
    }

    #[test]
    fn test_parse_address_without_markers() {
        assert_eq!(parse_address("西湖边"), Region::default());
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(LocationError::NotConfigured.http_status(), 500);
        assert_eq!(LocationError::UpstreamStatus(503).http_status(), 503);
        let provider = LocationError::Provider {
            status: 311,
            message: "key格式错误".to_string(),
        };
        assert_eq!(provider.http_status(), 400);
        assert_eq!(provider.to_response().status, 311);
        assert_eq!(provider.to_response().message.as_deref(), Some("key格式错误"));
    }

    #[tokio::test]
    async fn test_missing_keys_is_not_configured() {
        let client = LocationClient::new(LocationConfig {
            key: Some("K".to_string()),
            secret: Some("  ".to_string()),
            ..LocationConfig::default()
        });
        let err = client.search("西湖").await.unwrap_err();
        assert_eq!(err, LocationError::NotConfigured);
        assert_eq!(err.to_string(), "请配置腾讯位置服务API密钥");
    }

    #[tokio::test]
    async fn test_search_signs_and_normalises() {
        let server = MockServer::start_async().await;
        let mut params = search_params("KEY123", "西湖");
        let sig = sign(SEARCH_PATH, &params, "SECRET");
        params.insert("sig".to_string(), sig.clone());

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(SEARCH_PATH)
                    .query_param("key", "KEY123")
                    .query_param("keyword", "西湖")
                    .query_param("boundary", "region(0,0)")
                    .query_param("sig", sig.as_str());
                then.status(200).json_body(json!({
                    "status": 0,
                    "message": "query ok",
                    "data": [
                        {
                            "id": "123",
                            "title": "西湖",
                            "address": "浙江省杭州市西湖区龙井路1号",
                            "ad_info": {"province": "浙江省", "city": "杭州市", "district": "西湖区"}
                        },
                        {
                            "title": "西湖公园",
                            "address": "福建省福州市鼓楼区湖滨路70号"
                        }
                    ]
                }));
            })
            .await;

        let items = client(server.base_url()).search("西湖").await.unwrap();
        mock.assert_async().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "123");
        assert_eq!(items[0].district, "西湖区");
        assert_eq!(items[1].id, "place_1");
        assert_eq!(items[1].province, "福建省");
        assert_eq!(items[1].city, "福州市");
        assert_eq!(items[1].district, "鼓楼区");
    }

    #[tokio::test]
    async fn test_provider_error_is_propagated() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(SEARCH_PATH);
                then.status(200)
                    .json_body(json!({"status": 311, "message": "key格式错误"}));
            })
            .await;

        let err = client(server.base_url()).search("x").await.unwrap_err();
        assert_eq!(
            err,
            LocationError::Provider {
                status: 311,
                message: "key格式错误".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_upstream_http_error_keeps_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(SEARCH_PATH);
                then.status(502);
            })
            .await;

        let err = client(server.base_url()).search("x").await.unwrap_err();
        assert_eq!(err, LocationError::UpstreamStatus(502));
        assert_eq!(err.to_string(), "腾讯位置服务请求失败: 502");
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(SEARCH_PATH);
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let err = client(server.base_url()).search("x").await.unwrap_err();
        assert_eq!(err, LocationError::InvalidResponse);
    }
}
