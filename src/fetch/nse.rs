use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::model::{ChainSnapshot, IndexId, OptionLeg, StrikeQuotes};

use super::retry::{RetryPolicy, retry};
use super::session::{NseSession, cookie_header_from};
use super::{FetchError, SnapshotSource};

pub const NSE_BASE_URL: &str = "https://www.nseindia.com";
const VIX_INDEX_NAME: &str = "INDIA VIX";
const EXPIRY_FORMAT: &str = "%d-%b-%Y";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

// ── NSE API response types ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChainResponse {
    records: Records,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Records {
    #[serde(default)]
    expiry_dates: Vec<String>,
    #[serde(default)]
    data: Vec<StrikeRow>,
    underlying_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrikeRow {
    strike_price: f64,
    expiry_date: String,
    #[serde(rename = "CE")]
    call: Option<LegRow>,
    #[serde(rename = "PE")]
    put: Option<LegRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegRow {
    #[serde(default)]
    last_price: f64,
    #[serde(default)]
    total_traded_volume: f64,
    #[serde(default)]
    implied_volatility: f64,
    underlying_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AllIndicesResponse {
    data: Vec<IndexQuote>,
}

#[derive(Debug, Deserialize)]
struct IndexQuote {
    index: String,
    last: Option<f64>,
}

// ── Fetcher ─────────────────────────────────────────────────────────

/// Option chains and India VIX from the NSE public JSON endpoints.
pub struct NseFetcher {
    client: reqwest::Client,
    base_url: String,
    session: NseSession,
    retry: RetryPolicy,
}

impl NseFetcher {
    /// HTTP client with the request timeout that bounds every fetch.
    pub fn build_client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("creating NSE HTTP client")
    }

    /// Reuse `cached` if it is still fresh at `now`, otherwise open a new session.
    pub async fn connect(
        client: reqwest::Client,
        base_url: impl Into<String>,
        cached: Option<NseSession>,
        retry_policy: RetryPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, FetchError> {
        let base_url = base_url.into();
        let session = match cached.filter(|s| s.is_valid_at(now)) {
            Some(s) => {
                debug!("reusing NSE session acquired at {}", s.acquired_at);
                s
            }
            None => {
                let s = retry(&retry_policy, || acquire_session(&client, &base_url, now)).await?;
                info!("acquired new NSE session (expires {})", s.expires_at);
                s
            }
        };

        Ok(Self {
            client,
            base_url,
            session,
            retry: retry_policy,
        })
    }

    /// Session in use, for the caller to cache for the next run.
    pub fn session(&self) -> &NseSession {
        &self.session
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header(COOKIE, &self.session.cookie_header)
            .header("Referer", format!("{}/option-chain", self.base_url))
            .send()
            .await
            .map_err(|e| FetchError::network(what, e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::auth(what, format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::network(what, format!("HTTP {status}")));
        }

        let body = resp.text().await.map_err(|e| FetchError::network(what, e))?;
        decode_body(&body, what)
    }
}

#[async_trait]
impl SnapshotSource for NseFetcher {
    async fn fetch_snapshot(&self, index: IndexId) -> Result<ChainSnapshot, FetchError> {
        let path = format!("/api/option-chain-indices?symbol={}", index.symbol());
        let what = index.symbol();
        let resp: ChainResponse = retry(&self.retry, || self.get_json(&path, what)).await?;
        let snapshot = snapshot_from_response(resp);
        debug!(
            index = %index,
            spot = ?snapshot.spot_price,
            expiries = snapshot.expiries.len(),
            "fetched option chain"
        );
        Ok(snapshot)
    }

    async fn fetch_volatility_index(&self) -> Option<f64> {
        let result: Result<AllIndicesResponse, FetchError> =
            retry(&self.retry, || self.get_json("/api/allIndices", VIX_INDEX_NAME)).await;
        match result {
            Ok(resp) => {
                let vix = resp
                    .data
                    .into_iter()
                    .find(|q| q.index.eq_ignore_ascii_case(VIX_INDEX_NAME))
                    .and_then(|q| q.last);
                if vix.is_none() {
                    warn!("{VIX_INDEX_NAME} missing from allIndices response");
                }
                vix
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}

// ── Internal ────────────────────────────────────────────────────────

/// Hit the home page once; NSE answers with the cookies its API expects.
async fn acquire_session(
    client: &reqwest::Client,
    base_url: &str,
    now: DateTime<Utc>,
) -> Result<NseSession, FetchError> {
    let what = "NSE session";
    let resp = client
        .get(base_url)
        .send()
        .await
        .map_err(|e| FetchError::network(what, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::auth(what, format!("home page returned HTTP {status}")));
    }

    let cookie_header = cookie_header_from(
        resp.headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );
    if cookie_header.is_empty() {
        return Err(FetchError::auth(what, "no cookies issued"));
    }
    Ok(NseSession::new(cookie_header, now))
}

/// NSE answers `{}` instead of an error status when the session cookies are stale.
fn decode_body<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::parse(what, format!("invalid JSON: {e}")))?;
    if value.as_object().is_some_and(|o| o.is_empty()) {
        return Err(FetchError::auth(what, "empty response body"));
    }
    serde_json::from_value(value).map_err(|e| FetchError::parse(what, e))
}

fn snapshot_from_response(resp: ChainResponse) -> ChainSnapshot {
    let records = resp.records;

    let spot = records.underlying_value.or_else(|| {
        records
            .data
            .iter()
            .flat_map(|row| [row.call.as_ref(), row.put.as_ref()])
            .flatten()
            .find_map(|leg| leg.underlying_value)
    });

    let mut snapshot = ChainSnapshot::new(spot);
    for raw in &records.expiry_dates {
        match parse_expiry(raw) {
            Some(d) if !snapshot.expiries.contains(&d) => snapshot.expiries.push(d),
            Some(_) => {}
            None => warn!("skipping unparsable expiry date '{raw}'"),
        }
    }

    for row in records.data {
        let Some(expiry) = parse_expiry(&row.expiry_date) else {
            warn!("skipping strike {} with unparsable expiry '{}'", row.strike_price, row.expiry_date);
            continue;
        };
        snapshot.insert(
            expiry,
            StrikeQuotes {
                strike: row.strike_price,
                call: row.call.map(to_leg),
                put: row.put.map(to_leg),
            },
        );
    }

    snapshot
}

fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), EXPIRY_FORMAT).ok()
}

fn to_leg(raw: LegRow) -> OptionLeg {
    let volume = if raw.total_traded_volume.is_finite() && raw.total_traded_volume > 0.0 {
        raw.total_traded_volume.round() as u64
    } else {
        0
    };
    OptionLeg::new(raw.last_price, volume, raw.implied_volatility.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = r#"{
        "records": {
            "expiryDates": ["13-Mar-2025", "06-Mar-2025", "bogus"],
            "timestamp": "05-Mar-2025 15:30:00",
            "underlyingValue": 22500.5,
            "data": [
                {
                    "strikePrice": 22500,
                    "expiryDate": "06-Mar-2025",
                    "CE": {"lastPrice": 120, "totalTradedVolume": 1000, "impliedVolatility": 14, "underlyingValue": 22500.5},
                    "PE": {"lastPrice": 110, "totalTradedVolume": 800, "impliedVolatility": 15}
                },
                {
                    "strikePrice": 22600,
                    "expiryDate": "06-Mar-2025",
                    "PE": {"lastPrice": 170.5, "totalTradedVolume": 20, "impliedVolatility": 16.2}
                },
                {
                    "strikePrice": 22500,
                    "expiryDate": "13-Mar-2025",
                    "CE": {"lastPrice": 260, "totalTradedVolume": 50, "impliedVolatility": 13.1}
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_chain() {
        let resp: ChainResponse = decode_body(CHAIN, "NIFTY").unwrap();
        let snap = snapshot_from_response(resp);
        let mar6 = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let mar13 = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();

        assert_eq!(snap.spot_price, Some(22500.5));
        assert_eq!(snap.expiries, vec![mar13, mar6]);
        assert_eq!(snap.strikes_for(&mar6).len(), 2);

        let atm = &snap.strikes_for(&mar6)[0];
        assert_eq!(atm.call, Some(OptionLeg::new(120.0, 1000, 14.0)));
        assert_eq!(atm.put, Some(OptionLeg::new(110.0, 800, 15.0)));
        assert!(snap.strikes_for(&mar6)[1].call.is_none());
    }

    #[test]
    fn test_empty_body_is_auth_error() {
        let err = decode_body::<ChainResponse>("{}", "NIFTY").unwrap_err();
        assert!(matches!(err, FetchError::Auth { .. }));
    }

    #[test]
    fn test_html_body_is_parse_error() {
        let err = decode_body::<ChainResponse>("<html>Access Denied</html>", "NIFTY").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[test]
    fn test_spot_falls_back_to_leg_underlying() {
        let body = r#"{"records": {"expiryDates": [], "data": [
            {"strikePrice": 48000, "expiryDate": "06-Mar-2025",
             "PE": {"lastPrice": 1, "underlyingValue": 48010.0}}
        ]}}"#;
        let resp: ChainResponse = decode_body(body, "BANKNIFTY").unwrap();
        let snap = snapshot_from_response(resp);
        assert_eq!(snap.spot_price, Some(48010.0));
        // expiry registered from the strike row even though expiryDates was empty
        assert_eq!(snap.expiries.len(), 1);
    }

    #[test]
    fn test_vix_lookup_shape() {
        let body = r#"{"data": [{"index": "NIFTY 50", "last": 22500}, {"index": "INDIA VIX", "last": 14.25}]}"#;
        let resp: AllIndicesResponse = decode_body(body, VIX_INDEX_NAME).unwrap();
        let vix = resp.data.into_iter().find(|q| q.index == VIX_INDEX_NAME).and_then(|q| q.last);
        assert_eq!(vix, Some(14.25));
    }
}
