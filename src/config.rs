use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

use crate::engine::Thresholds;
use crate::fetch::nse::NSE_BASE_URL;
use crate::run::market::TradingWindow;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name}={value} is not a valid {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("{name} band is inverted: low {low} > high {high}")]
    InvertedBand { name: &'static str, low: f64, high: f64 },

    #[error("VWAP factors must be positive, got {low} / {high}")]
    NonPositiveFactor { low: f64, high: f64 },

    #[error("LOOKBACK_WINDOW must be at least 1")]
    EmptyLookback,

    #[error("EXPIRY_COUNT must be 1 or 2, got {0}")]
    ExpiryCount(usize),

    #[error("market opens at {open} but closes at {close}")]
    InvertedTradingWindow { open: NaiveTime, close: NaiveTime },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

/// Everything a tick needs to know, resolved from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `VIX_LOW` / `VIX_HIGH` | 11 / 20 |
/// | `IVP_LOW` / `IVP_HIGH` | 10 / 90 |
/// | `VWAP_FACTOR_LOW` / `VWAP_FACTOR_HIGH` | 0.9 / 1.1 |
/// | `LOOKBACK_WINDOW` | 30 |
/// | `EXPIRY_COUNT` | 2 |
/// | `FORCE_MARKET_OPEN` | false |
/// | `MARKET_OPEN` / `MARKET_CLOSE` | 09:15 / 15:30 (IST) |
/// | `HISTORY_FILE` | `data/straddle_history.csv` |
/// | `RUNLOG_DIR` | `.runlog` |
/// | `SESSION_FILE` | `<RUNLOG_DIR>/nse_session.json` |
/// | `NSE_BASE_URL` | `https://www.nseindia.com` |
/// | `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID` | unset (alerts are only logged) |
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub thresholds: Thresholds,
    pub lookback: usize,
    pub expiry_count: usize,
    /// Treat the market as open regardless of the clock (off-hours testing).
    pub force_market_open: bool,
    pub trading_window: TradingWindow,
    pub history_file: PathBuf,
    pub runlog_dir: PathBuf,
    pub session_file: PathBuf,
    pub nse_base_url: String,
    pub telegram: Option<TelegramCredentials>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let runlog_dir = PathBuf::from(".runlog");
        Self {
            thresholds: Thresholds::default(),
            lookback: 30,
            expiry_count: 2,
            force_market_open: false,
            trading_window: TradingWindow::default(),
            history_file: PathBuf::from("data/straddle_history.csv"),
            session_file: runlog_dir.join("nse_session.json"),
            runlog_dir,
            nse_base_url: NSE_BASE_URL.to_string(),
            telegram: None,
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);
        let d = Self::default();

        let thresholds = Thresholds {
            vix_low: env.f64("VIX_LOW", d.thresholds.vix_low)?,
            vix_high: env.f64("VIX_HIGH", d.thresholds.vix_high)?,
            ivp_low: env.f64("IVP_LOW", d.thresholds.ivp_low)?,
            ivp_high: env.f64("IVP_HIGH", d.thresholds.ivp_high)?,
            vwap_factor_low: env.f64("VWAP_FACTOR_LOW", d.thresholds.vwap_factor_low)?,
            vwap_factor_high: env.f64("VWAP_FACTOR_HIGH", d.thresholds.vwap_factor_high)?,
        };

        let runlog_dir = env.str("RUNLOG_DIR").map(PathBuf::from).unwrap_or(d.runlog_dir);
        let session_file = env
            .str("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| runlog_dir.join("nse_session.json"));

        let telegram = match (env.str("TELEGRAM_TOKEN"), env.str("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramCredentials { token, chat_id }),
            _ => None,
        };

        let config = Self {
            thresholds,
            lookback: env.usize("LOOKBACK_WINDOW", d.lookback)?,
            expiry_count: env.usize("EXPIRY_COUNT", d.expiry_count)?,
            force_market_open: env.bool("FORCE_MARKET_OPEN", d.force_market_open)?,
            trading_window: TradingWindow {
                open: env.time("MARKET_OPEN", d.trading_window.open)?,
                close: env.time("MARKET_CLOSE", d.trading_window.close)?,
            },
            history_file: env.str("HISTORY_FILE").map(PathBuf::from).unwrap_or(d.history_file),
            runlog_dir,
            session_file,
            nse_base_url: env.str("NSE_BASE_URL").unwrap_or(d.nse_base_url),
            telegram,
        };
        config.validate()?;
        Ok(config)
    }

    /// Human-readable dump for the `config` command. Credentials are masked.
    pub fn print(&self) {
        let t = &self.thresholds;
        println!("VIX band:          {} – {} (inclusive)", t.vix_low, t.vix_high);
        println!("IVP band:          {} – {} (exclusive)", t.ivp_low, t.ivp_high);
        println!("VWAP factors:      {} – {}", t.vwap_factor_low, t.vwap_factor_high);
        println!("Lookback:          {} rows", self.lookback);
        println!("Expiries:          {}", self.expiry_count);
        println!(
            "Trading window:    {} – {} IST, Mon–Fri",
            self.trading_window.open.format("%H:%M"),
            self.trading_window.close.format("%H:%M")
        );
        println!("Force market open: {}", self.force_market_open);
        println!("History file:      {}", self.history_file.display());
        println!("Run log dir:       {}", self.runlog_dir.display());
        println!("Session cache:     {}", self.session_file.display());
        println!("NSE base URL:      {}", self.nse_base_url);
        match &self.telegram {
            Some(tg) => println!("Telegram:          chat {} (token set)", tg.chat_id),
            None => println!("Telegram:          not configured, alerts are logged only"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        for (name, low, high) in [
            ("VIX", t.vix_low, t.vix_high),
            ("IVP", t.ivp_low, t.ivp_high),
            ("VWAP_FACTOR", t.vwap_factor_low, t.vwap_factor_high),
        ] {
            if low > high {
                return Err(ConfigError::InvertedBand { name, low, high });
            }
        }
        if t.vwap_factor_low <= 0.0 || t.vwap_factor_high <= 0.0 {
            return Err(ConfigError::NonPositiveFactor {
                low: t.vwap_factor_low,
                high: t.vwap_factor_high,
            });
        }
        if self.lookback == 0 {
            return Err(ConfigError::EmptyLookback);
        }
        if !(1..=2).contains(&self.expiry_count) {
            return Err(ConfigError::ExpiryCount(self.expiry_count));
        }
        let w = &self.trading_window;
        if w.open >= w.close {
            return Err(ConfigError::InvertedTradingWindow {
                open: w.open,
                close: w.close,
            });
        }
        Ok(())
    }
}

// ── Env helpers ──────────────────────────────────────────────────────

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn str(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parsed<T: std::str::FromStr>(&self, name: &str, default: T, expected: &'static str) -> Result<T, ConfigError> {
        match self.str(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
                expected,
            }),
        }
    }

    fn f64(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        self.parsed(name, default, "number")
    }

    fn usize(&self, name: &str, default: usize) -> Result<usize, ConfigError> {
        self.parsed(name, default, "non-negative integer")
    }

    fn bool(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.str(name) {
            None => Ok(default),
            Some(value) => match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Ok(true),
                "0" | "false" | "no" | "n" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    value,
                    expected: "boolean",
                }),
            },
        }
    }

    fn time(&self, name: &str, default: NaiveTime) -> Result<NaiveTime, ConfigError> {
        match self.str(name) {
            None => Ok(default),
            Some(value) => NaiveTime::parse_from_str(&value, "%H:%M").map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
                expected: "HH:MM time",
            }),
        }
    }
}
