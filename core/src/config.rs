//! Game configuration — tuning and chatbot settings loaded from `data/`.
//!
//! RULE: Every tunable number lives here or in the struct it tunes.
//! Subsystems read their section; they never hard-code a balance value.
//!
//! Chatbot settings are layered, lowest priority first:
//!   built-in defaults < `chatbot.json` < `api_key.txt` < environment.

use crate::{
    chase::ChaseParams,
    chatbot::Provider,
    error::{GameError, GameResult},
    haircut::HaircutConfig,
    lineup::LineupPolicy,
    types::Seconds,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Read and parse one JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &str) -> GameResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| GameError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

// ── Session tuning ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_customers:              usize,
    pub starting_reputation:        u8,
    pub max_reputation:             u8,
    pub max_dialogues_per_customer: u32,
    /// Ask the chatbot for replies instead of the customer's own lines.
    pub use_chatbot:                bool,
    pub lineup_policy:              LineupPolicy,
    /// Chance of a player hunch after each reply from the suspect.
    pub hunch_chance:               f64,
    pub arrival_delay_secs:         Seconds,
    pub accusation_beat_secs:       Seconds,
    pub getaway_beat_secs:          Seconds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_customers:              5,
            starting_reputation:        3,
            max_reputation:             5,
            max_dialogues_per_customer: 5,
            use_chatbot:                true,
            lineup_policy:              LineupPolicy::Clamp,
            hunch_chance:               0.75,
            arrival_delay_secs:         1.5,
            accusation_beat_secs:       2.0,
            getaway_beat_secs:          2.0,
        }
    }
}

impl SessionConfig {
    /// Local replies only, and a hunch after every qualifying reply.
    pub fn default_test() -> Self {
        Self {
            use_chatbot:  false,
            hunch_chance: 1.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> GameResult<()> {
        if self.max_customers == 0 {
            return Err(GameError::InvalidConfig("session.max_customers must be positive".into()));
        }
        if self.starting_reputation == 0 || self.starting_reputation > self.max_reputation {
            return Err(GameError::InvalidConfig(format!(
                "session.starting_reputation {} must be in 1..={}",
                self.starting_reputation, self.max_reputation
            )));
        }
        if !(0.0..=1.0).contains(&self.hunch_chance) {
            return Err(GameError::InvalidConfig("session.hunch_chance must be in [0, 1]".into()));
        }
        for (name, secs) in [
            ("arrival_delay_secs", self.arrival_delay_secs),
            ("accusation_beat_secs", self.accusation_beat_secs),
            ("getaway_beat_secs", self.getaway_beat_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(GameError::InvalidConfig(format!("session.{name} must be >= 0")));
            }
        }
        Ok(())
    }
}

// ── Chatbot settings ───────────────────────────────────────────────

pub const ENV_API_KEY: &str = "UNDERCOVER_BARBER_API_KEY";
pub const ENV_PROVIDER: &str = "UNDERCOVER_BARBER_PROVIDER";
pub const ENV_ENDPOINT: &str = "UNDERCOVER_BARBER_ENDPOINT";
pub const ENV_MODEL: &str = "UNDERCOVER_BARBER_MODEL";
pub const ENV_TEMPERATURE: &str = "UNDERCOVER_BARBER_TEMPERATURE";
pub const ENV_MAX_TOKENS: &str = "UNDERCOVER_BARBER_MAX_TOKENS";
pub const ENV_MIN_REQUEST_INTERVAL: &str = "UNDERCOVER_BARBER_MIN_REQUEST_INTERVAL";
pub const ENV_USE_FALLBACK: &str = "UNDERCOVER_BARBER_USE_FALLBACK";

/// Key value shipped in sample configs. Treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

pub const API_KEY_FILE: &str = "api_key.txt";
pub const CHATBOT_FILE: &str = "chatbot.json";

const DEFAULT_SYSTEM_PROMPT: &str = "You are playing a character in a barbershop game.\n\
You are a customer getting a haircut from an undercover cop (the player).\n\
Stay in character based on the personality provided.\n\
Keep responses short (1-3 sentences) and conversational.\n\
Never break character or mention that you're an AI.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotConfig {
    pub provider:              Provider,
    /// Never serialized back out.
    #[serde(skip)]
    pub api_key:               Option<String>,
    pub endpoint:              String,
    pub model:                 String,
    pub temperature:           f64,
    pub max_tokens:            u32,
    pub system_prompt:         String,
    /// Minimum seconds between two requests.
    pub min_request_interval:  Seconds,
    pub use_fallback_on_error: bool,
    pub request_timeout_secs:  Seconds,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            provider:              Provider::OpenAi,
            api_key:               None,
            endpoint:              Provider::OpenAi.default_endpoint().to_string(),
            model:                 "gpt-3.5-turbo".into(),
            temperature:           0.8,
            max_tokens:            150,
            system_prompt:         DEFAULT_SYSTEM_PROMPT.into(),
            min_request_interval:  1.0,
            use_fallback_on_error: true,
            request_timeout_secs:  10.0,
        }
    }
}

/// Partial chatbot settings as found in `chatbot.json`.
/// Absent keys leave the lower layer untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatbotOverlay {
    pub provider:              Option<String>,
    pub api_key:               Option<String>,
    pub endpoint:              Option<String>,
    pub model:                 Option<String>,
    pub temperature:           Option<f64>,
    pub max_tokens:            Option<u32>,
    pub system_prompt:         Option<String>,
    pub min_request_interval:  Option<Seconds>,
    pub use_fallback_on_error: Option<bool>,
    pub request_timeout_secs:  Option<Seconds>,
}

fn usable_key(key: &str) -> Option<String> {
    let key = key.trim();
    (!key.is_empty() && key != PLACEHOLDER_API_KEY).then(|| key.to_string())
}

impl ChatbotConfig {
    /// True when a real API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().and_then(usable_key).is_some()
    }

    /// Build the full layered configuration from a data directory.
    /// A broken `chatbot.json` is logged and skipped, never fatal.
    pub fn load_layered(data_dir: &str) -> Self {
        let mut config = Self::default();

        let file = format!("{data_dir}/{CHATBOT_FILE}");
        if Path::new(&file).exists() {
            match read_json::<ChatbotOverlay>(&file) {
                Ok(overlay) => {
                    config.apply_overlay(overlay);
                    log::info!("Chatbot config loaded from {file}");
                }
                Err(e) => log::warn!("Failed to parse chatbot config: {e}"),
            }
        }

        if let Some(key) = Self::load_api_key_file(data_dir) {
            config.api_key = Some(key);
        }

        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Apply the file layer. A provider switches to its own endpoint unless
    /// the file names one.
    pub fn apply_overlay(&mut self, overlay: ChatbotOverlay) {
        if let Some(provider) = overlay.provider.as_deref() {
            match provider.parse::<Provider>() {
                Ok(p) => {
                    self.provider = p;
                    if let Some(endpoint) = p.known_endpoint() {
                        self.endpoint = endpoint.to_string();
                    }
                }
                Err(e) => log::warn!("Ignoring chatbot provider: {e}"),
            }
        }
        if let Some(key) = overlay.api_key.as_deref().and_then(usable_key) {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = overlay.endpoint.filter(|s| !s.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(model) = overlay.model.filter(|s| !s.trim().is_empty()) {
            self.model = model;
        }
        if let Some(t) = overlay.temperature.filter(|t| *t >= 0.0) {
            self.temperature = t;
        }
        if let Some(n) = overlay.max_tokens.filter(|n| *n > 0) {
            self.max_tokens = n;
        }
        if let Some(prompt) = overlay.system_prompt.filter(|s| !s.trim().is_empty()) {
            self.system_prompt = prompt;
        }
        if let Some(secs) = overlay.min_request_interval {
            self.min_request_interval = secs.max(0.0);
        }
        if let Some(flag) = overlay.use_fallback_on_error {
            self.use_fallback_on_error = flag;
        }
        if let Some(secs) = overlay.request_timeout_secs.filter(|s| *s > 0.0) {
            self.request_timeout_secs = secs;
        }
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    /// Setting the provider also resets the endpoint to that provider's
    /// default, unless an endpoint override is given as well.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY).as_deref().and_then(usable_key) {
            self.api_key = Some(key);
            log::info!("Chatbot API key loaded from environment");
        }
        if let Some(raw) = get(ENV_PROVIDER) {
            match raw.parse::<Provider>() {
                Ok(provider) => {
                    self.provider = provider;
                    if let Some(endpoint) = provider.known_endpoint() {
                        self.endpoint = endpoint.to_string();
                    }
                }
                Err(e) => log::warn!("Ignoring {ENV_PROVIDER}: {e}"),
            }
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model = model;
        }
        if let Some(t) = parse_env(ENV_TEMPERATURE, get(ENV_TEMPERATURE)) {
            self.temperature = t;
        }
        if let Some(n) = parse_env(ENV_MAX_TOKENS, get(ENV_MAX_TOKENS)) {
            self.max_tokens = n;
        }
        if let Some(secs) = parse_env::<f64>(ENV_MIN_REQUEST_INTERVAL, get(ENV_MIN_REQUEST_INTERVAL)) {
            self.min_request_interval = secs.max(0.0);
        }
        if let Some(flag) = parse_env(ENV_USE_FALLBACK, get(ENV_USE_FALLBACK)) {
            self.use_fallback_on_error = flag;
        }
    }

    /// Read `api_key.txt` from the data directory, trimmed.
    pub fn load_api_key_file(data_dir: &str) -> Option<String> {
        let path = format!("{data_dir}/{API_KEY_FILE}");
        if !Path::new(&path).exists() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let key = usable_key(&content);
                if key.is_some() {
                    log::info!("Chatbot API key loaded from {path}");
                }
                key
            }
            Err(e) => {
                log::warn!("Failed to read API key file {path}: {e}");
                None
            }
        }
    }

    /// Write `api_key.txt` into the data directory.
    pub fn save_api_key_file(data_dir: &str, api_key: &str) -> GameResult<()> {
        let path = format!("{data_dir}/{API_KEY_FILE}");
        std::fs::write(&path, api_key.trim()).map_err(|source| GameError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("API key saved to {path}");
        Ok(())
    }

    pub fn validate(&self) -> GameResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(GameError::InvalidConfig("chatbot.endpoint is empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GameError::InvalidConfig("chatbot.temperature must be in [0, 2]".into()));
        }
        if self.max_tokens == 0 {
            return Err(GameError::InvalidConfig("chatbot.max_tokens must be positive".into()));
        }
        if self.request_timeout_secs <= 0.0 {
            return Err(GameError::InvalidConfig("chatbot.request_timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {name}: cannot parse '{raw}'");
            None
        }
    }
}

// ── Whole-game configuration ───────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct TuningFile {
    #[serde(default)]
    session:      SessionConfig,
    #[serde(default = "ChaseParams::street")]
    street_chase: ChaseParams,
    #[serde(default = "ChaseParams::car")]
    car_chase:    ChaseParams,
    #[serde(default)]
    haircut:      HaircutConfig,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub session:      SessionConfig,
    pub street_chase: ChaseParams,
    pub car_chase:    ChaseParams,
    pub haircut:      HaircutConfig,
    pub chatbot:      ChatbotConfig,
}

impl GameConfig {
    /// Load from the data/ directory.
    /// In tests, use GameConfig::default_test().
    pub fn load(data_dir: &str) -> GameResult<Self> {
        let tuning: TuningFile = read_json(&format!("{data_dir}/tuning.json"))?;
        let config = Self {
            session:      tuning.session,
            street_chase: tuning.street_chase,
            car_chase:    tuning.car_chase,
            haircut:      tuning.haircut,
            chatbot:      ChatbotConfig::load_layered(data_dir),
        };
        config.validate()?;
        log::info!(
            "Config loaded: {} customers, chatbot {} ({})",
            config.session.max_customers,
            if config.chatbot.is_configured() { "configured" } else { "offline" },
            config.chatbot.provider
        );
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            session:      SessionConfig::default_test(),
            street_chase: ChaseParams::street(),
            car_chase:    ChaseParams::car(),
            haircut:      HaircutConfig::default(),
            chatbot:      ChatbotConfig::default(),
        }
    }

    pub fn validate(&self) -> GameResult<()> {
        self.session.validate()?;
        self.street_chase.validate("street_chase")?;
        self.car_chase.validate("car_chase")?;
        if self.car_chase.boost_cooldown <= 0.0 {
            log::warn!("car_chase.boost_cooldown is zero; nitro can fire every tick");
        }
        self.haircut.validate()?;
        self.chatbot.validate()
    }
}
