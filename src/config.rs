//! Board configuration with JSON persistence and hot-reload watching.
//!
//! Every empirically chosen number the pipelines use (batch size, damping
//! thresholds, tick timings, relay timeouts) lives here so it can be tuned
//! without a rebuild. Missing fields fall back to [`crate::constants`].

use crate::constants::*;
use crate::error::ConfigError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::time::Duration;
use tracing::{debug, warn};

/// One network relay in the fallback chain.
///
/// `template` contains `{url}` (percent-encoded target) or `{raw}` (target
/// as-is). Relays flagged `json_contents` wrap the page in a JSON envelope
/// whose `contents` field holds the HTML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySpec {
    pub template: String,
    #[serde(default)]
    pub json_contents: bool,
}

impl RelaySpec {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            json_contents: false,
        }
    }

    pub fn json(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            json_contents: true,
        }
    }

    /// Relay URL for the given target.
    pub fn url_for(&self, target: &str) -> String {
        self.template
            .replace("{url}", &urlencoding::encode(target))
            .replace("{raw}", target)
    }
}

pub fn default_relays() -> Vec<RelaySpec> {
    vec![
        RelaySpec::json("https://api.allorigins.win/get?url={url}"),
        RelaySpec::new("https://corsproxy.io/?{url}"),
        RelaySpec::new("https://api.codetabs.com/v1/proxy?quest={url}"),
        RelaySpec::new("https://cors-anywhere.herokuapp.com/{raw}"),
    ]
}

/// Enhancement service connection settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the env var holding the API key
    pub api_key_env: String,
    pub max_tokens: u32,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 4000,
        }
    }
}

/// Tunables for the card pipelines and layout feedback loop
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub batch_size: usize,
    pub batch_yield_ms: u64,
    pub stage_start_delay_ms: u64,
    pub page_size: usize,
    pub damping_threshold: f32,
    pub link_damping_threshold: f32,
    pub enhance_tick_ms: u64,
    pub enhance_tick_step: u8,
    pub enhance_tick_cap: u8,
    pub enhance_timeout_ms: u64,
    pub relay_timeout_ms: u64,
    pub relays: Vec<RelaySpec>,
    pub placement_gap: f32,
    pub recenter_fraction: f32,
    pub camera_padding: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub camera_animation_ms: u64,
    pub enhancer: EnhancerConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            batch_size: STREAM_BATCH_SIZE,
            batch_yield_ms: STREAM_YIELD_MS,
            stage_start_delay_ms: STAGE_START_DELAY_MS,
            page_size: TABLE_PAGE_SIZE,
            damping_threshold: DEFAULT_DAMPING_THRESHOLD,
            link_damping_threshold: LINK_DAMPING_THRESHOLD,
            enhance_tick_ms: ENHANCE_TICK_MS,
            enhance_tick_step: ENHANCE_TICK_STEP,
            enhance_tick_cap: ENHANCE_TICK_CAP,
            enhance_timeout_ms: ENHANCE_TIMEOUT_MS,
            relay_timeout_ms: RELAY_ATTEMPT_TIMEOUT_MS,
            relays: default_relays(),
            placement_gap: PLACEMENT_GAP,
            recenter_fraction: RECENTER_FRACTION,
            camera_padding: CAMERA_PADDING,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            camera_animation_ms: CAMERA_ANIMATION_MS,
            enhancer: EnhancerConfig::default(),
        }
    }
}

impl BoardConfig {
    /// Load from the default path, falling back to defaults on any problem.
    pub fn load() -> Self {
        match default_config_path() {
            Ok(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            }),
            Ok(_) => Self::default(),
            Err(e) => {
                debug!("{e}, using default config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config.normalized())
    }

    /// Replace values the pipelines cannot run with (zero sizes, negative or
    /// non-finite distances, an inverted zoom range, relays without a target
    /// placeholder) by their defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();

        if self.batch_size == 0 {
            warn!("batch_size must be positive, using {}", defaults.batch_size);
            self.batch_size = defaults.batch_size;
        }
        if self.page_size == 0 {
            warn!("page_size must be positive, using {}", defaults.page_size);
            self.page_size = defaults.page_size;
        }
        if self.enhance_tick_ms == 0 {
            self.enhance_tick_ms = defaults.enhance_tick_ms;
        }
        self.enhance_tick_cap = self.enhance_tick_cap.min(100);

        for (name, value, default) in [
            ("damping_threshold", &mut self.damping_threshold, defaults.damping_threshold),
            ("link_damping_threshold", &mut self.link_damping_threshold, defaults.link_damping_threshold),
            ("placement_gap", &mut self.placement_gap, defaults.placement_gap),
            ("recenter_fraction", &mut self.recenter_fraction, defaults.recenter_fraction),
            ("camera_padding", &mut self.camera_padding, defaults.camera_padding),
        ] {
            if !value.is_finite() || *value < 0.0 {
                warn!("{name} must be a non-negative number, using {default}");
                *value = default;
            }
        }

        let zoom_ok = |z: f32| z.is_finite() && z > 0.0;
        if !zoom_ok(self.min_zoom) || !zoom_ok(self.max_zoom) {
            warn!("zoom range must be positive, using {}..{}", defaults.min_zoom, defaults.max_zoom);
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        } else if self.min_zoom > self.max_zoom {
            warn!("min_zoom {} exceeds max_zoom {}, swapping", self.min_zoom, self.max_zoom);
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }

        self.relays.retain(|relay| {
            let usable = relay.template.contains("{url}") || relay.template.contains("{raw}");
            if !usable {
                warn!("Ignoring relay without {{url}} or {{raw}}: {}", relay.template);
            }
            usable
        });
        self
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Damping threshold for the given card kind.
    pub fn damping_for(&self, kind: crate::types::CardKind) -> f32 {
        match kind {
            crate::types::CardKind::LinkPreview => self.link_damping_threshold,
            _ => self.damping_threshold,
        }
    }

    pub fn batch_yield(&self) -> Duration {
        Duration::from_millis(self.batch_yield_ms)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }
}

/// `<config_dir>/cardboard/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|d| d.join("cardboard").join("config.json"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Change reported by [`ConfigWatcher::poll`]
#[derive(Debug)]
pub enum ConfigEvent {
    Modified,
    Created,
    Deleted,
    Error(String),
}

/// Watches the config file so the embedder can reload it.
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Result<Self, ConfigError> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        // Watch the parent so delete-and-recreate saves are still seen
        let target = path.parent().unwrap_or(&path).to_path_buf();
        watcher.watch(&target, RecursiveMode::NonRecursive)?;
        Ok(Self {
            path,
            _watcher: watcher,
            rx,
        })
    }

    /// Next pending event for the watched file, if any.
    pub fn poll(&mut self) -> Option<ConfigEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    if !event.paths.iter().any(|p| p == &self.path) {
                        continue;
                    }
                    return match event.kind {
                        EventKind::Create(_) => Some(ConfigEvent::Created),
                        EventKind::Modify(_) => Some(ConfigEvent::Modified),
                        EventKind::Remove(_) => Some(ConfigEvent::Deleted),
                        _ => continue,
                    };
                }
                Ok(Err(e)) => return Some(ConfigEvent::Error(e.to_string())),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }
}
