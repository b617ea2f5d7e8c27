use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use supports_color::Stream;
use tracing::warn;

use crate::bootstrap::{BootstrapOptions, Preset};
use crate::dataset::LabelTable;
use crate::mark::{MarkKind, DEFAULT_GROUP_KEY};
use crate::preview::PreviewOptions;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string with comments.
    /// All fields are commented out so defaults are used, but users can uncomment to override
    pub fn generate_default_config(&self) -> String {
        let config = AppConfig::default();
        let toml_str = match toml::to_string_pretty(&config) {
            Ok(s) => s,
            Err(e) => return format!("# Failed to serialize default config: {}\n", e),
        };

        let comments = Self::collect_all_comments();
        Self::comment_all_fields(toml_str, comments)
    }

    /// Collect all field comments from struct constants into a map
    fn collect_all_comments() -> HashMap<String, String> {
        let mut comments = HashMap::new();

        for (field, comment) in APP_COMMENTS {
            comments.insert(field.to_string(), comment.to_string());
        }
        for (field, comment) in FETCH_COMMENTS {
            comments.insert(format!("fetch.{}", field), comment.to_string());
        }
        for (field, comment) in PLOT_COMMENTS {
            comments.insert(format!("plot.{}", field), comment.to_string());
        }
        for (field, comment) in TOOLTIP_COMMENTS {
            comments.insert(format!("tooltip.{}", field), comment.to_string());
        }
        for (field, comment) in PRESET_COMMENTS {
            comments.insert(format!("presets.{}", field), comment.to_string());
        }
        for (field, comment) in COLOR_COMMENTS {
            comments.insert(format!("theme.colors.{}", field), comment.to_string());
        }
        for (field, comment) in DEBUG_COMMENTS {
            comments.insert(format!("debug.{}", field), comment.to_string());
        }

        comments
    }

    /// Comment out all fields in TOML and add comments
    fn comment_all_fields(toml: String, comments: HashMap<String, String>) -> String {
        let mut result = String::new();
        result.push_str("# datasette-plot configuration file\n");
        result
            .push_str("# This file uses TOML format. See https://toml.io/ for syntax reference.\n");
        result.push('\n');

        let mut current_section = String::new();
        let mut seen_sections: Vec<String> = Vec::new();

        for line in toml.lines() {
            if let Some(section) = Self::extract_section_name(line) {
                // Array-of-tables headers repeat; describe them once.
                if !seen_sections.contains(&section) {
                    if let Some(header) = SECTION_HEADERS.iter().find(|(s, _)| *s == section) {
                        result.push_str(header.1);
                        result.push('\n');
                    }
                    seen_sections.push(section.clone());
                }
                current_section = section;

                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
                continue;
            }

            if let Some(field_path) = Self::extract_field_path_simple(line, &current_section) {
                if let Some(comment) = comments.get(&field_path) {
                    for comment_line in comment.lines() {
                        result.push_str("# ");
                        result.push_str(comment_line);
                        result.push('\n');
                    }
                }
                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
            } else if line.trim().is_empty() {
                result.push('\n');
            } else {
                // Continuation of a multi-line value
                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
            }
        }

        result
    }

    /// Extract section name from TOML line like "[plot]", "[theme.colors]" or "[[presets]]"
    fn extract_section_name(line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.contains('=') {
            Some(
                trimmed
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .to_string(),
            )
        } else {
            None
        }
    }

    /// Extract field path from a line (simpler version)
    fn extract_field_path_simple(line: &str, current_section: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
            return None;
        }

        let eq_pos = trimmed.find('=')?;
        let field_name = trimmed[..eq_pos].trim();
        if current_section.is_empty() {
            Some(field_name.to_string())
        } else {
            Some(format!("{}.{}", current_section, field_name))
        }
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;

        let template = self.generate_default_config();
        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub fetch: FetchConfig,
    pub plot: PlotConfig,
    /// Column id -> display label, on top of the built-in table
    pub labels: BTreeMap<String, String>,
    pub tooltip: TooltipConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
    pub presets: Vec<Preset>,
}

// Field comments for AppConfig (top-level fields)
const APP_COMMENTS: &[(&str, &str)] = &[(
    "version",
    "Configuration format version (for future compatibility)",
)];

// Section header comments
const SECTION_HEADERS: &[(&str, &str)] = &[
    (
        "fetch",
        "# ============================================================================\n# Data Fetch\n# ============================================================================",
    ),
    (
        "plot",
        "# ============================================================================\n# Plot Defaults\n# ============================================================================",
    ),
    (
        "labels",
        "# ============================================================================\n# Column Labels\n# ============================================================================\n# Display names for column ids, e.g. ttlt_p50 = \"Time to last token (seconds, P50)\".\n# Entries here override the built-in table.",
    ),
    (
        "tooltip",
        "# ============================================================================\n# Tooltips\n# ============================================================================",
    ),
    (
        "theme",
        "# ============================================================================\n# Color Theme\n# ============================================================================",
    ),
    (
        "theme.colors",
        "# Color definitions\n# Supported formats:\n#   - Named colors: \"red\", \"blue\", \"bright_red\", \"dark_gray\", etc. (case-insensitive)\n#   - Hex colors: \"#ff0000\" or \"#FF0000\" (case-insensitive)\n#   - Indexed colors: \"indexed(0-255)\" for specific xterm 256-color palette entries\n# Colors automatically adapt to your terminal's capabilities",
    ),
    (
        "debug",
        "# ============================================================================\n# Debug Settings\n# ============================================================================",
    ),
    (
        "presets",
        "# ============================================================================\n# Sample Visualizations\n# ============================================================================\n# Offered on pages whose host equals `host` and whose query contains `contains`.\n# Press the preset's number to open it.",
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub page_size: String,
}

const FETCH_COMMENTS: &[(&str, &str)] = &[
    ("timeout_secs", "Request timeout for the data fetch, in seconds"),
    (
        "page_size",
        "Value for _size when the page URL has none (\"max\" or a row count)",
    ),
];

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            page_size: "max".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn merge(&mut self, other: Self) {
        let default = FetchConfig::default();
        if other.timeout_secs != default.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
        if other.page_size != default.page_size {
            self.page_size = other.page_size;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    pub legend: bool,
    pub group_key: String,
    pub default_mark: MarkKind,
    pub default_x: String,
    pub default_y: String,
}

const PLOT_COMMENTS: &[(&str, &str)] = &[
    ("width", "Exported plot width in pixels"),
    ("height", "Exported plot height in pixels"),
    ("legend", "Show the colour legend"),
    (
        "group_key",
        "Constant colour channel used when a mark has no fill column",
    ),
    (
        "default_mark",
        "Mark shown when the URL has no _plot-mark: \"dot\", \"bar-y\" or \"line-y\"",
    ),
    ("default_x", "X column of the default mark"),
    ("default_y", "Y column of the default mark"),
];

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
            legend: true,
            group_key: DEFAULT_GROUP_KEY.to_string(),
            default_mark: MarkKind::LineY,
            default_x: "completed_request_rate".to_string(),
            default_y: "ttlt_p50".to_string(),
        }
    }
}

impl PlotConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PlotConfig::default();
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.legend != default.legend {
            self.legend = other.legend;
        }
        if other.group_key != default.group_key {
            self.group_key = other.group_key;
        }
        if other.default_mark != default.default_mark {
            self.default_mark = other.default_mark;
        }
        if other.default_x != default.default_x {
            self.default_x = other.default_x;
        }
        if other.default_y != default.default_y {
            self.default_y = other.default_y;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TooltipConfig {
    /// (label, column id) pairs shown for points
    pub channels: Vec<(String, String)>,
}

const TOOLTIP_COMMENTS: &[(&str, &str)] = &[(
    "channels",
    "Tooltip rows for point marks\nFormat: [[\"Label\", \"column_id\"], ...]. Columns missing from the data are skipped",
)];

impl Default for TooltipConfig {
    fn default() -> Self {
        let pair = |l: &str, c: &str| (l.to_string(), c.to_string());
        Self {
            channels: vec![
                pair("Model", "model"),
                pair("Data", "data"),
                pair("GPU", "gpu"),
                pair("Region", "region"),
                pair("Extra vLLM args", "vllm_extra_args"),
            ],
        }
    }
}

impl TooltipConfig {
    pub fn merge(&mut self, other: Self) {
        if other != TooltipConfig::default() {
            self.channels = other.channels;
        }
    }
}

const PRESET_COMMENTS: &[(&str, &str)] = &[
    ("name", "Shown in the preset list"),
    ("url", "Absolute, or relative to the current page"),
];

const SAMPLE_HOST: &str = "jackcook--datasette.modal.run";

fn default_presets() -> Vec<Preset> {
    let preset = |name: &str, url: &str| Preset {
        name: name.to_string(),
        url: url.to_string(),
        host: SAMPLE_HOST.to_string(),
        contains: "from+benchmarks".to_string(),
    };
    vec![
        preset(
            "Show all benchmarks",
            "/stopwatch/-/query?sql=select+*+from+benchmarks&_plot-mark=%7B\"mark\"%3A\"dot\"%2C\"options\"%3A%7B\"x\"%3A\"completed_request_rate\"%2C\"y\"%3A\"ttlt_p50\"%2C\"fill\"%3A\"gpu\"%2C\"tip\"%3Afalse%7D%7D",
        ),
        preset(
            "Number of H100 GPUs vs. time-to-last-token for Llama-3.1-8B",
            "/stopwatch/-/query?sql=select+*+from+benchmarks+where+gpu+like+\"H100%25\"+and+%28vllm_extra_args+%3D+\"%5B%5D\"+or+vllm_extra_args+like+\"%25tensor-parallel-size%25\"%29+and+model+like+\"%258B%25\"+and+generated_tokens+%3D+128",
        ),
        preset(
            "KV cache utilization vs. number of generated tokens on A100-80GB",
            "/stopwatch/-/query?sql=select+*+from+benchmarks+where+gpu+%3D+\"A100-80GB\"+and+vllm_extra_args+%3D+%27%5B%5D%27&_plot-mark=%7B\"mark\"%3A\"line-y\"%2C\"options\"%3A%7B\"x\"%3A\"completed_request_rate\"%2C\"y\"%3A\"ttlt_p50\"%2C\"stroke\"%3A\"id\"%2C\"tip\"%3Afalse%2C\"hidePoints\"%3Afalse%7D%7D",
        ),
        preset(
            "GPU vs. P95 time-to-last-token",
            "/stopwatch/-/query?sql=select+*+from+benchmarks+where+generated_tokens+%3D+512+and+vllm_extra_args+%3D+%27%5B%5D%27&_plot-mark=%7B\"mark\"%3A\"line-y\"%2C\"options\"%3A%7B\"x\"%3A\"completed_request_rate\"%2C\"y\"%3A\"ttlt_p50\"%2C\"stroke\"%3A\"id\"%2C\"tip\"%3Afalse%2C\"hidePoints\"%3Afalse%7D%7D",
        ),
        preset(
            "Enable-chunked-prefill and enforce-eager vs. P50 time-to-first-token",
            "/stopwatch/-/query?sql=select+*+from+benchmarks+where+gpu+%3D+\"H100\"+and+generated_tokens+%3D+128&_plot-mark=%7B\"mark\"%3A\"bar-y\"%2C\"options\"%3A%7B\"x\"%3A\"vllm_extra_args\"%2C\"y\"%3A\"ttlt_p50\"%2C\"fill\"%3A\"vllm_extra_args\"%2C\"tip\"%3Atrue%7D%7D",
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

/// Color configuration for the application theme.
///
/// Colors can be specified as named colors ("cyan"), hex ("#ff0000") or
/// indexed ("indexed(236)").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColorConfig {
    pub keybind_hints: String,
    pub keybind_labels: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub dimmed: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub link: String,
    pub sidebar_border: String,
    pub modal_border_active: String,
    pub chart_series_color_1: String,
    pub chart_series_color_2: String,
    pub chart_series_color_3: String,
    pub chart_series_color_4: String,
    pub chart_series_color_5: String,
    pub chart_series_color_6: String,
    pub chart_series_color_7: String,
}

// Field comments for ColorConfig
const COLOR_COMMENTS: &[(&str, &str)] = &[
    ("keybind_hints", "Keys in the controls bar"),
    ("keybind_labels", "Action labels in controls bar"),
    ("controls_bg", "Controls bar and header background"),
    ("text_primary", "Primary text"),
    ("text_secondary", "Secondary text, hidden channels"),
    ("dimmed", "Dimmed elements, axis lines"),
    ("success", "Status messages"),
    ("error", "Error messages"),
    ("warning", "Partial-result banner"),
    ("link", "Share link"),
    ("sidebar_border", "Mark editor borders"),
    ("modal_border_active", "Focused field"),
    ("chart_series_color_1", "First series color"),
    ("chart_series_color_2", "Second series color"),
    ("chart_series_color_3", "Third series color"),
    ("chart_series_color_4", "Fourth series color"),
    ("chart_series_color_5", "Fifth series color"),
    ("chart_series_color_6", "Sixth series color"),
    ("chart_series_color_7", "Seventh series color"),
];

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            keybind_hints: "cyan".to_string(),
            keybind_labels: "indexed(252)".to_string(),
            controls_bg: "indexed(235)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "indexed(240)".to_string(),
            dimmed: "dark_gray".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            link: "bright_blue".to_string(),
            sidebar_border: "indexed(240)".to_string(),
            modal_border_active: "yellow".to_string(),
            chart_series_color_1: "#4269d0".to_string(),
            chart_series_color_2: "#efb118".to_string(),
            chart_series_color_3: "#ff725c".to_string(),
            chart_series_color_4: "#6cc5b0".to_string(),
            chart_series_color_5: "#3ca951".to_string(),
            chart_series_color_6: "#ff8ab7".to_string(),
            chart_series_color_7: "#a463f2".to_string(),
        }
    }
}

impl ColorConfig {
    fn entries(&self) -> [(&'static str, &String); 19] {
        [
            ("keybind_hints", &self.keybind_hints),
            ("keybind_labels", &self.keybind_labels),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("text_secondary", &self.text_secondary),
            ("dimmed", &self.dimmed),
            ("success", &self.success),
            ("error", &self.error),
            ("warning", &self.warning),
            ("link", &self.link),
            ("sidebar_border", &self.sidebar_border),
            ("modal_border_active", &self.modal_border_active),
            ("chart_series_color_1", &self.chart_series_color_1),
            ("chart_series_color_2", &self.chart_series_color_2),
            ("chart_series_color_3", &self.chart_series_color_3),
            ("chart_series_color_4", &self.chart_series_color_4),
            ("chart_series_color_5", &self.chart_series_color_5),
            ("chart_series_color_6", &self.chart_series_color_6),
            ("chart_series_color_7", &self.chart_series_color_7),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();

        macro_rules! merge_color {
            ($($field:ident),* $(,)?) => {
                $(
                    if other.$field != default.$field {
                        self.$field = other.$field;
                    }
                )*
            };
        }

        merge_color!(
            keybind_hints,
            keybind_labels,
            controls_bg,
            text_primary,
            text_secondary,
            dimmed,
            success,
            error,
            warning,
            link,
            sidebar_border,
            modal_border_active,
            chart_series_color_1,
            chart_series_color_2,
            chart_series_color_3,
            chart_series_color_4,
            chart_series_color_5,
            chart_series_color_6,
            chart_series_color_7,
        );
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        self.colors.merge(other.colors);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

// Field comments for DebugConfig
const DEBUG_COMMENTS: &[(&str, &str)] = &[("enabled", "Show the debug strip by default")];

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            fetch: FetchConfig::default(),
            plot: PlotConfig::default(),
            labels: BTreeMap::new(),
            tooltip: TooltipConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
            presets: default_presets(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_from(&ConfigManager::new(app_name)?)
    }

    /// Load with the user file from `manager`'s directory
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();

        match Self::load_user_config(manager) {
            Ok(user_config) => config.merge(user_config),
            Err(e) => warn!("ignoring user config: {}", e),
        }

        config.validate()?;

        Ok(config)
    }

    /// Load user configuration from <config_dir>/config.toml
    fn load_user_config(manager: &ConfigManager) -> Result<AppConfig> {
        let config_path = manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.fetch.merge(other.fetch);
        self.plot.merge(other.plot);
        self.labels.extend(other.labels);
        self.tooltip.merge(other.tooltip);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
        if other.presets != default_presets() {
            self.presets = other.presets;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(eyre!("timeout_secs must be greater than 0"));
        }
        if self.fetch.page_size.trim().is_empty() {
            return Err(eyre!("page_size must not be empty"));
        }

        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(eyre!("plot width and height must be greater than 0"));
        }
        if self.plot.group_key.trim().is_empty() {
            return Err(eyre!("group_key must not be empty"));
        }

        for preset in &self.presets {
            if preset.url.trim().is_empty() {
                return Err(eyre!("Preset '{}' has no url", preset.name));
            }
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }

    pub fn label_table(&self) -> LabelTable {
        LabelTable::with_overrides(&self.labels)
    }

    /// Set `plot.default_mark` from a kind id such as `"bar-y"`.
    pub fn set_default_mark(&mut self, id: &str) -> Result<()> {
        self.plot.default_mark = MarkKind::from_id(id)
            .ok_or_else(|| eyre!("Unknown mark kind '{}': expected dot, bar-y or line-y", id))?;
        Ok(())
    }

    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            width: self.plot.width,
            height: self.plot.height,
            legend: self.plot.legend,
            tooltip: self.tooltip.channels.clone(),
            labels: self.label_table(),
        }
    }

    pub fn bootstrap_options(&self) -> BootstrapOptions {
        BootstrapOptions {
            group_key: self.plot.group_key.clone(),
            default_mark: self.plot.default_mark,
            default_x: self.plot.default_x.clone(),
            default_y: self.plot.default_y.clone(),
            labels: self.label_table(),
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, indexed or named) and convert to appropriate terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        // Hex format: "#ff0000" or "#FF0000" (6-character hex)
        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        // Indexed colors: "indexed(236)" for explicit 256-color palette
        let lower = trimmed.to_lowercase();
        if lower.starts_with("indexed(") && lower.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" => Ok(Color::Indexed(8)),
            "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" | "default" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(n), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    /// Convert RGB values to appropriate terminal color based on capabilities
    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Convert RGB to nearest 256-color palette index (xterm palette)
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // Grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Number of configurable chart series colors
pub const SERIES_COLORS: usize = 7;

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let mut colors = HashMap::new();
        for (name, value) in config.colors.entries() {
            colors.insert(name.to_string(), parser.parse(value)?);
        }
        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Get a color by name, returns None if not found
    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }

    /// Color for the `index`th series, cycling through the palette
    pub fn series_color(&self, index: usize) -> Color {
        self.get(&format!("chart_series_color_{}", index % SERIES_COLORS + 1))
    }
}
