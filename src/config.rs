use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use crate::animation::DEFAULT_STEP_DURATION;
use crate::model::Rgb;
use crate::picking::DEFAULT_CLICK_THRESHOLD_PX;
use crate::renderer::DEFAULT_BACKGROUND;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub viewer: ViewerConfig,
    pub report: ReportConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            viewer: ViewerConfig::from_env(),
            report: ReportConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "STUFFING_VIZ_API_HOST";
    const PORT_VAR: &'static str = "STUFFING_VIZ_API_PORT";

    fn from_env() -> Self {
        let host_value = env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                log::warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    log::warn!(
                        "⚠️ {} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    log::warn!(
                        "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Interactive viewer and capture settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub step_duration: Duration,
    pub capture_width: u32,
    pub capture_height: u32,
    pub click_threshold_px: f64,
    pub background: Rgb,
}

impl ViewerConfig {
    pub const DEFAULT_CAPTURE_WIDTH: u32 = 1920;
    pub const DEFAULT_CAPTURE_HEIGHT: u32 = 1080;

    const STEP_DURATION_VAR: &'static str = "STUFFING_VIZ_STEP_DURATION_MS";
    const CAPTURE_WIDTH_VAR: &'static str = "STUFFING_VIZ_CAPTURE_WIDTH";
    const CAPTURE_HEIGHT_VAR: &'static str = "STUFFING_VIZ_CAPTURE_HEIGHT";
    const CLICK_THRESHOLD_VAR: &'static str = "STUFFING_VIZ_CLICK_THRESHOLD_PX";
    const BACKGROUND_VAR: &'static str = "STUFFING_VIZ_BACKGROUND";

    /// Creates a builder for custom viewer settings.
    pub fn builder() -> ViewerConfigBuilder {
        ViewerConfigBuilder::default()
    }

    fn from_env() -> Self {
        let step_ms = load_f64_with_warning(
            Self::STEP_DURATION_VAR,
            DEFAULT_STEP_DURATION.as_millis() as f64,
            |value| value > 0.0,
            "must be greater than 0",
        );
        let capture_width = load_u32_with_warning(
            Self::CAPTURE_WIDTH_VAR,
            Self::DEFAULT_CAPTURE_WIDTH,
        );
        let capture_height = load_u32_with_warning(
            Self::CAPTURE_HEIGHT_VAR,
            Self::DEFAULT_CAPTURE_HEIGHT,
        );
        let click_threshold_px = load_f64_with_warning(
            Self::CLICK_THRESHOLD_VAR,
            DEFAULT_CLICK_THRESHOLD_PX,
            |value| value >= 0.0,
            "must not be negative",
        );
        let background = match env_string(Self::BACKGROUND_VAR) {
            Some(raw) => Rgb::from_hex(&raw).unwrap_or_else(|err| {
                log::warn!(
                    "⚠️ {} is not a color: {}. Using {}.",
                    Self::BACKGROUND_VAR,
                    err,
                    DEFAULT_BACKGROUND
                );
                DEFAULT_BACKGROUND
            }),
            None => DEFAULT_BACKGROUND,
        };

        Self::builder()
            .step_duration(Duration::from_secs_f64(step_ms / 1000.0))
            .capture_size(capture_width, capture_height)
            .click_threshold_px(click_threshold_px)
            .background(background)
            .build()
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            step_duration: DEFAULT_STEP_DURATION,
            capture_width: Self::DEFAULT_CAPTURE_WIDTH,
            capture_height: Self::DEFAULT_CAPTURE_HEIGHT,
            click_threshold_px: DEFAULT_CLICK_THRESHOLD_PX,
            background: DEFAULT_BACKGROUND,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ViewerConfigBuilder {
    config: ViewerConfig,
}

impl ViewerConfigBuilder {
    pub fn step_duration(mut self, duration: Duration) -> Self {
        self.config.step_duration = duration;
        self
    }

    /// Sets the fixed capture resolution used for snapshots and the report.
    pub fn capture_size(mut self, width: u32, height: u32) -> Self {
        self.config.capture_width = width;
        self.config.capture_height = height;
        self
    }

    pub fn click_threshold_px(mut self, threshold: f64) -> Self {
        self.config.click_threshold_px = threshold;
        self
    }

    pub fn background(mut self, color: Rgb) -> Self {
        self.config.background = color;
        self
    }

    pub fn build(self) -> ViewerConfig {
        self.config
    }
}

/// Defaults for generated reports.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    pub title: String,
    pub company_name: String,
    pub include_screenshot: bool,
}

impl ReportConfig {
    pub const DEFAULT_TITLE: &'static str = "STUFFING RESULT";
    pub const DEFAULT_COMPANY_NAME: &'static str = "Load Stuffing Visualization";

    const COMPANY_NAME_VAR: &'static str = "STUFFING_VIZ_COMPANY_NAME";
    const SCREENSHOT_VAR: &'static str = "STUFFING_VIZ_REPORT_SCREENSHOT";

    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    fn from_env() -> Self {
        let mut builder = Self::builder();
        if let Some(name) = env_string(Self::COMPANY_NAME_VAR) {
            builder = builder.company_name(name);
        }
        if let Some(flag) =
            env_string(Self::SCREENSHOT_VAR).and_then(|raw| parse_bool(&raw, Self::SCREENSHOT_VAR))
        {
            builder = builder.include_screenshot(flag);
        }
        builder.build()
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_string(),
            company_name: Self::DEFAULT_COMPANY_NAME.to_string(),
            include_screenshot: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn company_name(mut self, name: impl Into<String>) -> Self {
        self.config.company_name = name.into();
        self
    }

    pub fn include_screenshot(mut self, include: bool) -> Self {
        self.config.include_screenshot = include;
        self
    }

    pub fn build(self) -> ReportConfig {
        self.config
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            log::warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name,
                err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            log::warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn parse_f64(
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    var_name: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => value,
        Ok(_) => {
            log::warn!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name,
                raw,
                invalid_hint,
                default
            );
            default
        }
        Err(err) => {
            log::warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64(&raw, default, validator, invalid_hint, var_name),
        None => default,
    }
}

fn parse_u32(raw: &str, default: u32, var_name: &str) -> u32 {
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => value,
        Ok(_) => {
            log::warn!("⚠️ {} must be greater than 0. Using {}.", var_name, default);
            default
        }
        Err(err) => {
            log::warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

fn load_u32_with_warning(var_name: &str, default: u32) -> u32 {
    match env_string(var_name) {
        Some(raw) => parse_u32(&raw, default, var_name),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        assert_eq!(parse_bool("1", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("true", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("y", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("on", "TEST_VAR"), Some(true));

        // Test case insensitivity
        assert_eq!(parse_bool("TRUE", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("Yes", "TEST_VAR"), Some(true));

        // Test with whitespace
        assert_eq!(parse_bool(" true ", "TEST_VAR"), Some(true));
    }

    #[test]
    fn test_parse_bool_false_values() {
        assert_eq!(parse_bool("0", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("false", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("no", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("n", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("OFF", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("  0  ", "TEST_VAR"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_f64_falls_back_on_invalid_input() {
        let positive = |value: f64| value > 0.0;
        assert_eq!(parse_f64("250", 500.0, positive, "must be > 0", "T"), 250.0);
        assert_eq!(parse_f64("-1", 500.0, positive, "must be > 0", "T"), 500.0);
        assert_eq!(parse_f64("NaN", 500.0, positive, "must be > 0", "T"), 500.0);
        assert_eq!(parse_f64("fast", 500.0, positive, "must be > 0", "T"), 500.0);
    }

    #[test]
    fn test_parse_u32_rejects_zero() {
        assert_eq!(parse_u32("1280", 1920, "T"), 1280);
        assert_eq!(parse_u32("0", 1920, "T"), 1920);
        assert_eq!(parse_u32("-4", 1920, "T"), 1920);
    }

    #[test]
    fn test_builders_start_from_defaults() {
        let viewer = ViewerConfig::builder().capture_size(640, 480).build();
        assert_eq!(viewer.capture_width, 640);
        assert_eq!(viewer.step_duration, Duration::from_millis(500));
        assert_eq!(viewer.click_threshold_px, 5.0);
        assert_eq!(viewer.background, Rgb::new(0x1a, 0x1a, 0x1a));

        let report = ReportConfig::builder().company_name("ACME").build();
        assert_eq!(report.company_name, "ACME");
        assert_eq!(report.title, ReportConfig::DEFAULT_TITLE);
        assert!(report.include_screenshot);
    }
}
