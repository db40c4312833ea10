use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::optimizer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
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
    const HOST_VAR: &'static str = "LOAD_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "LOAD_PLANNER_API_PORT";

    fn from_env() -> Self {
        let host_value = env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = env_string(Self::PORT_VAR)
            .map(|raw| Self::parse_port(&raw))
            .unwrap_or(Self::DEFAULT_PORT);
        Self::from_parts(&host_value, port)
    }

    fn from_parts(host_value: &str, port: u16) -> Self {
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value.to_string()),
            Err(err) => {
                log::warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
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

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    fn parse_port(raw: &str) -> u16 {
        match raw.parse::<u16>() {
            Ok(value) if value != 0 => value,
            Ok(_) => {
                log::warn!("{} must not be 0. Using {}.", Self::PORT_VAR, Self::DEFAULT_PORT);
                Self::DEFAULT_PORT
            }
            Err(err) => {
                log::warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    Self::PORT_VAR,
                    raw,
                    err,
                    Self::DEFAULT_PORT
                );
                Self::DEFAULT_PORT
            }
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

/// Configuration for the packing engine.
#[derive(Clone, Debug, Default)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const RESOLUTION_VAR: &'static str = "LOAD_PLANNER_HEIGHT_MAP_RESOLUTION";
    const MAX_ITERATIONS_VAR: &'static str = "LOAD_PLANNER_MAX_ITERATIONS";
    const STABILITY_THRESHOLD_VAR: &'static str = "LOAD_PLANNER_STABILITY_THRESHOLD";
    const BALANCE_TOLERANCE_VAR: &'static str = "LOAD_PLANNER_BALANCE_TOLERANCE";
    const HEIGHT_EPSILON_VAR: &'static str = "LOAD_PLANNER_HEIGHT_EPSILON";
    const SIDE_LAYING_VAR: &'static str = "LOAD_PLANNER_ALLOW_SIDE_LAYING";
    const SORT_BY_DENSITY_VAR: &'static str = "LOAD_PLANNER_SORT_BY_DENSITY";

    fn from_env() -> Self {
        let height_map_resolution = load_f64_with_warning(
            Self::RESOLUTION_VAR,
            PackingConfig::DEFAULT_HEIGHT_MAP_RESOLUTION,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted height map resolution changes candidate positions and runtime",
        );

        let max_iterations = match env_string(Self::MAX_ITERATIONS_VAR) {
            Some(raw) => parse_usize_setting(
                Self::MAX_ITERATIONS_VAR,
                &raw,
                PackingConfig::DEFAULT_MAX_ITERATIONS,
            ),
            None => PackingConfig::DEFAULT_MAX_ITERATIONS,
        };

        let stability_threshold = load_f64_with_warning(
            Self::STABILITY_THRESHOLD_VAR,
            PackingConfig::DEFAULT_STABILITY_THRESHOLD,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted stability threshold changes which boxes are reported",
        );

        let balance_tolerance = load_f64_with_warning(
            Self::BALANCE_TOLERANCE_VAR,
            PackingConfig::DEFAULT_BALANCE_TOLERANCE,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted balance tolerance changes the balance verdict",
        );

        let height_epsilon = load_f64_with_warning(
            Self::HEIGHT_EPSILON_VAR,
            PackingConfig::DEFAULT_HEIGHT_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted height tolerance may misreport support",
        );

        let allow_side_laying = env_string(Self::SIDE_LAYING_VAR)
            .and_then(|raw| parse_bool(&raw, Self::SIDE_LAYING_VAR))
            .unwrap_or(PackingConfig::DEFAULT_ALLOW_SIDE_LAYING);

        let sort_by_density = env_string(Self::SORT_BY_DENSITY_VAR)
            .and_then(|raw| parse_bool(&raw, Self::SORT_BY_DENSITY_VAR))
            .unwrap_or(PackingConfig::DEFAULT_SORT_BY_DENSITY);

        let packing = PackingConfig::builder()
            .height_map_resolution(height_map_resolution)
            .max_iterations(max_iterations)
            .stability_threshold(stability_threshold)
            .balance_tolerance(balance_tolerance)
            .height_epsilon(height_epsilon)
            .allow_side_laying(allow_side_laying)
            .sort_by_density(sort_by_density)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
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
            log::warn!("Access to {} failed: {}. Using default value.", name, err);
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
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_setting(var_name, &raw, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_f64_setting(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = (default.abs().max(1.0)) * 1e-9;
            if (value - default).abs() > tolerance {
                log::warn!("{} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            log::warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name,
                raw,
                invalid_hint,
                default
            );
            default
        }
        Err(err) => {
            log::warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

fn parse_usize_setting(var_name: &str, raw: &str, default: usize) -> usize {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => value,
        Ok(_) => {
            log::warn!("{} must be greater than 0. Using {}.", var_name, default);
            default
        }
        Err(err) => {
            log::warn!(
                "Could not parse {} ('{}') as count: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1" ; "one")]
    #[test_case("true" ; "true")]
    #[test_case("yes" ; "yes")]
    #[test_case("y" ; "y")]
    #[test_case("ON" ; "upper on")]
    #[test_case(" true " ; "padded")]
    fn parse_bool_true_values(raw: &str) {
        assert_eq!(parse_bool(raw, "TEST_VAR"), Some(true));
    }

    #[test_case("0" ; "zero")]
    #[test_case("false" ; "false")]
    #[test_case("No" ; "mixed case no")]
    #[test_case("n" ; "n")]
    #[test_case("  off  " ; "padded off")]
    fn parse_bool_false_values(raw: &str) {
        assert_eq!(parse_bool(raw, "TEST_VAR"), Some(false));
    }

    #[test_case("invalid" ; "word")]
    #[test_case("2" ; "number")]
    #[test_case("" ; "empty")]
    fn parse_bool_invalid_values(raw: &str) {
        assert_eq!(parse_bool(raw, "TEST_VAR"), None);
    }

    #[test_case("25" => 25.0 ; "valid")]
    #[test_case("-5" => 50.0 ; "rejected by validator")]
    #[test_case("abc" => 50.0 ; "not a number")]
    #[test_case("inf" => 50.0 ; "infinite")]
    fn float_settings_fall_back(raw: &str) -> f64 {
        parse_f64_setting("TEST_VAR", raw, 50.0, |v| v > 0.0, "must be greater than 0", "changed")
    }

    #[test_case("1000" => 1000 ; "valid")]
    #[test_case("0" => 50_000 ; "zero")]
    #[test_case("-3" => 50_000 ; "negative")]
    fn count_settings_fall_back(raw: &str) -> usize {
        parse_usize_setting("TEST_VAR", raw, 50_000)
    }

    #[test]
    fn ports_and_hosts_fall_back_to_defaults() {
        assert_eq!(ApiConfig::parse_port("9000"), 9000);
        assert_eq!(ApiConfig::parse_port("0"), 8080);
        assert_eq!(ApiConfig::parse_port("http"), 8080);

        let api = ApiConfig::from_parts("not-an-ip", 9000);
        assert!(api.binds_to_all_interfaces());
        assert_eq!(api.display_host(), "0.0.0.0");
        assert_eq!(api.socket_addr().port(), 9000);

        let local = ApiConfig::from_parts("127.0.0.1", 8080);
        assert!(!local.binds_to_all_interfaces());
        assert_eq!(local.port(), 8080);
    }

    #[test]
    fn optimizer_defaults_match_packing_defaults() {
        let config = OptimizerConfig::default().packing_config();
        assert_eq!(config.max_iterations, PackingConfig::DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.height_map_resolution, 50.0);
        assert!(config.allow_side_laying);
    }
}
