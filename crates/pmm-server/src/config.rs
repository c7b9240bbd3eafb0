//! Configuration loading: a JSON file, then environment variable overrides
//! following `PMMS_<SECTION>_<KEY>`. Every range given in the wire spec is
//! enforced by [`ServerConfig::validate`], which exits the process on the
//! first violation — mirroring the fail-fast discipline of a long-running
//! service that would rather not start than start misconfigured.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub common: CommonConfig,
    pub authentication: AuthenticationConfig,
    pub log: LogConfig,
    pub connection_test: ConnectionTestConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            authentication: AuthenticationConfig::default(),
            log: LogConfig::default(),
            connection_test: ConnectionTestConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersionSetting {
    #[default]
    V4,
    V6,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    pub time_out_seconds: u32,
    pub ip_version: IpVersionSetting,
    pub port: u16,
    pub max_connection_per_thread: u32,
    pub thread: u32,
    pub max_room_count: u32,
    pub max_player_per_room: u8,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            time_out_seconds: 300,
            ip_version: IpVersionSetting::V4,
            port: 57000,
            max_connection_per_thread: 1000,
            thread: 1,
            max_room_count: 1000,
            max_player_per_room: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    pub game_id: String,
    pub enable_game_version_check: bool,
    pub game_version: String,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self { game_id: String::new(), enable_game_version_check: false, game_version: String::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelSetting {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevelSetting {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error | Self::Fatal => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enable_console_log: bool,
    pub console_log_level: LogLevelSetting,
    pub enable_file_log: bool,
    pub file_log_level: LogLevelSetting,
    pub file_log_path: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable_console_log: true,
            console_log_level: LogLevelSetting::Info,
            enable_file_log: false,
            file_log_level: LogLevelSetting::Info,
            file_log_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionTestConfig {
    pub connection_check_tcp_time_out_seconds: u32,
    pub connection_check_udp_time_out_seconds: u32,
    pub connection_check_udp_try_count: u32,
}

impl Default for ConnectionTestConfig {
    fn default() -> Self {
        Self {
            connection_check_tcp_time_out_seconds: 5,
            connection_check_udp_time_out_seconds: 3,
            connection_check_udp_try_count: 3,
        }
    }
}

fn range_check(ok: bool, name: &str) {
    if !ok {
        tracing::error!(field = name, "configuration value out of allowed range");
        std::process::exit(1);
    }
}

impl ServerConfig {
    /// Validate every documented range. Exits the process with a logged
    /// error on the first violation — a fatal startup fault per spec §6.
    pub fn validate(&self) {
        range_check((1..=3600).contains(&self.common.time_out_seconds), "common.time_out_seconds");
        range_check((1..=65535).contains(&self.common.max_connection_per_thread), "common.max_connection_per_thread");
        range_check((1..=65535).contains(&self.common.thread), "common.thread");
        range_check((1..=65535).contains(&self.common.max_room_count), "common.max_room_count");
        range_check((1..=255).contains(&self.common.max_player_per_room), "common.max_player_per_room");

        range_check(
            !self.authentication.game_id.is_empty() && self.authentication.game_id.len() <= 24,
            "authentication.game_id",
        );
        range_check(self.authentication.game_version.len() <= 24, "authentication.game_version");
        range_check(
            !self.authentication.enable_game_version_check || !self.authentication.game_version.is_empty(),
            "authentication.game_version",
        );

        range_check(
            (1..=3600).contains(&self.connection_test.connection_check_tcp_time_out_seconds),
            "connection_test.connection_check_tcp_time_out_seconds",
        );
        range_check(
            (1..=3600).contains(&self.connection_test.connection_check_udp_time_out_seconds),
            "connection_test.connection_check_udp_time_out_seconds",
        );
        range_check(
            (1..=100).contains(&self.connection_test.connection_check_udp_try_count),
            "connection_test.connection_check_udp_try_count",
        );
    }

    /// Load from `path` (JSON) if it exists, falling back to defaults, then
    /// apply `PMMS_<SECTION>_<KEY>` environment overrides.
    pub fn load(path: &str) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path, "loaded configuration file");
                    cfg
                },
                Err(e) => {
                    tracing::error!(path, error = %e, "failed to parse configuration file");
                    std::process::exit(1);
                },
            },
            Err(_) => {
                tracing::info!(path, "no configuration file found, using defaults");
                ServerConfig::default()
            },
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        apply_u32(&mut self.common.time_out_seconds, "PMMS_COMMON_TIME_OUT_SECONDS");
        apply_enum_ip_version(&mut self.common.ip_version, "PMMS_COMMON_IP_VERSION");
        apply_u16(&mut self.common.port, "PMMS_COMMON_PORT");
        apply_u32(&mut self.common.max_connection_per_thread, "PMMS_COMMON_MAX_CONNECTION_PER_THREAD");
        apply_u32(&mut self.common.thread, "PMMS_COMMON_THREAD");
        apply_u32(&mut self.common.max_room_count, "PMMS_COMMON_MAX_ROOM_COUNT");
        apply_u8(&mut self.common.max_player_per_room, "PMMS_COMMON_MAX_PLAYER_PER_ROOM");

        apply_string(&mut self.authentication.game_id, "PMMS_AUTHENTICATION_GAME_ID");
        apply_bool(&mut self.authentication.enable_game_version_check, "PMMS_AUTHENTICATION_ENABLE_GAME_VERSION_CHECK");
        apply_string(&mut self.authentication.game_version, "PMMS_AUTHENTICATION_GAME_VERSION");

        apply_bool(&mut self.log.enable_console_log, "PMMS_LOG_ENABLE_CONSOLE_LOG");
        apply_enum_log_level(&mut self.log.console_log_level, "PMMS_LOG_CONSOLE_LOG_LEVEL");
        apply_bool(&mut self.log.enable_file_log, "PMMS_LOG_ENABLE_FILE_LOG");
        apply_enum_log_level(&mut self.log.file_log_level, "PMMS_LOG_FILE_LOG_LEVEL");
        apply_string(&mut self.log.file_log_path, "PMMS_LOG_FILE_LOG_PATH");

        apply_u32(
            &mut self.connection_test.connection_check_tcp_time_out_seconds,
            "PMMS_CONNECTION_TEST_CONNECTION_CHECK_TCP_TIME_OUT_SECONDS",
        );
        apply_u32(
            &mut self.connection_test.connection_check_udp_time_out_seconds,
            "PMMS_CONNECTION_TEST_CONNECTION_CHECK_UDP_TIME_OUT_SECONDS",
        );
        apply_u32(
            &mut self.connection_test.connection_check_udp_try_count,
            "PMMS_CONNECTION_TEST_CONNECTION_CHECK_UDP_TRY_COUNT",
        );
    }
}

/// An unparseable or unrecognized environment override is a startup fault,
/// not a warning — spec §6: "Any out-of-range or unparseable value is a
/// startup fault." Mirrors `range_check`'s fail-fast discipline.
fn fatal_bad_override(key: &str, val: &str) -> ! {
    tracing::error!(key, val, "environment override is not a valid value for this field");
    std::process::exit(1);
}

fn apply_string(field: &mut String, key: &str) {
    if let Ok(val) = std::env::var(key)
        && !val.is_empty()
    {
        *field = val;
    }
}

fn apply_bool(field: &mut bool, key: &str) {
    if let Ok(val) = std::env::var(key) {
        match val.parse::<bool>() {
            Ok(parsed) => *field = parsed,
            Err(_) => fatal_bad_override(key, &val),
        }
    }
}

fn apply_u32(field: &mut u32, key: &str) {
    if let Ok(val) = std::env::var(key) {
        match val.parse::<u32>() {
            Ok(parsed) => *field = parsed,
            Err(_) => fatal_bad_override(key, &val),
        }
    }
}

fn apply_u16(field: &mut u16, key: &str) {
    if let Ok(val) = std::env::var(key) {
        match val.parse::<u16>() {
            Ok(parsed) => *field = parsed,
            Err(_) => fatal_bad_override(key, &val),
        }
    }
}

fn apply_u8(field: &mut u8, key: &str) {
    if let Ok(val) = std::env::var(key) {
        match val.parse::<u8>() {
            Ok(parsed) => *field = parsed,
            Err(_) => fatal_bad_override(key, &val),
        }
    }
}

fn apply_enum_ip_version(field: &mut IpVersionSetting, key: &str) {
    if let Ok(val) = std::env::var(key) {
        match val.to_lowercase().as_str() {
            "v4" => *field = IpVersionSetting::V4,
            "v6" => *field = IpVersionSetting::V6,
            _ => fatal_bad_override(key, &val),
        }
    }
}

fn apply_enum_log_level(field: &mut LogLevelSetting, key: &str) {
    if let Ok(val) = std::env::var(key) {
        match val.to_lowercase().as_str() {
            "debug" => *field = LogLevelSetting::Debug,
            "info" => *field = LogLevelSetting::Info,
            "warning" => *field = LogLevelSetting::Warning,
            "error" => *field = LogLevelSetting::Error,
            "fatal" => *field = LogLevelSetting::Fatal,
            _ => fatal_bad_override(key, &val),
        }
    }
}
