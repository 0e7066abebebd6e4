//! Configuration for tracing behavior.

use std::time::Duration;

use crate::instrument::Operation;

/// Environment variable read by [`TracingConfig::from_env`].
pub const VERBOSE_ENV: &str = "TRACED_SEA_ORM_VERBOSE";

const DEFAULT_SERVICE_NAME: &str = "unknown_service";

/// Label reported for every operation when legacy command names are on.
const LEGACY_COMMAND_NAME: &str = "Get";

/// Configuration options for dependency tracing.
///
/// # Example
///
/// ```rust
/// use traced_sea_orm::TracingConfig;
/// use std::time::Duration;
///
/// let config = TracingConfig::new("billing")
///     .with_verbose(true)
///     .with_slow_query_threshold(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name stamped on every dependency record.
    /// Default: `"unknown_service"`
    pub service_name: String,

    /// Print the SQL text and bound values of every call from a detached task.
    /// Default: `false`
    pub verbose: bool,

    /// Report every operation under the single command name `"Get"` instead of
    /// its own name. Only useful for dashboards built on that older labelling.
    /// Default: `false`
    pub legacy_command_names: bool,

    /// Whether to include the SQL statement in spans.
    /// Default: `false` (for security - prevents accidental credential logging)
    pub log_statements: bool,

    /// Whether to include query parameters in spans.
    /// Default: `false` (parameters may contain sensitive data)
    pub log_parameters: bool,

    /// Threshold for logging slow queries at WARN level.
    /// Default: 500ms
    pub slow_query_threshold: Duration,

    /// Whether to record the number of rows affected/returned on spans.
    /// Default: `true`
    pub record_row_counts: bool,

    /// Custom database name to include in spans (useful for multi-database setups).
    /// Default: `None`
    pub database_name: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            verbose: false,
            legacy_command_names: false,
            log_statements: false,
            log_parameters: false,
            slow_query_threshold: Duration::from_millis(500),
            record_row_counts: true,
            database_name: None,
        }
    }
}

impl TracingConfig {
    /// Create a configuration for `service_name` with default values.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::default().with_service_name(service_name)
    }

    /// Create a configuration for `service_name`, reading the verbose flag
    /// from the `TRACED_SEA_ORM_VERBOSE` environment variable.
    ///
    /// The variable is read once, here. `1`, `true`, `yes` and `on` (in any
    /// case) enable verbose printing; anything else, or no variable, leaves it
    /// off.
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let verbose = std::env::var(VERBOSE_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Self::new(service_name).with_verbose(verbose)
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Enable or disable the verbose query print.
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Report all operations as `"Get"`.
    pub fn with_legacy_command_names(mut self, enabled: bool) -> Self {
        self.legacy_command_names = enabled;
        self
    }

    /// Enable or disable SQL statement logging in spans.
    ///
    /// **Security Warning**: Enabling this may expose sensitive data in your traces
    /// if your queries contain credentials or PII in the SQL text itself.
    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Enable or disable parameter logging in spans.
    ///
    /// **Security Warning**: Query parameters often contain user input and
    /// potentially sensitive data. Only enable in development or controlled environments.
    pub fn with_parameter_logging(mut self, enabled: bool) -> Self {
        self.log_parameters = enabled;
        self
    }

    /// Set the threshold for slow query warnings.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    /// Enable or disable row count recording.
    pub fn with_row_count_recording(mut self, enabled: bool) -> Self {
        self.record_row_counts = enabled;
        self
    }

    /// Set a database name to include in spans.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Command name reported for `operation`.
    pub fn command_name(&self, operation: Operation) -> &'static str {
        if self.legacy_command_names {
            LEGACY_COMMAND_NAME
        } else {
            operation.as_str()
        }
    }

    /// Create a development-friendly configuration with full logging enabled.
    ///
    /// **Warning**: Do not use in production as it logs all SQL and parameters.
    pub fn development(service_name: impl Into<String>) -> Self {
        Self {
            verbose: true,
            log_statements: true,
            log_parameters: true,
            slow_query_threshold: Duration::from_millis(100),
            ..Self::new(service_name)
        }
    }

    /// Create a production-safe configuration with minimal overhead.
    pub fn production(service_name: impl Into<String>) -> Self {
        Self {
            slow_query_threshold: Duration::from_secs(1),
            ..Self::new(service_name)
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
