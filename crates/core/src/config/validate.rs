use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cost constants are not negative and the lossy multiplier is at least 1
/// - Forbidden chains are not empty
/// - Attempt limit and progress interval are not 0
/// - FFmpeg timeouts are not 0 when the handler is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    // Routing validation
    let costs = &config.routing.costs;
    for (name, value) in [
        ("depth_cost", costs.depth_cost),
        ("default_category_change_cost", costs.default_category_change_cost),
        ("priority_cost", costs.priority_cost),
    ] {
        if !non_negative(value) {
            return Err(invalid(format!(
                "routing.costs.{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    if let Some(entry) = costs.category_change_costs.iter().find(|c| !non_negative(c.cost)) {
        return Err(invalid(format!(
            "routing.costs.category_change_costs: {} -> {} has negative cost {}",
            entry.from, entry.to, entry.cost
        )));
    }
    if !(costs.lossy_cost_multiplier.is_finite() && costs.lossy_cost_multiplier >= 1.0) {
        return Err(invalid(format!(
            "routing.costs.lossy_cost_multiplier must be at least 1, got {}",
            costs.lossy_cost_multiplier
        )));
    }
    if config.routing.forbidden_chains.iter().any(Vec::is_empty) {
        return Err(invalid("routing.forbidden_chains cannot contain empty chains"));
    }
    if config.routing.max_route_attempts == Some(0) {
        return Err(invalid("routing.max_route_attempts cannot be 0"));
    }
    if config.routing.progress_log_interval == 0 {
        return Err(invalid("routing.progress_log_interval cannot be 0"));
    }

    // Handler validation
    let ffmpeg = &config.ffmpeg;
    if ffmpeg.enabled && (ffmpeg.timeout_secs == 0 || ffmpeg.probe_timeout_secs == 0) {
        return Err(invalid("ffmpeg timeouts cannot be 0"));
    }

    Ok(())
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
