//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use serde_json::json;

use wakemon_watchdog::WatchdogStats;

use crate::error::CliError;
use crate::settings::Settings;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    print_json(&error_json, "error");
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Print the banner shown when a run begins
pub fn print_run_started(settings: &Settings, dry_run: bool) {
    let mode = if dry_run {
        "dry run".yellow()
    } else {
        "live".green()
    };
    println!("{} ({})", "Watchdog started".bold(), mode);
    println!("  Command:   {}", settings.broadcast.command_line().cyan());
    println!(
        "  Every:     {:?} (polled every {:?})",
        settings.watchdog.fire_threshold(),
        settings.watchdog.poll_interval()
    );
    println!("  {}", "Press Ctrl-C to stop".dimmed());
}

/// Print final watchdog counters
pub fn print_stats(stats: &WatchdogStats, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "stats": stats
        });
        print_json(&output, "stats");
        return;
    }

    let state = if stats.running {
        "running".yellow()
    } else {
        "stopped".green()
    };
    println!("{} {}", "Watchdog".bold(), state);
    println!("  Polls:     {}", stats.ticks);
    println!("  Wake-ups:  {}", stats.fires);
    if stats.failed_fires > 0 {
        println!(
            "  Failed:    {} ({:.1}%)",
            stats.failed_fires.to_string().red(),
            stats.failure_rate()
        );
    }
}

/// Print the effective configuration
pub fn print_settings(settings: &Settings, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "config": settings
        });
        print_json(&output, "config");
        return;
    }

    let watchdog = &settings.watchdog;
    println!("{}", "Watchdog:".bold());
    println!("  Poll interval:  {} ms", watchdog.poll_interval_ms);
    println!("  Threshold:      {} us", watchdog.fire_threshold_us);
    println!("  Start settle:   {} ms", watchdog.start_settle_ms);
    println!("  Thread name:    {}", watchdog.thread_name);
    match watchdog.stack_size {
        Some(bytes) => println!("  Stack size:     {bytes} bytes"),
        None => println!("  Stack size:     {}", "platform default".dimmed()),
    }
    println!("{}", "Broadcast:".bold());
    println!("  Command:        {}", settings.broadcast.command_line().cyan());
}

/// Print the effective configuration as YAML
pub fn print_settings_yaml(settings: &Settings) -> Result<(), CliError> {
    print!("{}", serde_yaml::to_string(settings)?);
    Ok(())
}

fn print_json(value: &serde_json::Value, what: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format {what} as JSON: {e}"),
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::ConfigRead { .. }) => "ConfigRead",
        Some(CliError::UnsupportedConfigFormat(_)) => "UnsupportedConfigFormat",
        Some(CliError::JsonError(_)) => "JsonError",
        Some(CliError::YamlError(_)) => "YamlError",
        Some(CliError::StartFailed) => "StartFailed",
        Some(CliError::Watchdog(_)) => "Watchdog",
        Some(CliError::IoError(_)) => "IoError",
        None => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_names() {
        let err = Error::from(CliError::StartFailed);
        assert_eq!(error_type_name(&err), "StartFailed");

        let err = anyhow::anyhow!("something else");
        assert_eq!(error_type_name(&err), "Unknown");
    }
}
