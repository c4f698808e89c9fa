//! Colorful console output for generation and compile events.
//!
//! Provides a custom `tracing` layer that formats querygen events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (generation start/end, evaluator compiles)
//! - **DEBUG**: Cache hits, evictions, staged wrappers and written sources

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Targets shown by default.
const DEFAULT_DIRECTIVES: [&str; 2] = ["querygen_codegen=info", "querygen_eval=info"];

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. A non-empty
/// `RUST_LOG` replaces the default `info` level of the querygen crates.
pub fn init() {
    INIT.get_or_init(|| {
        EPOCH.get_or_init(Instant::now);
        print_banner();

        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(QuerygenConsoleLayer)
            .try_init();
    });
}

// Directives from `RUST_LOG` when set, the querygen defaults otherwise.
fn env_filter() -> EnvFilter {
    let builder = EnvFilter::builder();
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => builder.parse_lossy(directives),
        _ => builder.parse_lossy(DEFAULT_DIRECTIVES.join(",")),
    }
}

fn elapsed_secs() -> f64 {
    EPOCH
        .get()
        .map(|epoch| epoch.elapsed().as_secs_f64())
        .unwrap_or(0.0)
}

fn print_banner() {
    let line = format!("querygen v{VERSION} - query types and compiled evaluators");
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", line.bright_cyan().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats querygen events with colors.
pub struct QuerygenConsoleLayer;

impl<S: Subscriber> Layer<S> for QuerygenConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("querygen") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    message: Option<String>,
    fingerprint: Option<String>,
    backend: Option<String>,
    path: Option<String>,
    entity_count: Option<u64>,
    source_count: Option<u64>,
    parameters: Option<u64>,
}

impl EventVisitor {
    fn set_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "event" => self.event = Some(value),
            "message" => self.message = Some(value),
            "fingerprint" => self.fingerprint = Some(value),
            "backend" => self.backend = Some(value),
            "path" => self.path = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field, s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "entity_count" => self.entity_count = Some(value),
            "source_count" => self.source_count = Some(value),
            "parameters" => self.parameters = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value as u64);
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    match v.event.as_deref() {
        Some("generation_start") => format_generation_start(v),
        Some("generation_end") => format_generation_end(v),
        Some("compile") => format_compile(v),
        Some(_) => String::new(),
        None => format_message(v, level),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn format_generation_start(v: &EventVisitor) -> String {
    format!(
        "{} {} Generating │ {} entities",
        format_elapsed(),
        "▶".bright_green().bold(),
        v.entity_count.unwrap_or(0).bright_yellow()
    )
}

fn format_generation_end(v: &EventVisitor) -> String {
    format!(
        "{} {} Generation complete │ {} sources",
        format_elapsed(),
        "■".bright_cyan().bold(),
        v.source_count.unwrap_or(0).bright_yellow()
    )
}

fn format_compile(v: &EventVisitor) -> String {
    format!(
        "{} {} Compiling {} │ {} │ {} parameters",
        format_elapsed(),
        "⚙".bright_magenta(),
        v.fingerprint.as_deref().unwrap_or("?").white().bold(),
        v.backend.as_deref().unwrap_or("?").bright_blue(),
        v.parameters.unwrap_or(0).bright_yellow()
    )
}

fn format_message(v: &EventVisitor, level: Level) -> String {
    let Some(message) = v.message.as_deref() else {
        return String::new();
    };
    let detail = v.fingerprint.as_deref().or(v.path.as_deref()).unwrap_or("");
    let marker = match level {
        Level::ERROR => "✗".bright_red().bold().to_string(),
        Level::WARN => "!".bright_yellow().bold().to_string(),
        _ => "·".bright_black().to_string(),
    };
    if detail.is_empty() {
        format!("{} {} {}", format_elapsed(), marker, message)
    } else {
        format!(
            "{} {} {} │ {}",
            format_elapsed(),
            marker,
            message,
            detail.bright_black()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(s: &str) -> String {
        let mut out = String::new();
        let mut escape = false;
        for c in s.chars() {
            match (escape, c) {
                (false, '\u{1b}') => escape = true,
                (true, 'm') => escape = false,
                (false, c) => out.push(c),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_format_compile() {
        let v = EventVisitor {
            event: Some("compile".to_string()),
            fingerprint: Some("Q_42".to_string()),
            backend: Some("tiered".to_string()),
            parameters: Some(3),
            ..Default::default()
        };
        let line = strip(&format_event(&v, Level::INFO));
        assert!(line.ends_with("Compiling Q_42 │ tiered │ 3 parameters"));
    }

    #[test]
    fn test_format_generation() {
        let start = EventVisitor {
            event: Some("generation_start".to_string()),
            entity_count: Some(4),
            ..Default::default()
        };
        let end = EventVisitor {
            event: Some("generation_end".to_string()),
            source_count: Some(4),
            ..Default::default()
        };
        assert!(strip(&format_event(&start, Level::INFO)).ends_with("Generating │ 4 entities"));
        assert!(strip(&format_event(&end, Level::INFO)).ends_with("complete │ 4 sources"));
    }

    #[test]
    fn test_unknown_events_are_silent() {
        let v = EventVisitor {
            event: Some("other".to_string()),
            ..Default::default()
        };
        assert!(format_event(&v, Level::INFO).is_empty());
        assert!(format_event(&EventVisitor::default(), Level::DEBUG).is_empty());
    }

    #[test]
    fn test_format_message_with_detail() {
        let v = EventVisitor {
            message: Some("Entry cache hit".to_string()),
            fingerprint: Some("Q_7".to_string()),
            ..Default::default()
        };
        assert!(strip(&format_event(&v, Level::DEBUG)).ends_with("Entry cache hit │ Q_7"));
    }

    #[test]
    fn test_rust_log_overrides_defaults() {
        use tracing_subscriber::filter::LevelFilter;

        std::env::set_var(EnvFilter::DEFAULT_ENV, "querygen_eval=debug");
        let filter = env_filter();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        assert!(filter.to_string().contains("querygen_eval=debug"));

        std::env::remove_var(EnvFilter::DEFAULT_ENV);
        let filter = env_filter();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        assert!(filter.to_string().contains("querygen_codegen=info"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        tracing::info!(event = "compile", fingerprint = "Q_1", backend = "jit", parameters = 1u64);
    }
}
