//! `unfurl doctor` — environment audit for the preview pipeline.
//!
//! Runs local checks (config discovery, browser detection, document tools,
//! market-data settings) and prints a structured report with `[ok]`,
//! `[warn]`, `[fail]`, or `[info]` status indicators per item.

use std::path::Path;

use {anyhow::Result, unfurl_config::UnfurlConfig, unfurl_preview::detect};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn tally(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;
    for section in sections {
        for item in &section.items {
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
    }
    (errors, warnings)
}

fn print_report(sections: &[Section]) {
    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
        }
        eprintln!();
    }
}

// ── Checks ──────────────────────────────────────────────────────────────────

fn check_config() -> Section {
    let mut section = Section::new("Config");
    let path = unfurl_config::find_or_default_config_path();
    if path.exists() {
        section.push(Status::Ok, format!("using {}", path.display()));
    } else {
        section.push(
            Status::Info,
            "no config file found; defaults in effect (run `unfurl config init`)",
        );
    }
    section
}

fn check_browser(config: &UnfurlConfig) -> Section {
    let mut section = Section::new("Browser");

    match detect::find_chromium(config.preview.chrome_path.as_deref()) {
        Some(path) => section.push(Status::Ok, format!("Chromium found: {}", path.display())),
        None => section.push(
            Status::Fail,
            "no Chromium executable found; set CHROME or [preview].chrome_path",
        ),
    }

    if !config.preview.headless {
        section.push(Status::Info, "headless disabled; pages open a window");
    }

    let artifacts = Path::new(&config.preview.artifact_dir);
    if artifacts.is_dir() {
        section.push(
            Status::Ok,
            format!("artifact directory: {}", artifacts.display()),
        );
    } else {
        section.push(
            Status::Warn,
            format!(
                "artifact directory {} does not exist; diagnostics will fail to write",
                artifacts.display()
            ),
        );
    }

    section
}

fn check_document_tools() -> Section {
    let mut section = Section::new("Document tools");
    match which::which("pdfinfo") {
        Ok(path) => section.push(Status::Ok, format!("pdfinfo found: {}", path.display())),
        Err(_) => section.push(
            Status::Warn,
            "pdfinfo not found; PDF previews fall back to the file name",
        ),
    }
    section
}

fn check_markets(config: &UnfurlConfig) -> Section {
    let mut section = Section::new("Market data");

    if config.markets.exchange_rate_api_key.is_some() {
        section.push(Status::Ok, "exchange-rate API key configured");
    } else {
        section.push(
            Status::Warn,
            "!convert is disabled until [markets].exchange_rate_api_key is set",
        );
    }

    section.push(
        Status::Info,
        format!(
            "news summaries via {} ({})",
            config.markets.ollama_url, config.markets.ollama_model
        ),
    );

    section
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub fn handle_doctor(config: &UnfurlConfig) -> Result<()> {
    eprintln!("{BOLD}unfurl doctor{RESET}");
    eprintln!("{BOLD}============={RESET}\n");

    let sections = vec![
        check_config(),
        check_browser(config),
        check_document_tools(),
        check_markets(config),
    ];

    print_report(&sections);
    let (errors, warnings) = tally(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
