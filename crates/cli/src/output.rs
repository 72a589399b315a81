//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use manifest_lib::{ContainerSpec, Probe, ProbeHandler, ResourceName};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format, ready for kubectl apply
    Yaml,
}

/// One field of a key/value table
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Print a value as JSON or YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Table => {}
    }
    Ok(())
}

/// Print resources as a multi-document YAML stream
pub fn print_documents<T: Serialize>(documents: &[T]) -> Result<()> {
    for document in documents {
        print!("---\n{}", serde_yaml::to_string(document)?);
    }
    Ok(())
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Describe a probe in one line, e.g. `http GET /healthz :8080 (timeout 30s)`
pub fn format_probe(probe: Option<&Probe>) -> String {
    let Some(probe) = probe else {
        return "none (process)".dimmed().to_string();
    };

    let mut described = match &probe.handler {
        ProbeHandler::HttpGet { port, .. } => {
            let path = probe.http_path().unwrap_or("/");
            format!("http GET {}{}", path, format_port(*port))
        }
        ProbeHandler::TcpSocket { port } => format!("tcp{}", format_port(*port)),
    };
    if probe.timeout_seconds > 0 {
        described.push_str(&format!(" (timeout {}s)", probe.timeout_seconds));
    }
    described
}

fn format_port(port: Option<i32>) -> String {
    port.map(|p| format!(" :{p}")).unwrap_or_default()
}

/// Format a list, or a dimmed dash when empty
pub fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "-".dimmed().to_string()
    } else {
        items.join(" ")
    }
}

/// Key/value rows describing a container
pub fn container_rows(container: &ContainerSpec) -> Vec<FieldRow> {
    let mut rows = Vec::new();
    if !container.name.is_empty() {
        rows.push(FieldRow::new("Name", &container.name));
    }
    if !container.image.is_empty() {
        rows.push(FieldRow::new("Image", &container.image));
    }
    rows.push(FieldRow::new("Command", format_list(&container.command)));
    rows.push(FieldRow::new("Args", format_list(&container.args)));

    let ports: Vec<String> = container
        .ports
        .iter()
        .map(|p| format!("{}={}", p.name, p.container_port))
        .collect();
    rows.push(FieldRow::new("Ports", format_list(&ports)));

    let env: Vec<String> = container
        .env
        .iter()
        .map(|e| format!("{}={}", e.name, e.value))
        .collect();
    rows.push(FieldRow::new("Env", format_list(&env)));

    for name in [
        ResourceName::Cpu,
        ResourceName::Memory,
        ResourceName::EphemeralStorage,
    ] {
        let value = container
            .resources
            .requests
            .as_ref()
            .and_then(|list| list.get(&name))
            .map(|q| q.to_string())
            .unwrap_or_else(|| "-".dimmed().to_string());
        rows.push(FieldRow::new(name.as_str(), value));
    }

    rows.push(FieldRow::new(
        "Probe",
        format_probe(container.readiness_probe.as_ref()),
    ));
    rows
}

/// Color a stopped/running flag
pub fn color_state(stopped: bool) -> String {
    if stopped {
        "stopped".yellow().to_string()
    } else {
        "running".green().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_probe() {
        colored::control::set_override(false);

        let http = Probe {
            handler: ProbeHandler::HttpGet {
                path: Some("/healthz".to_string()),
                port: Some(8080),
            },
            timeout_seconds: 30,
            success_threshold: 1,
        };
        assert_eq!(format_probe(Some(&http)), "http GET /healthz :8080 (timeout 30s)");

        let tcp = Probe {
            handler: ProbeHandler::TcpSocket { port: None },
            timeout_seconds: 0,
            success_threshold: 1,
        };
        assert_eq!(format_probe(Some(&tcp)), "tcp");
        assert_eq!(format_probe(None), "none (process)");
    }

    #[test]
    fn test_container_rows_cover_resources() {
        colored::control::set_override(false);

        let rows = container_rows(&ContainerSpec::default());
        let fields: Vec<_> = rows.iter().map(|r| r.field.as_str()).collect();

        assert!(fields.contains(&"cpu"));
        assert!(fields.contains(&"memory"));
        assert!(fields.contains(&"ephemeral-storage"));
        assert!(!fields.contains(&"Name"));
    }
}
