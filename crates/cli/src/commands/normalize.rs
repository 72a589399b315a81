//! `kf-export normalize`

use anyhow::{bail, Result};
use colored::Colorize;
use manifest_lib::{cf_to_si_units, Quantity};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_error, print_structured, print_success, print_table, OutputFormat};

/// Result of normalizing one size string
#[derive(Debug, Serialize, Tabled)]
pub struct Normalized {
    #[tabled(rename = "Input")]
    pub input: String,
    #[tabled(rename = "SI Units")]
    pub normalized: String,
    #[tabled(rename = "Canonical", display_with = "display_canonical")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[tabled(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn display_canonical(canonical: &Option<String>) -> String {
    match canonical {
        Some(c) => c.clone(),
        None => "invalid".red().to_string(),
    }
}

/// Normalize one legacy size string and check it parses
pub fn normalize(input: &str) -> Normalized {
    let normalized = cf_to_si_units(input);
    let (canonical, error) = match Quantity::parse(&normalized) {
        Ok(q) => (Some(q.to_string()), None),
        Err(e) => (None, Some(e.to_string())),
    };
    Normalized {
        input: input.to_string(),
        normalized,
        canonical,
        error,
    }
}

/// Print CF to SI conversions, failing if any input doesn't parse
pub fn show_normalized(inputs: &[String], format: OutputFormat) -> Result<()> {
    let results: Vec<Normalized> = inputs.iter().map(|i| normalize(i)).collect();
    let invalid = results.iter().filter(|r| r.error.is_some()).count();

    match format {
        OutputFormat::Table => {
            for result in &results {
                if let Some(error) = &result.error {
                    print_error(&format!("{}: {}", result.input, error));
                }
            }
            print_table(results);
            if invalid == 0 {
                print_success(&format!("{} quantities normalized", inputs.len()));
            }
        }
        format => print_structured(&results, format)?,
    }

    if invalid > 0 {
        bail!("{invalid} of {} quantities could not be parsed", inputs.len());
    }
    Ok(())
}
