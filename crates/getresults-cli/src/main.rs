//! Interprets readings for one test definition described on the command line.

use std::error::Error;

use clap::Parser;
use getresults_interp::{InterpreterConfig, ValueInterpreter};
use getresults_types::{Decimal, Quantifier, RawValue, TestDefinition, TypedValue};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_TEST_NAME: &str = "TEST";

/// Interpret laboratory readings against a test definition.
#[derive(Parser, Debug)]
#[command(name = "getresults-interp", version, about)]
struct Args {
    /// Test name reported with each result.
    #[arg(long, default_value = DEFAULT_TEST_NAME)]
    name: String,

    /// Value type code: absolute or calculated.
    #[arg(long, default_value = "absolute")]
    kind: String,

    /// Value datatype code: string, integer or decimal.
    #[arg(long, default_value = "decimal")]
    datatype: String,

    /// Fractional digits for decimal values.
    #[arg(long)]
    precision: Option<u32>,

    /// Lower limit of detection (exclusive).
    #[arg(long)]
    lower: Option<Decimal>,

    /// Upper limit of detection (exclusive).
    #[arg(long)]
    upper: Option<Decimal>,

    /// Formula for calculated values, e.g. "{value} * 1000" or LOG10.
    #[arg(long)]
    formula: Option<String>,

    /// Reporting units.
    #[arg(long)]
    units: Option<String>,

    /// Maximum formula length after substituting the reading.
    #[arg(long, env = "GETRESULTS_MAX_FORMULA_LENGTH")]
    max_formula_length: Option<usize>,

    /// Print one JSON object per reading.
    #[arg(long)]
    json: bool,

    /// Raw readings to interpret.
    #[arg(required = true, value_name = "READING")]
    readings: Vec<String>,
}

impl Args {
    fn definition(&self) -> TestDefinition {
        TestDefinition {
            name: self.name.clone(),
            description: String::new(),
            value_type: self.kind.to_lowercase(),
            value_datatype: self.datatype.to_lowercase(),
            lower_limit: self.lower,
            upper_limit: self.upper,
            precision: self.precision,
            formula: self.formula.clone(),
            formula_utestid_name: None,
            units: self.units.clone(),
        }
    }

    fn config(&self) -> InterpreterConfig {
        let mut config = InterpreterConfig::default();
        if let Some(max) = self.max_formula_length {
            config.max_formula_length = max;
        }
        config
    }
}

#[derive(Serialize)]
struct ResultLine<'a> {
    test: &'a str,
    reading: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantifier: Option<Quantifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<TypedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    units: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let definition = args.definition();

    for issue in definition.validate() {
        tracing::warn!("Test definition {}: {}", definition.name, issue);
    }

    let interpreter = ValueInterpreter::new(args.config());
    let readings: Vec<RawValue> = args
        .readings
        .iter()
        .map(|r| RawValue::from(r.as_str()))
        .collect();

    tracing::debug!("Interpreting {} readings for {}", readings.len(), definition.name);
    let results = interpreter.classify_all(&definition, &readings);

    let mut failures = 0;
    for (reading, result) in args.readings.iter().zip(results) {
        let line = match result {
            Ok((quantifier, value)) => ResultLine {
                test: &definition.name,
                reading,
                quantifier: Some(quantifier),
                value: Some(value),
                units: definition.units.as_deref(),
                error: None,
            },
            Err(e) => {
                failures += 1;
                tracing::error!("Could not interpret '{}': {}", reading, e);
                ResultLine {
                    test: &definition.name,
                    reading,
                    quantifier: None,
                    value: None,
                    units: None,
                    error: Some(e.to_string()),
                }
            }
        };

        if args.json {
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{}", format_line(&line));
        }
    }

    if failures > 0 {
        return Err(format!(
            "{} of {} readings could not be interpreted",
            failures,
            readings.len()
        )
        .into());
    }
    Ok(())
}

fn format_line(line: &ResultLine<'_>) -> String {
    match (&line.quantifier, &line.value, &line.error) {
        (Some(quantifier), Some(value), _) => {
            let mut out = format!("{}\t{}\t{}{}", line.test, line.reading, quantifier, value);
            if let Some(units) = line.units {
                out.push(' ');
                out.push_str(units);
            }
            out
        }
        (_, _, Some(error)) => format!("{}\t{}\terror: {}", line.test, line.reading, error),
        _ => format!("{}\t{}", line.test, line.reading),
    }
}
