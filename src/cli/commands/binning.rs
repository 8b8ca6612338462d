//! Binning command implementation

use crate::cli::logging::log;
use crate::cli::{apply_binning_overrides, BinningArgs, LogLevel};
use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use crate::stats::binning_statistics;
use num_complex::Complex64;
use std::fs;

/// Parse a sample file: one sample per line, `re` or `re im`.
///
/// Blank lines and lines starting with `#` are skipped. Fields may be
/// separated by whitespace or commas.
pub fn parse_samples(text: &str) -> Result<Vec<Complex64>> {
    let mut samples = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .collect();
        let number = |field: &str| {
            field.parse::<f64>().map_err(|e| Error::SampleParse {
                line: n + 1,
                message: format!("'{field}': {e}"),
            })
        };

        let sample = match fields.as_slice() {
            [re] => Complex64::new(number(*re)?, 0.0),
            [re, im] => Complex64::new(number(*re)?, number(*im)?),
            _ => {
                return Err(Error::SampleParse {
                    line: n + 1,
                    message: format!("expected 1 or 2 fields, found {}", fields.len()),
                })
            }
        };
        samples.push(sample);
    }
    Ok(samples)
}

pub fn run_binning(args: &BinningArgs, mut config: ProbeConfig, level: LogLevel) -> Result<()> {
    apply_binning_overrides(&mut config, args);
    config.validate()?;

    let text = fs::read_to_string(&args.samples)
        .map_err(|e| Error::io(format!("reading samples {}", args.samples.display()), e))?;
    let samples = parse_samples(&text)?;

    log(
        level,
        LogLevel::Verbose,
        &format!("Loaded {} samples from {}", samples.len(), args.samples.display()),
    );

    let stats = binning_statistics(&samples, config.binning.num_bins)?;
    log(level, LogLevel::Normal, &stats.to_string());

    if stats.is_degenerate() {
        log(level, LogLevel::Normal, "  (zero variance: autocorrelation time undefined)");
    }
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  bins={} bin_size={} variance={:.6e} binned_variance={:.6e}",
            stats.num_bins, stats.bin_size, stats.variance, stats.binned_variance
        ),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_real_and_complex_lines() {
        let text = "# energy\n1.5\n\n2.0 -3.0\n4e-1,2\n";
        let samples = parse_samples(text).unwrap();
        assert_eq!(
            samples,
            vec![Complex64::new(1.5, 0.0), Complex64::new(2.0, -3.0), Complex64::new(0.4, 2.0)]
        );
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = parse_samples("1.0\nabc\n").unwrap_err();
        match err {
            Error::SampleParse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("abc"));
            }
            other => panic!("expected SampleParse, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_three_fields() {
        assert!(matches!(parse_samples("1 2 3"), Err(Error::SampleParse { line: 1, .. })));
    }
}
