//! Number and file-name conventions shared by the emitter and the parser.

use hn_core::Real;

pub const TOPOLOGY_FILE: &str = "main.csv";
pub const CSV_EXT: &str = "csv";

pub fn artifact_name(id: &str) -> String {
    format!("{}.{}", id, CSV_EXT)
}

/// Artifact name back to its id, for `.csv` files only.
pub fn artifact_id(name: &str) -> Option<&str> {
    name.strip_suffix(".csv").filter(|id| !id.is_empty())
}

/// Scientific notation with a signed, at least two-digit exponent: `1.450e+08`.
pub fn sci(value: Real, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let raw = format!("{:.*e}", digits, value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(e) => {
                let sign = if e < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, e.abs())
            }
            Err(_) => raw,
        },
        None => raw,
    }
}

/// Fixed six-decimal geometry value.
///
/// Geometry is in metres, so anything under 0.5 µm prints as `0.000000`
/// and is rejected on re-parse. The catalog keeps radii above a floor for
/// this reason.
pub fn fixed(value: Real) -> String {
    format!("{:.6}", value)
}

/// Plain decimal without a trailing `.0` for integral values.
pub fn plain(value: Real) -> String {
    format!("{}", value)
}
