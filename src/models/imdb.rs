use serde_json::Value;

/// Width of a zero-padded IMDb numeric identifier
pub const IMDB_ID_WIDTH: usize = 7;

const IMDB_TITLE_URL: &str = "https://www.imdb.com/title/tt";

/// Reads a raw external identifier out of vector-index metadata
///
/// Vector stores keep numeric metadata as floats, and some ingestion paths
/// store the id as a string, so integers, integral floats and numeric
/// strings are all accepted. Zero, negatives, fractions and anything
/// non-numeric count as absent.
pub fn parse_external_id(raw: Option<&Value>) -> Option<u64> {
    let id = match raw? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;

    (id != 0).then_some(id)
}

/// Renders an IMDb numeric id as a fixed-width, zero-padded string
///
/// Absent ids stay absent; there is no placeholder value.
pub fn format_imdb_id(id: Option<u64>) -> Option<String> {
    id.map(|id| format!("{:0width$}", id, width = IMDB_ID_WIDTH))
}

/// Builds the IMDb title page link for an already formatted id
pub fn imdb_url(formatted_id: &str) -> String {
    format!("{}{}", IMDB_TITLE_URL, formatted_id)
}
