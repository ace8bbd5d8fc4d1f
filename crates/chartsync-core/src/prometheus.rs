//! Minimal parser for the Prometheus text exposition format.
//!
//! Only what the scrapers need: sample lines with an optional label set, a
//! float value and an optional timestamp. `# HELP`/`# TYPE` comments are
//! skipped and metric types are not tracked.

use crate::error::ParseError;

/// One sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses a response body. The body must be UTF-8.
pub fn parse_bytes(body: &[u8]) -> Result<Vec<Sample>, ParseError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ParseError::new(format!("body is not valid UTF-8: {}", e)))?;
    parse_text(text)
}

/// Parses exposition text into samples, in document order.
pub fn parse_text(text: &str) -> Result<Vec<Sample>, ParseError> {
    let mut samples = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let sample = parse_line(line)
            .map_err(|e| ParseError::new(format!("line {}: {}", idx + 1, e.message)))?;
        samples.push(sample);
    }
    Ok(samples)
}

fn parse_line(line: &str) -> Result<Sample, ParseError> {
    let name_end = line
        .find(|c: char| !is_name_char(c))
        .unwrap_or(line.len());
    let name = &line[..name_end];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ParseError::new(format!("invalid metric name in '{}'", line)));
    }

    let mut rest = &line[name_end..];
    let mut labels = Vec::new();
    if let Some(after) = rest.strip_prefix('{') {
        let (parsed, remaining) = parse_labels(after)?;
        labels = parsed;
        rest = remaining;
    }

    if !rest.starts_with(|c: char| c == ' ' || c == '\t') {
        return Err(ParseError::new(format!("expected value after '{}'", name)));
    }

    let mut fields = rest.split_whitespace();
    let value_str = fields
        .next()
        .ok_or_else(|| ParseError::new(format!("missing value for '{}'", name)))?;
    let value = parse_value(value_str)?;

    if let Some(ts) = fields.next() {
        ts.parse::<i64>()
            .map_err(|_| ParseError::new(format!("invalid timestamp '{}'", ts)))?;
    }
    if fields.next().is_some() {
        return Err(ParseError::new(format!("trailing data after '{}'", name)));
    }

    Ok(Sample {
        name: name.to_string(),
        labels,
        value,
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn parse_value(s: &str) -> Result<f64, ParseError> {
    match s {
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => s
            .parse::<f64>()
            .map_err(|_| ParseError::new(format!("invalid value '{}'", s))),
    }
}

/// Parses `key="value",...}` and returns the labels and the text after `}`.
fn parse_labels(mut input: &str) -> Result<(Vec<(String, String)>, &str), ParseError> {
    let mut labels = Vec::new();
    loop {
        input = input.trim_start();
        if let Some(rest) = input.strip_prefix('}') {
            return Ok((labels, rest));
        }

        let key_end = input
            .find(|c: char| !is_name_char(c))
            .ok_or_else(|| ParseError::new("unterminated label set"))?;
        let key = &input[..key_end];
        if key.is_empty() {
            return Err(ParseError::new("empty label name"));
        }
        input = input[key_end..].trim_start();
        input = input
            .strip_prefix('=')
            .ok_or_else(|| ParseError::new(format!("expected '=' after label '{}'", key)))?;
        input = input
            .trim_start()
            .strip_prefix('"')
            .ok_or_else(|| ParseError::new(format!("label '{}' value is not quoted", key)))?;

        let mut value = String::new();
        let mut chars = input.char_indices();
        let close = loop {
            match chars.next() {
                Some((i, '"')) => break i,
                Some((_, '\\')) => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, c)) => value.push(c),
                    None => return Err(ParseError::new("unterminated escape")),
                },
                Some((_, c)) => value.push(c),
                None => return Err(ParseError::new(format!("unterminated value of '{}'", key))),
            }
        };
        labels.push((key.to_string(), value));
        input = input[close + 1..].trim_start();

        if let Some(rest) = input.strip_prefix(',') {
            input = rest;
        } else if !input.starts_with('}') {
            return Err(ParseError::new("expected ',' or '}' in label set"));
        }
    }
}
