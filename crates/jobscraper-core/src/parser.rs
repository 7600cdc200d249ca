//! Tolerant parsing of text-service replies into [`Job`] values.
//!
//! Replies are loosely typed: integers arrive as strings, booleans as
//! `"Yes"`, salaries as numbers. Each field is coerced independently with a
//! fixed precedence so one odd value never rejects the whole reply. Dates are
//! the exception: a missing, blank or unparseable date fails the job.
//!
//! Boolean strings are matched ignoring ASCII case and surrounding
//! whitespace, so `"YES"` and `" true "` count as well as `"Yes"`/`"true"`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::models::Job;

/// Strip Markdown code-fence markers around a JSON payload.
pub fn extract_json_payload(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawJobPayload {
    url: Value,
    title: Value,
    description: Value,
    company: Value,
    location: Value,
    #[serde(alias = "employment_type")]
    employment_type: Value,
    #[serde(alias = "posting_date")]
    posting_date: Value,
    #[serde(alias = "expiration_date")]
    expiration_date: Value,
    #[serde(alias = "is_active")]
    is_active: Value,
    #[serde(alias = "job_categories")]
    job_categories: Value,
    #[serde(alias = "must_skills")]
    must_skills: Value,
    #[serde(alias = "optional_skills")]
    optional_skills: Value,
    salary: Value,
    #[serde(alias = "years_of_experience")]
    years_of_experience: Value,
    #[serde(alias = "education_level")]
    education_level: Value,
    benefits: Value,
    #[serde(alias = "company_size")]
    company_size: Value,
    #[serde(alias = "work_culture")]
    work_culture: Value,
    remote: Value,
    languages: Value,
}

/// Parse a text-service reply (optionally code-fenced) into a [`Job`].
pub fn parse_job(reply: &str) -> Result<Job, AppError> {
    let payload = extract_json_payload(reply);
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| AppError::ParseError(format!("reply is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(AppError::ParseError(
            "reply is not a JSON object".to_string(),
        ));
    }
    let raw: RawJobPayload = serde_json::from_value(value)?;

    Ok(Job {
        url: coerce_string(&raw.url),
        title: coerce_string(&raw.title),
        description: coerce_string(&raw.description),
        company: coerce_string(&raw.company),
        location: coerce_string(&raw.location),
        employment_type: coerce_string(&raw.employment_type),
        posting_date: Some(parse_date(&raw.posting_date)?),
        expiration_date: Some(parse_date(&raw.expiration_date)?),
        is_active: coerce_bool(&raw.is_active),
        job_categories: coerce_string_list(&raw.job_categories),
        must_skills: coerce_string_list(&raw.must_skills),
        optional_skills: coerce_string_list(&raw.optional_skills),
        salary: coerce_salary(&raw.salary),
        years_of_experience: coerce_int(&raw.years_of_experience),
        education_level: coerce_string(&raw.education_level),
        benefits: coerce_string_list(&raw.benefits),
        company_size: coerce_int(&raw.company_size),
        work_culture: coerce_string(&raw.work_culture),
        remote: coerce_bool(&raw.remote),
        languages: coerce_string_list(&raw.languages),
    })
}

/// Number (truncated) > numeric string > 0.
pub fn coerce_int(value: &Value) -> i32 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                clamp_i32(i)
            } else if let Some(f) = n.as_f64() {
                f.trunc() as i32
            } else {
                0
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                clamp_i32(i)
            } else if let Ok(f) = s.parse::<f64>() {
                if f.is_finite() { f.trunc() as i32 } else { 0 }
            } else {
                0
            }
        }
        _ => 0,
    }
}

fn clamp_i32(i: i64) -> i32 {
    i.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Bool > "yes"/"true" (case-insensitive) > false.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

/// String as-is > integer digits > float with two decimals > empty.
pub fn coerce_salary(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else if let Some(f) = n.as_f64() {
                format!("{f:.2}")
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Array > single string as a one-element list > empty.
pub fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(coerce_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Dates are tried as RFC 3339, then `YYYY-MM-DD`, then `YYYY-MM-DDTHH:MM:SS` (UTC).
///
/// Null and blank values match no layout and are errors like any other.
pub fn parse_date(value: &Value) -> Result<DateTime<Utc>, AppError> {
    let text = match value {
        Value::Null => "",
        Value::String(s) => s.trim(),
        other => {
            return Err(AppError::ParseError(format!(
                "expected a date string, got {other}"
            )));
        }
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        && let Some(dt) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }

    Err(AppError::ParseError(format!(
        "unable to parse date: '{text}'"
    )))
}
