// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;
use time::Date;
use time::macros::format_description;

pub const DATE_LAYOUTS: &str = "YYYY-MM-DD or dd/mm/yyyy";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid odometer value")]
    InvalidOdometer,
    #[error("odometer cannot be negative")]
    NegativeOdometer,
    #[error("invalid date value (use {DATE_LAYOUTS})")]
    InvalidDate,
    #[error("invalid year value")]
    InvalidYear,
    #[error("photo URL {0:?} must start with http:// or https://")]
    InvalidUrl(String),
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Kilometers as typed at intake: plain digits, or digits grouped by
/// `.`/`,` in threes.
pub fn parse_odometer(input: &str) -> ValidationResult<u32> {
    let trimmed = input.trim();
    if trimmed.starts_with('-') {
        return Err(ValidationError::NegativeOdometer);
    }
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidOdometer);
    }

    let groups = trimmed.split(['.', ',']).collect::<Vec<_>>();
    for (index, group) in groups.iter().enumerate() {
        let valid_len = match (index, groups.len()) {
            (_, 1) => !group.is_empty(),
            (0, _) => (1..=3).contains(&group.len()),
            _ => group.len() == 3,
        };
        if !valid_len || !group.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(ValidationError::InvalidOdometer);
        }
    }

    groups
        .concat()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidOdometer)
}

pub fn parse_required_date(input: &str) -> ValidationResult<Date> {
    parse_date(input.trim())
}

pub fn parse_optional_date(input: &str) -> ValidationResult<Option<Date>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed).map(Some)
}

pub fn parse_optional_year(input: &str) -> ValidationResult<Option<i32>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() != 4 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidYear);
    }
    trimmed
        .parse::<i32>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidYear)
}

/// Blank input becomes `None`; anything else is kept trimmed.
pub fn parse_optional_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Comma-separated photo URLs; blank entries are skipped.
pub fn parse_photo_urls(input: &str) -> ValidationResult<Vec<String>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| {
            if has_http_scheme(url) {
                Ok(url.to_owned())
            } else {
                Err(ValidationError::InvalidUrl(url.to_owned()))
            }
        })
        .collect()
}

pub fn normalize_plate(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<String>()
        .to_uppercase()
}

pub fn format_input_date(value: Option<Date>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        url.len() > scheme.len()
            && url
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .or_else(|_| Date::parse(input, &format_description!("[day]/[month]/[year]")))
        .map_err(|_| ValidationError::InvalidDate)
}
