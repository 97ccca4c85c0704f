// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

pub fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| value.to_string())
}

pub fn format_optional_date(value: Option<Date>) -> String {
    value.map_or_else(String::new, format_date)
}

/// Thousands grouped with `.`, as the shop's locale writes kilometers.
pub fn format_odometer(km: u32) -> String {
    let digits = km.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped.push_str(" km");
    grouped
}

pub fn format_photo_count(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "1 foto".to_owned(),
        n => format!("{n} fotos"),
    }
}

pub fn consent_label(accepts: bool) -> &'static str {
    if accepts {
        "Acepta comunicaciones"
    } else {
        "No acepta comunicaciones"
    }
}
