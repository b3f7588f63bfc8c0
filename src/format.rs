use crate::table::filter::parse_row_date;

/// `"150000.5"` → `"$150,000.50"`. Unparseable amounts are returned as given.
pub fn currency(amount: &str) -> String {
    let Ok(value) = amount.trim().parse::<f64>() else {
        return amount.to_string();
    };
    if !value.is_finite() {
        return amount.to_string();
    }

    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// `"2024-11-05T10:00:00Z"` → `"November 5, 2024"`.
pub fn long_date(raw: &str) -> String {
    match parse_row_date(raw) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn active_label(active: bool) -> &'static str {
    if active {
        "Active"
    } else {
        "Inactive"
    }
}
