// Date expression parsing for filters (e.g. `est<today`, `est>=+7d`)

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Parse a date expression relative to `today`.
///
/// Supports absolute dates (`2026-01-10`), `today`, `tomorrow`, `yesterday`
/// and day offsets (`+7d`, `-3d`).
pub fn parse_date_expr(expr: &str, today: NaiveDate) -> Result<NaiveDate> {
    let expr = expr.trim();

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return Ok(date);
    }

    match expr.to_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Some(days) = expr.strip_suffix('d') {
        if days.starts_with('+') || days.starts_with('-') {
            let offset: i64 = days
                .parse()
                .with_context(|| format!("Invalid day offset: {}", expr))?;
            return today
                .checked_add_signed(Duration::days(offset))
                .with_context(|| format!("Date offset out of range: {}", expr));
        }
    }

    anyhow::bail!(
        "Unsupported date expression: {}. Use YYYY-MM-DD, today, tomorrow, yesterday or +Nd/-Nd.",
        expr
    )
}
