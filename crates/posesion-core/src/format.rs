//! Pure value formatters
//!
//! Shapes raw form values into the strings printed on the form: RUT
//! splitting, ISO date decomposition and Chilean thousands grouping.
//! All functions are pure and total; malformed input degrades to empty
//! components rather than an error.

/// Split a raw RUT into its numeric part and check digit.
///
/// Strips everything except digits and `k`/`K`, then takes the last
/// remaining character as the check digit (uppercased). Inputs with
/// fewer than two usable characters yield an empty pair.
pub fn split_rut(raw: &str) -> (String, String) {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'k' | 'K'))
        .collect();
    if clean.len() < 2 {
        return (String::new(), String::new());
    }
    let (numero, dv) = clean.split_at(clean.len() - 1);
    (numero.to_string(), dv.to_ascii_uppercase())
}

/// Join the split parts back into the printed `numero-dv` form.
///
/// An unsplittable RUT prints as nothing, not as a bare dash.
pub fn join_rut(raw: &str) -> String {
    let (numero, dv) = split_rut(raw);
    if numero.is_empty() {
        String::new()
    } else {
        format!("{numero}-{dv}")
    }
}

/// Decompose an ISO `YYYY-MM-DD` date into `(day, month, year)`.
///
/// Anything that does not split on `-` into exactly three parts yields
/// three empty strings.
pub fn split_date(raw: &str) -> (String, String, String) {
    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() != 3 {
        return (String::new(), String::new(), String::new());
    }
    (parts[2].to_string(), parts[1].to_string(), parts[0].to_string())
}

/// Format a raw monetary string for display.
///
/// Empty input prints as empty; a parseable integer is grouped with `.`
/// thousands separators (es-CL convention); anything else passes
/// through unchanged so hand-written values like `"12 UF"` survive.
pub fn format_clp(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.parse::<i64>() {
        Ok(n) => group_thousands(n),
        Err(_) => value.to_string(),
    }
}

/// Group an integer with `.` thousands separators.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Parse a valuation string as an integer amount, defaulting to zero.
///
/// Aggregation relies on this never failing: non-numeric or missing
/// valuations contribute nothing to a total.
pub fn parse_amount(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

/// Render a stored date for table rows: slashes instead of dashes, no
/// reordering.
pub fn slash_date(raw: &str) -> String {
    raw.replace('-', "/")
}
