//! en-US number rendering for table cells and stat cards.

const COMPACT_UNITS: [(f64, &str); 5] = [
    (1.0, ""),
    (1e3, "K"),
    (1e6, "M"),
    (1e9, "B"),
    (1e12, "T"),
];

/// Compact notation: `1234` -> `1.2K`, `3_400_000` -> `3.4M`.
pub fn format_compact_number(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let (negative, body) = compact_parts(value, max_fraction_digits);
    if negative {
        format!("-{body}")
    } else {
        body
    }
}

/// Compact notation with a narrow dollar sign: `-1500` -> `-$1.5K`.
pub fn format_compact_currency(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return "$0".to_string();
    }
    let (negative, body) = compact_parts(value, max_fraction_digits);
    if negative {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

/// Signed percentage with one decimal: `12.34` -> `+12.3%`.
pub fn format_with_sign(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    let prefix = if value > 0.0 { "+" } else { "" };
    format!("{prefix}{value:.1}%")
}

/// Fixed decimals with thousands separators: `1234.5` -> `1,234.50`.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn compact_parts(value: f64, digits: usize) -> (bool, String) {
    let abs = value.abs();
    let mut idx = COMPACT_UNITS
        .iter()
        .rposition(|(scale, _)| abs >= *scale)
        .unwrap_or(0);
    let mut scaled = round_to(abs / COMPACT_UNITS[idx].0, digits);
    // 999_950 rounds to 1000K; promote it to 1M
    if scaled >= 1000.0 && idx + 1 < COMPACT_UNITS.len() {
        idx += 1;
        scaled = round_to(abs / COMPACT_UNITS[idx].0, digits);
    }

    let body = trim_fraction(format!("{:.*}", digits, scaled));
    let negative = value < 0.0 && body != "0";
    (negative, format!("{body}{}", COMPACT_UNITS[idx].1))
}

fn round_to(value: f64, digits: usize) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

fn trim_fraction(mut text: String) -> String {
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}
