//! Parsing of the `draw_time` setting.
//!
//! Accepted forms:
//! - `[D ][[HH:]MM:]SS[.ffffff]`, e.g. `1 00:00:00`, `12:30:00`, `90`
//! - `N day[s][, HH:MM:SS]`, e.g. `1 day`, `2 days, 6:00:00`
//! - ISO 8601 `P[nW][nD][T[nH][nM][nS]]`, e.g. `P1D`, `PT12H`, `P1DT2H30M`

use chrono::Duration;

const MICROS_PER_SECOND: i64 = 1_000_000;

pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration is empty".into());
    }
    if let Some(rest) = s.strip_prefix('P') {
        return parse_iso8601(rest);
    }

    let (days, clock) = split_days(s)?;
    let time = if clock.is_empty() {
        Duration::zero()
    } else {
        parse_clock(clock)?
    };

    Duration::try_days(days)
        .and_then(|d| d.checked_add(&time))
        .ok_or_else(|| "duration is out of range".into())
}

fn parse_int(raw: &str, what: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| format!("'{raw}' is not a valid number of {what}"))
}

/// Splits a leading day count off the clock part.
fn split_days(s: &str) -> Result<(i64, &str), String> {
    if let Some((head, tail)) = s.split_once(" day") {
        let days = parse_int(head, "days")?;
        let tail = tail.strip_prefix('s').unwrap_or(tail);
        let tail = tail.trim_start().trim_start_matches(',').trim();
        return Ok((days, tail));
    }
    if let Some((head, tail)) = s.split_once(' ') {
        return Ok((parse_int(head, "days")?, tail.trim()));
    }
    Ok((0, s))
}

/// `[[HH:]MM:]SS[.ffffff]`
fn parse_clock(s: &str) -> Result<Duration, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [seconds] => ("0", "0", *seconds),
        [minutes, seconds] => ("0", *minutes, *seconds),
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        _ => return Err(format!("'{s}' has too many ':' separated fields")),
    };

    let hours = parse_int(hours, "hours")?;
    let minutes = parse_int(minutes, "minutes")?;
    if hours < 0 || minutes < 0 {
        return Err(format!("'{s}' must not contain negative fields"));
    }

    let (whole, fraction) = match seconds.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, fraction),
        None => (seconds, ""),
    };
    let whole = parse_int(whole, "seconds")?;
    if whole < 0 {
        return Err(format!("'{s}' must not contain negative fields"));
    }
    let micros = parse_fraction(fraction)?;

    let total_micros = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
        .and_then(|hm| hm.checked_add(whole))
        .and_then(|secs| secs.checked_mul(MICROS_PER_SECOND))
        .and_then(|us| us.checked_add(micros))
        .ok_or_else(|| "duration is out of range".to_string())?;
    Ok(Duration::microseconds(total_micros))
}

/// Up to six significant fractional digits; anything past microseconds is
/// dropped.
fn parse_fraction(fraction: &str) -> Result<i64, String> {
    if fraction.is_empty() {
        return Ok(0);
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{fraction}' is not a valid fraction of a second"));
    }
    let digits: String = fraction.chars().take(6).collect();
    let padded = format!("{digits:0<6}");
    parse_int(&padded, "microseconds")
}

fn parse_iso8601(rest: &str) -> Result<Duration, String> {
    let (date, time) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut micros: f64 = 0.0;
    let mut fields = 0;

    for (value, unit) in designators(date)? {
        let unit_seconds = match unit {
            'W' => 7.0 * 86_400.0,
            'D' => 86_400.0,
            other => return Err(format!("unsupported date designator '{other}'")),
        };
        micros += value * unit_seconds * MICROS_PER_SECOND as f64;
        fields += 1;
    }

    if let Some(time) = time {
        let parsed = designators(time)?;
        if parsed.is_empty() {
            return Err("'T' must be followed by a time component".into());
        }
        for (value, unit) in parsed {
            let unit_seconds = match unit {
                'H' => 3600.0,
                'M' => 60.0,
                'S' => 1.0,
                other => return Err(format!("unsupported time designator '{other}'")),
            };
            micros += value * unit_seconds * MICROS_PER_SECOND as f64;
            fields += 1;
        }
    }

    if fields == 0 {
        return Err("ISO 8601 duration has no components".into());
    }
    if !micros.is_finite() || micros > i64::MAX as f64 {
        return Err("duration is out of range".into());
    }
    Ok(Duration::microseconds(micros.round() as i64))
}

/// Splits `1D2H` style input into `(value, designator)` pairs.
fn designators(s: &str) -> Result<Vec<(f64, char)>, String> {
    let mut out = Vec::new();
    let mut number = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            number.push(if c == ',' { '.' } else { c });
        } else if c.is_ascii_alphabetic() {
            if number.is_empty() {
                return Err(format!("designator '{c}' has no value"));
            }
            let value = number
                .parse::<f64>()
                .map_err(|_| format!("'{number}' is not a valid number"))?;
            out.push((value, c));
            number.clear();
        } else {
            return Err(format!("unexpected character '{c}'"));
        }
    }

    if !number.is_empty() {
        return Err(format!("'{number}' is missing a designator"));
    }
    Ok(out)
}
