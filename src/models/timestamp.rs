use serde::{Deserialize, Serialize};
use std::fmt;

/// Date/time components of a GDP timestamp, exactly as written in the source.
///
/// Decomposition is positional: `YYYY-MM-DDTHH:MM:SS` with an optional
/// trailing `Z`. No calendar validation or zone conversion takes place, so
/// `2045-02-31T00:00:00Z` decomposes without complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Timestamp {
    /// Decompose a timestamp string. The error is a short reason; callers
    /// attach the row context.
    pub fn decompose(raw: &str) -> std::result::Result<Self, String> {
        if !raw.is_ascii() {
            return Err("contains non-ASCII characters".to_string());
        }
        if raw.len() < 19 {
            return Err(format!("expected at least 19 characters, found {}", raw.len()));
        }
        if raw.as_bytes()[10] != b'T' {
            return Err("missing 'T' date/time separator".to_string());
        }
        match &raw[19..] {
            "" | "Z" => {}
            trailing => return Err(format!("unexpected trailing text '{}'", trailing)),
        }

        let [year, month, day] = split_three(&raw[..10], '-', "date")?;
        let [hour, minute, second] = split_three(&raw[11..19], ':', "time")?;

        Ok(Self {
            year: parse_component(year, "year")?,
            month: parse_component(month, "month")?,
            day: parse_component(day, "day")?,
            hour: parse_component(hour, "hour")?,
            minute: parse_component(minute, "minute")?,
            second: parse_component(second, "second")?,
        })
    }

    pub fn components(&self) -> [i64; 6] {
        [
            self.year as i64,
            self.month as i64,
            self.day as i64,
            self.hour as i64,
            self.minute as i64,
            self.second as i64,
        ]
    }
}

fn split_three<'a>(
    part: &'a str,
    delimiter: char,
    what: &str,
) -> std::result::Result<[&'a str; 3], String> {
    let pieces: Vec<&str> = part.split(delimiter).collect();
    match pieces.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(format!(
            "{} part '{}' is not three '{}'-separated fields",
            what, part, delimiter
        )),
    }
}

fn parse_component<T: std::str::FromStr>(value: &str, name: &str) -> std::result::Result<T, String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{} '{}' is not an integer", name, value));
    }
    value
        .parse::<T>()
        .map_err(|_| format!("{} '{}' is out of range", name, value))
}

/// Space-separated integers, without zero padding (`2050 1 1 0 0 0`).
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}
