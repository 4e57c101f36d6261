use minijinja::value::Value;
use minijinja::{Environment, Error, ErrorKind};
use time::format_description::modifier::{
    Day, Hour, Minute, Month, MonthRepr, OffsetHour, OffsetMinute, Padding, Period, Second,
    Weekday, WeekdayRepr, Year, YearRepr,
};
use time::format_description::{BorrowedFormatItem, Component, OwnedFormatItem};
use time::macros::format_description;
use time::{PrimitiveDateTime, UtcOffset};

use crate::markdown;

/// Shape jrnl uses for entry dates: no seconds, no embedded timezone.
const ENTRY_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

pub(super) const DEFAULT_DATETIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";
const DEFAULT_UTC_OFFSET: &str = "+0100";

pub(super) fn register(env: &mut Environment<'static>) {
    env.add_filter("datetime", datetime);
    env.add_filter("md2html", md2html);
    env.add_filter("tagstrip", tagstrip);
    env.add_filter("strip_markdown", strip_markdown);
}

/// Re-emits a journal timestamp using a strftime-style pattern. The input
/// carries no timezone of its own; `offset` supplies one before formatting.
fn datetime(value: Value, format: Option<String>, offset: Option<String>) -> Result<Value, Error> {
    let raw = value.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            "datetime filter expects a string input",
        )
    })?;

    let parsed = PrimitiveDateTime::parse(raw.trim(), ENTRY_DATE_FORMAT).map_err(|err| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("datetime filter expects 'YYYY-MM-DD HH:MM' dates; got '{raw}': {err}"),
        )
    })?;
    let offset = parse_offset(offset.as_deref().unwrap_or(DEFAULT_UTC_OFFSET))?;
    let stamped = parsed.assume_offset(offset);

    let items = translate_strftime(format.as_deref().unwrap_or(DEFAULT_DATETIME_FORMAT))?;
    let formatted = stamped.format(&items).map_err(|err| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("failed to format datetime: {err}"),
        )
    })?;

    Ok(Value::from(formatted))
}

/// Markdown to an HTML fragment, marked safe so autoescaping templates emit
/// it verbatim. The output is not sanitized.
fn md2html(value: &str) -> Value {
    Value::from_safe_string(markdown::render_markdown(value))
}

/// Removes the leading sigil from a tag string. Empty input stays empty.
fn tagstrip(value: &str) -> String {
    value.chars().skip(1).collect()
}

fn strip_markdown(value: &str) -> String {
    markdown::plain_text(value)
}

/// Accepts `+HHMM` (strftime `%z` style), `+HH:MM`, `+HH`, `UTC`, and `Z`.
fn parse_offset(value: &str) -> Result<UtcOffset, Error> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("UTC") || trimmed.eq_ignore_ascii_case("Z") {
        return Ok(UtcOffset::UTC);
    }

    let invalid = |detail: &str| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("datetime filter offset '{value}' is invalid: {detail}"),
        )
    };

    let mut chars = trimmed.chars();
    let sign = match chars.next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Err(invalid("expected a leading '+' or '-'")),
    };

    let digits = chars.as_str();
    let (hours_str, minutes_str) = match digits.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };

    let hours: i8 = hours_str
        .parse()
        .map_err(|_| invalid("hour component is not a number"))?;
    let minutes: i8 = minutes_str
        .parse()
        .map_err(|_| invalid("minute component is not a number"))?;

    UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid("out of range"))
}

/// Translates a strftime pattern into `time` format items. Composite codes
/// (%R, %T, %F) expand inline; unknown codes are render errors.
pub(super) fn translate_strftime(format: &str) -> Result<Vec<OwnedFormatItem>, Error> {
    let mut items = Vec::new();
    let mut literal: Vec<u8> = Vec::new();
    let mut chars = format.chars();

    fn flush(items: &mut Vec<OwnedFormatItem>, buf: &mut Vec<u8>) {
        if !buf.is_empty() {
            items.push(OwnedFormatItem::Literal(
                buf.drain(..).collect::<Vec<_>>().into_boxed_slice(),
            ));
        }
    }

    while let Some(ch) = chars.next() {
        if ch != '%' {
            literal.extend(ch.to_string().bytes());
            continue;
        }

        let Some(code) = chars.next() else {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                "datetime filter received a format with a dangling '%'",
            ));
        };

        if code == '%' {
            literal.push(b'%');
            continue;
        }

        flush(&mut items, &mut literal);

        let expansion: &[char] = match code {
            'R' => &['H', ':', 'M'],
            'T' => &['H', ':', 'M', ':', 'S'],
            'F' => &['Y', '-', 'm', '-', 'd'],
            _ => {
                items.push(component_for(code).ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("datetime filter does not support %{code}"),
                    )
                })?);
                continue;
            }
        };

        for &piece in expansion {
            match component_for(piece) {
                Some(item) => items.push(item),
                None => {
                    literal.push(piece as u8);
                    flush(&mut items, &mut literal);
                }
            }
        }
    }

    flush(&mut items, &mut literal);

    if items.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "datetime filter received an empty format",
        ));
    }

    Ok(items)
}

fn component_for(code: char) -> Option<OwnedFormatItem> {
    let component = match code {
        'Y' => Component::Year(Year::default()),
        'y' => {
            let mut year = Year::default();
            year.repr = YearRepr::LastTwo;
            Component::Year(year)
        }
        'm' => Component::Month(Month::default()),
        'b' => {
            let mut month = Month::default();
            month.repr = MonthRepr::Short;
            Component::Month(month)
        }
        'B' => {
            let mut month = Month::default();
            month.repr = MonthRepr::Long;
            Component::Month(month)
        }
        'd' => Component::Day(Day::default()),
        'e' => {
            let mut day = Day::default();
            day.padding = Padding::Space;
            Component::Day(day)
        }
        'H' => Component::Hour(Hour::default()),
        'I' => {
            let mut hour = Hour::default();
            hour.is_12_hour_clock = true;
            Component::Hour(hour)
        }
        'M' => Component::Minute(Minute::default()),
        'S' => Component::Second(Second::default()),
        'a' => {
            let mut weekday = Weekday::default();
            weekday.repr = WeekdayRepr::Short;
            Component::Weekday(weekday)
        }
        'A' => Component::Weekday(Weekday::default()),
        'p' => {
            let mut period = Period::default();
            period.is_uppercase = true;
            Component::Period(period)
        }
        'P' => {
            let mut period = Period::default();
            period.is_uppercase = false;
            Component::Period(period)
        }
        'z' => {
            let mut hour = OffsetHour::default();
            hour.sign_is_mandatory = true;
            return Some(OwnedFormatItem::Compound(Box::new([
                Component::OffsetHour(hour).into(),
                Component::OffsetMinute(OffsetMinute::default()).into(),
            ])));
        }
        _ => return None,
    };
    Some(component.into())
}
