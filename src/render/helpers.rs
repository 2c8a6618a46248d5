//! Built-in helpers available to template expressions

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{
    DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike,
};
use indexmap::IndexMap;

use super::context::{Args, RenderContext};
use super::error::EvalError;
use super::value::{Value, MAX_SEQUENCE_LEN};
use crate::style::{OverrideMap, OverrideValue, StyleResolver};
use crate::theme::{heat_ratio, Rgb, Theme};

/// Most digits `dec` and `pct` will print after the decimal point
const MAX_DIGITS: i64 = 20;

/// Day, month and year, as in `7.&nbsp;3.&nbsp;2010`
const FULL_DATE: &str = "{day}.&nbsp;{month}.&nbsp;{year}";

/// Escape text for use in HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn register_formatting(context: &mut RenderContext) {
    context.register_helper("escape", |args| {
        args.arity(1, 1)?;
        Ok(Value::Str(escape_html(&args.value(0)?.to_string())))
    });
    context.register_helper("str", |args| {
        args.arity(1, 1)?;
        Ok(Value::Str(args.value(0)?.to_string()))
    });
    context.register_helper("int", to_int);
    context.register_helper("float", to_float);
    context.register_helper("len", length);
    context.register_helper("range", range);
    context.register_helper("keys", |args| {
        args.arity(1, 1)?;
        match args.value(0)? {
            Value::Map(entries) => Ok(Value::list(entries.keys().cloned())),
            other => Err(args.error(format!("expected a map, not {}", other.type_name()))),
        }
    });
    context.register_helper("values", |args| {
        args.arity(1, 1)?;
        match args.value(0)? {
            Value::Map(entries) => Ok(Value::List(entries.values().cloned().collect())),
            other => Err(args.error(format!("expected a map, not {}", other.type_name()))),
        }
    });
    context.register_helper("sorted", sorted);
    context.register_helper("min", |args| extreme(args, Ordering::Less));
    context.register_helper("max", |args| extreme(args, Ordering::Greater));
    context.register_helper("abs", |args| {
        args.arity(1, 1)?;
        match args.value(0)? {
            Value::Int(n) => Ok(Value::Int(n.saturating_abs())),
            _ => Ok(Value::Float(args.number(0)?.abs())),
        }
    });
    context.register_helper("round", |args| {
        args.arity(1, 2)?;
        let x = args.number(0)?;
        match args.get(1) {
            None | Some(Value::Null) => Ok(Value::Int(x.round() as i64)),
            Some(_) => {
                let factor = 10f64.powi(args.int(1)? as i32);
                Ok(Value::Float((x * factor).round() / factor))
            }
        }
    });
    context.register_helper("dec", |args| {
        args.arity(1, 2)?;
        let digits = digit_count(&args, 1, 0)?;
        Ok(Value::Str(format!("{:.*}", digits, args.number(0)?)))
    });
    context.register_helper("pct", |args| {
        args.arity(2, 3)?;
        let part = args.number(0)?;
        let total = args.number(1)?;
        let digits = digit_count(&args, 2, 1)?;
        let share = if total == 0.0 { 0.0 } else { part * 100.0 / total };
        Ok(Value::Str(format!("{:.*}", digits, share)))
    });
    context.register_helper("dist", |args| {
        args.arity(1, 1)?;
        let km = args.number(0)?;
        let digits = if km < 10.0 {
            2
        } else if km < 100.0 {
            1
        } else {
            0
        };
        Ok(Value::Str(format!("{:.*}", digits, km)))
    });
    context.register_helper("lat", |args| {
        args.arity(1, 1)?;
        let deg = args.number(0)?;
        Ok(Value::Str(coordinate(deg, if deg > 0.0 { 'N' } else { 'S' }, 2)))
    });
    context.register_helper("lon", |args| {
        args.arity(1, 1)?;
        let deg = args.number(0)?;
        Ok(Value::Str(coordinate(deg, if deg > 0.0 { 'E' } else { 'W' }, 3)))
    });
    context.register_helper("share", |args| {
        args.arity(2, 2)?;
        Ok(Value::Float(heat_ratio(args.number(0)?, args.number(1)?)))
    });
    context.register_helper("date", |args| {
        args.arity(0, 2)?;
        let moment = date_argument(&args, 0)?;
        let format = match args.get(1) {
            None | Some(Value::Null) => FULL_DATE,
            Some(_) => args.string(1)?,
        };
        Ok(Value::Str(format_date(&args, &moment, format)?))
    });
    context.register_helper("date_range", date_range);
}

pub(crate) fn register_theme(context: &mut RenderContext, theme: Arc<Theme>) {
    let t = Arc::clone(&theme);
    context.register_helper("css", move |args| {
        let (classes, overrides) = style_arguments(&args)?;
        Ok(Value::Str(
            StyleResolver::new(&t).resolve(&classes, overrides.as_ref())?,
        ))
    });
    let t = Arc::clone(&theme);
    context.register_helper("style", move |args| {
        let (classes, overrides) = style_arguments(&args)?;
        Ok(Value::Str(
            StyleResolver::new(&t).style_attribute(&classes, overrides.as_ref())?,
        ))
    });
    let t = Arc::clone(&theme);
    context.register_helper("gradient", move |args| {
        args.arity(3, 3)?;
        let from = color_argument(&t, &args, 0)?;
        let to = color_argument(&t, &args, 1)?;
        Ok(Value::Color(from.interpolate(to, args.number(2)?)))
    });
    context.register_helper("css_header", move |args| {
        args.arity(0, 0)?;
        Ok(Value::Str(theme.header_css()))
    });
}

fn to_int(args: Args<'_>) -> Result<Value, EvalError> {
    args.arity(1, 1)?;
    match args.value(0)? {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(x) => Ok(Value::Int(x.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| args.error(format!("invalid integer '{}'", s))),
        other => Err(args.error(format!("cannot convert {} to int", other.type_name()))),
    }
}

fn to_float(args: Args<'_>) -> Result<Value, EvalError> {
    args.arity(1, 1)?;
    match args.value(0)? {
        Value::Str(s) => s
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|_| args.error(format!("invalid number '{}'", s))),
        Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
        _ => Ok(Value::Float(args.number(0)?)),
    }
}

fn length(args: Args<'_>) -> Result<Value, EvalError> {
    args.arity(1, 1)?;
    let n = match args.value(0)? {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => return Err(args.error(format!("{} has no length", other.type_name()))),
    };
    Ok(Value::from(n))
}

fn range(args: Args<'_>) -> Result<Value, EvalError> {
    args.arity(1, 3)?;
    let (start, stop) = if args.len() == 1 {
        (0, args.int(0)?)
    } else {
        (args.int(0)?, args.int(1)?)
    };
    let step = args.int_or(2, 1)?;
    if step == 0 {
        return Err(args.error("step must not be zero"));
    }

    // Counted in i128 so no bound or step can overflow
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let span = stop - start;
    let count = if span.signum() == step.signum() {
        (span.abs() + step.abs() - 1) / step.abs()
    } else {
        0
    };
    if count > MAX_SEQUENCE_LEN as i128 {
        return Err(EvalError::TooLarge {
            size: count.unsigned_abs(),
            limit: MAX_SEQUENCE_LEN,
        });
    }
    Ok(Value::List(
        (0..count)
            .map(|i| Value::Int((start + i * step) as i64))
            .collect(),
    ))
}

/// Optional digit count for fixed-point output
fn digit_count(args: &Args<'_>, index: usize, default: i64) -> Result<usize, EvalError> {
    let digits = args.int_or(index, default)?;
    if !(0..=MAX_DIGITS).contains(&digits) {
        return Err(args.error(format!(
            "digits must be between 0 and {}, not {}",
            MAX_DIGITS, digits
        )));
    }
    Ok(digits as usize)
}

/// Ordering between two sortable values: numbers with numbers, strings with strings
fn order(args: &Args<'_>, a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    let ordering = match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };
    ordering.ok_or_else(|| {
        args.error(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))
    })
}

fn sorted(args: Args<'_>) -> Result<Value, EvalError> {
    args.arity(1, 1)?;
    let mut items = match args.value(0)? {
        Value::List(items) => items.clone(),
        Value::Map(entries) => entries.keys().cloned().map(Value::Str).collect(),
        other => return Err(args.error(format!("cannot sort {}", other.type_name()))),
    };

    // Check every pair once up front so the sort itself cannot fail
    for pair in items.windows(2) {
        order(&args, &pair[0], &pair[1])?;
    }
    items.sort_by(|a, b| order(&args, a, b).unwrap_or(Ordering::Equal));
    Ok(Value::List(items))
}

/// `min`/`max`: over one list argument, or over all arguments
fn extreme(args: Args<'_>, wanted: Ordering) -> Result<Value, EvalError> {
    let candidates = match args.values() {
        [Value::List(items)] => items.as_slice(),
        values => values,
    };
    let mut best = candidates
        .first()
        .ok_or_else(|| args.error("expected at least one value"))?;
    for candidate in &candidates[1..] {
        if order(&args, candidate, best)? == wanted {
            best = candidate;
        }
    }
    Ok(best.clone())
}

/// `N 50° 05.123` style coordinate
fn coordinate(deg: f64, hemisphere: char, degree_width: usize) -> String {
    let deg = deg.abs();
    let whole = deg.floor();
    let minutes = (deg - whole) * 60.0;
    format!(
        "{} {:0width$}° {:06.3}",
        hemisphere,
        whole as i64,
        minutes,
        width = degree_width
    )
}

/// A date argument: `YYYY-MM-DD`, a unix timestamp in seconds, or none
/// for the current local time
fn date_argument(args: &Args<'_>, index: usize) -> Result<NaiveDateTime, EvalError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(Local::now().naive_local()),
        Some(Value::Str(text)) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|e| args.error(format!("invalid date '{}': {}", text, e))),
        Some(Value::Int(seconds)) => DateTime::from_timestamp(*seconds, 0)
            .map(|utc| utc.with_timezone(&Local).naive_local())
            .ok_or_else(|| args.error(format!("timestamp {} is out of range", seconds))),
        Some(other) => Err(args.error(format!(
            "argument {} must be a date, not {}",
            index + 1,
            other.type_name()
        ))),
    }
}

/// A length of time given as a map such as `{"days": 6}`
fn duration_argument(
    args: &Args<'_>,
    entries: &IndexMap<String, Value>,
) -> Result<TimeDelta, EvalError> {
    let mut total = TimeDelta::zero();
    for (unit, amount) in entries {
        let amount = match amount {
            Value::Int(n) => *n,
            other => {
                return Err(args.error(format!(
                    "'{}' must be an int, not {}",
                    unit,
                    other.type_name()
                )))
            }
        };
        let delta = match unit.as_str() {
            "weeks" => TimeDelta::try_weeks(amount),
            "days" => TimeDelta::try_days(amount),
            "hours" => TimeDelta::try_hours(amount),
            other => return Err(args.error(format!("unknown duration unit '{}'", other))),
        };
        total = delta
            .and_then(|delta| total.checked_add(&delta))
            .ok_or_else(|| args.error("duration is out of range"))?;
    }
    Ok(total)
}

/// Substitute `{day}`, `{month}`, `{year}`, `{hour}`, `{minute}`,
/// `{monthname}` and `{monthabr}` in `format`
fn format_date(
    args: &Args<'_>,
    moment: &NaiveDateTime,
    format: &str,
) -> Result<String, EvalError> {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let field = &rest[open + 1..];
        let close = field
            .find('}')
            .ok_or_else(|| args.error(format!("unclosed '{{' in date format '{}'", format)))?;
        let text = match &field[..close] {
            "day" => moment.day().to_string(),
            "month" => moment.month().to_string(),
            "year" => moment.year().to_string(),
            "hour" => format!("{:02}", moment.hour()),
            "minute" => format!("{:02}", moment.minute()),
            "monthname" => moment.format("%B").to_string(),
            "monthabr" => moment.format("%b").to_string(),
            other => return Err(args.error(format!("unknown date field '{{{}}}'", other))),
        };
        out.push_str(&text);
        rest = &field[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn date_range(args: Args<'_>) -> Result<Value, EvalError> {
    args.arity(1, 2)?;
    let start = date_argument(&args, 0)?;
    let end = match args.get(1) {
        None | Some(Value::Null) => {
            return Ok(Value::Str(format_date(&args, &start, FULL_DATE)?))
        }
        Some(Value::Map(entries)) => {
            let length = duration_argument(&args, entries)?;
            start
                .checked_add_signed(length)
                .ok_or_else(|| args.error("end of range is out of range"))?
        }
        Some(_) => date_argument(&args, 1)?,
    };
    let (start, end) = if start > end { (end, start) } else { (start, end) };

    let head = if (start.year(), start.month()) == (end.year(), end.month()) {
        "{day}."
    } else if start.year() == end.year() {
        "{day}.&nbsp;{month}."
    } else {
        FULL_DATE
    };
    Ok(Value::Str(format!(
        "{}&nbsp;– {}",
        format_date(&args, &start, head)?,
        format_date(&args, &end, FULL_DATE)?
    )))
}

/// Split `css`/`style` arguments into class names and one override map
fn style_arguments(args: &Args<'_>) -> Result<(Vec<String>, Option<OverrideMap>), EvalError> {
    let mut classes = Vec::new();
    let mut overrides: Option<OverrideMap> = None;

    for value in args.values() {
        match value {
            Value::Null => {}
            Value::Str(name) => classes.push(name.clone()),
            Value::List(items) => {
                for item in items {
                    match item {
                        Value::Str(name) => classes.push(name.clone()),
                        other => {
                            return Err(args.error(format!(
                                "class names must be strings, not {}",
                                other.type_name()
                            )))
                        }
                    }
                }
            }
            Value::Map(entries) => {
                let map = overrides.get_or_insert_with(OverrideMap::new);
                merge_overrides(map, entries);
            }
            other => {
                return Err(args.error(format!(
                    "expected class names or overrides, not {}",
                    other.type_name()
                )))
            }
        }
    }
    Ok((classes, overrides))
}

fn merge_overrides(map: &mut OverrideMap, entries: &IndexMap<String, Value>) {
    for (property, value) in entries {
        let value = match value {
            Value::Color(c) => OverrideValue::Color(*c),
            other => OverrideValue::Text(other.to_string()),
        };
        map.insert(property.clone(), value);
    }
}

/// A color argument: a color value or the name of a theme color
fn color_argument(theme: &Theme, args: &Args<'_>, index: usize) -> Result<Rgb, EvalError> {
    match args.value(index)? {
        Value::Color(c) => Ok(*c),
        Value::Str(name) => Ok(theme.color(name)?),
        other => Err(args.error(format!(
            "argument {} must be a color, not {}",
            index + 1,
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeError;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
        RenderContext::with_theme(Arc::new(crate::theme::default_theme())).call(name, args)
    }

    fn text(name: &str, args: &[Value]) -> String {
        match call(name, args).unwrap() {
            Value::Str(s) => s,
            other => panic!("Expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("int", &["42".into()]), Ok(Value::Int(42)));
        assert_eq!(call("int", &[Value::Float(-2.7)]), Ok(Value::Int(-2)));
        assert_eq!(call("float", &["0.5".into()]), Ok(Value::Float(0.5)));
        assert_eq!(text("str", &[Value::Int(7)]), "7");
        assert!(call("int", &["x".into()]).is_err());
    }

    #[test]
    fn test_range_and_len() {
        assert_eq!(call("range", &[Value::Int(3)]), Ok(Value::list([0, 1, 2])));
        assert_eq!(
            call("range", &[Value::Int(5), Value::Int(0), Value::Int(-2)]),
            Ok(Value::list([5, 3, 1]))
        );
        assert!(call("range", &[Value::Int(0), Value::Int(3), Value::Int(0)]).is_err());
        assert_eq!(call("len", &["héllo".into()]), Ok(Value::Int(5)));
    }

    #[test]
    fn test_range_near_integer_limits() {
        assert_eq!(
            call(
                "range",
                &[Value::Int(i64::MAX - 1), Value::Int(i64::MAX), Value::Int(5)]
            ),
            Ok(Value::list([i64::MAX - 1]))
        );
        assert_eq!(
            call(
                "range",
                &[Value::Int(i64::MIN + 1), Value::Int(i64::MIN), Value::Int(-3)]
            ),
            Ok(Value::list([i64::MIN + 1]))
        );
        assert!(matches!(
            call("range", &[Value::Int(i64::MAX)]),
            Err(EvalError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_sorted_min_max() {
        let list = Value::list([3, 1, 2]);
        assert_eq!(call("sorted", &[list.clone()]), Ok(Value::list([1, 2, 3])));
        assert_eq!(call("min", &[list.clone()]), Ok(Value::Int(1)));
        assert_eq!(call("max", &[Value::Int(4), Value::Float(4.5)]), Ok(Value::Float(4.5)));
        assert!(call("sorted", &[Value::list(vec![Value::Int(1), Value::from("a")])]).is_err());
        assert!(call("max", &[Value::List(vec![])]).is_err());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(call("round", &[Value::Float(2.5)]), Ok(Value::Int(3)));
        assert_eq!(
            call("round", &[Value::Float(1.2345), Value::Int(2)]),
            Ok(Value::Float(1.23))
        );
        assert_eq!(text("dec", &[Value::Float(3.14159), Value::Int(2)]), "3.14");
        assert_eq!(text("pct", &[Value::Int(1), Value::Int(3)]), "33.3");
        assert_eq!(text("pct", &[Value::Int(1), Value::Int(0)]), "0.0");
    }

    #[test]
    fn test_digit_count_is_bounded() {
        assert!(matches!(
            call("dec", &[Value::Int(1), Value::Int(100_000)]),
            Err(EvalError::Helper { helper, .. }) if helper == "dec"
        ));
        assert!(matches!(
            call("pct", &[Value::Int(1), Value::Int(2), Value::Int(70_000)]),
            Err(EvalError::Helper { helper, .. }) if helper == "pct"
        ));
        assert!(call("dec", &[Value::Int(1), Value::Int(-1)]).is_err());
        assert_eq!(
            text("dec", &[Value::Float(0.5), Value::Int(20)]),
            "0.50000000000000000000"
        );
    }

    #[test]
    fn test_distance_precision() {
        assert_eq!(text("dist", &[Value::Float(5.4321)]), "5.43");
        assert_eq!(text("dist", &[Value::Float(54.321)]), "54.3");
        assert_eq!(text("dist", &[Value::Float(543.21)]), "543");
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(text("lat", &[Value::Float(50.0853833)]), "N 50° 05.123");
        assert_eq!(text("lon", &[Value::Float(-14.5)]), "W 014° 30.000");
    }

    #[test]
    fn test_dates() {
        assert_eq!(text("date", &["2010-03-07".into()]), "7.&nbsp;3.&nbsp;2010");
        assert_eq!(
            text("date_range", &["2010-03-07".into(), "2010-03-01".into()]),
            "1.&nbsp;– 7.&nbsp;3.&nbsp;2010"
        );
        assert_eq!(
            text("date_range", &["2010-01-07".into(), "2010-03-01".into()]),
            "7.&nbsp;1.&nbsp;– 1.&nbsp;3.&nbsp;2010"
        );
        assert_eq!(
            text("date_range", &["2009-12-31".into(), "2010-01-01".into()]),
            "31.&nbsp;12.&nbsp;2009&nbsp;– 1.&nbsp;1.&nbsp;2010"
        );
        assert!(call("date", &["yesterday".into()]).is_err());
    }

    #[test]
    fn test_impossible_dates_are_rejected() {
        assert!(matches!(
            call("date", &["2010-02-31".into()]),
            Err(EvalError::Helper { helper, .. }) if helper == "date"
        ));
        assert!(call("date_range", &["2010-02-30".into(), "2010-04-31".into()]).is_err());
    }

    #[test]
    fn test_date_formats() {
        let day = Value::from("2010-03-07");
        assert_eq!(
            text("date", &[day.clone(), "{day}. {monthname} {year}".into()]),
            "7. March 2010"
        );
        assert_eq!(
            text("date", &[day.clone(), "{monthabr} {day}, {hour}:{minute}".into()]),
            "Mar 7, 00:00"
        );
        assert!(call("date", &[day.clone(), "{weekday}".into()]).is_err());
        assert!(call("date", &[day, "{day".into()]).is_err());
        // Noon UTC is the same calendar day in every zone but the +13/+14 ones
        assert_eq!(
            text("date", &[Value::Int(1_262_347_200), "{year}".into()]),
            "2010"
        );
        assert!(call("date", &[]).is_ok());
    }

    #[test]
    fn test_date_range_with_duration() {
        assert_eq!(
            text("date_range", &["2010-03-28".into(), Value::map([("days", 6)])]),
            "28.&nbsp;3.&nbsp;– 3.&nbsp;4.&nbsp;2010"
        );
        assert_eq!(
            text("date_range", &["2010-03-07".into(), Value::map([("weeks", -1)])]),
            "28.&nbsp;2.&nbsp;– 7.&nbsp;3.&nbsp;2010"
        );
        assert!(call("date_range", &["2010-03-07".into(), Value::map([("years", 1)])]).is_err());
    }

    #[test]
    fn test_gradient_helper() {
        let ratio = Value::Float(0.5);
        assert_eq!(
            call("gradient", &["lightmin".into(), "lightmax".into(), ratio.clone()]),
            Ok(Value::Color(Rgb::new(255, 120, 0)))
        );
        assert_eq!(
            call(
                "gradient",
                &[Value::Color(Rgb::new(0, 0, 0)), Value::Color(Rgb::new(0, 0, 100)), ratio.clone()]
            ),
            Ok(Value::Color(Rgb::new(0, 0, 50)))
        );
        assert_eq!(
            call("gradient", &["lightmin".into(), "rgb(0,0,100)".into(), ratio.clone()]),
            Err(EvalError::Style(ThemeError::unknown_color("rgb(0,0,100)")))
        );
        assert_eq!(
            call("gradient", &["nope".into(), "lightmax".into(), ratio]),
            Err(EvalError::Style(ThemeError::unknown_color("nope")))
        );
    }

    #[test]
    fn test_css_helpers() {
        assert_eq!(
            text("css", &["number".into(), "highlight".into()]),
            "text-align: right; white-space: nowrap; font-weight: bold;"
        );
        let overrides = Value::map([("white-space", "inherit")]);
        assert_eq!(
            text("style", &[Value::list(["number"]), overrides]),
            " style=\"text-align: right;\""
        );
        assert_eq!(
            call("css", &["nope".into()]),
            Err(EvalError::Style(ThemeError::unknown_class("nope")))
        );
        assert_eq!(
            call("css", &[Value::map([("colour", "red")])]),
            Err(EvalError::Style(ThemeError::unknown_property("colour")))
        );
    }

    #[test]
    fn test_css_header() {
        assert_eq!(
            text("css_header", &[]),
            "\nbody {margin: 0; padding: 0; font-family: sans-serif;}\na {color: rgb(0,0,160);}"
        );
    }
}
