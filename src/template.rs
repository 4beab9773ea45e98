use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

/// A record whose named fields can be substituted into a format string.
pub trait Fields {
    /// Every name `field` resolves.
    const FIELDS: &'static [&'static str];

    fn field(&self, name: &str) -> Option<String>;
}

/// Replace each `{{.Name}}` in `format` with the matching field of `data`.
pub fn render<T: Fields>(format: &str, data: &T) -> Result<String> {
    lazy_static! {
        static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{\{\s*\.(\w+)\s*\}\}").unwrap();
    }

    let mut out = String::with_capacity(format.len());
    let mut last = 0;
    for cap in PLACEHOLDER_REGEX.captures_iter(format) {
        let whole = cap.get(0).unwrap();
        let name = &cap[1];
        let value = data
            .field(name)
            .ok_or_else(|| Error::UnknownField { name: name.to_owned() })?;
        out += &format[last..whole.start()];
        out += &value;
        last = whole.end();
    }
    out += &format[last..];
    Ok(out)
}

/// Expand `\n`, `\t` and `\\` typed on a command line.
pub fn unescape(format: &str) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pilot;

    impl Fields for Pilot {
        const FIELDS: &'static [&'static str] = &["Name", "Wing"];

        fn field(&self, name: &str) -> Option<String> {
            match name {
                "Name" => Some("Jane".to_owned()),
                "Wing" => Some("Rush 6".to_owned()),
                _ => None,
            }
        }
    }

    #[test]
    fn substitutes_fields() {
        assert_eq!(render("{{.Name}} flies a {{ .Wing }}!", &Pilot).unwrap(), "Jane flies a Rush 6!");
        assert_eq!(render("no fields", &Pilot).unwrap(), "no fields");
    }

    #[test]
    fn unknown_field_is_an_error() {
        match render("{{.Glider}}", &Pilot) {
            Err(Error::UnknownField { name }) => assert_eq!(name, "Glider"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unescapes_command_line_sequences() {
        assert_eq!(unescape(r"a\tb\n"), "a\tb\n");
        assert_eq!(unescape(r"c:\\dir\x"), "c:\\dir\\x");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
