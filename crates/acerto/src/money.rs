//! Monetary amounts, percentages and locale-aware number parsing.
//!
//! Amounts are kept as integer centavos and percentages as basis points so
//! that splits are exact. Parsing accepts what operators actually type on a
//! phone keyboard: `R$ 1.234,56`, `1,234.56`, `10,5`, `12.50`, `-3,00`.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number formatting conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Brazilian Portuguese: `1.234,56`.
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    /// US English: `1,234.56`.
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    /// Parse a BCP 47 style tag such as `pt-BR` or `en_us`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "pt-br" | "pt" => Some(Self::PtBr),
            "en-us" | "en" => Some(Self::EnUs),
            _ => None,
        }
    }

    /// The canonical tag.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::PtBr => "pt-BR",
            Self::EnUs => "en-US",
        }
    }

    /// Decimal separator.
    #[must_use]
    pub fn decimal_separator(self) -> char {
        match self {
            Self::PtBr => ',',
            Self::EnUs => '.',
        }
    }

    /// Thousands separator.
    #[must_use]
    pub fn thousands_separator(self) -> char {
        match self {
            Self::PtBr => '.',
            Self::EnUs => ',',
        }
    }

    fn currency_symbol(self) -> &'static str {
        match self {
            Self::PtBr => "R$ ",
            Self::EnUs => "$",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9.,]*[0-9][0-9.,]*$").expect("valid number regex"))
}

/// Parse a human-entered number into an integer scaled by `10^scale`.
///
/// Rounds half away from zero when the input carries more fractional digits
/// than `scale`.
///
/// # Errors
///
/// Returns [`Error::InvalidAmount`] if the input is not a number in either
/// convention or does not fit in an `i64`.
pub fn parse_scaled(input: &str, locale: Locale, scale: u32) -> Result<i64> {
    let invalid = || Error::InvalidAmount {
        input: input.to_string(),
    };

    let mut text: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();

    let mut negative = false;
    if let Some(rest) = text.strip_prefix('-') {
        negative = true;
        text = rest.to_string();
    } else if let Some(rest) = text.strip_prefix('+') {
        text = rest.to_string();
    }

    let lowered = text.to_ascii_lowercase();
    if lowered.starts_with("r$") {
        text = text[2..].to_string();
    } else if let Some(rest) = text.strip_prefix('$') {
        text = rest.to_string();
    }

    if !negative {
        if let Some(rest) = text.strip_prefix('-') {
            negative = true;
            text = rest.to_string();
        }
    }

    if !digits_re().is_match(&text) {
        return Err(invalid());
    }

    let decimal = decimal_separator_of(&text, locale);

    let (int_part, frac_part) = match decimal {
        Some(sep) => {
            let idx = text.rfind(sep).ok_or_else(invalid)?;
            let frac = &text[idx + 1..];
            if frac.contains(['.', ',']) {
                return Err(invalid());
            }
            (&text[..idx], frac)
        }
        None => (text.as_str(), ""),
    };

    if let Some(sep) = decimal {
        if int_part.contains(sep) {
            return Err(invalid());
        }
    }

    let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();

    let mut value: i128 = 0;
    for d in int_digits.chars() {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(digit(d))))
            .ok_or_else(invalid)?;
    }

    let mut frac_digits = frac_part.chars();
    for _ in 0..scale {
        let d = frac_digits.next().map_or(0, digit);
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(d)))
            .ok_or_else(invalid)?;
    }
    if frac_digits.next().is_some_and(|d| digit(d) >= 5) {
        value += 1;
    }

    if negative {
        value = -value;
    }
    i64::try_from(value).map_err(|_| invalid())
}

fn digit(c: char) -> u32 {
    c.to_digit(10).unwrap_or(0)
}

/// Decide which separator, if any, is the decimal point.
fn decimal_separator_of(text: &str, locale: Locale) -> Option<char> {
    let dots = text.matches('.').count();
    let commas = text.matches(',').count();

    match (dots, commas) {
        (0, 0) => None,
        (_, 0) | (0, _) => {
            let (sep, count) = if dots > 0 { ('.', dots) } else { (',', commas) };
            if count > 1 {
                return None;
            }
            if sep == locale.decimal_separator() {
                return Some(sep);
            }
            let after = text.len() - text.rfind(sep).map_or(0, |i| i + 1);
            if after == 3 {
                None
            } else {
                Some(sep)
            }
        }
        _ => {
            let last_dot = text.rfind('.');
            let last_comma = text.rfind(',');
            if last_dot > last_comma {
                Some('.')
            } else {
                Some(',')
            }
        }
    }
}

fn group_thousands(mut value: u64, sep: char) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while value > 0 {
        groups.push(value % 1000);
        value /= 1000;
    }
    let mut out = String::new();
    for (i, group) in groups.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&group.to_string());
        } else {
            out.push(sep);
            out.push_str(&format!("{group:03}"));
        }
    }
    out
}

/// A monetary amount in centavos.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Build from centavos.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Build from whole currency units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Value in centavos.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Parse a human-entered amount.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAmount`] if the input is not a number.
    pub fn parse(input: &str, locale: Locale) -> Result<Self> {
        parse_scaled(input, locale, 2).map(Self)
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether the amount is above zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Subtraction that stops at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self((self.0 - other.0).max(0))
    }

    /// Multiply by a count of plays.
    #[must_use]
    pub fn times(self, count: u64) -> Option<Self> {
        let count = i64::try_from(count).ok()?;
        self.0.checked_mul(count).map(Self)
    }

    /// Take a percentage, rounding half away from zero to the centavo.
    #[must_use]
    pub fn percent(self, pct: Percent) -> Self {
        let num = i128::from(self.0) * i128::from(pct.basis_points());
        let mut q = num / 10_000;
        let r = num % 10_000;
        if r.abs() * 2 >= 10_000 {
            q += num.signum();
        }
        Self(q as i64)
    }

    /// Format with the currency symbol, e.g. `R$ 1.234,56`.
    #[must_use]
    pub fn format(self, locale: Locale) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{}{}", locale.currency_symbol(), self.abs_plain(locale))
    }

    /// Format without a symbol, e.g. `1.234,56`.
    #[must_use]
    pub fn format_plain(self, locale: Locale) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{}", self.abs_plain(locale))
    }

    /// Dot-decimal rendering with no grouping, as used in payment codes.
    #[must_use]
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    fn abs_plain(self, locale: Locale) -> String {
        let abs = self.0.unsigned_abs();
        format!(
            "{}{}{:02}",
            group_thousands(abs / 100, locale.thousands_separator()),
            locale.decimal_separator(),
            abs % 100
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(Locale::PtBr))
    }
}

/// A percentage in basis points (`10_000` is 100 %).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percent(u32);

impl Percent {
    /// 100 %.
    pub const FULL: Self = Self(10_000);

    /// Build from basis points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PercentOutOfRange`] above 100 %.
    pub fn from_basis_points(bp: u32) -> Result<Self> {
        if bp > 10_000 {
            return Err(Error::PercentOutOfRange {
                value: format!("{}", f64::from(bp) / 100.0),
            });
        }
        Ok(Self(bp))
    }

    /// Build from a whole percentage, clamped to 100.
    #[must_use]
    pub fn whole(pct: u32) -> Self {
        Self(pct.min(100) * 100)
    }

    /// Parse `40`, `33,5`, `12.25%`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAmount`] for non-numbers and
    /// [`Error::PercentOutOfRange`] outside 0..=100.
    pub fn parse(input: &str, locale: Locale) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches('%');
        let bp = parse_scaled(trimmed, locale, 2)?;
        if !(0..=10_000).contains(&bp) {
            return Err(Error::PercentOutOfRange {
                value: input.trim().to_string(),
            });
        }
        Ok(Self(bp as u32))
    }

    /// Value in basis points.
    #[must_use]
    pub const fn basis_points(self) -> u32 {
        self.0
    }

    /// What remains of 100 %.
    #[must_use]
    pub fn complement(self) -> Self {
        Self(10_000u32.saturating_sub(self.0))
    }

    /// Render as `40%` or `33,33%`.
    #[must_use]
    pub fn format(self, locale: Locale) -> String {
        if self.0 % 100 == 0 {
            format!("{}%", self.0 / 100)
        } else {
            let frac = format!("{:02}", self.0 % 100);
            format!(
                "{}{}{}%",
                self.0 / 100,
                locale.decimal_separator(),
                frac.trim_end_matches('0')
            )
        }
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(Locale::PtBr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn br(input: &str) -> i64 {
        Money::parse(input, Locale::PtBr).unwrap().cents()
    }

    fn us(input: &str) -> i64 {
        Money::parse(input, Locale::EnUs).unwrap().cents()
    }

    #[test]
    fn test_parse_pt_br_formats() {
        assert_eq!(br("1.234,56"), 123_456);
        assert_eq!(br("R$ 1.234,56"), 123_456);
        assert_eq!(br("r$10"), 1_000);
        assert_eq!(br("10,5"), 1_050);
        assert_eq!(br("0,05"), 5);
        assert_eq!(br("1.234"), 123_400);
        assert_eq!(br("1.234.567"), 123_456_700);
        assert_eq!(br(" 7 "), 700);
    }

    #[test]
    fn test_parse_en_us_formats() {
        assert_eq!(us("1,234.56"), 123_456);
        assert_eq!(us("$1,234.56"), 123_456);
        assert_eq!(us("10.5"), 1_050);
        assert_eq!(us("1,234"), 123_400);
        assert_eq!(us("1,234,567.8"), 123_456_780);
    }

    #[test]
    fn test_parse_foreign_convention_in_locale() {
        // Dot decimal typed on a pt-BR form.
        assert_eq!(br("12.50"), 1_250);
        assert_eq!(br("1,234.56"), 123_456);
        // Comma decimal typed on an en-US form.
        assert_eq!(us("12,5"), 1_250);
        assert_eq!(us("1.234,56"), 123_456);
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(br("-3,00"), -300);
        assert_eq!(br("-R$ 3,00"), -300);
        assert_eq!(br("R$ -3,00"), -300);
        assert_eq!(us("-$1,000.01"), -100_001);
    }

    #[test]
    fn test_parse_rounds_half_away_from_zero() {
        assert_eq!(br("0,005"), 1);
        assert_eq!(br("0,004"), 0);
        assert_eq!(br("-0,005"), -1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "abc", "R$", "1,2,3,4.5.6", "12a", ",", "1.2.3,4,5"] {
            assert!(
                Money::parse(input, Locale::PtBr).is_err(),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_format() {
        let m = Money::from_cents(123_456);
        assert_eq!(m.format(Locale::PtBr), "R$ 1.234,56");
        assert_eq!(m.format(Locale::EnUs), "$1,234.56");
        assert_eq!(Money::from_cents(-5).format(Locale::PtBr), "-R$ 0,05");
        assert_eq!(Money::ZERO.format_plain(Locale::PtBr), "0,00");
        assert_eq!(Money::from_cents(100_000_000).format_plain(Locale::EnUs), "1,000,000.00");
        assert_eq!(Money::from_cents(1050).to_decimal_string(), "10.50");
    }

    #[test]
    fn test_format_parse_round_trip() {
        for cents in [0, 1, 99, 100, 123_456, 100_000_000, -42, -123_456_789] {
            let m = Money::from_cents(cents);
            for locale in [Locale::PtBr, Locale::EnUs] {
                assert_eq!(Money::parse(&m.format(locale), locale).unwrap(), m);
                assert_eq!(Money::parse(&m.format_plain(locale), locale).unwrap(), m);
            }
        }
    }

    #[test]
    fn test_percent_split_rounding() {
        let gross = Money::from_cents(1_001);
        let share = gross.percent(Percent::whole(50));
        assert_eq!(share.cents(), 501);
        assert_eq!((gross - share).cents(), 500);

        assert_eq!(Money::from_cents(1_000).percent(Percent::FULL).cents(), 1_000);
        assert_eq!(Money::from_cents(1_000).percent(Percent::default()).cents(), 0);
        assert_eq!(Money::from_cents(-1_001).percent(Percent::whole(50)).cents(), -501);
    }

    #[test]
    fn test_percent_parse() {
        assert_eq!(Percent::parse("40", Locale::PtBr).unwrap(), Percent::whole(40));
        assert_eq!(Percent::parse("33,5%", Locale::PtBr).unwrap().basis_points(), 3_350);
        assert_eq!(Percent::parse("12.25", Locale::EnUs).unwrap().basis_points(), 1_225);
        assert!(matches!(
            Percent::parse("101", Locale::PtBr),
            Err(Error::PercentOutOfRange { .. })
        ));
        assert!(Percent::parse("-1", Locale::PtBr).is_err());
    }

    #[test]
    fn test_percent_complement_and_format() {
        let p = Percent::parse("33,33", Locale::PtBr).unwrap();
        assert_eq!(p.complement().basis_points(), 6_667);
        assert_eq!(p.format(Locale::PtBr), "33,33%");
        assert_eq!(Percent::whole(40).format(Locale::EnUs), "40%");
        assert_eq!(Percent::parse("12,5", Locale::PtBr).unwrap().to_string(), "12,5%");
        assert!(Percent::from_basis_points(10_001).is_err());
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_units(10);
        let b = Money::from_cents(250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!(b.saturating_sub(a), Money::ZERO);
        assert_eq!(b.times(4), Some(Money::from_units(10)));
        assert_eq!(Money::from_cents(i64::MAX).times(2), None);
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 1_500);
    }

    #[test]
    fn test_locale_tags() {
        assert_eq!(Locale::from_tag("pt_BR"), Some(Locale::PtBr));
        assert_eq!(Locale::from_tag("EN-us"), Some(Locale::EnUs));
        assert_eq!(Locale::from_tag("fr-FR"), None);
        assert_eq!(Locale::EnUs.to_string(), "en-US");
    }
}
