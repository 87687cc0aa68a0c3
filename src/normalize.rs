use crate::models::{Cell, DateStyle};
use crate::text::is_blank;
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").expect("valid regex"));
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})$").expect("valid regex"));

/// Rango de números que se toman como serial de Excel
const SERIAL_MIN: f64 = 1.0;
const SERIAL_MAX: f64 = 80000.0;

/// Convierte celdas crudas a texto, con las fechas en un formato único
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    pub style: DateStyle,
    pub serial_dates: bool,
}

impl Normalizer {
    pub fn new(style: DateStyle, serial_dates: bool) -> Self {
        Self { style, serial_dates }
    }

    pub fn cell(&self, cell: &Cell) -> String {
        match cell {
            Cell::Empty => String::new(),
            Cell::DateTime(dt) => self.format_date(dt.date()),
            Cell::Number(n) => {
                if n.is_nan() {
                    return String::new();
                }
                if self.serial_dates && (SERIAL_MIN..=SERIAL_MAX).contains(n) {
                    if let Some(date) = excel_serial_to_date(*n) {
                        return self.format_date(date);
                    }
                }
                format_number(*n)
            }
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Text(s) => self.text(s),
        }
    }

    /// Fechas en texto; lo que no se reconoce pasa igual
    pub fn text(&self, raw: &str) -> String {
        if is_blank(raw) {
            return String::new();
        }
        let s = raw.trim();

        // "YYYY-MM-DD 00:00:00"
        if let Some(caps) = ISO_PREFIX.captures(s) {
            let date = ymd(&caps[1], &caps[2], &caps[3]);
            return date.map_or_else(|| s.to_string(), |d| self.format_date(d));
        }

        // "D/M/YY" o "DD/MM/YYYY", siempre día primero
        if let Some(caps) = SLASH_DATE.captures(s) {
            let year = if caps[3].len() == 2 {
                format!("20{}", &caps[3])
            } else {
                caps[3].to_string()
            };
            let date = ymd(&year, &caps[2], &caps[1]);
            return date.map_or_else(|| s.to_string(), |d| self.format_date(d));
        }

        s.to_string()
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        match self.style {
            DateStyle::DayMonthYear => date.format("%d/%m/%Y").to_string(),
            DateStyle::Iso => date.format("%Y-%m-%d").to_string(),
        }
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Serial de Excel a fecha (base 1899-12-30 por el bug del año bisiesto 1900)
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Enteros sin ".0"
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso() -> Normalizer {
        Normalizer::new(DateStyle::Iso, true)
    }

    fn dmy() -> Normalizer {
        Normalizer::new(DateStyle::DayMonthYear, true)
    }

    #[test]
    fn test_blank_values() {
        assert_eq!(iso().cell(&Cell::Empty), "");
        assert_eq!(iso().cell(&Cell::text("  nan ")), "");
        assert_eq!(iso().cell(&Cell::text("None")), "");
        assert_eq!(iso().cell(&Cell::Number(f64::NAN)), "");
    }

    #[test]
    fn test_native_datetime() {
        let dt = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(iso().cell(&Cell::DateTime(dt)), "2025-03-07");
        assert_eq!(dmy().cell(&Cell::DateTime(dt)), "07/03/2025");
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(iso().cell(&Cell::Number(45000.0)), "2023-03-15");
        assert_eq!(dmy().cell(&Cell::Number(1.0)), "31/12/1899");
        assert_eq!(iso().cell(&Cell::Number(45000.75)), "2023-03-15");
        // fuera de rango queda como número
        assert_eq!(iso().cell(&Cell::Number(0.0)), "0");
        assert_eq!(iso().cell(&Cell::Number(80001.0)), "80001");
        assert_eq!(iso().cell(&Cell::Number(-3.5)), "-3.5");
    }

    #[test]
    fn test_serial_dates_disabled() {
        let n = Normalizer::new(DateStyle::Iso, false);
        assert_eq!(n.cell(&Cell::Number(45000.0)), "45000");
        assert_eq!(n.cell(&Cell::Number(12.5)), "12.5");
    }

    #[test]
    fn test_iso_strings() {
        assert_eq!(dmy().text("2024-01-05 00:00:00"), "05/01/2024");
        assert_eq!(iso().text("2024-01-05T10:00"), "2024-01-05");
        assert_eq!(iso().text("2024-13-45"), "2024-13-45");
    }

    #[test]
    fn test_slash_strings() {
        assert_eq!(iso().text("15/08/24"), "2024-08-15");
        assert_eq!(iso().text("5/3/2024"), "2024-03-05");
        assert_eq!(dmy().text("5/3/24"), "05/03/2024");
        // mes 15 no existe: pasa igual
        assert_eq!(iso().text("3/15/2024"), "3/15/2024");
    }

    #[test]
    fn test_slash_year_needs_two_or_four_digits() {
        assert_eq!(iso().text("1/2/024"), "1/2/024");
        assert_eq!(iso().text("1/2/20245"), "1/2/20245");
        assert_eq!(iso().text("1/2/24"), "2024-02-01");
    }

    #[test]
    fn test_other_text_passes_through() {
        assert_eq!(iso().text("  Vaca 12 "), "Vaca 12");
        assert_eq!(iso().text("12/2024"), "12/2024");
        assert_eq!(iso().cell(&Cell::Bool(true)), "True");
    }

    #[test]
    fn test_idempotent_on_canonical_values() {
        for n in [iso(), dmy()] {
            for input in ["2024-08-15", "15/08/2024", "01/01/2000", "1999-12-31 08:00"] {
                let once = n.text(input);
                assert_eq!(n.text(&once), once, "input {input}");
            }
            let once = n.cell(&Cell::Number(45000.0));
            assert_eq!(n.text(&once), once);
        }
    }
}
