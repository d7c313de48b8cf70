//! Input masks and display helpers shared by the login, registration and
//! finance views.

use chrono::NaiveDate;

use crate::error::ValidationError;

const MONTHS: [&str; 12] = [
    "Janeiro", "Fevereiro", "Marco", "Abril", "Maio", "Junho",
    "Julho", "Agosto", "Setembro", "Outubro", "Novembro", "Dezembro",
];

pub fn digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Inserts each separator in front of the digit at its position.
fn mask(digits: &str, breaks: &[(usize, char)]) -> String {
    let mut out = String::with_capacity(digits.len() + breaks.len());
    for (i, c) in digits.chars().enumerate() {
        if let Some((_, sep)) = breaks.iter().find(|(at, _)| *at == i) {
            out.push(*sep);
        }
        out.push(c);
    }
    out
}

/// Masks a CPF as `XXX.XXX.XXX-XX` while it is being typed.
pub fn format_cpf(value: &str) -> String {
    let digits: String = digits(value).chars().take(11).collect();
    mask(&digits, &[(3, '.'), (6, '.'), (9, '-')])
}

/// Masks a date as `DD/MM/AAAA` while it is being typed.
pub fn format_date_input(value: &str) -> String {
    let digits: String = digits(value).chars().take(8).collect();
    mask(&digits, &[(2, '/'), (4, '/')])
}

pub fn format_currency(value: f64) -> String {
    format!("R$ {:.2}", value)
}

pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

pub fn validate_cpf(value: &str) -> Result<String, ValidationError> {
    let cpf = format_cpf(value);
    if digits(&cpf).len() != 11 {
        return Err(ValidationError::InvalidCpf);
    }
    Ok(cpf)
}

pub fn validate_birth_date(value: &str) -> Result<String, ValidationError> {
    let date = format_date_input(value);
    NaiveDate::parse_from_str(&date, "%d/%m/%Y")
        .ok()
        .filter(|_| date.len() == 10)
        .map(|_| date)
        .ok_or(ValidationError::InvalidBirthDate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_mask_is_progressive() {
        assert_eq!(format_cpf(""), "");
        assert_eq!(format_cpf("123"), "123");
        assert_eq!(format_cpf("1234"), "123.4");
        assert_eq!(format_cpf("1234567"), "123.456.7");
        assert_eq!(format_cpf("1234567890"), "123.456.789-0");
        assert_eq!(format_cpf("12345678901"), "123.456.789-01");
    }

    #[test]
    fn cpf_mask_truncates_and_ignores_non_digits() {
        assert_eq!(format_cpf("123.456.789-0123"), "123.456.789-01");
        assert_eq!(format_cpf("abc 123 456 789 01 99"), "123.456.789-01");
    }

    #[test]
    fn date_mask_is_progressive_and_truncates() {
        assert_eq!(format_date_input("2"), "2");
        assert_eq!(format_date_input("251"), "25/1");
        assert_eq!(format_date_input("25122"), "25/12/2");
        assert_eq!(format_date_input("25122025"), "25/12/2025");
        assert_eq!(format_date_input("2512202599"), "25/12/2025");
    }

    #[test]
    fn currency_has_two_decimals() {
        assert_eq!(format_currency(75.0), "R$ 75.00");
        assert_eq!(format_currency(0.0), "R$ 0.00");
        assert_eq!(format_currency(1234.5), "R$ 1234.50");
    }

    #[test]
    fn month_names_are_one_based() {
        assert_eq!(month_name(1), Some("Janeiro"));
        assert_eq!(month_name(12), Some("Dezembro"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn validation_rejects_incomplete_input() {
        assert_eq!(validate_cpf("1234567890"), Err(ValidationError::InvalidCpf));
        assert_eq!(validate_cpf("12345678901").unwrap(), "123.456.789-01");
        assert_eq!(validate_birth_date("01021990").unwrap(), "01/02/1990");
        assert_eq!(validate_birth_date("3102199"), Err(ValidationError::InvalidBirthDate));
        assert_eq!(validate_birth_date("31/02/1990"), Err(ValidationError::InvalidBirthDate));
    }
}
