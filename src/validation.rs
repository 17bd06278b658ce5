//! Pure payload validators shared by the backends.
//!
//! One function per rule. Each returns a [`ValidationError`] naming the field, plus the
//! accepted values for enum rules, and never touches backend state.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::payload::Payload;

/// Borrower (`tomador`) types accepted by service invoices.
pub const BORROWER_TYPES: &[&str] = &["Undefined", "NaturalPerson", "LegalEntity"];

/// Borrower tax regimes accepted by service invoices.
pub const TAX_REGIMES: &[&str] = &[
    "Isento",
    "MicroempreendedorIndividual",
    "SimplesNacional",
    "LucroPresumido",
    "LucroReal",
];

/// Service invoice taxation types.
pub const TAXATION_TYPES: &[&str] = &[
    "None",
    "WithinCity",
    "OutsideCity",
    "Export",
    "Free",
    "Immune",
    "SuspendedCourtDecision",
    "SuspendedAdministrativeProcedure",
    "OutsideCityFree",
    "OutsideCityImmune",
    "OutsideCitySuspended",
    "OutsideCitySuspendedAdministrativeProcedure",
    "ObjectiveImune",
];

/// Payment billing types.
pub const BILLING_TYPES: &[&str] = &["UNDEFINED", "BOLETO", "PIX", "CREDIT_CARD"];

/// Country used when a borrower address omits one.
pub const DEFAULT_COUNTRY: &str = "BRA";

/// ISO 3166-1 alpha-3 country codes.
pub const COUNTRY_CODES: &[&str] = &[
    "ABW", "AFG", "AGO", "AIA", "ALA", "ALB", "AND", "ARE", "ARG", "ARM", "ASM", "ATA", "ATF",
    "ATG", "AUS", "AUT", "AZE", "BDI", "BEL", "BEN", "BES", "BFA", "BGD", "BGR", "BHR", "BHS",
    "BIH", "BLM", "BLR", "BLZ", "BMU", "BOL", "BRA", "BRB", "BRN", "BTN", "BVT", "BWA", "CAF",
    "CAN", "CCK", "CHE", "CHL", "CHN", "CIV", "CMR", "COD", "COG", "COK", "COL", "COM", "CPV",
    "CRI", "CUB", "CUW", "CXR", "CYM", "CYP", "CZE", "DEU", "DJI", "DMA", "DNK", "DOM", "DZA",
    "ECU", "EGY", "ERI", "ESH", "ESP", "EST", "ETH", "FIN", "FJI", "FLK", "FRA", "FRO", "FSM",
    "GAB", "GBR", "GEO", "GGY", "GHA", "GIB", "GIN", "GLP", "GMB", "GNB", "GNQ", "GRC", "GRD",
    "GRL", "GTM", "GUF", "GUM", "GUY", "HKG", "HMD", "HND", "HRV", "HTI", "HUN", "IDN", "IMN",
    "IND", "IOT", "IRL", "IRN", "IRQ", "ISL", "ISR", "ITA", "JAM", "JEY", "JOR", "JPN", "KAZ",
    "KEN", "KGZ", "KHM", "KIR", "KNA", "KOR", "KWT", "LAO", "LBN", "LBR", "LBY", "LCA", "LIE",
    "LKA", "LSO", "LTU", "LUX", "LVA", "MAC", "MAF", "MAR", "MCO", "MDA", "MDG", "MDV", "MEX",
    "MHL", "MKD", "MLI", "MLT", "MMR", "MNE", "MNG", "MNP", "MOZ", "MRT", "MSR", "MTQ", "MUS",
    "MWI", "MYS", "MYT", "NAM", "NCL", "NER", "NFK", "NGA", "NIC", "NIU", "NLD", "NOR", "NPL",
    "NRU", "NZL", "OMN", "PAK", "PAN", "PCN", "PER", "PHL", "PLW", "PNG", "POL", "PRI", "PRK",
    "PRT", "PRY", "PSE", "PYF", "QAT", "REU", "ROU", "RUS", "RWA", "SAU", "SDN", "SEN", "SGP",
    "SGS", "SHN", "SJM", "SLB", "SLE", "SLV", "SMR", "SOM", "SPM", "SRB", "SSD", "STP", "SUR",
    "SVK", "SVN", "SWE", "SWZ", "SXM", "SYC", "SYR", "TCA", "TCD", "TGO", "THA", "TJK", "TKL",
    "TKM", "TLS", "TON", "TTO", "TUN", "TUR", "TUV", "TWN", "TZA", "UGA", "UKR", "UMI", "URY",
    "USA", "UZB", "VAT", "VCT", "VEN", "VGB", "VIR", "VNM", "VUT", "WLF", "WSM", "YEM", "ZAF",
    "ZMB", "ZWE",
];

const COUNTRY_ALIASES: &[(&str, &str)] = &[("BRASIL", "BRA"), ("BRAZIL", "BRA")];

/// Check that every field in `fields` is present, in order.
///
/// Reports the first missing field.
pub fn require_fields(payload: &Payload, fields: &[&str]) -> ValidationResult<()> {
    match fields.iter().find(|f| !payload.contains(f)) {
        Some(field) => Err(ValidationError::missing(field)),
        None => Ok(()),
    }
}

/// Like [`require_fields`], but null, `false`, zero and blank strings also count as missing.
pub fn require_non_empty_fields(payload: &Payload, fields: &[&str]) -> ValidationResult<()> {
    match fields.iter().find(|f| !is_truthy(payload.get(f))) {
        Some(field) => Err(ValidationError::missing(field)),
        None => Ok(()),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// A present, non-blank string.
pub fn required_string<'a>(field: &str, value: Option<&'a Value>) -> ValidationResult<&'a str> {
    match value.and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ValidationError::new(
            field,
            format!("required field '{field}' is missing or not a non-empty string"),
        )),
    }
}

/// A JSON number strictly greater than zero.
pub fn positive_number(field: &str, value: Option<&Value>) -> ValidationResult<f64> {
    match value.and_then(Value::as_f64) {
        Some(n) if n > 0.0 => Ok(n),
        _ => Err(ValidationError::new(
            field,
            format!("field '{field}' must be numeric and greater than zero"),
        )),
    }
}

/// An integer, given either as a JSON integer or a string of digits.
pub fn integer(field: &str, value: Option<&Value>) -> ValidationResult<i64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::new(field, format!("field '{field}' must be an integer")))
}

/// A date in `YYYY-MM-DD` or `DD/MM/YYYY` form.
pub fn parse_date(field: &str, value: Option<&Value>) -> ValidationResult<NaiveDate> {
    let raw = required_string(field, value)?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| {
            ValidationError::new(
                field,
                format!("field '{field}' must be a date (YYYY-MM-DD or DD/MM/YYYY), got '{raw}'"),
            )
        })
}

/// Membership in a closed set.
pub fn one_of(field: &str, value: &str, accepted: &[&str]) -> ValidationResult<()> {
    if accepted.contains(&value) {
        Ok(())
    } else {
        Err(
            ValidationError::new(field, format!("invalid '{field}': '{value}'"))
                .with_accepted(accepted.iter().copied()),
        )
    }
}

/// Membership in a closed set when present; absent, `null` or blank passes.
///
/// A present value that is not a string is rejected.
pub fn optional_one_of(field: &str, value: Option<&Value>, accepted: &[&str]) -> ValidationResult<()> {
    match value {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(v)) if v.is_empty() => Ok(()),
        Some(Value::String(v)) => one_of(field, v, accepted),
        Some(other) => Err(
            ValidationError::new(field, format!("field '{field}' must be a string, got {other}"))
                .with_accepted(accepted.iter().copied()),
        ),
    }
}

/// Normalize a country to its ISO 3166-1 alpha-3 code.
///
/// Absent or blank input yields `BRA`; full-name aliases collapse to their code.
///
/// ```rust
/// use finbridge::validation::normalize_country_code;
///
/// assert_eq!(normalize_country_code(Some(" brasil ")).unwrap(), "BRA");
/// assert_eq!(normalize_country_code(None).unwrap(), "BRA");
/// assert!(normalize_country_code(Some("XXX")).is_err());
/// ```
pub fn normalize_country_code(country: Option<&str>) -> ValidationResult<String> {
    let country = match country.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => return Ok(DEFAULT_COUNTRY.to_string()),
    };

    let normalized = COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == country)
        .map(|(_, code)| (*code).to_string())
        .unwrap_or(country);

    if COUNTRY_CODES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(ValidationError::new(
            "country",
            format!("invalid country code '{normalized}', expected ISO 3166-1 alpha-3 such as 'BRA' or 'USA'"),
        ))
    }
}

/// Normalize a country taken straight from a payload.
///
/// Absent or `null` yields `BRA`; a string goes through [`normalize_country_code`]; any other
/// JSON type is rejected rather than replaced.
pub fn country_code(value: Option<&Value>) -> ValidationResult<String> {
    match value {
        None | Some(Value::Null) => normalize_country_code(None),
        Some(Value::String(country)) => normalize_country_code(Some(country)),
        Some(other) => Err(ValidationError::new(
            "country",
            format!("field 'country' must be an ISO 3166-1 alpha-3 string, got {other}"),
        )
        .with_accepted(COUNTRY_CODES.iter().copied())),
    }
}

/// Borrower `type` when present.
pub fn validate_borrower_type(value: Option<&Value>) -> ValidationResult<()> {
    optional_one_of("type", value, BORROWER_TYPES)
}

/// Borrower `taxRegime` when present.
pub fn validate_tax_regime(value: Option<&Value>) -> ValidationResult<()> {
    optional_one_of("taxRegime", value, TAX_REGIMES)
}

/// Invoice `taxationType` when present.
pub fn validate_taxation_type(value: Option<&Value>) -> ValidationResult<()> {
    optional_one_of("taxationType", value, TAXATION_TYPES)
}

/// Payment `billingType`.
pub fn validate_billing_type(value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) => one_of("billingType", v, BILLING_TYPES),
        None => Err(ValidationError::missing("billingType").with_accepted(BILLING_TYPES.iter().copied())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        Payload::try_from(value).unwrap()
    }

    #[test]
    fn test_require_fields_reports_first_missing_in_order() {
        let p = payload(json!({"a": 1, "c": null}));
        assert!(require_fields(&p, &["a", "c"]).is_ok());
        let err = require_fields(&p, &["a", "b", "d"]).unwrap_err();
        assert_eq!(err.field, "b");
    }

    #[test]
    fn test_require_non_empty_fields_treats_blank_as_missing() {
        let p = payload(json!({"value": 10, "dueDate": " ", "customer": null}));
        let err = require_non_empty_fields(&p, &["value", "dueDate"]).unwrap_err();
        assert_eq!(err.field, "dueDate");
        let err = require_non_empty_fields(&p, &["customer"]).unwrap_err();
        assert_eq!(err.field, "customer");
    }

    #[test]
    fn test_required_string() {
        assert_eq!(required_string("x", Some(&json!("abc"))).unwrap(), "abc");
        assert!(required_string("x", Some(&json!("  "))).is_err());
        assert!(required_string("x", Some(&json!(5))).is_err());
        assert_eq!(required_string("x", None).unwrap_err().field, "x");
    }

    #[test]
    fn test_positive_number() {
        assert_eq!(positive_number("amount", Some(&json!(150.0))).unwrap(), 150.0);
        assert_eq!(positive_number("amount", Some(&json!(7))).unwrap(), 7.0);
        assert!(positive_number("amount", Some(&json!(0))).is_err());
        assert!(positive_number("amount", Some(&json!(-1.5))).is_err());
        assert!(positive_number("amount", Some(&json!("10"))).is_err());
    }

    #[test]
    fn test_integer_accepts_digit_strings() {
        assert_eq!(integer("id", Some(&json!(42))).unwrap(), 42);
        assert_eq!(integer("id", Some(&json!("123"))).unwrap(), 123);
        assert!(integer("id", Some(&json!("12a"))).is_err());
        assert!(integer("id", Some(&json!(1.5))).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        assert_eq!(parse_date("d", Some(&json!("2025-04-10"))).unwrap(), expected);
        assert_eq!(parse_date("d", Some(&json!("10/04/2025"))).unwrap(), expected);
        assert!(parse_date("d", Some(&json!("2025-13-01"))).is_err());
    }

    #[test]
    fn test_one_of_carries_accepted_values() {
        let err = one_of("billingType", "CASH", BILLING_TYPES).unwrap_err();
        assert_eq!(err.field, "billingType");
        assert_eq!(err.accepted, vec!["UNDEFINED", "BOLETO", "PIX", "CREDIT_CARD"]);
    }

    #[test]
    fn test_country_code_normalization() {
        assert_eq!(normalize_country_code(Some("Brazil")).unwrap(), "BRA");
        assert_eq!(normalize_country_code(Some("Brasil")).unwrap(), "BRA");
        assert_eq!(normalize_country_code(Some("usa")).unwrap(), "USA");
        assert_eq!(normalize_country_code(Some("")).unwrap(), "BRA");
        let err = normalize_country_code(Some("XXX")).unwrap_err();
        assert_eq!(err.field, "country");
    }

    #[test]
    fn test_enum_validators_allow_absent_values() {
        assert!(validate_borrower_type(None).is_ok());
        assert!(validate_borrower_type(Some(&Value::Null)).is_ok());
        assert!(validate_tax_regime(Some(&json!("SimplesNacional"))).is_ok());
        assert!(validate_taxation_type(Some(&json!("WithinCity"))).is_ok());
        assert_eq!(
            validate_borrower_type(Some(&json!("Company"))).unwrap_err().field,
            "type"
        );
        assert_eq!(
            validate_tax_regime(Some(&json!("Lucro"))).unwrap_err().field,
            "taxRegime"
        );
        assert!(validate_billing_type(None).is_err());
        assert!(validate_billing_type(Some("PIX")).is_ok());
    }

    #[test]
    fn test_enum_validators_reject_non_string_values() {
        let err = validate_taxation_type(Some(&json!(42))).unwrap_err();
        assert_eq!(err.field, "taxationType");
        assert!(err.accepted.contains(&"WithinCity".to_string()));
        assert_eq!(validate_borrower_type(Some(&json!(5))).unwrap_err().field, "type");
        assert_eq!(validate_tax_regime(Some(&json!(true))).unwrap_err().field, "taxRegime");
    }

    #[test]
    fn test_country_code_from_payload_value() {
        assert_eq!(country_code(None).unwrap(), "BRA");
        assert_eq!(country_code(Some(&Value::Null)).unwrap(), "BRA");
        assert_eq!(country_code(Some(&json!(" Brazil "))).unwrap(), "BRA");

        let err = country_code(Some(&json!(123))).unwrap_err();
        assert_eq!(err.field, "country");
        assert!(err.accepted.contains(&"BRA".to_string()));
    }
}
