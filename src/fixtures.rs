//! Canned borrower and service data for offline invoice assembly.

use std::sync::OnceLock;

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

fn borrowers() -> &'static [Value] {
    static BORROWERS: OnceLock<Vec<Value>> = OnceLock::new();
    BORROWERS.get_or_init(|| {
        vec![
            // minimum accepted by the invoicing provider
            json!({
                "federalTaxNumber": 11111111000191u64,
                "address": { "country": "BRA" }
            }),
            json!({
                "type": "LegalEntity",
                "name": "Empresa Recomendável",
                "federalTaxNumber": 22222222000182u64,
                "taxRegime": "Isento",
                "email": "recomendado@empresa.com",
                "address": {
                    "country": "BRA",
                    "postalCode": "12345-000",
                    "street": "Rua Central",
                    "number": "100",
                    "district": "Centro",
                    "city": { "code": "3550308", "name": "São Paulo" },
                    "state": "SP"
                }
            }),
            json!({
                "type": "LegalEntity",
                "name": "Empresa Completa",
                "federalTaxNumber": 33333333000173u64,
                "municipalTaxNumber": "987654",
                "taxRegime": "LucroPresumido",
                "email": "completo@empresa.com",
                "address": {
                    "country": "BRA",
                    "postalCode": "04567-000",
                    "street": "Av. Completa",
                    "number": "789",
                    "additionalInformation": "Sala 300",
                    "district": "Bairro Completo",
                    "city": { "code": "3304557", "name": "Rio de Janeiro" },
                    "state": "RJ"
                }
            }),
            json!({
                "type": "LegalEntity",
                "name": "Empresa Quatro",
                "federalTaxNumber": 44444444000164u64,
                "municipalTaxNumber": "123456",
                "taxRegime": "SimplesNacional",
                "email": "empresa4@teste.com",
                "address": {
                    "country": "BRA",
                    "postalCode": "54321-000",
                    "street": "Rua Exemplo",
                    "number": "456",
                    "additionalInformation": "Conjunto B",
                    "district": "Bairro Exemplo",
                    "city": { "code": "5208707", "name": "Recife" },
                    "state": "PE"
                }
            }),
        ]
    })
}

/// Look up a borrower by federal tax number (CNPJ/CPF digits).
pub fn borrower_by_tax_number(federal_tax_number: u64) -> Option<&'static Value> {
    borrowers()
        .iter()
        .find(|b| b.get("federalTaxNumber").and_then(Value::as_u64) == Some(federal_tax_number))
}

/// Number of borrower fixtures.
pub fn borrower_count() -> usize {
    borrowers().len()
}

/// Service fixture by position.
///
/// Timestamps (`issuedOn`, activity window) are generated at call time.
pub fn service(index: usize) -> Option<Value> {
    let now = Utc::now();
    let issued_on = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    match index {
        0 => Some(json!({
            "cityServiceCode": "101",
            "description": "Serviço mínimo exigido",
            "servicesAmount": 100.0
        })),
        1 => Some(json!({
            "cityServiceCode": "202",
            "description": "Serviço com campos recomendados",
            "servicesAmount": 250.0,
            "taxationType": "None",
            "issRate": 0.05,
            "issuedOn": issued_on
        })),
        2 => Some(json!({
            "cityServiceCode": "303",
            "description": "Serviço completo com todos os campos disponíveis",
            "servicesAmount": 1500.0,
            "federalServiceCode": "1234",
            "cnaeCode": "6201501",
            "rpsSerialNumber": "ABC",
            "rpsNumber": 1001,
            "issuedOn": issued_on,
            "taxationType": "WithinCity",
            "issRate": 0.02,
            "issTaxAmount": 75.0,
            "deductionsAmount": 50.0,
            "discountUnconditionedAmount": 10.0,
            "discountConditionedAmount": 5.0,
            "irAmountWithheld": 3.0,
            "pisAmountWithheld": 2.0,
            "cofinsAmountWithheld": 1.5,
            "csllAmountWithheld": 1.0,
            "inssAmountWithheld": 4.0,
            "issAmountWithheld": 0.0,
            "othersAmountWithheld": 0.5,
            "approximateTax": { "source": "IBPT", "version": "2025.1", "totalRate": 15.0 },
            "additionalInformation": "Informações adicionais sobre o serviço prestado.",
            "location": {
                "state": "SP",
                "country": "BRA",
                "postalCode": "04567-000",
                "street": "Av. Paulista",
                "number": "1000",
                "district": "Bela Vista",
                "additionalInformation": "10º andar",
                "city": { "code": "3550308", "name": "São Paulo" }
            },
            "activityEvent": {
                "name": "Workshop de tecnologia",
                "startOn": (now - Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true),
                "endOn": issued_on,
                "atvEvId": "event-001"
            }
        })),
        _ => None,
    }
}

/// Number of service fixtures.
pub const SERVICE_COUNT: usize = 3;
