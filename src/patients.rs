use crate::formatting::digits;
use crate::models::Patient;

pub fn matches(patient: &Patient, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    if patient.name.to_lowercase().contains(&query.to_lowercase()) || patient.cpf.contains(query) {
        return true;
    }
    // "12345" should still find "123.45..."
    let query_digits = digits(query);
    !query_digits.is_empty() && digits(&patient.cpf).contains(&query_digits)
}

pub fn filter_patients<'a>(patients: &'a [Patient], query: &str) -> Vec<&'a Patient> {
    patients.iter().filter(|p| matches(p, query)).collect()
}
