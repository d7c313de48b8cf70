use serde::Serialize;

use crate::formatting::{format_currency, month_name};
use crate::models::{ClinicBreakdown, FinancialAppointment, FinancialSummary};

/// Revenue per appointment, zero when there are no appointments.
pub fn average_ticket(total_revenue: f64, appointments: u32) -> f64 {
    if appointments == 0 {
        return 0.0;
    }
    total_revenue / appointments as f64
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ClinicCard {
    pub unit_id: String,
    pub unit_name: String,
    pub revenue: String,
    pub appointments: u32,
    pub average_ticket: String,
}

impl From<&ClinicBreakdown> for ClinicCard {
    fn from(clinic: &ClinicBreakdown) -> Self {
        ClinicCard {
            unit_id: clinic.unit_id.clone(),
            unit_name: clinic.unit_name.clone(),
            revenue: format_currency(clinic.total_revenue),
            appointments: clinic.total_appointments,
            average_ticket: format_currency(average_ticket(clinic.total_revenue, clinic.total_appointments)),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TransactionRow {
    pub date: String,
    pub patient: String,
    pub service: String,
    pub doctor: String,
    pub unit: String,
    pub value: String,
}

impl From<&FinancialAppointment> for TransactionRow {
    fn from(apt: &FinancialAppointment) -> Self {
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        TransactionRow {
            date: apt.date.clone(),
            patient: or_na(&apt.user_name),
            service: or_na(&apt.service_name),
            doctor: or_na(&apt.doctor_name),
            unit: or_na(&apt.unit_name),
            value: format_currency(apt.paid_value.unwrap_or(0.0)),
        }
    }
}

/// What the finance page shows for one month. The backend's average ticket
/// is used when it sends one; older backends only send the appointments.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SummaryView {
    pub period: String,
    pub total_revenue: String,
    pub total_appointments: u32,
    pub average_ticket: String,
    /// Empty when the view is filtered to one clinic.
    pub clinics: Vec<ClinicCard>,
    pub transactions: Vec<TransactionRow>,
}

impl SummaryView {
    pub fn build(summary: &FinancialSummary, month: u32, year: i32, unit_filter: Option<&str>) -> SummaryView {
        let paid: f64 = summary.appointments.iter().map(|a| a.paid_value.unwrap_or(0.0)).sum();
        let count = summary.appointments.len() as u32;
        let filtered = unit_filter.map_or(false, |u| !u.is_empty());

        SummaryView {
            period: format!("{} {}", month_name(month).unwrap_or("?"), year),
            total_revenue: format_currency(summary.total_revenue),
            total_appointments: summary.total_appointments,
            average_ticket: format_currency(summary.average_ticket.unwrap_or_else(|| average_ticket(paid, count))),
            clinics: if filtered {
                Vec::new()
            } else {
                summary.clinic_breakdown.iter().map(ClinicCard::from).collect()
            },
            transactions: summary.appointments.iter().map(TransactionRow::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paid(id: &str, value: Option<f64>) -> FinancialAppointment {
        FinancialAppointment {
            id: id.to_string(),
            date: "10/02/2026".into(),
            user_name: Some("Joao".into()),
            service_name: Some("Restauracao".into()),
            doctor_name: Some("Dr. Pedro".into()),
            unit_id: Some("u1".into()),
            unit_name: Some("Centro".into()),
            paid_value: value,
        }
    }

    fn summary(appointments: Vec<FinancialAppointment>) -> FinancialSummary {
        let total: f64 = appointments.iter().filter_map(|a| a.paid_value).sum();
        FinancialSummary {
            total_revenue: total,
            total_appointments: appointments.len() as u32,
            average_ticket: None,
            clinic_breakdown: vec![
                ClinicBreakdown { unit_id: "u1".into(), unit_name: "Centro".into(), total_revenue: total, total_appointments: appointments.len() as u32 },
                ClinicBreakdown { unit_id: "u2".into(), unit_name: "Norte".into(), total_revenue: 0.0, total_appointments: 0 },
            ],
            appointments,
        }
    }

    #[test]
    fn average_of_paid_values() {
        let view = SummaryView::build(&summary(vec![paid("a", Some(100.0)), paid("b", Some(50.0))]), 2, 2026, None);
        assert_eq!(view.average_ticket, "R$ 75.00");
        assert_eq!(view.total_revenue, "R$ 150.00");
        assert_eq!(view.period, "Fevereiro 2026");
    }

    #[test]
    fn no_appointments_means_zero_ticket() {
        let view = SummaryView::build(&summary(vec![]), 3, 2026, None);
        assert_eq!(view.average_ticket, "R$ 0.00");
        assert_eq!(view.clinics[1].average_ticket, "R$ 0.00");
        assert!(view.transactions.is_empty());
    }

    #[test]
    fn breakdown_hidden_under_unit_filter() {
        let data = summary(vec![paid("a", Some(80.0))]);
        assert_eq!(SummaryView::build(&data, 1, 2026, None).clinics.len(), 2);
        assert!(SummaryView::build(&data, 1, 2026, Some("u1")).clinics.is_empty());
        assert_eq!(SummaryView::build(&data, 1, 2026, Some("")).clinics.len(), 2);
    }

    #[test]
    fn missing_paid_value_counts_as_zero() {
        let view = SummaryView::build(&summary(vec![paid("a", Some(90.0)), paid("b", None)]), 1, 2026, None);
        assert_eq!(view.average_ticket, "R$ 45.00");
        assert_eq!(view.transactions[1].value, "R$ 0.00");
    }

    #[test]
    fn average_ticket_handles_zero() {
        assert_eq!(average_ticket(0.0, 0), 0.0);
        assert_eq!(average_ticket(300.0, 4), 75.0);
    }

    #[test]
    fn backend_average_ticket_wins() {
        let mut data = summary(vec![paid("a", Some(100.0)), paid("b", Some(50.0))]);
        data.average_ticket = Some(80.0);
        assert_eq!(SummaryView::build(&data, 2, 2026, None).average_ticket, "R$ 80.00");
    }
}
