use base64::{engine::general_purpose, Engine};
use log::info;
use serde::Serialize;
use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use crate::api::ApiClient;
use crate::error::{DocumentError, ValidationError};
use crate::models::GenerateDocumentRequest;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateKind {
    pub key: &'static str,
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

pub static TEMPLATES: [TemplateKind; 4] = [
    TemplateKind { key: "atestado", name: "Atestado", fields: &["dias_afastamento"] },
    TemplateKind { key: "afastamento", name: "Afastamento", fields: &["data_inicio", "data_fim", "procedimentos"] },
    TemplateKind { key: "termo_consentimento", name: "Termo de Consentimento", fields: &["procedimento"] },
    TemplateKind { key: "receita", name: "Receita Médica", fields: &["medicamentos", "observacoes"] },
];

pub fn template_kind(key: &str) -> Option<&'static TemplateKind> {
    TEMPLATES.iter().find(|t| t.key == key)
}

/// Checks a generation request before it is sent. Custom fields are kept
/// only if the template knows them.
pub fn prepare_request(template_type: &str, patient_id: &str, doctor_id: &str,
    custom_fields: &HashMap<String, String>) -> Result<GenerateDocumentRequest, ValidationError> {

    if template_type.trim().is_empty() {
        return Err(ValidationError::MissingField("template_type"));
    }
    if patient_id.trim().is_empty() {
        return Err(ValidationError::MissingField("patient_id"));
    }
    if doctor_id.trim().is_empty() {
        return Err(ValidationError::MissingField("doctor_id"));
    }
    let kind = template_kind(template_type)
        .ok_or_else(|| ValidationError::UnknownTemplate(template_type.to_string()))?;

    let custom_fields = custom_fields.iter()
        .filter(|(k, _)| kind.fields.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(GenerateDocumentRequest {
        template_type: kind.key.to_string(),
        patient_id: patient_id.to_string(),
        doctor_id: doctor_id.to_string(),
        custom_fields,
    })
}

fn safe_file_name(filename: &str) -> Result<&str, ValidationError> {
    let invalid = || ValidationError::InvalidFileName(filename.to_string());
    let name = Path::new(filename).file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    if name != filename || name.starts_with('.') {
        return Err(invalid());
    }
    Ok(name)
}

/// Decodes a base64 PDF and writes it into `dir`.
pub fn save_pdf(dir: &Path, filename: &str, pdf_base64: &str) -> Result<PathBuf, DocumentError> {
    let name = safe_file_name(filename)?;
    let bytes = general_purpose::STANDARD.decode(pdf_base64.trim())?;
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}

pub async fn download_pdf(api: &ApiClient, request: &GenerateDocumentRequest, dir: &Path) -> Result<PathBuf, DocumentError> {
    let pdf = api.generate_document_pdf(request).await?;
    let path = save_pdf(dir, &pdf.filename, &pdf.pdf_base64)?;
    info!("documents:: saved {} for patient {}", path.display(), request.patient_id);
    Ok(path)
}
