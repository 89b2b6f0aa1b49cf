// src/models/patient.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::resource::{Entity, EntityId, Searchable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: EntityId,
    pub name: String,

    // CPF (pode vir formatado ou só dígitos)
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,

    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,

    // Convênio: o plano sempre pertence à operadora selecionada
    #[serde(default)]
    pub insurance_provider: Option<EntityId>,
    #[serde(default)]
    pub insurance_plan: Option<EntityId>,

    // Calculado pelo backend
    #[serde(default)]
    pub visit_count: u32,
}

impl Patient {
    /// Idade em anos completos na data informada.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|birth| today.years_since(birth))
    }
}

impl Entity for Patient {
    type Draft = PatientDraft;

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Searchable for Patient {
    // Busca por nome OU CPF
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.document_id.as_deref());
        fields
    }
}

// Formulário de cadastro/edição de paciente
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct PatientDraft {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(custom(function = "validate_cpf", message = "CPF inválido."))]
    pub document_id: Option<String>,

    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub insurance_provider: Option<EntityId>,
    pub insurance_plan: Option<EntityId>,
}

impl From<&Patient> for PatientDraft {
    fn from(patient: &Patient) -> Self {
        Self {
            name: patient.name.clone(),
            document_id: patient.document_id.clone(),
            birth_date: patient.birth_date,
            phone: patient.phone.clone(),
            email: patient.email.clone(),
            insurance_provider: patient.insurance_provider,
            insurance_plan: patient.insurance_plan,
        }
    }
}

/// CPF: 11 dígitos (pontuação ignorada) com os dois dígitos verificadores corretos.
pub fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    let digits: Vec<u32> = value
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| ValidationError::new("invalid_cpf"))?;

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return Err(ValidationError::new("invalid_cpf"));
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        match (sum * 10) % 11 {
            10 => 0,
            r => r,
        }
    };

    if check(9) != digits[9] || check(10) != digits[10] {
        return Err(ValidationError::new("invalid_cpf"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_check_digits() {
        assert!(validate_cpf("529.982.247-25").is_ok());
        assert!(validate_cpf("52998224725").is_ok());
        assert!(validate_cpf("529.982.247-26").is_err());
        assert!(validate_cpf("111.111.111-11").is_err());
        assert!(validate_cpf("1234").is_err());
    }

    #[test]
    fn draft_rejects_blank_name_and_bad_cpf() {
        let draft = PatientDraft {
            name: String::new(),
            document_id: Some("000.000.000-01".into()),
            ..Default::default()
        };
        let errors = draft.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("document_id"));
    }

    #[test]
    fn age_counts_completed_years() {
        let patient = Patient {
            id: 1,
            name: "Ana".into(),
            document_id: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 20),
            phone: None,
            email: None,
            insurance_provider: None,
            insurance_plan: None,
            visit_count: 0,
        };
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2024, 5, 19).unwrap()), Some(33));
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()), Some(34));
    }
}
