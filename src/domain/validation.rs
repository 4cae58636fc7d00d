// src/domain/validation.rs

// Validadores reutilizados pelos formulários das etapas (`#[validate(custom/schema)]`).
// Os códigos de erro são chaves de tradução, não frases.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::ValidationError;

pub fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Grupo "obrigatórios juntos": todos vazios ou todos preenchidos.
/// Qualquer combinação parcial é rejeitada, listando os campos que faltam.
pub fn require_together(fields: &[(&'static str, bool)]) -> Result<(), ValidationError> {
    let filled = fields.iter().filter(|(_, is_set)| *is_set).count();
    if filled == 0 || filled == fields.len() {
        return Ok(());
    }

    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, is_set)| !*is_set)
        .map(|(name, _)| *name)
        .collect();

    let mut err = ValidationError::new("required_together");
    err.message = Some(Cow::Borrowed("required_together"));
    err.add_param(Cow::Borrowed("missing"), &missing);
    Err(err)
}

pub fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_amount");
        err.message = Some(Cow::Borrowed("invalid_amount"));
        Err(err)
    }
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("required"));
        return Err(err);
    }
    Ok(())
}

/// Telefone: dígitos (com '+' opcional no início), 10 a 15 dígitos.
pub fn phone_number(value: &str) -> Result<(), ValidationError> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let valid = (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_phone");
        err.message = Some(Cow::Borrowed("invalid_phone"));
        Err(err)
    }
}
