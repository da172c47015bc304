//! Request extractors.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use validator::{Validate, ValidationError, ValidationErrors};

use affdesk_shared::types::{MAX_AMOUNT, MAX_TARGET};
use affdesk_shared::{AppError, FieldError};

use crate::response::ApiError;

/// JSON body that is deserialized and then validated.
///
/// Malformed bodies and failed `validator` rules both become 400 responses;
/// rule failures list every offending field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError(AppError::Validation(rejection.body_text()))
            })?;
        value
            .validate()
            .map_err(|errors| ApiError(AppError::InvalidInput(field_errors(&errors))))?;
        Ok(Self(value))
    }
}

/// Query string parameters; malformed values become enveloped 400s.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                ApiError(AppError::Validation(rejection.body_text()))
            })?;
        Ok(Self(value))
    }
}

/// Path parameters; malformed ids and dates become enveloped 400s.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| {
                ApiError(AppError::Validation(rejection.body_text()))
            })?;
        Ok(Self(value))
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Flattens `validator` output into sorted field errors.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err.message.as_ref().map_or_else(
                    || format!("{field} is invalid ({})", err.code),
                    ToString::to_string,
                );
                FieldError::new(field.as_ref(), message)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// `validator` rule: the decimal must be zero or more.
pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// `validator` rule: the decimal must be above zero.
pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn within(value: Decimal, max: Decimal) -> Result<(), ValidationError> {
    if value.abs() > max {
        let mut err = ValidationError::new("range");
        err.message = Some(format!("must be between -{max} and {max}").into());
        return Err(err);
    }
    Ok(())
}

/// `validator` rule: the amount fits a `NUMERIC(18, 2)` money column.
pub fn within_money_range(value: &Decimal) -> Result<(), ValidationError> {
    within(*value, MAX_AMOUNT)
}

/// `validator` rule: the value fits a `NUMERIC(18, 4)` KPI target column.
pub fn within_target_range(value: &Decimal) -> Result<(), ValidationError> {
    within(*value, MAX_TARGET)
}

/// `validator` rule: a money amount of zero or more.
pub fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    non_negative(value)?;
    within_money_range(value)
}

/// `validator` rule: a money amount above zero.
pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    positive(value)?;
    within_money_range(value)
}

/// `validator` rule: not blank after trimming.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 2, message = "too short"))]
        name: String,
        #[validate(custom(function = "positive"))]
        amount: Decimal,
    }

    #[test]
    fn test_field_errors_sorted_with_messages() {
        let sample = Sample {
            name: "a".to_string(),
            amount: dec!(0),
        };
        let errors = sample.validate().unwrap_err();
        let fields = field_errors(&errors);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "amount");
        assert_eq!(fields[0].message, "must be greater than 0");
        assert_eq!(fields[1].field, "name");
        assert_eq!(fields[1].message, "too short");
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        team_id: Option<Option<u32>>,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"team_id": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"team_id": 7}"#).unwrap();

        assert_eq!(absent.team_id, None);
        assert_eq!(null.team_id, Some(None));
        assert_eq!(set.team_id, Some(Some(7)));
    }

    #[test]
    fn test_decimal_rules() {
        assert!(non_negative(&dec!(0)).is_ok());
        assert!(non_negative(&dec!(-0.01)).is_err());
        assert!(positive(&dec!(0.01)).is_ok());
        assert!(positive(&dec!(0)).is_err());
        assert!(not_blank("  ").is_err());
        assert!(not_blank(" x ").is_ok());
    }

    #[test]
    fn test_money_bounds() {
        assert!(within_money_range(&dec!(9999999999999999.99)).is_ok());
        assert!(within_money_range(&dec!(10000000000000000)).is_err());
        assert!(within_money_range(&dec!(-10000000000000000)).is_err());
        assert!(within_target_range(&dec!(99999999999999.9999)).is_ok());
        assert!(within_target_range(&dec!(100000000000000)).is_err());

        assert!(positive_amount(&dec!(0.01)).is_ok());
        assert!(positive_amount(&dec!(100000000000000000)).is_err());
        assert!(non_negative_amount(&dec!(0)).is_ok());
        assert_eq!(
            non_negative_amount(&dec!(-1)).unwrap_err().code,
            "non_negative"
        );
        assert_eq!(non_negative_amount(&dec!(100000000000000000)).unwrap_err().code, "range");
    }
}
