use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::{
    LocationPath, RawSearchRequest, RecordType, SearchCriteria, SearchMode, ValidatedSearch,
};

#[allow(clippy::unwrap_used)]
static MOBILE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

/// Default cap on the owner-name fragment
pub const DEFAULT_MAX_OWNER_FRAGMENT_LEN: usize = 100;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a mobile number: exactly 10 ASCII digits, no formatting
    pub fn validate_mobile_number(mobile: &str) -> Result<()> {
        if mobile.trim().is_empty() {
            return Err(anyhow!("Mobile number is required"));
        }

        if !MOBILE_NUMBER.is_match(mobile) {
            return Err(anyhow!("Mobile number must be 10 digits"));
        }

        Ok(())
    }

    /// Validate a record type against the fixed set
    pub fn validate_record_type(record_type: &str) -> Result<RecordType> {
        if record_type.trim().is_empty() {
            return Err(anyhow!("Record type is required"));
        }

        record_type.parse::<RecordType>().map_err(|_| {
            anyhow!(
                "Record type must be one of: {}",
                RecordType::ALL.map(|t| t.as_str()).join(", ")
            )
        })
    }

    /// Validate the search mode
    pub fn validate_search_mode(mode: &str) -> Result<SearchMode> {
        if mode.trim().is_empty() {
            return Err(anyhow!("Search mode is required"));
        }

        mode.parse::<SearchMode>()
            .map_err(|_| anyhow!("Search mode must be one of: manual, uid"))
    }

    /// Validate a language code
    pub fn validate_language(language: &str) -> Result<()> {
        if language.trim().is_empty() {
            return Err(anyhow!("Language is required"));
        }

        if language.len() > 32 {
            return Err(anyhow!("Language code too long (max 32 characters)"));
        }

        Ok(())
    }

    /// Validate that a captcha answer was supplied
    pub fn validate_captcha(captcha: &str) -> Result<()> {
        if captcha.trim().is_empty() {
            return Err(anyhow!("Captcha is required"));
        }

        Ok(())
    }

    /// Validate a property UID (uid mode)
    pub fn validate_property_uid(uid: &str) -> Result<()> {
        if uid.trim().is_empty() {
            return Err(anyhow!("Property UID is required for UID search"));
        }

        if uid.len() > 64 {
            return Err(anyhow!("Property UID too long (max 64 characters)"));
        }

        Ok(())
    }

    /// Validate an owner-name fragment
    pub fn validate_owner_fragment(fragment: &str, max_len: usize) -> Result<()> {
        if fragment.chars().count() > max_len {
            return Err(anyhow!("Owner name too long (max {max_len} characters)"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control())
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Checks the shape of an incoming search request and builds the lookup
/// criteria. Every violated constraint is reported; nothing is looked up.
#[derive(Debug, Clone, Copy)]
pub struct SearchValidator {
    max_owner_fragment_len: usize,
}

impl Default for SearchValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OWNER_FRAGMENT_LEN)
    }
}

impl SearchValidator {
    /// Validator with a custom owner-name length cap.
    #[must_use]
    pub const fn new(max_owner_fragment_len: usize) -> Self {
        Self {
            max_owner_fragment_len,
        }
    }

    /// Validate `raw`, returning the typed request or every violation found.
    pub fn validate(
        &self,
        raw: &RawSearchRequest,
    ) -> std::result::Result<ValidatedSearch, ValidationError> {
        let mut errors = ValidationError::default();

        let mobile_number = non_empty(raw.mobile_number.as_deref());
        if let Err(e) = InputValidator::validate_mobile_number(&mobile_number) {
            errors.push("mobileNumber", e.to_string());
        }

        let record_type = match InputValidator::validate_record_type(
            raw.record_type.as_deref().unwrap_or_default(),
        ) {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push("recordType", e.to_string());
                None
            }
        };

        let language = non_empty(raw.language.as_deref());
        if let Err(e) = InputValidator::validate_language(&language) {
            errors.push("language", e.to_string());
        }

        let captcha = non_empty(raw.captcha.as_deref());
        if let Err(e) = InputValidator::validate_captcha(&captcha) {
            errors.push("captcha", e.to_string());
        }

        let criteria = match InputValidator::validate_search_mode(
            raw.search_mode.as_deref().unwrap_or_default(),
        ) {
            Ok(SearchMode::Uid) => Self::identifier_criteria(raw, &mut errors),
            Ok(SearchMode::Manual) => self.manual_criteria(raw, &mut errors),
            Err(e) => {
                errors.push("searchMode", e.to_string());
                None
            }
        };

        match (criteria, record_type) {
            (Some(criteria), Some(record_type)) if errors.is_empty() => Ok(ValidatedSearch {
                criteria,
                record_type,
                mobile_number,
                language,
                location: LocationPath {
                    state_id: raw.state_id,
                    district_id: raw.district_id,
                    taluka_id: raw.taluka_id,
                    village_id: raw.village_id,
                },
                captcha,
                captcha_id: raw.captcha_id.as_deref().map(InputValidator::sanitize_text),
            }),
            _ => Err(errors),
        }
    }

    fn identifier_criteria(
        raw: &RawSearchRequest,
        errors: &mut ValidationError,
    ) -> Option<SearchCriteria> {
        let uid = non_empty(raw.property_uid.as_deref());
        match InputValidator::validate_property_uid(&uid) {
            Ok(()) => Some(SearchCriteria::ByIdentifier { uid }),
            Err(e) => {
                errors.push("propertyUid", e.to_string());
                None
            }
        }
    }

    fn manual_criteria(
        &self,
        raw: &RawSearchRequest,
        errors: &mut ValidationError,
    ) -> Option<SearchCriteria> {
        let village_id = raw.village_id;
        if village_id.is_none() {
            errors.push("villageId", "Village is required for manual search");
        }

        let survey = Some(non_empty(raw.survey_number.as_deref())).filter(|s| !s.is_empty());
        let owner = Some(non_empty(raw.owner_name.as_deref())).filter(|s| !s.is_empty());

        if survey.is_none() && owner.is_none() {
            errors.push(
                "surveyNumber",
                "Either a survey number or an owner name is required",
            );
            return None;
        }

        let village_id = village_id?;

        // A survey number wins over an owner name when both are supplied.
        if let Some(survey) = survey {
            let subdivision =
                Some(non_empty(raw.subdivision_number.as_deref())).filter(|s| !s.is_empty());
            return Some(SearchCriteria::ByLocationAndSurvey {
                village_id,
                survey,
                subdivision,
            });
        }

        let owner_fragment = owner?;
        if let Err(e) =
            InputValidator::validate_owner_fragment(&owner_fragment, self.max_owner_fragment_len)
        {
            errors.push("ownerName", e.to_string());
            return None;
        }

        Some(SearchCriteria::ByLocationAndOwner {
            village_id,
            owner_fragment,
        })
    }
}

impl SearchValidator {
    /// Read a JSON search body field by field, so a value of the wrong JSON
    /// type is reported against its field instead of failing the whole body.
    pub fn read_body(body: &Value) -> std::result::Result<RawSearchRequest, ValidationError> {
        let mut errors = ValidationError::default();
        let Some(fields) = body.as_object() else {
            errors.push("body", "Request body must be a JSON object");
            return Err(errors);
        };

        let raw = RawSearchRequest {
            search_mode: text_field(fields, "searchMode", &mut errors),
            record_type: text_field(fields, "recordType", &mut errors),
            property_uid: text_field(fields, "propertyUid", &mut errors),
            state_id: id_field(fields, "stateId", &mut errors),
            district_id: id_field(fields, "districtId", &mut errors),
            taluka_id: id_field(fields, "talukaId", &mut errors),
            village_id: id_field(fields, "villageId", &mut errors),
            survey_number: text_field(fields, "surveyNumber", &mut errors),
            subdivision_number: text_field(fields, "subdivisionNumber", &mut errors),
            owner_name: text_field(fields, "ownerName", &mut errors),
            mobile_number: text_field(fields, "mobileNumber", &mut errors),
            language: text_field(fields, "language", &mut errors),
            captcha: text_field(fields, "captcha", &mut errors),
            captcha_id: text_field(fields, "captchaId", &mut errors),
        };

        if errors.is_empty() {
            Ok(raw)
        } else {
            Err(errors)
        }
    }
}

fn text_field(fields: &Map<String, Value>, name: &str, errors: &mut ValidationError) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.push(name, "must be a string");
            None
        }
    }
}

fn id_field(fields: &Map<String, Value>, name: &str, errors: &mut ValidationError) -> Option<u64> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let id = value.as_u64();
            if id.is_none() {
                errors.push(name, "must be a positive integer");
            }
            id
        }
    }
}

fn non_empty(value: Option<&str>) -> String {
    value.map(InputValidator::sanitize_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_request() -> RawSearchRequest {
        RawSearchRequest {
            search_mode: Some("manual".to_string()),
            record_type: Some("7-12".to_string()),
            village_id: Some(1),
            survey_number: Some("123".to_string()),
            mobile_number: Some("9876543210".to_string()),
            language: Some("marathi".to_string()),
            captcha: Some("AB12C".to_string()),
            ..RawSearchRequest::default()
        }
    }

    #[test]
    fn test_survey_wins_over_owner() {
        let mut raw = manual_request();
        raw.owner_name = Some("Sita".to_string());
        let validated = SearchValidator::default().validate(&raw).unwrap();
        assert_eq!(validated.criteria.label(), "survey");
    }

    #[test]
    fn test_blank_subdivision_is_absent() {
        let mut raw = manual_request();
        raw.subdivision_number = Some("  ".to_string());
        let validated = SearchValidator::default().validate(&raw).unwrap();
        assert_eq!(
            validated.criteria,
            SearchCriteria::ByLocationAndSurvey {
                village_id: 1,
                survey: "123".to_string(),
                subdivision: None,
            }
        );
    }

    #[test]
    fn test_read_body_reports_wrong_types_per_field() {
        let body = serde_json::json!({
            "searchMode": "manual",
            "villageId": "1",
            "mobileNumber": 9876543210_u64,
            "surveyNumber": "123"
        });
        let errors = SearchValidator::read_body(&body).unwrap_err();
        assert_eq!(errors.fields(), vec!["villageId", "mobileNumber"]);
    }

    #[test]
    fn test_read_body_accepts_nulls_and_missing_fields() {
        let body = serde_json::json!({ "searchMode": "uid", "villageId": null, "propertyUid": "12345678901" });
        let raw = SearchValidator::read_body(&body).unwrap();
        assert_eq!(raw.village_id, None);
        assert_eq!(raw.property_uid.as_deref(), Some("12345678901"));
    }

    #[test]
    fn test_read_body_rejects_non_object() {
        let errors = SearchValidator::read_body(&serde_json::json!([1, 2])).unwrap_err();
        assert!(errors.has_field("body"));
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(InputValidator::sanitize_text("  Ram\u{0}\n "), "Ram");
    }
}
