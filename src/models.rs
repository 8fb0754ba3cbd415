//! Data models for land records and the location hierarchy
//!
//! This module contains all data structures used throughout the application,
//! including hierarchy entities, land records, search requests and the
//! validated search criteria produced by the validator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Names of a location in English, Hindi and (optionally) the regional script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedName {
    /// English name
    pub name_en: String,
    /// Hindi name
    pub name_hi: String,
    /// Name in the regional language, when it differs
    pub name_local: Option<String>,
}

impl LocalizedName {
    /// Build a name triple.
    pub fn new(en: impl Into<String>, hi: impl Into<String>, local: Option<&str>) -> Self {
        Self {
            name_en: en.into(),
            name_hi: hi.into(),
            name_local: local.map(ToString::to_string),
        }
    }
}

/// Root of the location hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// Store-assigned identifier
    pub id: u64,
    /// Unique short code (e.g. `MH`)
    pub code: String,
    /// Localized names
    #[serde(flatten)]
    pub name: LocalizedName,
}

/// A district, owned by exactly one state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    /// Store-assigned identifier
    pub id: u64,
    /// Owning state
    pub state_id: u64,
    /// Short code (e.g. `MUM`)
    pub code: String,
    /// Localized names
    #[serde(flatten)]
    pub name: LocalizedName,
}

/// A taluka, owned by exactly one district
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taluka {
    /// Store-assigned identifier
    pub id: u64,
    /// Owning district
    pub district_id: u64,
    /// Short code
    pub code: String,
    /// Localized names
    #[serde(flatten)]
    pub name: LocalizedName,
}

/// A village, the leaf of the location hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Village {
    /// Store-assigned identifier
    pub id: u64,
    /// Owning taluka
    pub taluka_id: u64,
    /// Short code
    pub code: String,
    /// Localized names
    #[serde(flatten)]
    pub name: LocalizedName,
}

/// Kind of land-record document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// 7/12 extract (ownership and crop details)
    #[serde(rename = "7-12", alias = "extract-7-12")]
    Extract712,
    /// 8A extract (holdings of an account holder)
    #[serde(rename = "8a", alias = "extract-8a")]
    Extract8A,
    /// Urban property card
    #[serde(rename = "property-card")]
    PropertyCard,
    /// K-Prat extract
    #[serde(rename = "k-prat")]
    KPrat,
}

impl RecordType {
    /// Every record type, in display order
    pub const ALL: [Self; 4] = [
        Self::Extract712,
        Self::Extract8A,
        Self::PropertyCard,
        Self::KPrat,
    ];

    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extract712 => "7-12",
            Self::Extract8A => "8a",
            Self::PropertyCard => "property-card",
            Self::KPrat => "k-prat",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7-12" | "7/12" | "extract-7-12" => Ok(Self::Extract712),
            "8a" | "extract-8a" => Ok(Self::Extract8A),
            "property-card" => Ok(Self::PropertyCard),
            "k-prat" => Ok(Self::KPrat),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// A land-record entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandRecord {
    /// Store-assigned identifier
    pub id: u64,
    /// 11-digit property UID, unique when present
    pub property_uid: Option<String>,
    /// Owning village
    pub village_id: u64,
    /// Cadastral survey number
    pub survey_number: String,
    /// Sub-parcel within the survey number
    pub subdivision_number: Option<String>,
    /// Owner of record
    pub owner_name: String,
    /// Owner's father's name
    pub father_name: Option<String>,
    /// Free-form area (e.g. `500 sq ft`)
    pub area: Option<String>,
    /// Land classification (residential, agricultural, ...)
    pub classification: Option<String>,
    /// Document type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Opaque structured payload
    pub record_data: Option<serde_json::Value>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when inserting a land record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLandRecord {
    /// 11-digit property UID
    #[serde(default)]
    pub property_uid: Option<String>,
    /// Owning village
    pub village_id: u64,
    /// Cadastral survey number
    pub survey_number: String,
    /// Sub-parcel within the survey number
    #[serde(default)]
    pub subdivision_number: Option<String>,
    /// Owner of record
    pub owner_name: String,
    /// Owner's father's name
    #[serde(default)]
    pub father_name: Option<String>,
    /// Free-form area
    #[serde(default)]
    pub area: Option<String>,
    /// Land classification
    #[serde(default)]
    pub classification: Option<String>,
    /// Document type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Opaque structured payload
    #[serde(default)]
    pub record_data: Option<serde_json::Value>,
}

impl NewLandRecord {
    /// Minimal record with the required fields; optional fields start absent.
    pub fn new(
        village_id: u64,
        survey_number: impl Into<String>,
        owner_name: impl Into<String>,
        record_type: RecordType,
    ) -> Self {
        Self {
            property_uid: None,
            village_id,
            survey_number: survey_number.into(),
            subdivision_number: None,
            owner_name: owner_name.into(),
            father_name: None,
            area: None,
            classification: None,
            record_type,
            record_data: None,
        }
    }

    /// Set the property UID.
    #[must_use]
    pub fn with_property_uid(mut self, uid: impl Into<String>) -> Self {
        self.property_uid = Some(uid.into());
        self
    }

    /// Set the subdivision number.
    #[must_use]
    pub fn with_subdivision(mut self, subdivision: impl Into<String>) -> Self {
        self.subdivision_number = Some(subdivision.into());
        self
    }
}

/// Lifecycle of an audited search request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    /// Created, lookup not finished
    Pending,
    /// Lookup finished (zero or more records)
    Completed,
    /// Lookup faulted
    Failed,
}

impl SearchStatus {
    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Only `pending` may move, and only to a terminal status.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional location path chosen in the cascading form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPath {
    /// Selected state
    pub state_id: Option<u64>,
    /// Selected district
    pub district_id: Option<u64>,
    /// Selected taluka
    pub taluka_id: Option<u64>,
    /// Selected village
    pub village_id: Option<u64>,
}

/// Audit record of a search attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Store-assigned identifier
    pub id: u64,
    /// Requester's mobile number
    pub mobile_number: String,
    /// Selected state
    pub state_id: Option<u64>,
    /// Selected district
    pub district_id: Option<u64>,
    /// Selected taluka
    pub taluka_id: Option<u64>,
    /// Selected village
    pub village_id: Option<u64>,
    /// Survey number selector
    pub survey_number: Option<String>,
    /// Subdivision selector
    pub subdivision_number: Option<String>,
    /// Owner-name selector
    pub owner_name: Option<String>,
    /// Requested document type
    pub record_type: RecordType,
    /// Property UID selector
    pub property_uid: Option<String>,
    /// UI language code
    pub language: String,
    /// Current status
    pub status: SearchStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when opening an audit row; status always starts `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSearchRequest {
    /// Requester's mobile number
    pub mobile_number: String,
    /// Location path as submitted
    pub location: LocationPath,
    /// Survey number selector
    pub survey_number: Option<String>,
    /// Subdivision selector
    pub subdivision_number: Option<String>,
    /// Owner-name selector
    pub owner_name: Option<String>,
    /// Requested document type
    pub record_type: RecordType,
    /// Property UID selector
    pub property_uid: Option<String>,
    /// UI language code
    pub language: String,
}

impl NewSearchRequest {
    /// Materialize the audit row with the given id.
    #[must_use]
    pub fn into_request(self, id: u64) -> SearchRequest {
        SearchRequest {
            id,
            mobile_number: self.mobile_number,
            state_id: self.location.state_id,
            district_id: self.location.district_id,
            taluka_id: self.location.taluka_id,
            village_id: self.location.village_id,
            survey_number: self.survey_number,
            subdivision_number: self.subdivision_number,
            owner_name: self.owner_name,
            record_type: self.record_type,
            property_uid: self.property_uid,
            language: self.language,
            status: SearchStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Recognized search modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Cascading location search
    Manual,
    /// Direct property UID search
    Uid,
}

impl SearchMode {
    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Uid => "uid",
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "uid" => Ok(Self::Uid),
            other => Err(format!("unknown search mode: {other}")),
        }
    }
}

/// Search request body as received from a client; nothing is trusted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchRequest {
    /// `manual` or `uid`
    pub search_mode: Option<String>,
    /// Document type
    pub record_type: Option<String>,
    /// Property UID (uid mode)
    pub property_uid: Option<String>,
    /// Selected state
    pub state_id: Option<u64>,
    /// Selected district
    pub district_id: Option<u64>,
    /// Selected taluka
    pub taluka_id: Option<u64>,
    /// Selected village (manual mode)
    pub village_id: Option<u64>,
    /// Survey number selector
    pub survey_number: Option<String>,
    /// Subdivision selector
    pub subdivision_number: Option<String>,
    /// Owner-name selector
    pub owner_name: Option<String>,
    /// 10-digit mobile number
    pub mobile_number: Option<String>,
    /// UI language code
    pub language: Option<String>,
    /// Captcha answer
    pub captcha: Option<String>,
    /// Id of the issued captcha challenge
    pub captcha_id: Option<String>,
}

/// Lookup strategy, constructed only by the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Direct lookup by property UID
    ByIdentifier {
        /// Property UID
        uid: String,
    },
    /// Village + survey number, optionally narrowed by subdivision
    ByLocationAndSurvey {
        /// Village to search
        village_id: u64,
        /// Survey number
        survey: String,
        /// Optional subdivision
        subdivision: Option<String>,
    },
    /// Village + case-insensitive owner-name fragment
    ByLocationAndOwner {
        /// Village to search
        village_id: u64,
        /// Owner name fragment
        owner_fragment: String,
    },
}

impl SearchCriteria {
    /// Mode this criteria was built from
    #[must_use]
    pub const fn mode(&self) -> SearchMode {
        match self {
            Self::ByIdentifier { .. } => SearchMode::Uid,
            Self::ByLocationAndSurvey { .. } | Self::ByLocationAndOwner { .. } => {
                SearchMode::Manual
            }
        }
    }

    /// Short label used in logs and metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ByIdentifier { .. } => "uid",
            Self::ByLocationAndSurvey { .. } => "survey",
            Self::ByLocationAndOwner { .. } => "owner",
        }
    }
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSearch {
    /// Lookup strategy
    pub criteria: SearchCriteria,
    /// Requested document type
    pub record_type: RecordType,
    /// 10-digit mobile number
    pub mobile_number: String,
    /// UI language code
    pub language: String,
    /// Location path as submitted
    pub location: LocationPath,
    /// Captcha answer
    pub captcha: String,
    /// Id of the issued captcha challenge
    pub captcha_id: Option<String>,
}

impl ValidatedSearch {
    /// Audit fields for this request
    #[must_use]
    pub fn to_audit(&self) -> NewSearchRequest {
        let (survey_number, subdivision_number, owner_name, property_uid) = match &self.criteria {
            SearchCriteria::ByIdentifier { uid } => (None, None, None, Some(uid.clone())),
            SearchCriteria::ByLocationAndSurvey {
                survey,
                subdivision,
                ..
            } => (Some(survey.clone()), subdivision.clone(), None, None),
            SearchCriteria::ByLocationAndOwner { owner_fragment, .. } => {
                (None, None, Some(owner_fragment.clone()), None)
            }
        };

        NewSearchRequest {
            mobile_number: self.mobile_number.clone(),
            location: self.location.clone(),
            survey_number,
            subdivision_number,
            owner_name,
            record_type: self.record_type,
            property_uid,
            language: self.language.clone(),
        }
    }
}

/// Result of a completed search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Audit row id
    pub search_request_id: u64,
    /// Matching records
    pub records: Vec<LandRecord>,
    /// Always `records.len()`
    pub total: usize,
}

impl SearchOutcome {
    /// Wrap `records`, keeping `total` consistent.
    #[must_use]
    pub fn new(search_request_id: u64, records: Vec<LandRecord>) -> Self {
        let total = records.len();
        Self {
            search_request_id,
            records,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_wire_names() {
        for record_type in RecordType::ALL {
            let json = serde_json::to_string(&record_type).unwrap();
            assert_eq!(json, format!("\"{}\"", record_type.as_str()));
            assert_eq!(record_type.as_str().parse::<RecordType>().unwrap(), record_type);
        }
        assert_eq!("extract-7-12".parse::<RecordType>().unwrap(), RecordType::Extract712);
        assert!("deed".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_status_never_reverts() {
        assert!(SearchStatus::Pending.can_transition_to(SearchStatus::Completed));
        assert!(SearchStatus::Pending.can_transition_to(SearchStatus::Failed));
        assert!(!SearchStatus::Completed.can_transition_to(SearchStatus::Pending));
        assert!(!SearchStatus::Failed.can_transition_to(SearchStatus::Completed));
        assert!(!SearchStatus::Pending.can_transition_to(SearchStatus::Pending));
    }

    #[test]
    fn test_state_serializes_flat_camel_case() {
        let state = State {
            id: 14,
            code: "MH".to_string(),
            name: LocalizedName::new("Maharashtra", "महाराष्ट्र", Some("महाराष्ट्र")),
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["nameEn"], "Maharashtra");
        assert_eq!(value["code"], "MH");
    }

    #[test]
    fn test_outcome_total_matches_records() {
        let outcome = SearchOutcome::new(7, Vec::new());
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.search_request_id, 7);
    }
}
