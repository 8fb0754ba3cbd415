use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::captcha::CaptchaStore;
use crate::error::{LandRecordError, Result, ValidationError};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{
    LandRecord, RawSearchRequest, SearchCriteria, SearchOutcome, SearchStatus, ValidatedSearch,
};
use crate::repository::{LandRecordRepository, SearchRequestRepository};
use crate::validation::SearchValidator;

/// Stages a request passes through on its way to a terminal status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Received,
    Validated,
    Resolved,
    Filtered,
    Recorded,
}

/// Runs searches: validate, open the audit row, look up, filter by record
/// type, close the audit row.
pub struct SearchService {
    records: Arc<dyn LandRecordRepository>,
    audit: Arc<dyn SearchRequestRepository>,
    validator: SearchValidator,
    captchas: Option<Arc<CaptchaStore>>,
    metrics: Arc<MetricsCollector>,
}

impl SearchService {
    pub fn new(
        records: Arc<dyn LandRecordRepository>,
        audit: Arc<dyn SearchRequestRepository>,
    ) -> Self {
        Self {
            records,
            audit,
            validator: SearchValidator::default(),
            captchas: None,
            metrics: Arc::new(MetricsCollector::default()),
        }
    }

    /// Use a validator with non-default limits.
    #[must_use]
    pub fn with_validator(mut self, validator: SearchValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Require answers to match a challenge issued by `captchas`.
    #[must_use]
    pub fn with_captcha_verification(mut self, captchas: Arc<CaptchaStore>) -> Self {
        self.captchas = Some(captchas);
        self
    }

    /// Report into a shared collector.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Validate and run a raw request.
    ///
    /// Validation failures return [`LandRecordError::Validation`] and leave no
    /// audit row. Any later store fault marks the audit row `failed` and
    /// returns a generic [`LandRecordError::Search`].
    pub async fn search(&self, raw: &RawSearchRequest) -> Result<SearchOutcome> {
        debug!(stage = ?SearchStage::Received, mode = ?raw.search_mode, "Search received");

        let validated = self.validate(raw).map_err(|errors| self.reject(errors))?;
        debug!(stage = ?SearchStage::Validated, criteria = validated.criteria.label(), "Search validated");

        self.execute(&validated).await
    }

    /// Run a search from an untyped JSON body. Fields of the wrong JSON type
    /// are rejected the same way as any other validation failure.
    pub async fn search_json(&self, body: &serde_json::Value) -> Result<SearchOutcome> {
        let raw = SearchValidator::read_body(body).map_err(|errors| self.reject(errors))?;
        self.search(&raw).await
    }

    fn reject(&self, errors: ValidationError) -> LandRecordError {
        warn!(fields = ?errors.fields(), "Search request rejected");
        self.metrics.record_validation_failure(errors.violations.len());
        LandRecordError::Validation(errors)
    }

    fn validate(&self, raw: &RawSearchRequest) -> std::result::Result<ValidatedSearch, ValidationError> {
        let validated = self.validator.validate(raw)?;

        match &self.captchas {
            Some(captchas) => {
                if let Err(rejection) =
                    captchas.verify(validated.captcha_id.as_deref(), &validated.captcha)
                {
                    let mut errors = ValidationError::default();
                    errors.push("captcha", rejection.reason());
                    return Err(errors);
                }
            }
            None => debug!("Captcha verification disabled; answer only checked for presence"),
        }

        Ok(validated)
    }

    /// Run an already validated request.
    pub async fn execute(&self, validated: &ValidatedSearch) -> Result<SearchOutcome> {
        let timer = OperationTimer::new("search_land_records");
        let mode = validated.criteria.label();

        let audit_row = self.audit.create(validated.to_audit()).await.map_err(|e| {
            error!(error = %e, "Failed to open search audit row");
            self.metrics.record_error("audit");
            self.metrics.record_search(mode, false, 0, timer.elapsed());
            LandRecordError::Search("Search failed".to_string())
        })?;
        let search_request_id = audit_row.id;

        match self.lookup(&validated.criteria).await {
            Ok(candidates) => {
                debug!(stage = ?SearchStage::Resolved, search_request_id, candidates = candidates.len(), "Lookup resolved");

                let records: Vec<LandRecord> = candidates
                    .into_iter()
                    .filter(|r| r.record_type == validated.record_type)
                    .collect();
                debug!(stage = ?SearchStage::Filtered, search_request_id, matched = records.len(), "Filtered by record type");

                if let Err(e) = self
                    .audit
                    .update_status(search_request_id, SearchStatus::Completed)
                    .await
                {
                    error!(search_request_id, error = %e, "Failed to complete search audit row");
                    self.fail_audit_row(search_request_id).await;
                    self.metrics.record_error("audit");
                    self.metrics.record_search(mode, false, 0, timer.elapsed());
                    return Err(LandRecordError::Search("Search failed".to_string()));
                }
                debug!(stage = ?SearchStage::Recorded, search_request_id, "Search recorded");

                self.metrics.record_search(mode, true, records.len(), timer.elapsed());
                info!(
                    search_request_id,
                    mode = validated.criteria.mode().as_str(),
                    criteria = mode,
                    record_type = %validated.record_type,
                    total = records.len(),
                    "Search completed"
                );
                timer.finish();
                Ok(SearchOutcome::new(search_request_id, records))
            }
            Err(e) => {
                error!(search_request_id, error = %e, "Land record lookup failed");
                self.fail_audit_row(search_request_id).await;
                self.metrics.record_error("lookup");
                self.metrics.record_search(mode, false, 0, timer.elapsed());
                Err(LandRecordError::Search("Search failed".to_string()))
            }
        }
    }

    async fn lookup(&self, criteria: &SearchCriteria) -> Result<Vec<LandRecord>> {
        match criteria {
            SearchCriteria::ByIdentifier { uid } => Ok(self
                .records
                .find_by_property_uid(uid)
                .await?
                .into_iter()
                .collect()),
            SearchCriteria::ByLocationAndSurvey {
                village_id,
                survey,
                subdivision,
            } => {
                self.records
                    .find_by_village_and_survey(*village_id, survey, subdivision.as_deref())
                    .await
            }
            SearchCriteria::ByLocationAndOwner {
                village_id,
                owner_fragment,
            } => {
                self.records
                    .find_by_owner_in_village(*village_id, owner_fragment)
                    .await
            }
        }
    }

    async fn fail_audit_row(&self, search_request_id: u64) {
        if let Err(e) = self
            .audit
            .update_status(search_request_id, SearchStatus::Failed)
            .await
        {
            error!(search_request_id, error = %e, "Failed to mark search audit row as failed");
        }
    }
}
