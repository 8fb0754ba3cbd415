//! Repository pattern for data access
//!
//! The location hierarchy, land records and the search audit trail are each
//! reached through a trait so the backing store can be swapped (in-memory for
//! tests and the default server, `sled` for a persistent audit log).

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{LandRecordError, Result};
use crate::models::{
    District, LandRecord, LocalizedName, NewLandRecord, NewSearchRequest, SearchRequest,
    SearchStatus, State, Taluka, Village,
};

/// Read access to the State → District → Taluka → Village tree.
///
/// Listing a parent with no children (or a parent that does not exist)
/// yields an empty vector, never an error. Results keep insertion order.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// All states
    async fn list_states(&self) -> Result<Vec<State>>;
    /// State by id
    async fn state(&self, id: u64) -> Result<Option<State>>;
    /// State by its unique code
    async fn state_by_code(&self, code: &str) -> Result<Option<State>>;
    /// Districts whose `state_id` equals `state_id`
    async fn list_districts(&self, state_id: u64) -> Result<Vec<District>>;
    /// District by id
    async fn district(&self, id: u64) -> Result<Option<District>>;
    /// Talukas whose `district_id` equals `district_id`
    async fn list_talukas(&self, district_id: u64) -> Result<Vec<Taluka>>;
    /// Taluka by id
    async fn taluka(&self, id: u64) -> Result<Option<Taluka>>;
    /// Villages whose `taluka_id` equals `taluka_id`
    async fn list_villages(&self, taluka_id: u64) -> Result<Vec<Village>>;
    /// Village by id
    async fn village(&self, id: u64) -> Result<Option<Village>>;
}

/// Land-record lookups and inserts.
#[async_trait]
pub trait LandRecordRepository: Send + Sync {
    /// Exact match on the trimmed property UID; at most one record
    async fn find_by_property_uid(&self, uid: &str) -> Result<Option<LandRecord>>;

    /// Exact match on village and survey number, narrowed by subdivision when given
    async fn find_by_village_and_survey(
        &self,
        village_id: u64,
        survey_number: &str,
        subdivision_number: Option<&str>,
    ) -> Result<Vec<LandRecord>>;

    /// Case-insensitive owner-name substring match within a village
    async fn find_by_owner_in_village(
        &self,
        village_id: u64,
        owner_fragment: &str,
    ) -> Result<Vec<LandRecord>>;

    /// Record by id
    async fn land_record(&self, id: u64) -> Result<Option<LandRecord>>;

    /// Insert a record, assigning its id and creation time
    async fn insert(&self, record: NewLandRecord) -> Result<LandRecord>;
}

/// Permanent log of search attempts.
#[async_trait]
pub trait SearchRequestRepository: Send + Sync {
    /// Open a `pending` audit row
    async fn create(&self, request: NewSearchRequest) -> Result<SearchRequest>;

    /// Move a `pending` row to a terminal status
    async fn update_status(&self, id: u64, status: SearchStatus) -> Result<SearchRequest>;

    /// Audit row by id
    async fn get(&self, id: u64) -> Result<Option<SearchRequest>>;
}

/// Monotonic id source owned by a single collection
#[derive(Debug)]
struct IdSequence(AtomicU64);

impl IdSequence {
    const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// A collection keyed by store-assigned id; `BTreeMap` keeps insertion order
/// because ids only grow.
#[derive(Debug)]
struct Table<T> {
    rows: RwLock<BTreeMap<u64, T>>,
    ids: IdSequence,
}

impl<T: Clone> Table<T> {
    const fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            ids: IdSequence::new(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<u64, T>>> {
        self.rows
            .read()
            .map_err(|_| LandRecordError::Storage("table lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<u64, T>>> {
        self.rows
            .write()
            .map_err(|_| LandRecordError::Storage("table lock poisoned".to_string()))
    }

    fn get(&self, id: u64) -> Result<Option<T>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn filter(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        Ok(self.read()?.values().filter(|row| predicate(row)).cloned().collect())
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Result<Option<T>> {
        Ok(self.read()?.values().find(|row| predicate(row)).cloned())
    }

    fn contains(&self, id: u64) -> Result<bool> {
        Ok(self.read()?.contains_key(&id))
    }
}

/// Process-local store backing every repository trait.
#[derive(Debug)]
pub struct InMemoryRepository {
    states: Table<State>,
    districts: Table<District>,
    talukas: Table<Taluka>,
    villages: Table<Village>,
    land_records: Table<LandRecord>,
    search_requests: Table<SearchRequest>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Empty store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            states: Table::new(),
            districts: Table::new(),
            talukas: Table::new(),
            villages: Table::new(),
            land_records: Table::new(),
            search_requests: Table::new(),
        }
    }

    /// Add a state. State codes are unique.
    pub fn insert_state(&self, code: &str, name: LocalizedName) -> Result<State> {
        let mut rows = self.states.write()?;
        if rows.values().any(|s| s.code == code) {
            return Err(duplicate_code("state", code));
        }
        let state = State {
            id: self.states.ids.next(),
            code: code.to_string(),
            name,
        };
        rows.insert(state.id, state.clone());
        Ok(state)
    }

    /// Add a district under an existing state.
    pub fn insert_district(&self, state_id: u64, code: &str, name: LocalizedName) -> Result<District> {
        if !self.states.contains(state_id)? {
            return Err(LandRecordError::UnknownParent {
                entity: "district",
                parent_id: state_id,
            });
        }
        let mut rows = self.districts.write()?;
        if rows.values().any(|d| d.state_id == state_id && d.code == code) {
            return Err(duplicate_code("district", code));
        }
        let district = District {
            id: self.districts.ids.next(),
            state_id,
            code: code.to_string(),
            name,
        };
        rows.insert(district.id, district.clone());
        Ok(district)
    }

    /// Add a taluka under an existing district.
    pub fn insert_taluka(&self, district_id: u64, code: &str, name: LocalizedName) -> Result<Taluka> {
        if !self.districts.contains(district_id)? {
            return Err(LandRecordError::UnknownParent {
                entity: "taluka",
                parent_id: district_id,
            });
        }
        let mut rows = self.talukas.write()?;
        if rows.values().any(|t| t.district_id == district_id && t.code == code) {
            return Err(duplicate_code("taluka", code));
        }
        let taluka = Taluka {
            id: self.talukas.ids.next(),
            district_id,
            code: code.to_string(),
            name,
        };
        rows.insert(taluka.id, taluka.clone());
        Ok(taluka)
    }

    /// Add a village under an existing taluka.
    pub fn insert_village(&self, taluka_id: u64, code: &str, name: LocalizedName) -> Result<Village> {
        if !self.talukas.contains(taluka_id)? {
            return Err(LandRecordError::UnknownParent {
                entity: "village",
                parent_id: taluka_id,
            });
        }
        let mut rows = self.villages.write()?;
        if rows.values().any(|v| v.taluka_id == taluka_id && v.code == code) {
            return Err(duplicate_code("village", code));
        }
        let village = Village {
            id: self.villages.ids.next(),
            taluka_id,
            code: code.to_string(),
            name,
        };
        rows.insert(village.id, village.clone());
        Ok(village)
    }

    /// District by code within a state
    pub fn district_by_code(&self, state_id: u64, code: &str) -> Result<Option<District>> {
        self.districts.find(|d| d.state_id == state_id && d.code == code)
    }

    /// Taluka by code within a district
    pub fn taluka_by_code(&self, district_id: u64, code: &str) -> Result<Option<Taluka>> {
        self.talukas.find(|t| t.district_id == district_id && t.code == code)
    }

    /// Village by code within a taluka
    pub fn village_by_code(&self, taluka_id: u64, code: &str) -> Result<Option<Village>> {
        self.villages.find(|v| v.taluka_id == taluka_id && v.code == code)
    }

    /// Number of stored land records
    pub fn land_record_count(&self) -> Result<usize> {
        Ok(self.land_records.read()?.len())
    }
}

fn duplicate_code(entity: &'static str, code: &str) -> LandRecordError {
    LandRecordError::DuplicateCode {
        entity,
        code: code.to_string(),
    }
}

#[async_trait]
impl LocationRepository for InMemoryRepository {
    async fn list_states(&self) -> Result<Vec<State>> {
        self.states.filter(|_| true)
    }

    async fn state(&self, id: u64) -> Result<Option<State>> {
        self.states.get(id)
    }

    async fn state_by_code(&self, code: &str) -> Result<Option<State>> {
        self.states.find(|s| s.code.eq_ignore_ascii_case(code))
    }

    async fn list_districts(&self, state_id: u64) -> Result<Vec<District>> {
        self.districts.filter(|d| d.state_id == state_id)
    }

    async fn district(&self, id: u64) -> Result<Option<District>> {
        self.districts.get(id)
    }

    async fn list_talukas(&self, district_id: u64) -> Result<Vec<Taluka>> {
        self.talukas.filter(|t| t.district_id == district_id)
    }

    async fn taluka(&self, id: u64) -> Result<Option<Taluka>> {
        self.talukas.get(id)
    }

    async fn list_villages(&self, taluka_id: u64) -> Result<Vec<Village>> {
        self.villages.filter(|v| v.taluka_id == taluka_id)
    }

    async fn village(&self, id: u64) -> Result<Option<Village>> {
        self.villages.get(id)
    }
}

#[async_trait]
impl LandRecordRepository for InMemoryRepository {
    async fn find_by_property_uid(&self, uid: &str) -> Result<Option<LandRecord>> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Ok(None);
        }
        self.land_records
            .find(|r| r.property_uid.as_deref() == Some(uid))
    }

    async fn find_by_village_and_survey(
        &self,
        village_id: u64,
        survey_number: &str,
        subdivision_number: Option<&str>,
    ) -> Result<Vec<LandRecord>> {
        self.land_records.filter(|r| {
            r.village_id == village_id
                && r.survey_number == survey_number
                && subdivision_number.map_or(true, |sub| r.subdivision_number.as_deref() == Some(sub))
        })
    }

    async fn find_by_owner_in_village(
        &self,
        village_id: u64,
        owner_fragment: &str,
    ) -> Result<Vec<LandRecord>> {
        let needle = owner_fragment.to_lowercase();
        self.land_records.filter(|r| {
            r.village_id == village_id && r.owner_name.to_lowercase().contains(&needle)
        })
    }

    async fn land_record(&self, id: u64) -> Result<Option<LandRecord>> {
        self.land_records.get(id)
    }

    async fn insert(&self, record: NewLandRecord) -> Result<LandRecord> {
        if !self.villages.contains(record.village_id)? {
            return Err(LandRecordError::UnknownParent {
                entity: "land record",
                parent_id: record.village_id,
            });
        }

        // Stored trimmed so lookups and the uniqueness check agree.
        let property_uid = record
            .property_uid
            .map(|uid| uid.trim().to_string())
            .filter(|uid| !uid.is_empty());

        // Uniqueness check and insert happen under one write lock.
        let mut rows = self.land_records.write()?;
        if let Some(uid) = &property_uid {
            if rows.values().any(|r| r.property_uid.as_ref() == Some(uid)) {
                return Err(LandRecordError::DuplicatePropertyUid(uid.clone()));
            }
        }

        let land_record = LandRecord {
            id: self.land_records.ids.next(),
            property_uid,
            village_id: record.village_id,
            survey_number: record.survey_number,
            subdivision_number: record.subdivision_number,
            owner_name: record.owner_name,
            father_name: record.father_name,
            area: record.area,
            classification: record.classification,
            record_type: record.record_type,
            record_data: record.record_data,
            created_at: Utc::now(),
        };
        rows.insert(land_record.id, land_record.clone());
        Ok(land_record)
    }
}

#[async_trait]
impl SearchRequestRepository for InMemoryRepository {
    async fn create(&self, request: NewSearchRequest) -> Result<SearchRequest> {
        let row = request.into_request(self.search_requests.ids.next());
        self.search_requests.write()?.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_status(&self, id: u64, status: SearchStatus) -> Result<SearchRequest> {
        let mut rows = self.search_requests.write()?;
        let row = rows.get_mut(&id).ok_or(LandRecordError::NotFound {
            entity: "search request",
            id,
        })?;
        if !row.status.can_transition_to(status) {
            return Err(LandRecordError::InvalidTransition {
                id,
                from: row.status.to_string(),
                to: status.to_string(),
            });
        }
        row.status = status;
        Ok(row.clone())
    }

    async fn get(&self, id: u64) -> Result<Option<SearchRequest>> {
        self.search_requests.get(id)
    }
}
