//! Reference data loaded at startup.
//!
//! The hierarchy is described as a nested tree (state → districts → talukas →
//! villages → land records), so every child is attached to exactly one parent
//! by construction. The same shape can be read from a YAML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{LocalizedName, NewLandRecord, RecordType};
use crate::repository::{InMemoryRepository, LandRecordRepository};

/// Whole seed document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    /// Top-level states
    #[serde(default)]
    pub states: Vec<SeedState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedState {
    pub code: String,
    #[serde(flatten)]
    pub name: LocalizedName,
    #[serde(default)]
    pub districts: Vec<SeedDistrict>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDistrict {
    pub code: String,
    #[serde(flatten)]
    pub name: LocalizedName,
    #[serde(default)]
    pub talukas: Vec<SeedTaluka>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedTaluka {
    pub code: String,
    #[serde(flatten)]
    pub name: LocalizedName,
    #[serde(default)]
    pub villages: Vec<SeedVillage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedVillage {
    pub code: String,
    #[serde(flatten)]
    pub name: LocalizedName,
    #[serde(default)]
    pub land_records: Vec<SeedLandRecord>,
}

/// A land record inside a village; the village id is assigned on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedLandRecord {
    #[serde(default)]
    pub property_uid: Option<String>,
    pub survey_number: String,
    #[serde(default)]
    pub subdivision_number: Option<String>,
    pub owner_name: String,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default)]
    pub record_data: Option<serde_json::Value>,
}

impl SeedLandRecord {
    fn into_new(self, village_id: u64) -> NewLandRecord {
        NewLandRecord {
            property_uid: self.property_uid,
            village_id,
            survey_number: self.survey_number,
            subdivision_number: self.subdivision_number,
            owner_name: self.owner_name,
            father_name: self.father_name,
            area: self.area,
            classification: self.classification,
            record_type: self.record_type,
            record_data: self.record_data,
        }
    }
}

/// Counts of what a seed run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub states: usize,
    pub districts: usize,
    pub talukas: usize,
    pub villages: usize,
    pub land_records: usize,
}

impl SeedData {
    /// Parse a YAML seed document
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read a YAML seed file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Insert everything into `repo`, parents before children.
    pub async fn apply(self, repo: &InMemoryRepository) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();

        for seed_state in self.states {
            let state = repo.insert_state(&seed_state.code, seed_state.name)?;
            summary.states += 1;

            for seed_district in seed_state.districts {
                let district = repo.insert_district(state.id, &seed_district.code, seed_district.name)?;
                summary.districts += 1;

                for seed_taluka in seed_district.talukas {
                    let taluka = repo.insert_taluka(district.id, &seed_taluka.code, seed_taluka.name)?;
                    summary.talukas += 1;

                    for seed_village in seed_taluka.villages {
                        let village =
                            repo.insert_village(taluka.id, &seed_village.code, seed_village.name)?;
                        summary.villages += 1;

                        for record in seed_village.land_records {
                            let inserted = repo.insert(record.into_new(village.id)).await?;
                            debug!(record_id = inserted.id, village = %village.code, "Seeded land record");
                            summary.land_records += 1;
                        }
                    }
                }
            }
        }

        info!(
            states = summary.states,
            districts = summary.districts,
            talukas = summary.talukas,
            villages = summary.villages,
            land_records = summary.land_records,
            "Reference data loaded"
        );
        Ok(summary)
    }
}

fn name(en: &str, hi: &str, local: &str) -> LocalizedName {
    LocalizedName::new(en, hi, Some(local))
}

fn leaf_state(code: &str, en: &str, hi: &str, local: &str) -> SeedState {
    SeedState {
        code: code.to_string(),
        name: name(en, hi, local),
        districts: Vec::new(),
    }
}

fn leaf_district(code: &str, en: &str, hi: &str, local: &str) -> SeedDistrict {
    SeedDistrict {
        code: code.to_string(),
        name: name(en, hi, local),
        talukas: Vec::new(),
    }
}

fn leaf_taluka(code: &str, en: &str, hi: &str, local: &str) -> SeedTaluka {
    SeedTaluka {
        code: code.to_string(),
        name: name(en, hi, local),
        villages: Vec::new(),
    }
}

fn leaf_village(code: &str, en: &str, hi: &str, local: &str) -> SeedVillage {
    SeedVillage {
        code: code.to_string(),
        name: name(en, hi, local),
        land_records: Vec::new(),
    }
}

fn juhu_records() -> Vec<SeedLandRecord> {
    vec![
        SeedLandRecord {
            property_uid: Some("12345678901".to_string()),
            survey_number: "123".to_string(),
            subdivision_number: Some("1".to_string()),
            owner_name: "राम शर्मा".to_string(),
            father_name: Some("श्याम शर्मा".to_string()),
            area: Some("500 sq ft".to_string()),
            classification: Some("Residential".to_string()),
            record_type: RecordType::Extract712,
            record_data: Some(serde_json::json!({
                "ownershipType": "Individual",
                "landType": "Urban",
                "registrationDate": "2020-01-15",
                "lastUpdated": "2023-12-01"
            })),
        },
        SeedLandRecord {
            property_uid: Some("12345678902".to_string()),
            survey_number: "124".to_string(),
            subdivision_number: Some("2".to_string()),
            owner_name: "सीता पटेल".to_string(),
            father_name: Some("गीता पटेल".to_string()),
            area: Some("750 sq ft".to_string()),
            classification: Some("Commercial".to_string()),
            record_type: RecordType::PropertyCard,
            record_data: Some(serde_json::json!({
                "ownershipType": "Individual",
                "landType": "Urban",
                "registrationDate": "2019-05-20",
                "lastUpdated": "2023-11-15"
            })),
        },
    ]
}

/// The dataset shipped with the service: all states and union territories,
/// with sample depth under Maharashtra → Mumbai → Andheri.
#[must_use]
pub fn builtin() -> SeedData {
    let mut juhu = leaf_village("JUH", "Juhu", "जुहू", "जुहू");
    juhu.land_records = juhu_records();

    let mut andheri = leaf_taluka("AND", "Andheri", "अंधेरी", "अंधेरी");
    andheri.villages = vec![
        juhu,
        leaf_village("VER", "Versova", "वर्सोवा", "वर्सोवा"),
        leaf_village("LOK", "Lokhandwala", "लोकहंडवाला", "लोकहंडवाला"),
    ];

    let mut mumbai = leaf_district("MUM", "Mumbai", "मुंबई", "मुंबई");
    mumbai.talukas = vec![
        andheri,
        leaf_taluka("BAN", "Bandra", "बांद्रा", "बांद्रा"),
        leaf_taluka("BOR", "Borivali", "बोरिवली", "बोरिवली"),
    ];

    let mut maharashtra = leaf_state("MH", "Maharashtra", "महाराष्ट्र", "महाराष्ट्र");
    maharashtra.districts = vec![
        mumbai,
        leaf_district("PUN", "Pune", "पुणे", "पुणे"),
        leaf_district("NAG", "Nagpur", "नागपूर", "नागपूर"),
        leaf_district("AUR", "Aurangabad", "औरंगाबाद", "औरंगाबाद"),
        leaf_district("NAS", "Nashik", "नाशिक", "नाशिक"),
    ];

    let states = vec![
        leaf_state("AP", "Andhra Pradesh", "आंध्र प्रदेश", "ఆంధ్ర ప్రదేశ్"),
        leaf_state("AR", "Arunachal Pradesh", "अरुणाचल प्रदेश", "Arunachal Pradesh"),
        leaf_state("AS", "Assam", "असम", "অসম"),
        leaf_state("BR", "Bihar", "बिहार", "बिहार"),
        leaf_state("CG", "Chhattisgarh", "छत्तीसगढ़", "छत्तीसगढ़"),
        leaf_state("GA", "Goa", "गोवा", "गोंय"),
        leaf_state("GJ", "Gujarat", "गुजरात", "ગુજરાત"),
        leaf_state("HR", "Haryana", "हरियाणा", "हरियाणा"),
        leaf_state("HP", "Himachal Pradesh", "हिमाचल प्रदेश", "हिमाचल प्रदेश"),
        leaf_state("JH", "Jharkhand", "झारखंड", "झारखंड"),
        leaf_state("KA", "Karnataka", "कर्नाटक", "ಕರ್ನಾಟಕ"),
        leaf_state("KL", "Kerala", "केरल", "കേരളം"),
        leaf_state("MP", "Madhya Pradesh", "मध्य प्रदेश", "मध्य प्रदेश"),
        maharashtra,
        leaf_state("MN", "Manipur", "मणिपुर", "মণিপুর"),
        leaf_state("ML", "Meghalaya", "मेघालय", "Meghalaya"),
        leaf_state("MZ", "Mizoram", "मिजोरम", "Mizoram"),
        leaf_state("NL", "Nagaland", "नगालैंड", "Nagaland"),
        leaf_state("OR", "Odisha", "ओडिशा", "ଓଡ଼ିଶା"),
        leaf_state("PB", "Punjab", "पंजाब", "ਪੰਜਾਬ"),
        leaf_state("RJ", "Rajasthan", "राजस्थान", "राजस्थान"),
        leaf_state("SK", "Sikkim", "सिक्किम", "སི་ཀིམ་"),
        leaf_state("TN", "Tamil Nadu", "तमिलनाडु", "தமிழ் நாடு"),
        leaf_state("TG", "Telangana", "तेलंगाना", "తెలంగాణ"),
        leaf_state("TR", "Tripura", "त्रिपुरा", "ত্রিপুরা"),
        leaf_state("UK", "Uttarakhand", "उत्तराखंड", "उत्तराखंड"),
        leaf_state("UP", "Uttar Pradesh", "उत्तर प्रदेश", "उत्तर प्रदेश"),
        leaf_state("WB", "West Bengal", "पश्चिम बंगाल", "পশ্চিমবঙ্গ"),
        // Union Territories
        leaf_state("AN", "Andaman and Nicobar Islands", "अंडमान और निकोबार द्वीप समूह", "Andaman and Nicobar Islands"),
        leaf_state("CH", "Chandigarh", "चंडीगढ़", "ਚੰਡੀਗੜ੍ਹ"),
        leaf_state(
            "DH",
            "Dadra and Nagar Haveli and Daman and Diu",
            "दादरा और नगर हवेली और दमन और दीव",
            "દાદરા અને નગર હવેલી અને દમણ અને દીવ",
        ),
        leaf_state("DL", "Delhi", "दिल्ली", "दिल्ली"),
        leaf_state("JK", "Jammu and Kashmir", "जम्मू और कश्मीर", "جموں و کشمیر"),
        leaf_state("LA", "Ladakh", "लद्दाख", "ལ་དྭགས་"),
        leaf_state("LD", "Lakshadweep", "लक्षद्वीप", "ലക്ഷദ്വീപ്"),
        leaf_state("PY", "Puducherry", "पुदुचेरी", "புதுச்சேரி"),
    ];

    SeedData { states }
}

/// Fresh store loaded with [`builtin`]
pub async fn seeded_repository() -> Result<InMemoryRepository> {
    let repo = InMemoryRepository::new();
    builtin().apply(&repo).await?;
    Ok(repo)
}
