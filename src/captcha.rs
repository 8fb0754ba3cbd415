//! Captcha challenges bound to an id, so a submitted answer can be checked
//! against what the server actually issued.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MAX_TTL_SECS: u64 = 86_400;

/// Issued challenge as returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaChallenge {
    /// Challenge text to display
    pub captcha: String,
    /// Id to echo back with the answer
    pub captcha_id: String,
}

#[derive(Debug, Clone)]
struct Issued {
    answer: String,
    expires_at: DateTime<Utc>,
}

/// Why an answer was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaRejection {
    /// No challenge id was supplied
    MissingId,
    /// Unknown, expired or already used challenge
    UnknownOrExpired,
    /// Answer does not match the challenge
    Mismatch,
}

impl CaptchaRejection {
    /// Message for the caller
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingId => "Captcha id is required",
            Self::UnknownOrExpired => "Captcha has expired, please request a new one",
            Self::Mismatch => "Captcha does not match",
        }
    }
}

/// Concurrent store of outstanding challenges
#[derive(Debug)]
pub struct CaptchaStore {
    issued: DashMap<String, Issued>,
    length: usize,
    ttl: Duration,
}

impl CaptchaStore {
    /// Store issuing `length`-character challenges valid for `ttl_secs`.
    #[must_use]
    pub fn new(length: usize, ttl_secs: u64) -> Self {
        Self {
            issued: DashMap::new(),
            length: length.max(1),
            ttl: Duration::seconds(i64::try_from(ttl_secs.min(MAX_TTL_SECS)).unwrap_or(0)),
        }
    }

    /// Generate a fresh uppercase alphanumeric challenge.
    #[must_use]
    pub fn issue(&self) -> CaptchaChallenge {
        let mut rng = rand::thread_rng();
        let captcha: String = (0..self.length)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        let captcha_id = format!("{:032x}", rng.gen::<u128>());

        self.purge_expired();
        self.issued.insert(
            captcha_id.clone(),
            Issued {
                answer: captcha.clone(),
                expires_at: Utc::now() + self.ttl,
            },
        );

        CaptchaChallenge {
            captcha,
            captcha_id,
        }
    }

    /// Check `answer` against challenge `id`. A challenge can be used once,
    /// whether or not the answer matched.
    pub fn verify(&self, id: Option<&str>, answer: &str) -> Result<(), CaptchaRejection> {
        let id = id.filter(|id| !id.is_empty()).ok_or(CaptchaRejection::MissingId)?;
        let (_, issued) = self
            .issued
            .remove(id)
            .ok_or(CaptchaRejection::UnknownOrExpired)?;

        if issued.expires_at < Utc::now() {
            return Err(CaptchaRejection::UnknownOrExpired);
        }
        if !issued.answer.eq_ignore_ascii_case(answer.trim()) {
            return Err(CaptchaRejection::Mismatch);
        }
        Ok(())
    }

    /// Outstanding challenges
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.issued.len()
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.issued.retain(|_, issued| issued.expires_at >= now);
    }
}
