//! Deal-related state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category assigned when a submission leaves it blank.
pub const DEFAULT_CATEGORY: &str = "General";

/// Deal status. Everything except `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    #[default]
    Pending,
    Promoted,
    Verified,
    Rejected,
}

impl DealStatus {
    /// Check if the status can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Promoted and verified deals are both eligible for alerts.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Promoted | Self::Verified)
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Promoted => write!(f, "promoted"),
            Self::Verified => write!(f, "verified"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A verifier's judgment on a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Valid,
    Invalid,
}

impl std::str::FromStr for Verdict {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            other => Err(crate::Error::validation(format!(
                "Unknown verdict '{}', expected 'valid' or 'invalid'",
                other
            ))),
        }
    }
}

/// A single user's verification of a deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Verification ID.
    pub id: String,
    /// Deal being verified.
    pub deal_id: String,
    /// User who verified.
    pub verifier_id: String,
    /// The verdict.
    pub verdict: Verdict,
    /// Optional supporting evidence.
    pub evidence: Option<String>,
    /// Verification timestamp.
    pub created_at: DateTime<Utc>,
}

/// A submitted deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Deal ID.
    pub id: String,
    /// Deal title.
    pub title: String,
    /// Offer price.
    pub price: Decimal,
    /// Price before the discount, if known.
    pub original_price: Option<Decimal>,
    /// Link to the offer.
    pub url: String,
    /// Category.
    pub category: String,
    /// Submitting user.
    pub submitter_id: String,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Verifications in arrival order.
    pub verifications: Vec<Verification>,
    /// Centralized vote tally.
    pub votes: u32,
    /// Lifecycle status.
    pub status: DealStatus,
    /// When the deal was promoted.
    pub promoted_at: Option<DateTime<Utc>>,
    /// When the deal was verified.
    pub verified_at: Option<DateTime<Utc>>,
}

impl Deal {
    /// Number of `valid` verifications.
    pub fn valid_count(&self) -> u32 {
        self.count_verdict(Verdict::Valid)
    }

    /// Number of `invalid` verifications.
    pub fn invalid_count(&self) -> u32 {
        self.count_verdict(Verdict::Invalid)
    }

    /// Total verifications of either verdict.
    pub fn verification_count(&self) -> u32 {
        u32::try_from(self.verifications.len()).unwrap_or(u32::MAX)
    }

    fn count_verdict(&self, verdict: Verdict) -> u32 {
        let count = self
            .verifications
            .iter()
            .filter(|v| v.verdict == verdict)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Check whether a user has already verified this deal.
    pub fn verified_by(&self, user_id: &str) -> bool {
        self.verifications.iter().any(|v| v.verifier_id == user_id)
    }

    /// Check if the deal is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.status == DealStatus::Pending
    }

    /// Discount relative to the original price, as a percentage.
    pub fn discount_percent(&self) -> Option<Decimal> {
        let original = self.original_price?;
        if original <= Decimal::ZERO || original <= self.price {
            return None;
        }
        Some(((original - self.price) / original) * Decimal::ONE_HUNDRED)
    }

    /// Time from submission to promotion.
    pub fn time_to_promotion(&self) -> Option<chrono::Duration> {
        self.promoted_at.map(|at| at - self.created_at)
    }

    /// Time from submission to verification.
    pub fn time_to_verification(&self) -> Option<chrono::Duration> {
        self.verified_at.map(|at| at - self.created_at)
    }
}

/// Submission payload for a new deal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealDraft {
    pub title: String,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub url: String,
    #[serde(default)]
    pub category: String,
    pub submitter_id: String,
}

impl DealDraft {
    /// Check required fields and price sanity.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::Error::validation("Deal title is required"));
        }
        if self.url.trim().is_empty() {
            return Err(crate::Error::validation("Deal URL is required"));
        }
        if self.submitter_id.trim().is_empty() {
            return Err(crate::Error::validation("Submitter is required"));
        }
        match self.price {
            None => return Err(crate::Error::validation("Deal price is required")),
            Some(price) if price <= Decimal::ZERO => {
                return Err(crate::Error::validation(format!(
                    "Deal price must be positive, got {}",
                    price
                )));
            }
            Some(_) => {}
        }
        if let Some(original) = self.original_price
            && original <= Decimal::ZERO
        {
            return Err(crate::Error::validation(format!(
                "Original price must be positive, got {}",
                original
            )));
        }
        Ok(())
    }
}

/// Listing filter for deals.
#[derive(Debug, Clone, Default)]
pub struct DealFilter {
    /// Only deals with this status.
    pub status: Option<DealStatus>,
    /// Case-insensitive match on title or category.
    pub search: Option<String>,
}

/// State for deal-related data.
#[derive(Debug, Default)]
pub struct DealState {
    /// Deals indexed by ID.
    deals: HashMap<String, Deal>,
    /// Deal IDs in submission order.
    order: Vec<String>,
}

impl DealState {
    /// Create a pending deal from a validated draft.
    pub fn insert(&mut self, draft: DealDraft, now: DateTime<Utc>) -> crate::Result<Deal> {
        draft.validate()?;
        let price = draft
            .price
            .ok_or_else(|| crate::Error::validation("Deal price is required"))?;

        let category = match draft.category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            c => c.to_string(),
        };

        let deal = Deal {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            price,
            original_price: draft.original_price,
            url: draft.url.trim().to_string(),
            category,
            submitter_id: draft.submitter_id,
            created_at: now,
            verifications: Vec::new(),
            votes: 0,
            status: DealStatus::Pending,
            promoted_at: None,
            verified_at: None,
        };

        self.order.push(deal.id.clone());
        self.deals.insert(deal.id.clone(), deal.clone());
        Ok(deal)
    }

    /// Get a deal by ID.
    pub fn get(&self, deal_id: &str) -> Option<&Deal> {
        self.deals.get(deal_id)
    }

    /// Get a deal by ID or fail with a not-found error.
    pub fn require(&self, deal_id: &str) -> crate::Result<&Deal> {
        self.get(deal_id)
            .ok_or_else(|| crate::Error::not_found(format!("Deal '{}' not found", deal_id)))
    }

    /// Get a mutable deal by ID or fail with a not-found error.
    pub fn require_mut(&mut self, deal_id: &str) -> crate::Result<&mut Deal> {
        self.deals
            .get_mut(deal_id)
            .ok_or_else(|| crate::Error::not_found(format!("Deal '{}' not found", deal_id)))
    }

    /// Add one vote. Votes are not deduplicated per user.
    pub fn add_vote(&mut self, deal_id: &str) -> crate::Result<&Deal> {
        let deal = self.require_mut(deal_id)?;
        deal.votes = deal.votes.saturating_add(1);
        Ok(deal)
    }

    /// Append a verification, rejecting a second one from the same user.
    pub fn add_verification(
        &mut self,
        deal_id: &str,
        verifier_id: &str,
        verdict: Verdict,
        evidence: Option<String>,
        now: DateTime<Utc>,
    ) -> crate::Result<Verification> {
        let deal = self.require_mut(deal_id)?;
        if deal.verified_by(verifier_id) {
            return Err(crate::Error::duplicate(format!(
                "User '{}' already verified deal '{}'",
                verifier_id, deal_id
            )));
        }

        let verification = Verification {
            id: uuid::Uuid::new_v4().to_string(),
            deal_id: deal_id.to_string(),
            verifier_id: verifier_id.to_string(),
            verdict,
            evidence: evidence.filter(|e| !e.trim().is_empty()),
            created_at: now,
        };
        deal.verifications.push(verification.clone());
        Ok(verification)
    }

    /// Deals matching the filter, newest first.
    pub fn list(&self, filter: &DealFilter) -> Vec<&Deal> {
        let query = filter.search.as_ref().map(|q| q.to_lowercase());
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.deals.get(id))
            .filter(|d| {
                if let Some(status) = filter.status
                    && d.status != status
                {
                    return false;
                }
                if let Some(query) = &query
                    && !d.title.to_lowercase().contains(query)
                    && !d.category.to_lowercase().contains(query)
                {
                    return false;
                }
                true
            })
            .collect()
    }

    /// All deals in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &Deal> {
        self.order.iter().filter_map(|id| self.deals.get(id))
    }

    /// Number of deals.
    pub fn len(&self) -> usize {
        self.deals.len()
    }

    /// Check if there are no deals.
    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }
}
