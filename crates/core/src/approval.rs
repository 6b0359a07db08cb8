//! Time-boxed edit-approval predicate.
//!
//! Posted financial records are locked; a mutation is only allowed while an
//! approved, unconsumed, unexpired approval for the matching action exists.
//! The predicate here is deliberately effect-free: stamping `first_edit_at`
//! and consuming the approval are explicit writes the persistence layer
//! issues after authorization succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actions an approval can authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    /// Edit detail rows of a posted record.
    Edit,
    /// Post a record.
    Post,
    /// Unpost a record.
    Unpost,
    /// Delete a record.
    Delete,
    /// Run a batch process against a record.
    Process,
}

impl ApprovalAction {
    /// Stable persisted identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Post => "post",
            Self::Unpost => "unpost",
            Self::Delete => "delete",
            Self::Process => "process",
        }
    }

    /// Parses a persisted identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "edit" => Some(Self::Edit),
            "post" => Some(Self::Post),
            "unpost" => Some(Self::Unpost),
            "delete" => Some(Self::Delete),
            "process" => Some(Self::Process),
            _ => None,
        }
    }
}

/// Review status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting review.
    Pending,
    /// Granted.
    Approved,
    /// Denied.
    Rejected,
}

impl ApprovalStatus {
    /// Stable persisted identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a persisted identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// The fields of an approval row the predicate needs.
#[derive(Debug, Clone)]
pub struct ApprovalSnapshot {
    /// Review status.
    pub status: ApprovalStatus,
    /// Authorized action.
    pub action: ApprovalAction,
    /// End of the authorization window.
    pub expires_at: DateTime<Utc>,
    /// When the approval was explicitly released, if ever.
    pub consumed_at: Option<DateTime<Utc>>,
    /// When the first gated edit happened, if ever (audit only).
    pub first_edit_at: Option<DateTime<Utc>>,
}

impl ApprovalSnapshot {
    /// Whether this approval authorizes `action` at `now`.
    ///
    /// Usable means: approved, not yet consumed, not yet expired, and for
    /// the requested action. `first_edit_at` has no effect on the outcome;
    /// multiple edits within the window are allowed until release.
    #[must_use]
    pub fn is_usable(&self, action: ApprovalAction, now: DateTime<Utc>) -> bool {
        self.status == ApprovalStatus::Approved
            && self.action == action
            && self.consumed_at.is_none()
            && now < self.expires_at
    }
}

/// Authorization failure raised by the approval gate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApprovalError {
    /// No usable approval exists for the record.
    #[error("no active approval for {0} on this record")]
    NotAuthorized(&'static str),
}

impl ApprovalError {
    /// Builds the failure for a given action.
    #[must_use]
    pub fn not_authorized(action: ApprovalAction) -> Self {
        Self::NotAuthorized(action.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(status: ApprovalStatus, action: ApprovalAction) -> ApprovalSnapshot {
        ApprovalSnapshot {
            status,
            action,
            expires_at: Utc::now() + Duration::minutes(30),
            consumed_at: None,
            first_edit_at: None,
        }
    }

    #[test]
    fn test_usable_when_approved_and_live() {
        let s = snapshot(ApprovalStatus::Approved, ApprovalAction::Edit);
        assert!(s.is_usable(ApprovalAction::Edit, Utc::now()));
    }

    #[test]
    fn test_not_usable_when_pending_or_rejected() {
        let now = Utc::now();
        assert!(!snapshot(ApprovalStatus::Pending, ApprovalAction::Edit)
            .is_usable(ApprovalAction::Edit, now));
        assert!(!snapshot(ApprovalStatus::Rejected, ApprovalAction::Edit)
            .is_usable(ApprovalAction::Edit, now));
    }

    #[test]
    fn test_not_usable_after_expiry() {
        let mut s = snapshot(ApprovalStatus::Approved, ApprovalAction::Edit);
        s.expires_at = Utc::now() - Duration::seconds(1);
        assert!(!s.is_usable(ApprovalAction::Edit, Utc::now()));
    }

    #[test]
    fn test_not_usable_once_consumed() {
        let mut s = snapshot(ApprovalStatus::Approved, ApprovalAction::Edit);
        s.consumed_at = Some(Utc::now());
        assert!(!s.is_usable(ApprovalAction::Edit, Utc::now()));
    }

    #[test]
    fn test_action_must_match() {
        let s = snapshot(ApprovalStatus::Approved, ApprovalAction::Unpost);
        assert!(!s.is_usable(ApprovalAction::Edit, Utc::now()));
        assert!(s.is_usable(ApprovalAction::Unpost, Utc::now()));
    }

    #[test]
    fn test_first_edit_stamp_does_not_consume() {
        let mut s = snapshot(ApprovalStatus::Approved, ApprovalAction::Edit);
        s.first_edit_at = Some(Utc::now());
        assert!(s.is_usable(ApprovalAction::Edit, Utc::now()));
    }

    #[test]
    fn test_action_codec_round_trip() {
        for action in [
            ApprovalAction::Edit,
            ApprovalAction::Post,
            ApprovalAction::Unpost,
            ApprovalAction::Delete,
            ApprovalAction::Process,
        ] {
            assert_eq!(ApprovalAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(ApprovalAction::parse("void"), None);
    }

    #[test]
    fn test_status_codec_round_trip() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(ApprovalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApprovalStatus::parse("granted"), None);
    }
}
