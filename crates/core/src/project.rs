//! Project records, service packages, and intake validation.
//!
//! A project is created from a client's intake form against a service
//! package. The package fixes the price (`total_amount`) and the revision
//! allowance (`max_revisions`); neither changes afterwards.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::payment::PaymentSummary;
use crate::status::{define_name_enum, PaymentStatus, ProjectStatus};
use crate::types::{Amount, DbId, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length of a project title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a project description.
pub const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// Maximum length of the call-to-action text.
pub const MAX_CTA_TEXT_LENGTH: usize = 100;

/// Maximum length of the free-form client notes.
pub const MAX_CLIENT_NOTES_LENGTH: usize = 2_000;

/// Maximum number of brand colors on an intake form.
pub const MAX_BRAND_COLORS: usize = 5;

/* --------------------------------------------------------------------------
Enums
-------------------------------------------------------------------------- */

define_name_enum! {
    /// Advisory scheduling priority. Never gates a transition.
    Priority ("priority") {
        Low => "low",
        Normal => "normal",
        High => "high",
        Urgent => "urgent",
    }
}

define_name_enum! {
    /// Where the finished video will be published.
    TargetPlatform ("target platform") {
        Tiktok => "tiktok",
        Instagram => "instagram",
        Youtube => "youtube",
        Whatsapp => "whatsapp",
        Facebook => "facebook",
        Multiple => "multiple",
    }
}

define_name_enum! {
    /// Requested running time of the finished video.
    VideoDuration ("video duration") {
        Seconds15 => "15s",
        Seconds30 => "30s",
        Seconds60 => "60s",
        Seconds90 => "90s",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl Default for TargetPlatform {
    fn default() -> Self {
        TargetPlatform::Multiple
    }
}

impl Default for VideoDuration {
    fn default() -> Self {
        VideoDuration::Seconds30
    }
}

/* --------------------------------------------------------------------------
Packages
-------------------------------------------------------------------------- */

/// A priced service tier a client buys when creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: DbId,
    pub name: String,
    pub price: Amount,
    pub delivery_days: i32,
    pub revision_count: i32,
    pub is_active: bool,
}

impl Package {
    /// A package must be active and sensibly priced before a project can use it.
    pub fn ensure_orderable(&self) -> Result<(), CoreError> {
        if !self.is_active {
            return Err(CoreError::Validation(format!(
                "Package '{}' is no longer offered",
                self.name
            )));
        }
        if self.price <= 0 {
            return Err(CoreError::Validation(format!(
                "Package '{}' has a non-positive price",
                self.name
            )));
        }
        if self.revision_count < 0 {
            return Err(CoreError::Validation(format!(
                "Package '{}' has a negative revision allowance",
                self.name
            )));
        }
        Ok(())
    }
}

/* --------------------------------------------------------------------------
Intake
-------------------------------------------------------------------------- */

/// The client-supplied brief captured when a project is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProjectIntake {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[serde(default)]
    pub target_platform: TargetPlatform,
    #[serde(default)]
    pub video_duration: VideoDuration,
    #[serde(default)]
    pub script_provided: bool,
    #[serde(default)]
    pub custom_script: Option<String>,
    #[serde(default)]
    pub brand_colors: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub cta_text: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub cta_url: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub client_notes: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

/// Validate an intake form, collecting field errors into a single message.
pub fn validate_intake(intake: &ProjectIntake) -> Result<(), CoreError> {
    intake
        .validate()
        .map_err(|errors| CoreError::Validation(errors.to_string()))?;

    if intake.title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be blank".to_string()));
    }

    if intake.description.trim().is_empty() {
        return Err(CoreError::Validation(
            "Description must not be blank".to_string(),
        ));
    }

    if intake.script_provided
        && intake
            .custom_script
            .as_ref()
            .map_or(true, |s| s.trim().is_empty())
    {
        return Err(CoreError::Validation(
            "A script must be supplied when script_provided is set".to_string(),
        ));
    }

    if intake.brand_colors.len() > MAX_BRAND_COLORS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_BRAND_COLORS} brand colors may be given"
        )));
    }

    for color in &intake.brand_colors {
        validate_hex_color(color)?;
    }

    Ok(())
}

/// Validate that a color is in hex format `#RRGGBB`.
pub fn validate_hex_color(color: &str) -> Result<(), CoreError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Must be in #RRGGBB hex format"
        )))
    }
}

/* --------------------------------------------------------------------------
Project
-------------------------------------------------------------------------- */

/// One purchased video-production order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub client_id: DbId,
    pub package_id: DbId,
    pub assigned_to: Option<DbId>,
    pub status: ProjectStatus,
    #[serde(flatten)]
    pub intake: ProjectIntake,
    pub total_amount: Amount,
    pub revision_count_used: i32,
    pub max_revisions: i32,
    pub delivery_days: i32,
    pub deadline_date: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything a store needs to insert a new project row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub client_id: DbId,
    pub package_id: DbId,
    pub intake: ProjectIntake,
    pub total_amount: Amount,
    pub max_revisions: i32,
    pub delivery_days: i32,
    pub created_at: Timestamp,
}

impl NewProject {
    /// Build the insert payload from a validated intake and its package.
    pub fn from_package(
        client_id: DbId,
        package: &Package,
        intake: ProjectIntake,
        now: Timestamp,
    ) -> Self {
        Self {
            client_id,
            package_id: package.id,
            intake,
            total_amount: package.price,
            max_revisions: package.revision_count,
            delivery_days: package.delivery_days,
            created_at: now,
        }
    }

    /// Materialise the row a store writes. Every project starts in `pending_payment`.
    pub fn into_project(self, id: DbId) -> Project {
        Project {
            id,
            client_id: self.client_id,
            package_id: self.package_id,
            assigned_to: None,
            status: ProjectStatus::PendingPayment,
            intake: self.intake,
            total_amount: self.total_amount,
            revision_count_used: 0,
            max_revisions: self.max_revisions,
            delivery_days: self.delivery_days,
            deadline_date: None,
            started_at: None,
            completed_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

impl Project {
    /// Revisions still available to the client.
    pub fn revisions_remaining(&self) -> i32 {
        (self.max_revisions - self.revision_count_used).max(0)
    }

    /// Deadline measured from a production start time.
    pub fn deadline_from(&self, started_at: Timestamp) -> Timestamp {
        started_at + Duration::days(i64::from(self.delivery_days))
    }

    /// A fresh `updated_at` strictly after the current one, so the
    /// `(status, updated_at)` pair always changes on commit.
    pub fn next_updated_at(&self, now: Timestamp) -> Timestamp {
        let floor = self.updated_at + Duration::microseconds(1);
        if now > floor {
            now
        } else {
            floor
        }
    }
}

/// A project as returned to callers: the stored row plus its payment projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub payment_status: PaymentStatus,
    pub payment: PaymentSummary,
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn valid_intake() -> ProjectIntake {
        ProjectIntake {
            title: "Launch teaser".to_string(),
            description: "30 second teaser for our new product line".to_string(),
            ..Default::default()
        }
    }

    fn package() -> Package {
        Package {
            id: 7,
            name: "Starter".to_string(),
            price: 1500,
            delivery_days: 3,
            revision_count: 2,
            is_active: true,
        }
    }

    #[test]
    fn valid_intake_passes() {
        assert!(validate_intake(&valid_intake()).is_ok());
    }

    #[test]
    fn missing_title_rejected() {
        let mut intake = valid_intake();
        intake.title = String::new();
        assert_matches!(validate_intake(&intake), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_description_rejected() {
        let mut intake = valid_intake();
        intake.description = "   ".to_string();
        assert_matches!(validate_intake(&intake), Err(CoreError::Validation(_)));
    }

    #[test]
    fn overlong_title_rejected() {
        let mut intake = valid_intake();
        intake.title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert_matches!(validate_intake(&intake), Err(CoreError::Validation(_)));
    }

    #[test]
    fn script_required_when_flagged() {
        let mut intake = valid_intake();
        intake.script_provided = true;
        assert_matches!(validate_intake(&intake), Err(CoreError::Validation(msg)) if msg.contains("script"));

        intake.custom_script = Some("INT. STUDIO - DAY".to_string());
        assert!(validate_intake(&intake).is_ok());
    }

    #[test]
    fn bad_cta_url_rejected() {
        let mut intake = valid_intake();
        intake.cta_url = Some("not a url".to_string());
        assert_matches!(validate_intake(&intake), Err(CoreError::Validation(_)));

        intake.cta_url = Some("https://example.com/shop".to_string());
        assert!(validate_intake(&intake).is_ok());
    }

    #[test]
    fn brand_colors_checked() {
        let mut intake = valid_intake();
        intake.brand_colors = vec!["#FF4444".to_string(), "#00aa00".to_string()];
        assert!(validate_intake(&intake).is_ok());

        intake.brand_colors.push("red".to_string());
        assert_matches!(validate_intake(&intake), Err(CoreError::Validation(msg)) if msg.contains("red"));

        intake.brand_colors = vec!["#000000".to_string(); MAX_BRAND_COLORS + 1];
        assert_matches!(validate_intake(&intake), Err(CoreError::Validation(_)));
    }

    #[test]
    fn intake_defaults_from_json() {
        let intake: ProjectIntake =
            serde_json::from_str(r#"{"title": "T", "description": "D"}"#).unwrap();
        assert_eq!(intake.target_platform, TargetPlatform::Multiple);
        assert_eq!(intake.video_duration, VideoDuration::Seconds30);
        assert_eq!(intake.priority, Priority::Normal);
        assert!(intake.brand_colors.is_empty());
    }

    #[test]
    fn new_project_takes_price_and_allowance_from_package() {
        let now = Utc::now();
        let project = NewProject::from_package(3, &package(), valid_intake(), now).into_project(1);
        assert_eq!(project.status, ProjectStatus::PendingPayment);
        assert_eq!(project.total_amount, 1500);
        assert_eq!(project.max_revisions, 2);
        assert_eq!(project.revision_count_used, 0);
        assert_eq!(project.assigned_to, None);
        assert_eq!(project.updated_at, now);
    }

    #[test]
    fn inactive_package_not_orderable() {
        let mut pkg = package();
        assert!(pkg.ensure_orderable().is_ok());
        pkg.is_active = false;
        assert_matches!(pkg.ensure_orderable(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn updated_at_strictly_increases() {
        let now = Utc::now();
        let project = NewProject::from_package(3, &package(), valid_intake(), now).into_project(1);
        assert!(project.next_updated_at(now) > project.updated_at);
        assert!(project.next_updated_at(now - Duration::seconds(5)) > project.updated_at);
        let later = now + Duration::seconds(5);
        assert_eq!(project.next_updated_at(later), later);
    }

    #[test]
    fn deadline_uses_delivery_days() {
        let now = Utc::now();
        let project = NewProject::from_package(3, &package(), valid_intake(), now).into_project(1);
        assert_eq!(project.deadline_from(now), now + Duration::days(3));
    }
}
