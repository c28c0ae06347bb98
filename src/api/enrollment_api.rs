// ==========================================
// Correlativities Engine - Enrollment API
// ==========================================
// Caller-facing facade: input validation, engine dispatch, error
// translation. Holds no rules of its own.
// ==========================================

use std::collections::BTreeMap;

use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineConfigReader;
use crate::domain::{
    BulkEnrollmentResult, CareerId, CorrelativitiesGraph, Enrollment, EnrollmentDecision,
    EnrollmentId, EnrollmentStatus, StudentId, Subject, SubjectEligibility, SubjectId,
};
use crate::engine::{
    CorrelativitiesGraphBuilder, EligibilityEngine, EnrollmentGatekeeper, EnrollmentRepositories,
};
use crate::i18n::t_with_args;

pub struct EnrollmentApi {
    eligibility: EligibilityEngine,
    graph: CorrelativitiesGraphBuilder,
    gatekeeper: EnrollmentGatekeeper,
}

impl EnrollmentApi {
    /// Facade with default tunables
    pub fn new(repos: EnrollmentRepositories) -> Self {
        Self {
            eligibility: EligibilityEngine::new(repos.clone()),
            graph: CorrelativitiesGraphBuilder::new(repos.clone()),
            gatekeeper: EnrollmentGatekeeper::new(repos),
        }
    }

    /// Facade with tunables read from configuration
    pub async fn from_config<C>(repos: EnrollmentRepositories, config: &C) -> ApiResult<Self>
    where
        C: EngineConfigReader + ?Sized,
    {
        let bulk_max_concurrent = config
            .bulk_max_concurrent()
            .await
            .map_err(|e| ApiError::Internal(format!("config: {}", e)))?;
        let report_cycles = config
            .report_cycles()
            .await
            .map_err(|e| ApiError::Internal(format!("config: {}", e)))?;

        Ok(Self {
            eligibility: EligibilityEngine::new(repos.clone()),
            graph: CorrelativitiesGraphBuilder::new(repos.clone()).with_cycle_report(report_cycles),
            gatekeeper: EnrollmentGatekeeper::new(repos).with_bulk_max_concurrent(bulk_max_concurrent),
        })
    }

    fn require_id(field: &str, blank: bool) -> ApiResult<()> {
        if blank {
            return Err(ApiError::ValidationFailure(t_with_args(
                "validation.blank_id",
                &[("field", field)],
            )));
        }
        Ok(())
    }

    // ==========================================
    // Queries
    // ==========================================

    /// Eligibility map of a career for one student
    pub async fn get_eligibility_for_student(
        &self,
        student_id: &StudentId,
        career_id: &CareerId,
    ) -> ApiResult<BTreeMap<SubjectId, SubjectEligibility>> {
        Self::require_id("student_id", student_id.is_blank())?;
        Self::require_id("career_id", career_id.is_blank())?;
        Ok(self
            .eligibility
            .get_eligibility_for_student(student_id, career_id)
            .await?)
    }

    pub async fn get_graph_for_student(
        &self,
        student_id: &StudentId,
        career_id: &CareerId,
    ) -> ApiResult<CorrelativitiesGraph> {
        Self::require_id("student_id", student_id.is_blank())?;
        Self::require_id("career_id", career_id.is_blank())?;
        Ok(self.graph.build_graph(student_id, career_id).await?)
    }

    /// Full decision, including the rejection reason
    pub async fn check_enrollment(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> ApiResult<EnrollmentDecision> {
        Self::require_id("student_id", student_id.is_blank())?;
        Self::require_id("subject_id", subject_id.is_blank())?;
        let decision = self
            .gatekeeper
            .check_enrollment(student_id, subject_id)
            .await?;
        if let EnrollmentDecision::Rejected(reason) = &decision {
            debug!(student_id = %student_id, subject_id = %subject_id, reason = reason.reason_key(), "enrollment check rejected");
        }
        Ok(decision)
    }

    pub async fn can_enroll_in_subject(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> ApiResult<bool> {
        Ok(self
            .check_enrollment(student_id, subject_id)
            .await?
            .is_allowed())
    }

    pub async fn get_missing_prerequisites(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> ApiResult<Vec<Subject>> {
        Self::require_id("student_id", student_id.is_blank())?;
        Self::require_id("subject_id", subject_id.is_blank())?;
        Ok(self
            .eligibility
            .get_missing_prerequisites(student_id, subject_id)
            .await?)
    }

    // ==========================================
    // Commands
    // ==========================================

    /// Create a record; prerequisites are not re-checked
    pub async fn enroll(
        &self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        status: EnrollmentStatus,
    ) -> ApiResult<Enrollment> {
        Self::require_id("student_id", student_id.is_blank())?;
        Self::require_id("subject_id", subject_id.is_blank())?;
        Ok(self.gatekeeper.enroll(student_id, subject_id, status).await?)
    }

    pub async fn bulk_enroll(
        &self,
        student_id: &StudentId,
        subject_ids: &[SubjectId],
    ) -> ApiResult<BulkEnrollmentResult> {
        Self::require_id("student_id", student_id.is_blank())?;
        if subject_ids.is_empty() {
            return Err(ApiError::ValidationFailure(crate::i18n::t(
                "bulk.empty_selection",
            )));
        }
        for subject_id in subject_ids {
            Self::require_id("subject_id", subject_id.is_blank())?;
        }
        Ok(self.gatekeeper.bulk_enroll(student_id, subject_ids).await)
    }

    pub async fn change_status(
        &self,
        enrollment_id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> ApiResult<Enrollment> {
        Self::require_id("enrollment_id", enrollment_id.is_blank())?;
        Ok(self.gatekeeper.change_status(enrollment_id, status).await?)
    }

    /// User-facing message for a bulk result, in the current locale
    ///
    /// First line: enrolled / failed counts. Second line, only when some
    /// subjects were refused at validation: their names.
    pub fn bulk_enroll_summary(result: &BulkEnrollmentResult) -> String {
        let mut message = t_with_args(
            "bulk.summary",
            &[
                ("success", &result.success_count.to_string()),
                ("failed", &result.failure_count.to_string()),
            ],
        );

        let refused: Vec<&str> = result.rejected().map(|item| item.display_name()).collect();
        if !refused.is_empty() {
            message.push('\n');
            message.push_str(&t_with_args(
                "bulk.not_enrolled",
                &[("subjects", &refused.join(", "))],
            ));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigResult;
    use crate::engine::test_support::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedConfig {
        bulk_max_concurrent: usize,
    }

    #[async_trait]
    impl EngineConfigReader for FixedConfig {
        async fn bulk_max_concurrent(&self) -> ConfigResult<usize> {
            Ok(self.bulk_max_concurrent)
        }

        async fn default_locale(&self) -> ConfigResult<String> {
            Ok("es".to_string())
        }

        async fn report_cycles(&self) -> ConfigResult<bool> {
            Ok(true)
        }
    }

    fn api() -> (Arc<InMemoryStore>, EnrollmentApi) {
        let store = Arc::new(InMemoryStore::new());
        store.add_subject("A", "Algebra", 1, 1, 2);
        store.add_subject("B", "Calculus", 1, 2, 2);
        store.place("C1", "A");
        store.place("C1", "B");
        store.require("B", "A");
        let api = EnrollmentApi::new(store.repositories());
        (store, api)
    }

    #[tokio::test]
    async fn test_blank_ids_rejected_before_store() {
        let (store, api) = api();
        store.fail_reads();

        let err = api
            .get_eligibility_for_student(&StudentId::new("  "), &CareerId::new("C1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailure(_)));

        let err = api
            .can_enroll_in_subject(&StudentId::new("s1"), &SubjectId::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailure(_)));
    }

    #[tokio::test]
    async fn test_empty_bulk_selection_rejected() {
        let (_store, api) = api();
        let err = api.bulk_enroll(&StudentId::new("s1"), &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailure(_)));
    }

    #[tokio::test]
    async fn test_store_failure_translated() {
        let (store, api) = api();
        store.fail_reads();

        let err = api
            .get_graph_for_student(&StudentId::new("s1"), &CareerId::new("C1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::GraphLoadFailure(_)));

        let err = api
            .can_enroll_in_subject(&StudentId::new("s1"), &SubjectId::new("A"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::StoreFailure(_)));
    }

    #[tokio::test]
    async fn test_enroll_full_subject_is_capacity_error() {
        let (store, api) = api();
        store.set_current_enrollment("A", 2);

        let err = api
            .enroll(&StudentId::new("s1"), &SubjectId::new("A"), EnrollmentStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::CapacityExceeded { capacity: 2, .. }));
    }

    #[tokio::test]
    async fn test_from_config_and_bulk_flow() {
        let store = Arc::new(InMemoryStore::new());
        store.add_subject("A", "Algebra", 1, 1, 2);
        store.add_subject("B", "Calculus", 1, 2, 2);
        store.require("B", "A");
        let api = EnrollmentApi::from_config(store.repositories(), &FixedConfig { bulk_max_concurrent: 1 })
            .await
            .unwrap();

        let result = api
            .bulk_enroll(&StudentId::new("s1"), &[SubjectId::new("A"), SubjectId::new("B")])
            .await
            .unwrap();

        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 0);
        assert_eq!(result.rejected().count(), 1);
    }

    #[test]
    fn test_bulk_summary_lists_refused_subjects() {
        use crate::domain::{BulkItemOutcome, BulkItemResult, BulkPhase, EnrollmentRejection};

        let result = BulkEnrollmentResult::from_items(vec![BulkItemResult {
            subject_id: SubjectId::new("B"),
            subject_name: Some("Calculus".to_string()),
            phase: BulkPhase::Validation,
            outcome: BulkItemOutcome::Rejected(EnrollmentRejection::SubjectNotFound),
        }]);

        let message = EnrollmentApi::bulk_enroll_summary(&result);
        assert!(message.contains('0'));
        assert!(message.contains("Calculus"));
    }
}
