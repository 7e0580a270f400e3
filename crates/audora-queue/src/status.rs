//! Job status translation.
//!
//! Maps broker-reported Celery task states onto the progress model clients
//! see. The broker never reports percentages, so the percentage is a fixed
//! point per state.

use chrono::{Duration, Utc};

use audora_core::models::{JobStage, ProcessingProgress};
use audora_core::AppError;

/// Task states the worker fleet reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Started,
    Success,
    Failure,
    Retry,
}

impl TaskState {
    /// Parse a broker status string. Unknown strings are an error, never
    /// silently folded into another state.
    pub fn parse(status: &str) -> Result<Self, AppError> {
        match status {
            "PENDING" => Ok(TaskState::Pending),
            "STARTED" => Ok(TaskState::Started),
            "SUCCESS" => Ok(TaskState::Success),
            "FAILURE" => Ok(TaskState::Failure),
            "RETRY" => Ok(TaskState::Retry),
            other => Err(AppError::UnknownStatus(other.to_string())),
        }
    }

    /// Whether the broker can still move this state forward.
    pub fn is_settled(self) -> bool {
        !matches!(self, TaskState::Pending | TaskState::Started)
    }
}

/// Translate a broker status into client-facing progress.
///
/// An unrecognized status translates to a failed stage and also surfaces
/// the error to the caller for logging.
pub fn translate(status: &str, traceback: Option<&str>) -> (ProcessingProgress, Option<AppError>) {
    match TaskState::parse(status) {
        Ok(TaskState::Pending) => (
            ProcessingProgress {
                stage: JobStage::Queued,
                percentage: 0.0,
                current_step: "Waiting in processing queue".to_string(),
                eta: None,
            },
            None,
        ),
        Ok(TaskState::Started) => (
            ProcessingProgress {
                stage: JobStage::Processing,
                percentage: 25.0,
                current_step: "Analyzing and processing audio".to_string(),
                eta: Some(Utc::now() + Duration::minutes(8)),
            },
            None,
        ),
        Ok(TaskState::Success) => (
            ProcessingProgress {
                stage: JobStage::Completed,
                percentage: 100.0,
                current_step: "Processing complete".to_string(),
                eta: None,
            },
            None,
        ),
        Ok(TaskState::Failure) => (
            ProcessingProgress {
                stage: JobStage::Failed,
                percentage: 0.0,
                current_step: traceback
                    .map(|t| format!("Processing failed: {}", t))
                    .unwrap_or_else(|| "Processing failed".to_string()),
                eta: None,
            },
            None,
        ),
        Ok(TaskState::Retry) => (
            ProcessingProgress {
                stage: JobStage::Retrying,
                percentage: 10.0,
                current_step: "Retrying after transient failure".to_string(),
                eta: None,
            },
            None,
        ),
        Err(err) => (
            ProcessingProgress {
                stage: JobStage::Failed,
                percentage: 0.0,
                current_step: format!("Unknown task status: {}", status),
                eta: None,
            },
            Some(err),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_states() {
        assert_eq!(TaskState::parse("PENDING").unwrap(), TaskState::Pending);
        assert_eq!(TaskState::parse("SUCCESS").unwrap(), TaskState::Success);
        assert!(matches!(
            TaskState::parse("REVOKED"),
            Err(AppError::UnknownStatus(_))
        ));
    }

    #[test]
    fn settled_states() {
        assert!(!TaskState::Pending.is_settled());
        assert!(!TaskState::Started.is_settled());
        assert!(TaskState::Success.is_settled());
        assert!(TaskState::Failure.is_settled());
        assert!(TaskState::Retry.is_settled());
    }

    #[test]
    fn pending_maps_to_queued_at_zero() {
        let (progress, err) = translate("PENDING", None);
        assert_eq!(progress.stage, JobStage::Queued);
        assert_eq!(progress.percentage, 0.0);
        assert!(progress.eta.is_none());
        assert!(err.is_none());
    }

    #[test]
    fn started_maps_to_processing_with_eta() {
        let (progress, err) = translate("STARTED", None);
        assert_eq!(progress.stage, JobStage::Processing);
        assert_eq!(progress.percentage, 25.0);
        assert!(progress.eta.is_some());
        assert!(err.is_none());
    }

    #[test]
    fn failure_carries_traceback() {
        let (progress, _) = translate("FAILURE", Some("boom"));
        assert_eq!(progress.stage, JobStage::Failed);
        assert!(progress.current_step.contains("boom"));
    }

    #[test]
    fn retry_maps_to_retrying() {
        let (progress, _) = translate("RETRY", None);
        assert_eq!(progress.stage, JobStage::Retrying);
        assert_eq!(progress.percentage, 10.0);
    }

    #[test]
    fn unknown_status_fails_loudly() {
        let (progress, err) = translate("IGNORED", None);
        assert_eq!(progress.stage, JobStage::Failed);
        assert!(matches!(err, Some(AppError::UnknownStatus(ref s)) if s == "IGNORED"));
    }
}
