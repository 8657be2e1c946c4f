//! Status aggregation over step instances.
//!
//! The single place that derives an instance's overall status from its steps.
//! Rejected wins over pending, pending wins over approved.

use std::collections::BTreeMap;

use docflow_shared::types::ApprovalInstanceId;
use serde::{Deserialize, Serialize};

use crate::workflow::instance::{ApprovalInstance, ApprovalStepInstance};
use crate::workflow::types::{ApprovalStatus, StepStatus};

/// Progress of one approval instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSummary {
    /// The summarized instance.
    pub approval_instance_id: ApprovalInstanceId,
    /// Steps already approved.
    pub approved_count: usize,
    /// Steps in the instance.
    pub total_steps: usize,
    /// Derived overall status.
    pub overall_status: ApprovalStatus,
}

impl ApprovalSummary {
    /// Returns true once no further decision can change the status.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.overall_status.is_terminal()
    }
}

/// Stateless aggregator for approval progress.
pub struct StatusAggregator;

impl StatusAggregator {
    /// Derives the overall status from a set of step statuses.
    ///
    /// `REJECTED` if any step is rejected, else `PENDING` if any step is
    /// pending, else `APPROVED`.
    pub fn overall_status<I>(statuses: I) -> ApprovalStatus
    where
        I: IntoIterator<Item = StepStatus>,
    {
        let mut any_pending = false;
        for status in statuses {
            match status {
                StepStatus::Rejected => return ApprovalStatus::Rejected,
                StepStatus::Pending => any_pending = true,
                StepStatus::Approved => {}
            }
        }
        if any_pending {
            ApprovalStatus::Pending
        } else {
            ApprovalStatus::Approved
        }
    }

    /// Summarizes one instance from its steps.
    #[must_use]
    pub fn aggregate(instance: &ApprovalInstance) -> ApprovalSummary {
        ApprovalSummary {
            approval_instance_id: instance.id,
            approved_count: instance
                .steps
                .iter()
                .filter(|s| s.status == StepStatus::Approved)
                .count(),
            total_steps: instance.steps.len(),
            overall_status: Self::overall_status(instance.steps.iter().map(|s| s.status)),
        }
    }

    /// Groups loose step instances by instance id and summarizes each group.
    ///
    /// Output is ordered by instance id, which is time-ordered.
    #[must_use]
    pub fn group(steps: &[ApprovalStepInstance]) -> Vec<ApprovalSummary> {
        let mut groups: BTreeMap<ApprovalInstanceId, Vec<StepStatus>> = BTreeMap::new();
        for step in steps {
            groups
                .entry(step.approval_instance_id)
                .or_default()
                .push(step.status);
        }

        groups
            .into_iter()
            .map(|(approval_instance_id, statuses)| ApprovalSummary {
                approval_instance_id,
                approved_count: statuses
                    .iter()
                    .filter(|&&s| s == StepStatus::Approved)
                    .count(),
                total_steps: statuses.len(),
                overall_status: Self::overall_status(statuses),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(instance: ApprovalInstanceId, sequence: u32, status: StepStatus) -> ApprovalStepInstance {
        ApprovalStepInstance {
            approval_instance_id: instance,
            sequence,
            name: format!("Step {sequence}"),
            description: None,
            approver_role: None,
            status,
            activated_at: None,
            decided_by: None,
            comment: None,
            decided_at: None,
        }
    }

    #[test]
    fn test_overall_status_rules() {
        use StepStatus::{Approved, Pending, Rejected};
        assert_eq!(
            StatusAggregator::overall_status([Approved, Approved]),
            ApprovalStatus::Approved
        );
        assert_eq!(
            StatusAggregator::overall_status([Approved, Pending]),
            ApprovalStatus::Pending
        );
        assert_eq!(
            StatusAggregator::overall_status([Approved, Rejected, Pending]),
            ApprovalStatus::Rejected
        );
    }

    #[test]
    fn test_group_by_instance() {
        let first = ApprovalInstanceId::new();
        let second = ApprovalInstanceId::new();
        let steps = vec![
            step(first, 1, StepStatus::Approved),
            step(second, 1, StepStatus::Approved),
            step(first, 2, StepStatus::Pending),
            step(second, 2, StepStatus::Rejected),
            step(second, 3, StepStatus::Pending),
        ];

        let summaries = StatusAggregator::group(&steps);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].approval_instance_id, first);
        assert_eq!(summaries[0].approved_count, 1);
        assert_eq!(summaries[0].total_steps, 2);
        assert_eq!(summaries[0].overall_status, ApprovalStatus::Pending);

        assert_eq!(summaries[1].approval_instance_id, second);
        assert_eq!(summaries[1].overall_status, ApprovalStatus::Rejected);
        assert!(summaries[1].is_complete());
    }

    #[test]
    fn test_group_empty() {
        assert!(StatusAggregator::group(&[]).is_empty());
    }
}
