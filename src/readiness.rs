//! Merge-readiness evaluation - pure functions over aggregated PR facts
//!
//! No I/O happens here. The evaluator is total: every input yields a verdict,
//! and unknown facts resolve to not-ready with a reason naming the ambiguity.

use crate::types::{CheckSummary, CiStatus, MergeReadiness, MergeableState, PrFacts};

/// Fold the check runs of a head commit into a single CI verdict.
///
/// Success only if every run completed with a passing conclusion; failure if
/// any completed run concluded otherwise; pending while runs are outstanding.
/// A PR with zero configured checks counts as success.
pub fn ci_status(checks: Option<&CheckSummary>) -> CiStatus {
    let Some(summary) = checks else {
        return CiStatus::Unknown;
    };

    if summary.failed() > 0 {
        CiStatus::Failure
    } else if summary.pending() > 0 {
        CiStatus::Pending
    } else {
        CiStatus::Success
    }
}

/// Evaluate a PR's merge readiness, accumulating every blocking reason.
///
/// `is_merge_ready` is true iff approvals exist, no comment threads are
/// unresolved, the host reports the PR mergeable, CI succeeded, and the
/// mergeable state is clean.
pub fn evaluate_readiness(pr: &PrFacts) -> MergeReadiness {
    let ci = ci_status(pr.checks.as_ref());

    let (has_approvals, unresolved) = match &pr.reviews {
        Some(reviews) => (reviews.has_approvals(), reviews.unresolved_threads()),
        // Review data missing: no approval can be assumed
        None => (false, 0),
    };
    let has_unresolved_comments = unresolved > 0;

    let mergeable = pr.mergeable.unwrap_or(false);

    let mut blocking_reasons = Vec::new();

    if pr.reviews.is_none() {
        blocking_reasons.push("review data unavailable".to_string());
    } else if !has_approvals {
        blocking_reasons.push("not approved".to_string());
    }

    if has_unresolved_comments {
        blocking_reasons.push(format!("{unresolved} unresolved comment thread(s)"));
    }

    match pr.mergeable {
        Some(true) => {}
        Some(false) => blocking_reasons.push("not mergeable (conflicts)".to_string()),
        None => blocking_reasons.push("mergeable flag unknown (still computing)".to_string()),
    }

    match ci {
        CiStatus::Success => {}
        CiStatus::Failure => {
            let names = pr
                .checks
                .as_ref()
                .map(CheckSummary::failed_names)
                .unwrap_or_default();
            blocking_reasons.push(format!("CI failing: {}", names.join(", ")));
        }
        CiStatus::Pending => blocking_reasons.push("CI still running".to_string()),
        CiStatus::Unknown => blocking_reasons.push("CI status unknown".to_string()),
    }

    if pr.mergeable_state != MergeableState::Clean {
        blocking_reasons.push(format!("mergeable state is {}", pr.mergeable_state));
    }

    let is_merge_ready = has_approvals
        && !has_unresolved_comments
        && mergeable
        && ci == CiStatus::Success
        && pr.mergeable_state == MergeableState::Clean;

    MergeReadiness {
        ci_status: ci,
        mergeable,
        mergeable_state: pr.mergeable_state,
        has_approvals,
        has_unresolved_comments,
        blocking_reasons,
        is_merge_ready,
    }
}
