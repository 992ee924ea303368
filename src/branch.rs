//! Branch-name parsing and generation
//!
//! Work branches embed the issue number so a branch can be traced back to its
//! issue without any stored mapping. The extraction grammar is
//! `.*-<digits>(end|non-digit)`; the first `-<digits>` group wins, matching
//! the `issue-<n>-<slug>` shape produced by [`branch_for_issue`].

use regex::Regex;
use std::sync::OnceLock;

fn issue_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Dash-separated digit group terminated by end-of-name or a non-digit
    RE.get_or_init(|| Regex::new(r"-(\d+)(?:[^\d].*)?$").expect("valid regex"))
}

/// Extract the issue number from a branch name, if the branch follows the
/// work-branch grammar. Returns None rather than guessing.
pub fn issue_number_from_branch(branch: &str) -> Option<u64> {
    issue_number_re()
        .captures(branch)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Generate the work branch name for an issue: `issue-<n>-<slug>`.
///
/// The slug keeps lowercase alphanumerics, collapses everything else into
/// single dashes, and is capped so branch names stay shell-friendly.
pub fn branch_for_issue(number: u64, title: &str) -> String {
    const MAX_SLUG_LEN: usize = 40;

    let mut slug = String::new();
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        format!("issue-{number}")
    } else {
        format!("issue-{number}-{slug}")
    }
}
