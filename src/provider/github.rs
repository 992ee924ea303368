//! GitHub host provider
//!
//! octocrab for the REST surface it models well, raw reqwest for the
//! check-runs endpoint, and GraphQL for review threads, project-board fields,
//! and sub-issues, which the REST API does not expose.

use async_trait::async_trait;
use chrono::Utc;
use octocrab::Octocrab;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::HostProvider;
use crate::types::{
    BoardStatus, CheckConclusion, CheckRun, CheckState, CheckSummary, MergeableState, PrFacts,
    ProjectItem, ReviewRecord, ReviewSummary, ReviewVerdict,
};

/// GitHub host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

// GraphQL response plumbing

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

fn unwrap_graphql<T>(response: GraphQlResponse<T>) -> Result<T> {
    if let Some(errors) = response.errors {
        if !errors.is_empty() {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::GitHubApi(format!(
                "GraphQL error: {}",
                messages.join(", ")
            )));
        }
    }
    response
        .data
        .ok_or_else(|| Error::GitHubApi("no data in GraphQL response".to_string()))
}

/// GitHub host provider using octocrab
pub struct GitHubHost {
    client: Octocrab,
    config: HostConfig,
    /// Token for raw HTTP requests (check runs)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API host for raw requests
    api_host: String,
}

impl GitHubHost {
    /// Create a new GitHub host provider
    pub fn new(token: &str, config: HostConfig) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        let api_host = if let Some(ref h) = config.host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
            format!("{h}/api/v3")
        } else {
            "api.github.com".to_string()
        };

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("nudge")
            .build()
            .map_err(|e| Error::GitHubApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            token: token.to_string(),
            http_client,
            api_host,
        })
    }

    async fn rest_get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!(
            "https://{}/repos/{}/{}/{path}",
            self.api_host, self.config.owner, self.config.repo
        );

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("request to {path} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "{path} returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("failed to parse {path} response: {e}")))
    }
}

// Raw REST shapes - only the fields the core consumes

#[derive(Deserialize)]
struct RestPr {
    number: u64,
    title: Option<String>,
    user: Option<RestUser>,
    head: RestRef,
    base: RestRef,
    draft: Option<bool>,
    updated_at: Option<chrono::DateTime<Utc>>,
    mergeable: Option<bool>,
    mergeable_state: Option<String>,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct RestUser {
    login: String,
}

#[derive(Deserialize)]
struct RestRef {
    #[serde(rename = "ref")]
    ref_field: String,
}

fn mergeable_state_from_str(s: &str) -> MergeableState {
    match s {
        "clean" => MergeableState::Clean,
        "behind" => MergeableState::Behind,
        "dirty" => MergeableState::Dirty,
        "blocked" => MergeableState::Blocked,
        // GitHub never reports "conflicting" directly; "dirty" means
        // conflicts, but accept both spellings
        "conflicting" => MergeableState::Conflicting,
        _ => MergeableState::Unknown,
    }
}

impl RestPr {
    fn into_facts(self) -> PrFacts {
        PrFacts {
            number: self.number,
            title: self.title.unwrap_or_default(),
            author: self.user.map(|u| u.login).unwrap_or_default(),
            head_ref: self.head.ref_field,
            base_ref: self.base.ref_field,
            is_draft: self.draft.unwrap_or(false),
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
            mergeable: self.mergeable,
            mergeable_state: self
                .mergeable_state
                .as_deref()
                .map_or(MergeableState::Unknown, mergeable_state_from_str),
            checks: None,
            reviews: None,
            html_url: self.html_url.unwrap_or_default(),
        }
    }
}

// GraphQL shapes

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewThreadsData {
    repository: ReviewThreadsRepo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewThreadsRepo {
    pull_request: ReviewThreadsPr,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewThreadsPr {
    review_threads: ThreadNodes,
}

#[derive(Deserialize)]
struct ThreadNodes {
    nodes: Vec<ThreadNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadNode {
    is_resolved: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardItemsData {
    repository: BoardItemsRepo,
}

#[derive(Deserialize)]
struct BoardItemsRepo {
    issues: IssueNodes,
}

#[derive(Deserialize)]
struct IssueNodes {
    nodes: Vec<GqlIssue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    labels: Option<NamedNodes>,
    assignees: Option<LoginNodes>,
    project_items: Option<ProjectItemNodes>,
}

#[derive(Deserialize)]
struct NamedNodes {
    nodes: Vec<Named>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct LoginNodes {
    nodes: Vec<RestUser>,
}

#[derive(Deserialize)]
struct ProjectItemNodes {
    nodes: Vec<GqlProjectItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlProjectItem {
    field_value_by_name: Option<GqlFieldValue>,
}

#[derive(Deserialize)]
struct GqlFieldValue {
    name: Option<String>,
}

impl GqlIssue {
    fn into_item(self, sub_issues: Vec<ProjectItem>) -> ProjectItem {
        let board_status = self
            .project_items
            .and_then(|p| p.nodes.into_iter().next())
            .and_then(|i| i.field_value_by_name)
            .and_then(|f| f.name)
            .map(|name| BoardStatus::parse(&name));

        ProjectItem {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            is_open: self.state.eq_ignore_ascii_case("open"),
            labels: self
                .labels
                .map(|l| l.nodes.into_iter().map(|n| n.name).collect())
                .unwrap_or_default(),
            assignees: self
                .assignees
                .map(|a| a.nodes.into_iter().map(|u| u.login).collect())
                .unwrap_or_default(),
            board_status,
            sub_issues,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubIssuesData {
    repository: SubIssuesRepo,
}

#[derive(Deserialize)]
struct SubIssuesRepo {
    issue: SubIssuesIssue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubIssuesIssue {
    sub_issues: IssueNodes,
}

const ISSUE_FIELDS: &str = r#"
    number
    title
    body
    state
    labels(first: 20) { nodes { name } }
    assignees(first: 10) { nodes { login } }
    projectItems(first: 5) {
        nodes {
            fieldValueByName(name: "Status") {
                ... on ProjectV2ItemFieldSingleSelectValue { name }
            }
        }
    }
"#;

#[async_trait]
impl HostProvider for GitHubHost {
    async fn current_actor(&self) -> Result<String> {
        let user = self.client.current().user().await?;
        debug!(login = %user.login, "resolved current actor");
        Ok(user.login)
    }

    async fn list_open_prs(&self) -> Result<Vec<PrFacts>> {
        debug!("listing open PRs");
        let page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100)
            .send()
            .await?;

        // The list endpoint omits mergeable/mergeable_state; fetch each PR
        // individually so those facts are present
        let mut prs = Vec::with_capacity(page.items.len());
        for stub in &page.items {
            let pr: RestPr = self.rest_get(&format!("pulls/{}", stub.number)).await?;
            prs.push(pr.into_facts());
        }

        debug!(count = prs.len(), "listed open PRs");
        Ok(prs)
    }

    async fn get_check_runs(&self, head_ref: &str) -> Result<CheckSummary> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            check_runs: Vec<RestCheckRun>,
        }

        #[derive(Deserialize)]
        struct RestCheckRun {
            name: String,
            status: String,
            conclusion: Option<String>,
        }

        debug!(head_ref, "fetching check runs");
        let response: CheckRunsResponse = self
            .rest_get(&format!("commits/{head_ref}/check-runs"))
            .await?;

        let runs = response
            .check_runs
            .into_iter()
            .map(|r| {
                let state = match r.status.as_str() {
                    "completed" => CheckState::Completed,
                    "in_progress" => CheckState::InProgress,
                    _ => CheckState::Queued,
                };
                let conclusion = r.conclusion.as_deref().map(|c| match c {
                    "success" => CheckConclusion::Success,
                    "neutral" => CheckConclusion::Neutral,
                    "skipped" => CheckConclusion::Skipped,
                    "cancelled" => CheckConclusion::Cancelled,
                    "timed_out" => CheckConclusion::TimedOut,
                    "action_required" => CheckConclusion::ActionRequired,
                    "stale" => CheckConclusion::Stale,
                    _ => CheckConclusion::Failure,
                });
                CheckRun {
                    name: r.name,
                    state,
                    conclusion,
                }
            })
            .collect();

        Ok(CheckSummary { runs })
    }

    async fn get_review_summary(&self, pr_number: u64) -> Result<ReviewSummary> {
        debug!(pr_number, "fetching reviews");
        let reviews = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list_reviews(pr_number)
            .send()
            .await?;

        // Latest review per reviewer: reviews arrive oldest-first, so a later
        // record simply replaces the earlier one
        let mut latest: Vec<ReviewRecord> = Vec::new();
        for review in reviews.items {
            let Some(login) = review.user.as_ref().map(|u| u.login.clone()) else {
                continue;
            };
            let verdict = match review.state {
                Some(octocrab::models::pulls::ReviewState::Approved) => ReviewVerdict::Approved,
                Some(octocrab::models::pulls::ReviewState::ChangesRequested) => {
                    ReviewVerdict::ChangesRequested
                }
                Some(octocrab::models::pulls::ReviewState::Commented) => ReviewVerdict::Commented,
                // Pending/dismissed reviews carry no verdict
                _ => continue,
            };
            let submitted_at = review.submitted_at.unwrap_or_else(Utc::now);
            let record = ReviewRecord {
                reviewer: login.clone(),
                verdict,
                submitted_at,
            };
            if let Some(existing) = latest.iter_mut().find(|r| r.reviewer == login) {
                *existing = record;
            } else {
                latest.push(record);
            }
        }

        // Thread resolution is GraphQL-only
        let response: GraphQlResponse<ReviewThreadsData> = self
            .client
            .graphql(&serde_json::json!({
                "query": r"
                    query ReviewThreads($owner: String!, $repo: String!, $number: Int!) {
                        repository(owner: $owner, name: $repo) {
                            pullRequest(number: $number) {
                                reviewThreads(first: 100) {
                                    nodes { isResolved }
                                }
                            }
                        }
                    }
                ",
                "variables": {
                    "owner": self.config.owner,
                    "repo": self.config.repo,
                    "number": pr_number,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("review threads query failed: {e}")))?;

        let threads = unwrap_graphql(response)?
            .repository
            .pull_request
            .review_threads
            .nodes;
        let threads_total = threads.len();
        let threads_resolved = threads.iter().filter(|t| t.is_resolved).count();

        debug!(
            pr_number,
            reviewers = latest.len(),
            threads_total,
            threads_resolved,
            "fetched review summary"
        );
        Ok(ReviewSummary {
            latest,
            threads_total,
            threads_resolved,
        })
    }

    async fn list_board_items(&self) -> Result<Vec<ProjectItem>> {
        debug!("listing board items");
        let query = format!(
            r"query BoardItems($owner: String!, $repo: String!) {{
                repository(owner: $owner, name: $repo) {{
                    issues(states: [OPEN], first: 100) {{
                        nodes {{ {ISSUE_FIELDS} }}
                    }}
                }}
            }}"
        );
        let response: GraphQlResponse<BoardItemsData> = self
            .client
            .graphql(&serde_json::json!({
                "query": query,
                "variables": {
                    "owner": self.config.owner,
                    "repo": self.config.repo,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("board items query failed: {e}")))?;

        let items: Vec<ProjectItem> = unwrap_graphql(response)?
            .repository
            .issues
            .nodes
            .into_iter()
            .map(|i| i.into_item(Vec::new()))
            .collect();

        debug!(count = items.len(), "listed board items");
        Ok(items)
    }

    async fn get_issue(&self, number: u64) -> Result<ProjectItem> {
        debug!(number, "fetching issue");
        let issue = self
            .client
            .issues(&self.config.owner, &self.config.repo)
            .get(number)
            .await?;

        Ok(ProjectItem {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            is_open: matches!(issue.state, octocrab::models::IssueState::Open),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            assignees: issue.assignees.into_iter().map(|a| a.login).collect(),
            board_status: None,
            sub_issues: Vec::new(),
        })
    }

    async fn list_sub_issues(&self, epic_number: u64) -> Result<Vec<ProjectItem>> {
        debug!(epic_number, "listing sub-issues");
        let query = format!(
            r"query SubIssues($owner: String!, $repo: String!, $number: Int!) {{
                repository(owner: $owner, name: $repo) {{
                    issue(number: $number) {{
                        subIssues(first: 50) {{
                            nodes {{ {ISSUE_FIELDS} }}
                        }}
                    }}
                }}
            }}"
        );
        let response: GraphQlResponse<SubIssuesData> = self
            .client
            .graphql(&serde_json::json!({
                "query": query,
                "variables": {
                    "owner": self.config.owner,
                    "repo": self.config.repo,
                    "number": epic_number,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("sub-issues query failed: {e}")))?;

        let subs: Vec<ProjectItem> = unwrap_graphql(response)?
            .repository
            .issue
            .sub_issues
            .nodes
            .into_iter()
            .map(|i| i.into_item(Vec::new()))
            .collect();

        debug!(epic_number, count = subs.len(), "listed sub-issues");
        Ok(subs)
    }

    async fn assign_issue(&self, number: u64, login: &str) -> Result<()> {
        debug!(number, login, "assigning issue");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_assignees(number, &[login])
            .await?;
        Ok(())
    }

    async fn set_board_status(&self, number: u64, status: BoardStatus) -> Result<()> {
        // Projects v2 status updates need the project item id, the Status
        // field id, and the matching option id - one query, one mutation
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LookupData {
            repository: LookupRepo,
        }
        #[derive(Deserialize)]
        struct LookupRepo {
            issue: LookupIssue,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LookupIssue {
            project_items: LookupItemNodes,
        }
        #[derive(Deserialize)]
        struct LookupItemNodes {
            nodes: Vec<LookupItem>,
        }
        #[derive(Deserialize)]
        struct LookupItem {
            id: String,
            project: LookupProject,
        }
        #[derive(Deserialize)]
        struct LookupProject {
            id: String,
            field: Option<LookupField>,
        }
        #[derive(Deserialize)]
        struct LookupField {
            id: String,
            options: Vec<LookupOption>,
        }
        #[derive(Deserialize)]
        struct LookupOption {
            id: String,
            name: String,
        }

        debug!(number, ?status, "setting board status");
        let response: GraphQlResponse<LookupData> = self
            .client
            .graphql(&serde_json::json!({
                "query": r#"
                    query StatusField($owner: String!, $repo: String!, $number: Int!) {
                        repository(owner: $owner, name: $repo) {
                            issue(number: $number) {
                                projectItems(first: 1) {
                                    nodes {
                                        id
                                        project {
                                            id
                                            field(name: "Status") {
                                                ... on ProjectV2SingleSelectField {
                                                    id
                                                    options { id name }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                "#,
                "variables": {
                    "owner": self.config.owner,
                    "repo": self.config.repo,
                    "number": number,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("status field query failed: {e}")))?;

        let item = unwrap_graphql(response)?
            .repository
            .issue
            .project_items
            .nodes
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::GitHubApi(format!("issue #{number} is not on a project board"))
            })?;

        let field = item.project.field.ok_or_else(|| {
            Error::GitHubApi("project has no single-select Status field".to_string())
        })?;

        let option = field
            .options
            .iter()
            .find(|o| BoardStatus::parse(&o.name) == status)
            .ok_or_else(|| {
                Error::GitHubApi(format!("no Status option matches {status:?}"))
            })?;

        let response: GraphQlResponse<serde_json::Value> = self
            .client
            .graphql(&serde_json::json!({
                "query": r"
                    mutation SetStatus($project: ID!, $item: ID!, $field: ID!, $option: String!) {
                        updateProjectV2ItemFieldValue(input: {
                            projectId: $project,
                            itemId: $item,
                            fieldId: $field,
                            value: { singleSelectOptionId: $option }
                        }) {
                            projectV2Item { id }
                        }
                    }
                ",
                "variables": {
                    "project": item.project.id,
                    "item": item.id,
                    "field": field.id,
                    "option": option.id,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("status mutation failed: {e}")))?;
        unwrap_graphql(response)?;

        debug!(number, "board status updated");
        Ok(())
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<u64> {
        debug!(head, base, "creating PR");
        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let mut builder = pulls.create(title, head, base);
        if let Some(body_text) = body {
            builder = builder.body(body_text);
        }
        let pr = builder.send().await?;
        debug!(pr_number = pr.number, "created PR");
        Ok(pr.number)
    }
}
