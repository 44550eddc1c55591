use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::diff::parse_unified_diff;
use super::fetch::DiffSource;
use super::merge::merge_by_path;
use super::normalize::{extract_file_items, normalize_files};
use super::types::{FileChange, PrTarget};
use super::ChangeError;
use crate::tools::{args, run_tool_variants, to_plain, ArgMap, CapabilityRegistry};

/// Capability name candidates per operation, in priority order. Only a
/// subset is typically enabled in any given environment.
const FILES_CAPABILITIES: &[&str] = &[
    "GITHUB_LIST_PULL_REQUEST_FILES",
    "GITHUB_LIST_FILES_FOR_A_PULL_REQUEST",
    "GITHUB_LIST_FILES_ON_A_PULL_REQUEST",
];
const COMPARE_CAPABILITIES: &[&str] = &["GITHUB_COMPARE_TWO_COMMITS", "GITHUB_COMPARE_COMMITS"];
const COMMITS_CAPABILITIES: &[&str] = &[
    "GITHUB_LIST_COMMITS_ON_A_PULL_REQUEST",
    "GITHUB_LIST_PULL_REQUEST_COMMITS",
];
const COMMIT_CAPABILITIES: &[&str] = &["GITHUB_GET_A_COMMIT", "GITHUB_GET_A_COMMIT_OBJECT"];
const UPDATE_CAPABILITIES: &[&str] = &[
    "GITHUB_UPDATE_A_PULL_REQUEST",
    "GITHUB_EDIT_A_PULL_REQUEST",
    "GITHUB_UPDATE_PULL_REQUEST",
];

/// Best-effort reconciliation of a pull request's changed files.
///
/// Four strategies are tried strictly in priority order, stopping at the
/// first non-empty result: the PR-files listing, a base...head commit
/// compare, per-commit file aggregation, and finally the raw `.diff`
/// download. Strategy failures before the last one are logged and fall
/// through; an empty final result is a valid outcome, not an error.
pub struct ChangeDiscovery {
    registry: CapabilityRegistry,
    diff_source: Arc<dyn DiffSource>,
}

impl ChangeDiscovery {
    pub fn new(registry: CapabilityRegistry, diff_source: Arc<dyn DiffSource>) -> ChangeDiscovery {
        ChangeDiscovery {
            registry,
            diff_source,
        }
    }

    #[instrument(skip(self), fields(owner = %target.owner, repo = %target.repo, pr = target.number))]
    pub async fn discover(&self, target: &PrTarget) -> Result<Vec<FileChange>, ChangeError> {
        match self.from_pr_files(target).await {
            Ok(files) if !files.is_empty() => {
                info!(files = files.len(), "resolved changes via pull-request files listing");
                return Ok(files);
            }
            Ok(_) => debug!("pull-request files listing yielded nothing"),
            Err(err) => warn!(error = %err, "pull-request files listing failed, falling through"),
        }

        match self.from_commit_compare(target).await {
            Ok(files) if !files.is_empty() => {
                info!(files = files.len(), "resolved changes via commit-range compare");
                return Ok(files);
            }
            Ok(_) => debug!("commit-range compare yielded nothing"),
            Err(err) => warn!(error = %err, "commit-range compare failed, falling through"),
        }

        match self.from_per_commit_files(target).await {
            Ok(files) if !files.is_empty() => {
                info!(files = files.len(), "resolved changes via per-commit aggregation");
                return Ok(files);
            }
            Ok(_) => debug!("per-commit aggregation yielded nothing"),
            Err(err) => warn!(error = %err, "per-commit aggregation failed, falling through"),
        }

        // Last resort; its errors are the pipeline's errors.
        debug!("falling back to raw diff download");
        let body = self.diff_source.fetch_diff(target).await?;
        let files = merge_by_path(parse_unified_diff(&body));
        info!(files = files.len(), "resolved changes via raw diff download");
        Ok(files)
    }

    /// Strategy 1: the dedicated PR-files listing endpoint.
    async fn from_pr_files(&self, target: &PrTarget) -> Result<Vec<FileChange>, ChangeError> {
        let Some(capability) = self.registry.find(FILES_CAPABILITIES) else {
            debug!("no pull-request files capability available");
            return Ok(Vec::new());
        };
        let response = run_tool_variants(capability, &pull_number_variants(target)).await?;
        Ok(reconcile(&response))
    }

    /// Strategy 2: compare base...head, when the caller knows both SHAs.
    async fn from_commit_compare(&self, target: &PrTarget) -> Result<Vec<FileChange>, ChangeError> {
        let Some((base, head)) = target.commit_range() else {
            debug!("commit range unknown, skipping compare strategy");
            return Ok(Vec::new());
        };
        let Some(capability) = self.registry.find(COMPARE_CAPABILITIES) else {
            debug!("no commit compare capability available");
            return Ok(Vec::new());
        };

        let basehead = format!("{base}...{head}");
        let repo_args = [
            ("owner", json!(target.owner.as_str())),
            ("repo", json!(target.repo.as_str())),
        ];
        let variants = [
            args(&[repo_args[0].clone(), repo_args[1].clone(), ("base", json!(base)), ("head", json!(head))]),
            args(&[repo_args[0].clone(), repo_args[1].clone(), ("basehead", json!(basehead.as_str()))]),
            args(&[repo_args[0].clone(), repo_args[1].clone(), ("base_head", json!(basehead.as_str()))]),
            args(&[repo_args[0].clone(), repo_args[1].clone(), ("base_ref", json!(base)), ("head_ref", json!(head))]),
        ];
        let response = run_tool_variants(capability, &variants).await?;
        Ok(reconcile(&response))
    }

    /// Strategy 3: list the PR's commits and aggregate each commit's file
    /// list. A single commit failing to fetch skips that commit only.
    async fn from_per_commit_files(&self, target: &PrTarget) -> Result<Vec<FileChange>, ChangeError> {
        let (Some(commits_capability), Some(commit_capability)) = (
            self.registry.find(COMMITS_CAPABILITIES),
            self.registry.find(COMMIT_CAPABILITIES),
        ) else {
            debug!("per-commit capabilities incomplete, skipping strategy");
            return Ok(Vec::new());
        };

        let commits = run_tool_variants(commits_capability, &pull_number_variants(target)).await?;
        let commit_items: &[Value] = match &commits {
            Value::Array(items) => items.as_slice(),
            other => extract_file_items(other),
        };
        let shas: Vec<&str> = commit_items
            .iter()
            .filter_map(|item| item.get("sha"))
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|sha| !sha.is_empty())
            .collect();
        debug!(commits = shas.len(), "aggregating files across commits");

        let mut all_files = Vec::new();
        for sha in shas {
            let variants = [
                args(&[
                    ("owner", json!(target.owner.as_str())),
                    ("repo", json!(target.repo.as_str())),
                    ("ref", json!(sha)),
                ]),
                args(&[
                    ("owner", json!(target.owner.as_str())),
                    ("repo", json!(target.repo.as_str())),
                    ("sha", json!(sha)),
                ]),
                args(&[
                    ("owner", json!(target.owner.as_str())),
                    ("repo", json!(target.repo.as_str())),
                    ("commit_sha", json!(sha)),
                ]),
            ];
            match run_tool_variants(commit_capability, &variants).await {
                Ok(response) => all_files.extend(normalize_files(extract_file_items(&response))),
                Err(err) => warn!(%sha, error = %err, "commit fetch failed, skipping commit"),
            }
        }
        Ok(merge_by_path(all_files))
    }
}

/// Update a pull request's body (and optionally title) through whichever
/// update/edit capability is enabled. Unlike a discovery strategy, a
/// missing capability here is a hard configuration error, distinct from
/// any successful-but-empty outcome.
pub async fn update_pr_body(
    registry: &CapabilityRegistry,
    target: &PrTarget,
    body: &str,
    title: Option<&str>,
) -> Result<(), ChangeError> {
    let Some(capability) = registry.find(UPDATE_CAPABILITIES) else {
        return Err(ChangeError::CapabilityUnavailable(
            "pull request update".to_string(),
        ));
    };

    let mut variants = pull_number_variants(target);
    for variant in &mut variants {
        variant.insert("body".to_string(), json!(body));
        if let Some(title) = title {
            variant.insert("title".to_string(), json!(title));
        }
    }
    run_tool_variants(capability, &variants).await?;

    // Some backends silently drop the title on a combined update; follow up
    // with a title-only call, best-effort since the body already landed.
    if let Some(title) = title {
        let mut title_variants = pull_number_variants(target);
        for variant in &mut title_variants {
            variant.insert("title".to_string(), json!(title));
        }
        if let Err(err) = run_tool_variants(capability, &title_variants).await {
            warn!(error = %err, "dedicated title update failed");
        }
    }
    Ok(())
}

/// Normalize an upstream response envelope into the canonical merged list.
/// Generic over the response wrapper so typed SDK responses and raw JSON
/// go through the same canonicalization step.
fn reconcile<T: serde::Serialize>(response: &T) -> Vec<FileChange> {
    let plain = to_plain(response);
    merge_by_path(normalize_files(extract_file_items(&plain)))
}

fn pull_number_variants(target: &PrTarget) -> [ArgMap; 2] {
    [
        args(&[
            ("owner", json!(target.owner.as_str())),
            ("repo", json!(target.repo.as_str())),
            ("pull_number", json!(target.number)),
        ]),
        args(&[
            ("owner", json!(target.owner.as_str())),
            ("repo", json!(target.repo.as_str())),
            ("number", json!(target.number)),
        ]),
    ]
}
