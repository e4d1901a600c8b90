//! Resolve a repository and its current head commit.

use crate::analysis::types::RepositoryRef;
use crate::github::error::GitHubError;
use crate::github::util::{ApiContext, spawn_task};
use crate::github::wire::{WireBranch, WireRepository};
use crate::runtime::AsyncTask;
use log::{debug, warn};

pub(crate) fn get_repository(
    ctx: ApiContext,
    owner: String,
    name: String,
) -> AsyncTask<Result<RepositoryRef, GitHubError>> {
    spawn_task(async move {
        if owner.is_empty() || name.is_empty() {
            return Err(GitHubError::InvalidInput(
                "owner and repository name are required".to_string(),
            ));
        }
        let full_name = format!("{owner}/{name}");
        let repo: WireRepository = ctx
            .get_json(&format!("/repos/{full_name}"), &[], &full_name)
            .await?;

        // Empty repositories have no branch; the head then stays unknown.
        let head = match &repo.default_branch {
            Some(branch) => {
                match ctx
                    .get_json::<WireBranch>(
                        &format!("/repos/{full_name}/branches/{branch}"),
                        &[],
                        &full_name,
                    )
                    .await
                {
                    Ok(b) => Some(b.commit.sha),
                    Err(e) if e.is_rate_limit() || matches!(e, GitHubError::Auth(_)) => {
                        return Err(e);
                    }
                    Err(e) => {
                        warn!("Could not resolve head of {full_name}@{branch}: {e}");
                        None
                    }
                }
            }
            None => None,
        };

        debug!("Resolved {full_name} (head {head:?})");
        Ok(repo.into_ref(head))
    })
}
