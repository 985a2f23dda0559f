//! Orchestration-side import job checks.

use super::{
    ensure, expect_status, json_body, CheckContext, CheckGroup, CheckResult, GroupKind, SmokeCheck,
};
use crate::config::OrchestrationTarget;
use uuid::Uuid;

pub const ORCHESTRATION: CheckGroup = CheckGroup {
    kind: GroupKind::Orchestration,
    name: "orchestration",
    checks: &[
        SmokeCheck {
            name: "random_import_job_status_is_404",
            description: "Call the import job-status url; it should return 404 since we are specifying a random job id",
            run: random_import_job_status_is_404,
        },
        SmokeCheck {
            name: "import_job_listing_status_is_200_with_array",
            description: "Call the import job-listing url; it should return 200 and the response should be an array",
            run: import_job_listing_status_is_200_with_array,
        },
    ],
};

fn workspace_path(target: &OrchestrationTarget<'_>) -> String {
    format!("/api/workspaces/{}/{}", target.namespace, target.name)
}

fn random_import_job_status_is_404(ctx: &CheckContext<'_>) -> CheckResult {
    let target = ctx.orchestration()?;
    let path = format!("{}/importJob/{}", workspace_path(&target), Uuid::new_v4());
    let response = ctx.orchestration_get(&path)?;
    expect_status(&response, 404, "Job Status")
}

fn import_job_listing_status_is_200_with_array(ctx: &CheckContext<'_>) -> CheckResult {
    let target = ctx.orchestration()?;
    let path = format!("{}/importJob?runningOnly=true", workspace_path(&target));
    let response = ctx.orchestration_get(&path)?;
    expect_status(&response, 200, "Job Listing")?;

    let jobs = json_body(&response)?;
    ensure(jobs.is_array(), || {
        format!("job listing was not an array: {}", response.body)
    })
}
