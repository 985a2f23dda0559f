//! Authenticated job checks against cWDS.

use super::{
    ensure, expect_status, json_body, CheckContext, CheckGroup, CheckResult, GroupKind, SmokeCheck,
};
use uuid::Uuid;

pub const AUTHENTICATED: CheckGroup = CheckGroup {
    kind: GroupKind::Authenticated,
    name: "authenticated",
    checks: &[
        SmokeCheck {
            name: "job_listing_status_is_200_with_array",
            description: "Call the job-listing url; it should return 200 and the response should be an array",
            run: job_listing_status_is_200_with_array,
        },
        SmokeCheck {
            name: "random_job_status_is_404",
            description: "Call the job-status url; it should return 404 since we are specifying a random job id",
            run: random_job_status_is_404,
        },
    ],
};

fn job_listing_status_is_200_with_array(ctx: &CheckContext<'_>) -> CheckResult {
    let path = format!("/job/v1/instance/{}", ctx.workspace_id()?);
    let response = ctx.cwds_get(&path, true)?;
    expect_status(&response, 200, "Job Listing")?;

    let jobs = json_body(&response)?;
    ensure(jobs.is_array(), || {
        format!("job listing was not an array: {}", response.body)
    })
}

fn random_job_status_is_404(ctx: &CheckContext<'_>) -> CheckResult {
    let path = format!("/job/v1/{}", Uuid::new_v4());
    let response = ctx.cwds_get(&path, true)?;
    expect_status(&response, 404, "Job Status")
}
