use crate::harness::{Assertion, Scenario, SmokeArgs};

const IMPORT_JOBS: &str = "/api/workspaces/billing/my-workspace/importJob";

fn full_args() -> SmokeArgs {
    SmokeArgs {
        workspace_id: Some("ws-1".into()),
        user_token: Some("good-token".into()),
        orchestration: true,
        namespace: Some("billing".into()),
        name: Some("my-workspace".into()),
        ..SmokeArgs::default()
    }
}

#[test]
fn test_orchestration_checks_run_with_all_arguments() {
    Scenario::new("orchestration_checks_run_with_all_arguments")
        .healthy_service()
        .accepts_tokens()
        .get("/job/v1/instance/ws-1", 200, "[]")
        .get(IMPORT_JOBS, 200, "[]")
        .get(&format!("{}/", IMPORT_JOBS), 404, r#"{"message":"no such job"}"#)
        .smoke_with(full_args())
        .assert_successful()
        .assert_checks_run(8)
        .assert_note("Running orchestration tests.")
        .assert(Assertion::GroupRan("orchestration".into()))
        .assert(Assertion::BearerSent {
            prefix: IMPORT_JOBS.into(),
            token: "good-token".into(),
        })
        .assert_hits("GET", IMPORT_JOBS, 2)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_orchestration_listing_failure_is_reported() {
    Scenario::new("orchestration_listing_failure_is_reported")
        .healthy_service()
        .accepts_tokens()
        .get("/job/v1/instance/ws-1", 200, "[]")
        .get(IMPORT_JOBS, 500, "boom")
        .get(&format!("{}/", IMPORT_JOBS), 404, "{}")
        .smoke_with(full_args())
        .assert_check_failed(
            "import_job_listing_status_is_200_with_array",
            "Job Listing HTTP status is 500 not 200",
        )
        .assert(Assertion::CheckPassed("random_import_job_status_is_404".into()))
        .assert_exit_code(1)
        .run()
        .unwrap();
}

#[test]
fn test_missing_workspace_name_skips_orchestration() {
    Scenario::new("missing_workspace_name_skips_orchestration")
        .healthy_service()
        .accepts_tokens()
        .get("/job/v1/instance/ws-1", 200, "[]")
        .smoke_with(SmokeArgs {
            name: None,
            ..full_args()
        })
        .assert_successful()
        .assert_checks_run(6)
        .assert_note("user_token, workspace_namespace, or workspace_name are missing.  Skipping orchestration tests.")
        .assert(Assertion::GroupSkipped("orchestration".into()))
        .assert_hits("GET", "/api/workspaces/", 0)
        .run()
        .unwrap();
}

#[test]
fn test_orchestration_without_token_is_skipped() {
    Scenario::new("orchestration_without_token_is_skipped")
        .healthy_service()
        .smoke_with(SmokeArgs {
            workspace_id: None,
            user_token: None,
            ..full_args()
        })
        .assert_checks_run(4)
        .assert(Assertion::GroupSkipped("orchestration".into()))
        .assert(Assertion::GroupSkipped("authenticated".into()))
        .run()
        .unwrap();
}
