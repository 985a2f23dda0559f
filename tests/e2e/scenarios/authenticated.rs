use crate::harness::{Assertion, Scenario, SmokeArgs};

#[test]
fn test_token_and_workspace_run_job_checks() {
    Scenario::new("token_and_workspace_run_job_checks")
        .healthy_service()
        .accepts_tokens()
        .get("/job/v1/instance/ws-1", 200, "[]")
        .smoke_authenticated("ws-1", "good-token")
        .assert_successful()
        .assert_checks_run(6)
        .assert_note("user_token and workspace_id both provided.  Running additional authenticated tests.")
        .assert(Assertion::GroupRan("authenticated".into()))
        .assert(Assertion::CheckPassed("random_job_status_is_404".into()))
        .assert(Assertion::BearerSent {
            prefix: "/job/v1/".into(),
            token: "good-token".into(),
        })
        .assert(Assertion::NoAuthorization {
            prefix: "/oauth2/v1/tokeninfo".into(),
        })
        .assert_hits("GET", "/oauth2/v1/tokeninfo", 1)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_random_job_found_fails() {
    Scenario::new("random_job_found_fails")
        .healthy_service()
        .accepts_tokens()
        .get("/job/v1/", 200, r#"{"jobId":"unexpected"}"#)
        .get("/job/v1/instance/ws-1", 200, "[]")
        .smoke_authenticated("ws-1", "good-token")
        .assert_check_failed("random_job_status_is_404", "Job Status HTTP status is 200 not 404")
        .assert(Assertion::CheckPassed("job_listing_status_is_200_with_array".into()))
        .assert_exit_code(1)
        .run()
        .unwrap();
}

#[test]
fn test_job_listing_must_be_an_array() {
    Scenario::new("job_listing_must_be_an_array")
        .healthy_service()
        .accepts_tokens()
        .get("/job/v1/instance/ws-1", 200, r#"{"jobs":[]}"#)
        .smoke_authenticated("ws-1", "good-token")
        .assert_check_failed("job_listing_status_is_200_with_array", "not an array")
        .run()
        .unwrap();
}

#[test]
fn test_rejected_token_aborts_before_any_check() {
    Scenario::new("rejected_token_aborts_before_any_check")
        .healthy_service()
        .rejects_tokens()
        .smoke_authenticated("ws-1", "expired-token")
        .assert(Assertion::TokenRejected)
        .assert_exit_code(1)
        .assert_hits("GET", "/oauth2/v1/tokeninfo", 1)
        .assert_hits("GET", "/status", 0)
        .assert_hits("GET", "/job/v1/", 0)
        .run()
        .unwrap();
}

#[test]
fn test_workspace_without_token_skips_job_checks() {
    Scenario::new("workspace_without_token_skips_job_checks")
        .healthy_service()
        .smoke_with(SmokeArgs {
            workspace_id: Some("ws-1".into()),
            ..SmokeArgs::default()
        })
        .assert_successful()
        .assert_checks_run(4)
        .assert(Assertion::GroupSkipped("authenticated".into()))
        .assert_hits("GET", "/oauth2/v1/tokeninfo", 0)
        .run()
        .unwrap();
}

#[test]
fn test_empty_token_counts_as_absent() {
    Scenario::new("empty_token_counts_as_absent")
        .healthy_service()
        .rejects_tokens()
        .smoke_authenticated("ws-1", "")
        .assert_successful()
        .assert_checks_run(4)
        .assert_hits("GET", "/oauth2/v1/tokeninfo", 0)
        .run()
        .unwrap();
}
