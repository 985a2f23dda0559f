//! Unauthenticated checks: `/status` and `/version`.

use super::{
    ensure, expect_status, json_body, CheckContext, CheckError, CheckGroup, CheckResult,
    GroupKind, SmokeCheck,
};
use serde_json::Value;

pub const UNAUTHENTICATED: CheckGroup = CheckGroup {
    kind: GroupKind::Unauthenticated,
    name: "unauthenticated",
    checks: &[
        SmokeCheck {
            name: "status_code_is_200",
            description: "Call the status url; it should return 200",
            run: status_code_is_200,
        },
        SmokeCheck {
            name: "status_and_components_are_up",
            description: "The status payload and every component in it should report UP",
            run: status_and_components_are_up,
        },
        SmokeCheck {
            name: "version_code_is_200",
            description: "Call the version url; it should return 200",
            run: version_code_is_200,
        },
        SmokeCheck {
            name: "version_is_present",
            description: "The version payload should carry a non-empty build.version",
            run: version_is_present,
        },
    ],
};

const STATUS_PATH: &str = "/status";
const VERSION_PATH: &str = "/version";
const UP: &str = "UP";

fn status_code_is_200(ctx: &CheckContext<'_>) -> CheckResult {
    let response = ctx.cwds_get(STATUS_PATH, false)?;
    expect_status(&response, 200, "Status")
}

fn status_and_components_are_up(ctx: &CheckContext<'_>) -> CheckResult {
    let response = ctx.cwds_get(STATUS_PATH, false)?;
    let payload = json_body(&response)?;

    ensure(payload.get("status").and_then(Value::as_str) == Some(UP), || {
        format!("Status is not {}: {}", UP, response.body)
    })?;

    // Components are optional; when reported, each one must be up.
    let Some(components) = payload.get("components") else {
        return Ok(());
    };
    let components = components.as_object().ok_or_else(|| {
        CheckError::Failure(format!("components is not an object: {}", response.body))
    })?;

    let down: Vec<&str> = components
        .iter()
        .filter(|(_, component)| component.get("status").and_then(Value::as_str) != Some(UP))
        .map(|(name, _)| name.as_str())
        .collect();

    ensure(down.is_empty(), || {
        format!("components not {}: {}: {}", UP, down.join(", "), response.body)
    })
}

fn version_code_is_200(ctx: &CheckContext<'_>) -> CheckResult {
    let response = ctx.cwds_get(VERSION_PATH, false)?;
    expect_status(&response, 200, "Version")
}

fn version_is_present(ctx: &CheckContext<'_>) -> CheckResult {
    let response = ctx.cwds_get(VERSION_PATH, false)?;
    let payload = json_body(&response)?;

    let version = payload
        .get("build")
        .and_then(|build| build.get("version"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    ensure(!version.trim().is_empty(), || {
        format!("build.version missing or empty: {}", response.body)
    })
}
