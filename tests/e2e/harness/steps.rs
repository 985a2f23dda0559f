use super::assertions::Assertion;

/// All possible actions in a test scenario
#[derive(Debug)]
pub enum ScenarioStep {
    // Mock service setup
    Serve {
        method: String,
        prefix: String,
        status: u16,
        body: String,
    },

    // Smoke runs
    RunSmoke(SmokeArgs),

    // Load runs
    RunLoad(LoadArgs),

    Assert {
        assertion: Assertion,
    },
}

/// Command-line style inputs for a smoke run. Hosts default to the mock
/// service.
#[derive(Debug, Clone, Default)]
pub struct SmokeArgs {
    pub workspace_id: Option<String>,
    pub user_token: Option<String>,
    /// Point orchestration checks at the mock service.
    pub orchestration: bool,
    pub namespace: Option<String>,
    pub name: Option<String>,
    /// cWDS host instead of the mock service.
    pub host: Option<String>,
    /// Token-info endpoint instead of the mock service's.
    pub token_info_url: Option<String>,
}

/// Toggles for a load run against the mock service.
#[derive(Debug, Clone)]
pub struct LoadArgs {
    pub workspace_count: u32,
    pub enable_cbas: bool,
    pub wds_upload: bool,
    pub record_roundtrip: bool,
    pub cbas_submit_workflow: bool,
}

impl Default for LoadArgs {
    fn default() -> Self {
        Self {
            workspace_count: 1,
            enable_cbas: false,
            wds_upload: true,
            record_roundtrip: false,
            cbas_submit_workflow: false,
        }
    }
}
