use serde::{Deserialize, Serialize};

/// App Store app as configured for a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VppAppMetadata {
    pub vpp_app_team_id: u32,
    pub adam_id: String,
    pub platform: String,
    pub name: String,
    pub self_service: bool,
}

/// Script configured to run at the end of the setup experience
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupScript {
    pub id: u32,
    pub team_id: Option<u32>,
    pub name: String,
    pub contents: String,
}

/// Everything the script runner needs to execute a setup script on a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub host_id: u32,
    pub script_name: String,
    pub script_contents: String,
    pub setup_experience_script_id: u32,
}

impl ScriptRequest {
    pub fn for_host(host_id: u32, script: &SetupScript) -> Self {
        Self {
            host_id,
            script_name: script.name.clone(),
            script_contents: script.contents.clone(),
            setup_experience_script_id: script.id,
        }
    }
}
