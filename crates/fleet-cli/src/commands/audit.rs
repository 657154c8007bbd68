// Audit trail display

use anyhow::Result;
use fleet_core::OrganizationId;

use super::workspace::{print_json, Workspace};

pub async fn show_trail(workspace: &Workspace, organization: &OrganizationId) -> Result<()> {
    let trail = workspace.admin().audit_trail(organization).await?;
    print_json(&trail)
}
