// Read-only capability queries

use anyhow::Result;
use fleet_capabilities::{CapabilityEndpoints, CapabilityView, ValidateLimitRequest};
use fleet_core::OrganizationId;
use std::collections::BTreeMap;

use super::workspace::{print_json, Workspace};

pub async fn resolve(
    workspace: &Workspace,
    organization: &OrganizationId,
    code: Option<&str>,
) -> Result<()> {
    let resolver = workspace.resolver();
    match code {
        Some(code) => {
            let view = CapabilityEndpoints::new(&resolver)
                .capability(organization, code)
                .await?;
            print_json(&view)
        }
        None => {
            let all: BTreeMap<String, CapabilityView> = resolver
                .get_all_capabilities(organization)
                .await?
                .into_iter()
                .map(|(code, resolved)| (code, resolved.into()))
                .collect();
            print_json(&all)
        }
    }
}

pub async fn summary(workspace: &Workspace, organization: &OrganizationId) -> Result<()> {
    let resolver = workspace.resolver();
    print_json(&CapabilityEndpoints::new(&resolver).summary(organization).await?)
}

pub async fn check(workspace: &Workspace, organization: &OrganizationId, code: &str) -> Result<()> {
    let resolver = workspace.resolver();
    print_json(&CapabilityEndpoints::new(&resolver).check(organization, code).await?)
}

pub async fn validate_limit(
    workspace: &Workspace,
    organization: &OrganizationId,
    code: &str,
    current_count: i64,
) -> Result<()> {
    let resolver = workspace.resolver();
    let request = ValidateLimitRequest {
        capability_code: code.to_string(),
        current_count,
    };
    let response = CapabilityEndpoints::new(&resolver)
        .validate_limit(organization, &request)
        .await?;
    print_json(&response)
}
