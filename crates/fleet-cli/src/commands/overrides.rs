// Organization override commands

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use fleet_capabilities::OverrideRequest;
use fleet_core::effects::CapabilityStoreEffects;
use fleet_core::{CapabilityValue, OrganizationId, ValueType};
use serde_json::json;

use super::workspace::{print_json, Workspace};

#[derive(clap::Subcommand)]
pub enum OverridesSubcommand {
    /// List an organization's overrides
    List {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,

        /// Include expired overrides
        #[arg(long)]
        all: bool,
    },
    /// Create or replace an override
    Set {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,

        /// Capability code
        code: String,

        /// Value, parsed according to the capability's declared type
        value: String,

        /// Why the override exists
        #[arg(short, long)]
        reason: Option<String>,

        /// Expiry instant (RFC 3339)
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,

        /// Principal recorded in the audit log
        #[arg(long, default_value = "cli")]
        actor: String,
    },
    /// Remove an override
    Clear {
        /// Organization ID (UUID)
        #[arg(short, long)]
        organization: OrganizationId,

        /// Capability code
        code: String,

        /// Principal recorded in the audit log
        #[arg(long, default_value = "cli")]
        actor: String,
    },
}

pub async fn handle_overrides_command(
    workspace: &Workspace,
    command: OverridesSubcommand,
) -> Result<()> {
    match command {
        OverridesSubcommand::List { organization, all } => {
            let overrides = workspace.admin().list_overrides(&organization, all).await?;
            print_json(&overrides)
        }
        OverridesSubcommand::Set {
            organization,
            code,
            value,
            reason,
            expires_at,
            actor,
        } => {
            let capability = workspace
                .store()
                .capability_by_code(&code)
                .await?
                .ok_or_else(|| anyhow!("unknown capability: {code}"))?;
            let value = parse_value(&value, capability.value_type)?;
            let row = workspace
                .admin()
                .set_override(
                    &actor,
                    OverrideRequest {
                        organization_id: organization,
                        code,
                        value,
                        reason,
                        expires_at,
                    },
                )
                .await?;
            workspace.save().await?;
            print_json(&json!({
                "code": capability.code,
                "value": row.value,
                "reason": row.reason,
                "expires_at": row.expires_at,
            }))
        }
        OverridesSubcommand::Clear {
            organization,
            code,
            actor,
        } => {
            let removed = workspace
                .admin()
                .clear_override(&actor, organization, &code)
                .await?;
            if removed {
                workspace.save().await?;
            }
            print_json(&json!({ "code": code, "removed": removed }))
        }
    }
}

/// Parse a command-line value as the capability's declared type
fn parse_value(raw: &str, value_type: ValueType) -> Result<CapabilityValue> {
    let trimmed = raw.trim();
    match value_type {
        ValueType::Int => trimmed
            .parse::<i64>()
            .map(CapabilityValue::Int)
            .with_context(|| format!("{raw:?} is not an integer")),
        ValueType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "enabled" => Ok(CapabilityValue::Bool(true)),
            "false" | "no" | "0" | "disabled" => Ok(CapabilityValue::Bool(false)),
            _ => bail!("{raw:?} is not a boolean"),
        },
        ValueType::Text => Ok(CapabilityValue::Text(raw.to_string())),
    }
}
