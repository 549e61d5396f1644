//! Deployment summary

use super::Context;
use crate::argument_parsing::format_output;
use crate::error::CliResult;
use crate::logic;
use crate::output::Output;

/// Print the policy id, contract address and tier units
pub fn handle_policy(ctx: &Context, format: &str, output: &dyn Output) -> CliResult<()> {
    let summary = logic::policy_summary(
        &ctx.policy,
        &ctx.deployment,
        &ctx.tiers,
        &ctx.wallet.address(),
    );
    output.print(&format_output(&summary, format)?)
}
