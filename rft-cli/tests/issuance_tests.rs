//! Issuance actions against the emulator
//!
//! Each test builds a fresh emulator context from the built-in preset and
//! checks ledger state after the actions run.

use std::sync::Arc;

use lib_cip68::{Cip68Datum, Tier};
use lib_ledger::{Emulator, LedgerError, Rejection, ScriptFailure};
use lib_tx::{TxError, Wallet, PLUTUS_V2_TAG};
use lib_types::{Amount, Network, PolicyId, ScriptHash, Unit};
use rft_cli::cli_config::RftConfig;
use rft_cli::commands::demo::handle_demo;
use rft_cli::commands::mint_base::handle_mint_base;
use rft_cli::commands::mint_reference::handle_mint_reference;
use rft_cli::commands::mint_user::handle_mint_user;
use rft_cli::commands::respend::handle_respend;
use rft_cli::commands::{build_context, emulator_context, Context};
use rft_cli::logic::total_quantity;
use rft_cli::output::SilentOutput;
use rft_cli::CliError;

fn tier(n: u8) -> Tier {
    Tier::new(n).unwrap()
}

fn all_tiers() -> Vec<Tier> {
    Tier::all().collect()
}

fn setup() -> (Context, Arc<Emulator>) {
    emulator_context(&RftConfig::default()).unwrap()
}

async fn wallet_quantity(ctx: &Context, unit: &Unit) -> Amount {
    let utxos = ctx.ledger.utxos_at(&ctx.wallet.address()).await.unwrap();
    total_quantity(&utxos, unit)
}

async fn contract_quantity(ctx: &Context, unit: &Unit) -> Amount {
    let utxos = ctx
        .ledger
        .utxos_at(&ctx.deployment.contract_address)
        .await
        .unwrap();
    total_quantity(&utxos, unit)
}

#[tokio::test]
async fn test_base_mint_credits_full_supply() {
    let (ctx, emulator) = setup();
    let base = ctx.policy.base_unit();
    assert_eq!(wallet_quantity(&ctx, &base).await, 0);

    handle_mint_base(&ctx, &SilentOutput).await.unwrap();

    assert_eq!(wallet_quantity(&ctx, &base).await, 10_000_000_000);
    assert_eq!(emulator.tx_count().await, 1);
}

#[tokio::test]
async fn test_reference_mint_locks_one_utxo_per_tier() {
    let (ctx, _emulator) = setup();
    handle_mint_base(&ctx, &SilentOutput).await.unwrap();
    handle_mint_reference(&ctx, &all_tiers(), &SilentOutput)
        .await
        .unwrap();

    let contract = ctx
        .ledger
        .utxos_at(&ctx.deployment.contract_address)
        .await
        .unwrap();
    assert_eq!(contract.len(), 3);

    for t in all_tiers() {
        let unit = ctx.reference_unit(t).unwrap();
        let holders: Vec<_> = contract.iter().filter(|e| e.utxo.holds(&unit)).collect();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].utxo.value.quantity_of(&unit), 1);

        let datum = Cip68Datum::from_plutus_data(holders[0].utxo.datum.as_ref().unwrap()).unwrap();
        assert_eq!(datum.tier(), Some(t.index()));
        assert_eq!(
            datum.metadata_text("name").unwrap(),
            format!("BushWifPlanesTier{}", t)
        );
    }
    // Nothing leaks to the wallet
    for t in all_tiers() {
        assert_eq!(wallet_quantity(&ctx, &ctx.reference_unit(t).unwrap()).await, 0);
    }
}

#[tokio::test]
async fn test_user_mint_moves_exact_price() {
    let (ctx, _emulator) = setup();
    handle_mint_base(&ctx, &SilentOutput).await.unwrap();
    handle_mint_reference(&ctx, &all_tiers(), &SilentOutput)
        .await
        .unwrap();

    let base = ctx.policy.base_unit();
    let user = ctx.user_unit(tier(1)).unwrap();
    let wallet_before = wallet_quantity(&ctx, &base).await;
    let contract_before = contract_quantity(&ctx, &base).await;

    handle_mint_user(&ctx, tier(1), &SilentOutput).await.unwrap();

    assert_eq!(wallet_quantity(&ctx, &base).await, wallet_before - 91);
    assert_eq!(contract_quantity(&ctx, &base).await, contract_before + 91);
    assert_eq!(wallet_quantity(&ctx, &user).await, 1);
    assert_eq!(contract_quantity(&ctx, &user).await, 0);
}

#[tokio::test]
async fn test_user_mint_third_tier_price() {
    let (ctx, _emulator) = setup();
    handle_mint_base(&ctx, &SilentOutput).await.unwrap();

    let base = ctx.policy.base_unit();
    handle_mint_user(&ctx, tier(3), &SilentOutput).await.unwrap();

    assert_eq!(contract_quantity(&ctx, &base).await, 911_911);
    assert_eq!(
        wallet_quantity(&ctx, &ctx.user_unit(tier(3)).unwrap()).await,
        1
    );
}

#[tokio::test]
async fn test_user_mint_without_base_asset_fails() {
    let (ctx, emulator) = setup();

    let err = handle_mint_user(&ctx, tier(1), &SilentOutput)
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Tx(TxError::InsufficientFunds { .. })));
    assert_eq!(emulator.tx_count().await, 0);
}

#[tokio::test]
async fn test_respend_relocks_same_token() {
    let (ctx, emulator) = setup();
    handle_mint_base(&ctx, &SilentOutput).await.unwrap();
    handle_mint_reference(&ctx, &all_tiers(), &SilentOutput)
        .await
        .unwrap();

    let unit = ctx.reference_unit(tier(1)).unwrap();
    let contract = ctx.deployment.contract_address;
    let before = ctx.ledger.utxos_with_unit(&contract, &unit).await.unwrap();
    assert_eq!(before.len(), 1);
    let count_before = emulator.tx_count().await;

    let tx_hash = handle_respend(&ctx, tier(1), &SilentOutput).await.unwrap();

    let after = ctx.ledger.utxos_with_unit(&contract, &unit).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_ne!(after[0].outpoint, before[0].outpoint);
    assert_eq!(after[0].outpoint.tx_hash, tx_hash);
    assert_eq!(after[0].utxo.value.quantity_of(&unit), 1);
    assert_eq!(contract_quantity(&ctx, &unit).await, 1);
    assert_eq!(wallet_quantity(&ctx, &unit).await, 0);

    let datum = Cip68Datum::from_plutus_data(after[0].utxo.datum.as_ref().unwrap()).unwrap();
    assert_eq!(datum.tier(), Some(1));
    // Consume and re-lock happen in one transaction
    assert_eq!(emulator.tx_count().await, count_before + 1);
}

#[tokio::test]
async fn test_respend_missing_token_fails_before_submission() {
    let (ctx, emulator) = setup();
    handle_mint_base(&ctx, &SilentOutput).await.unwrap();
    let count_before = emulator.tx_count().await;

    let err = handle_respend(&ctx, tier(2), &SilentOutput)
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::ReferenceTokenNotFound { tier: 2 }));
    assert_eq!(emulator.tx_count().await, count_before);
}

#[tokio::test]
async fn test_duplicate_reference_mint_rejected() {
    let (ctx, emulator) = setup();
    handle_mint_reference(&ctx, &[tier(1)], &SilentOutput)
        .await
        .unwrap();
    let count_before = emulator.tx_count().await;

    let err = handle_mint_reference(&ctx, &[tier(1)], &SilentOutput)
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Ledger(LedgerError::Rejected { .. })));
    assert!(matches!(
        err.rejection(),
        Some(Rejection::Script {
            failure: ScriptFailure::DuplicateReferenceMint(_),
            ..
        })
    ));
    assert_eq!(emulator.tx_count().await, count_before);
    assert_eq!(
        contract_quantity(&ctx, &ctx.reference_unit(tier(1)).unwrap()).await,
        1
    );
}

#[tokio::test]
async fn test_base_mint_requires_owned_policy() {
    let mut config = RftConfig::default();
    config.policy.base_policy_id = Some(PolicyId::new([0xab; 28]));
    let (ctx, emulator) = emulator_context(&config).unwrap();

    let err = handle_mint_base(&ctx, &SilentOutput).await.unwrap_err();
    assert!(matches!(err, CliError::BasePolicyNotOwned { .. }));
    assert_eq!(emulator.tx_count().await, 0);
}

#[tokio::test]
async fn test_demo_runs_full_sequence() {
    let (ctx, emulator) = setup();

    let report = handle_demo(&ctx, "json", &SilentOutput).await.unwrap();

    assert_eq!(emulator.tx_count().await, 4);
    assert_ne!(report.base_mint, report.respend);
    for t in all_tiers() {
        assert_eq!(
            contract_quantity(&ctx, &ctx.reference_unit(t).unwrap()).await,
            1
        );
    }
    assert_eq!(contract_quantity(&ctx, &ctx.policy.base_unit()).await, 91);
    assert_eq!(
        wallet_quantity(&ctx, &ctx.user_unit(tier(1)).unwrap()).await,
        1
    );
}

#[test]
fn test_deployment_is_deterministic_per_wallet() {
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join("seed.txt");
    let wallet = Wallet::generate(Network::Emulator).unwrap();
    std::fs::write(&seed_path, wallet.phrase()).unwrap();

    let mut config = RftConfig::default();
    config.wallet.seed_file = Some(seed_path);
    let (first, _) = emulator_context(&config).unwrap();
    let (second, _) = emulator_context(&config).unwrap();
    assert_eq!(first.deployment.policy_id, second.deployment.policy_id);
    assert_eq!(first.wallet.address(), wallet.address());

    // A different wallet changes the base policy and admin parameters
    let (other, _) = setup();
    assert_ne!(first.deployment.policy_id, other.deployment.policy_id);

    // So does a different tier price
    config.tiers[0].price += 1;
    let (repriced, _) = emulator_context(&config).unwrap();
    assert_ne!(first.deployment.policy_id, repriced.deployment.policy_id);
}

#[tokio::test]
async fn test_live_context_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = Wallet::generate(Network::Preprod).unwrap();
    std::fs::write(dir.path().join("seed.txt"), wallet.phrase()).unwrap();
    std::fs::write(dir.path().join("blockfrost.txt"), "preprodProjectId\n").unwrap();
    std::fs::write(dir.path().join("validator.hex"), "4e4d01000033222220051200120011").unwrap();

    let mut config = RftConfig::preset(Network::Preprod);
    config.wallet.seed_file = Some(dir.path().join("seed.txt"));
    config.network.credential_file = dir.path().join("blockfrost.txt");
    config.policy.validator_code_file = Some(dir.path().join("validator.hex"));

    let ctx = build_context(&config, Network::Preprod).unwrap();
    assert_eq!(ctx.network(), Network::Preprod);
    assert_eq!(ctx.wallet.address(), wallet.address());
    // Pre-applied code hashes to the policy id unchanged
    let code = hex::decode("4e4d01000033222220051200120011").unwrap();
    assert_eq!(
        ctx.deployment.policy_id,
        ScriptHash::of_script(PLUTUS_V2_TAG, &code)
    );

    let err = handle_demo(&ctx, "json", &SilentOutput).await.unwrap_err();
    assert!(matches!(err, CliError::DemoRequiresEmulator(Network::Preprod)));
}

#[test]
fn test_live_context_requires_files() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = Wallet::generate(Network::Mainnet).unwrap();
    std::fs::write(dir.path().join("seed.txt"), wallet.phrase()).unwrap();

    let mut config = RftConfig::preset(Network::Mainnet);
    config.wallet.seed_file = Some(dir.path().join("seed.txt"));
    config.network.credential_file = dir.path().join("missing.txt");

    // No validator code configured
    assert!(matches!(
        build_context(&config, Network::Mainnet),
        Err(CliError::ConfigError(_))
    ));

    std::fs::write(dir.path().join("validator.hex"), "4e4d01").unwrap();
    config.policy.validator_code_file = Some(dir.path().join("validator.hex"));
    assert!(matches!(
        build_context(&config, Network::Mainnet),
        Err(CliError::Ledger(LedgerError::Credential(_)))
    ));
}
