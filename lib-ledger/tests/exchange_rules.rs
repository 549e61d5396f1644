//! Exchange validator rules enforced by the emulator

use lib_cip68::{
    Cip68Datum, MintRedeemer, PlutusData, SpendRedeemer, Tier, TierSpec, TierTable, CIP68_VERSION,
};
use lib_ledger::{
    new_tx, Emulator, ExchangeRules, LedgerClient, Rejection, ScriptFailure,
    DEFAULT_GENESIS_LOVELACE,
};
use lib_tx::{Deployment, NativeScript, PolicyConfig, ProtocolParams, ValidatorCode, Wallet};
use lib_types::{AssetName, Network, Unit, Value};

struct Fixture {
    wallet: Wallet,
    emulator: Emulator,
    tiers: TierTable,
    deployment: Deployment,
    base_unit: Unit,
}

fn tier(n: u8) -> Tier {
    Tier::new(n).unwrap()
}

async fn fixture() -> Fixture {
    let wallet = Wallet::generate(Network::Emulator).unwrap();
    let bwp_policy = NativeScript::single_owner(wallet.key_hash());
    let base_unit = Unit::new(
        bwp_policy.hash().unwrap(),
        AssetName::from_text("bushwifplanes").unwrap(),
    );
    let tiers = TierTable::new(
        [(1, 91), (2, 911), (3, 911_911)]
            .into_iter()
            .map(|(n, price)| TierSpec {
                tier: tier(n),
                name: format!("BushWifPlanesTier{}", n),
                image: "ipfs://QmNrXv6eQakz74uPCqboy4hgb5RDjUzxM78GFERN7uoWTq".into(),
                price,
            })
            .collect(),
    )
    .unwrap();
    let config = PolicyConfig {
        base_policy_id: base_unit.policy_id,
        base_asset_name: base_unit.asset_name.clone(),
        admins: vec![wallet.key_hash()],
        tier_prices: tiers.prices(),
    };
    let deployment = Deployment::derive(
        &config,
        &tiers,
        ValidatorCode::Unapplied(b"exchange"),
        Network::Emulator,
    )
    .unwrap();
    let emulator = Emulator::new(
        vec![(wallet.address(), Value::from_lovelace(DEFAULT_GENESIS_LOVELACE))],
        ProtocolParams::default(),
    )
    .unwrap()
    .with_evaluator(Box::new(ExchangeRules::new(config, tiers.clone(), &deployment)));

    // Fund the wallet with the base asset
    let tx = new_tx(&emulator, wallet.address())
        .await
        .unwrap()
        .attach_minting_policy(bwp_policy)
        .mint_assets(Value::from_asset(base_unit.clone(), 10_000_000_000), None)
        .complete()
        .unwrap()
        .sign(&wallet)
        .unwrap();
    emulator.submit(&tx).await.unwrap();

    Fixture {
        wallet,
        emulator,
        tiers,
        deployment,
        base_unit,
    }
}

impl Fixture {
    fn reference_unit(&self, n: u8) -> Unit {
        self.tiers
            .get(tier(n))
            .unwrap()
            .reference_unit(self.deployment.policy_id)
            .unwrap()
    }

    fn datum(&self, n: u8) -> PlutusData {
        self.tiers
            .get(tier(n))
            .unwrap()
            .datum("test", CIP68_VERSION)
            .to_plutus_data()
    }

    async fn mint_reference(&self, n: u8, datum: PlutusData) -> Result<(), Rejection> {
        let unit = self.reference_unit(n);
        let tx = new_tx(&self.emulator, self.wallet.address())
            .await
            .unwrap()
            .attach_minting_policy(self.deployment.script.clone())
            .mint_assets(
                Value::from_asset(unit.clone(), 1),
                Some(MintRedeemer::MintReferenceTokens { tiers: vec![tier(n)] }.to_plutus_data()),
            )
            .pay_to_contract(self.deployment.contract_address, datum, Value::from_asset(unit, 1))
            .add_signer(self.wallet.key_hash())
            .complete()
            .unwrap()
            .sign(&self.wallet)
            .unwrap();
        self.emulator
            .submit(&tx)
            .await
            .map(|_| ())
            .map_err(|e| e.rejection().cloned().unwrap())
    }
}

#[tokio::test]
async fn test_duplicate_reference_mint_rejected() {
    let f = fixture().await;
    f.mint_reference(1, f.datum(1)).await.unwrap();

    let err = f.mint_reference(1, f.datum(1)).await.unwrap_err();
    assert!(matches!(
        err,
        Rejection::Script {
            failure: ScriptFailure::DuplicateReferenceMint(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_reference_datum_must_name_tier() {
    let f = fixture().await;
    let err = f.mint_reference(2, f.datum(3)).await.unwrap_err();
    assert!(matches!(
        err,
        Rejection::Script {
            failure: ScriptFailure::ReferenceNotLocked(_, 2),
            ..
        }
    ));
}

#[tokio::test]
async fn test_user_mint_underpaid_rejected() {
    let f = fixture().await;
    let user = f
        .tiers
        .get(tier(1))
        .unwrap()
        .user_unit(f.deployment.policy_id)
        .unwrap();

    let tx = new_tx(&f.emulator, f.wallet.address())
        .await
        .unwrap()
        .attach_minting_policy(f.deployment.script.clone())
        .mint_assets(
            Value::from_asset(user, 1),
            Some(MintRedeemer::MintRft { tier: tier(1) }.to_plutus_data()),
        )
        .pay_to_contract(
            f.deployment.contract_address,
            PlutusData::unit(),
            Value::from_asset(f.base_unit.clone(), 90),
        )
        .complete()
        .unwrap()
        .sign(&f.wallet)
        .unwrap();

    let err = f.emulator.submit(&tx).await.unwrap_err();
    assert_eq!(
        err.rejection(),
        Some(&Rejection::Script {
            script: f.deployment.policy_id,
            failure: ScriptFailure::PriceNotPaid { price: 91, paid: 90 },
        })
    );
}

#[tokio::test]
async fn test_spend_with_wrong_tier_rejected() {
    let f = fixture().await;
    f.mint_reference(1, f.datum(1)).await.unwrap();

    let locked = f
        .emulator
        .utxos_with_unit(&f.deployment.contract_address, &f.reference_unit(1))
        .await
        .unwrap();
    assert_eq!(locked.len(), 1);
    let datum = Cip68Datum::from_plutus_data(locked[0].utxo.datum.as_ref().unwrap()).unwrap();
    assert_eq!(datum.tier(), Some(1));

    let tx = new_tx(&f.emulator, f.wallet.address())
        .await
        .unwrap()
        .collect_from(locked, Some(SpendRedeemer::new(tier(2)).to_plutus_data()))
        .attach_spending_validator(f.deployment.script.clone())
        .pay_to_contract(
            f.deployment.contract_address,
            f.datum(1),
            Value::from_asset(f.reference_unit(1), 1),
        )
        .complete()
        .unwrap()
        .sign(&f.wallet)
        .unwrap();

    let err = f.emulator.submit(&tx).await.unwrap_err();
    assert!(matches!(
        err.rejection(),
        Some(Rejection::Script {
            failure: ScriptFailure::SpendTierMismatch(2),
            ..
        })
    ));
}
