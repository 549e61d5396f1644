//! Wallet
//!
//! A wallet is a BIP39 mnemonic and the CIP-1852 keys derived from it, so an
//! issuer can restore the same address in any Cardano wallet.
//!
//! # Key Derivation
//!
//! ```text
//! mnemonic
//!     |
//!     +-- root = PBKDF2-HMAC-SHA512(passphrase "", salt = entropy, 4096 rounds)
//!     |          96 bytes, clamped: kL (32) || kR (32) || chain code (32)
//!     |
//!     +-- account = root / 1852' / 1815' / 0'
//!             |
//!             +-- payment key = account / 0 / 0
//!             +-- stake key   = account / 2 / 0
//!
//! address = base(payment key hash, stake key hash)
//! ```
//!
//! Children are derived with BIP32-Ed25519 (scheme V2). Signing uses the
//! extended key directly: `kL` is the scalar and `kR` the nonce prefix.

use std::fmt;
use std::path::Path;

use bip39::Mnemonic;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use lib_types::{Address, Credential, KeyHash, Network};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::Serialize;
use sha2::Sha512;

use crate::errors::{TxError, TxResult};

type HmacSha512 = Hmac<Sha512>;

/// Entropy for a 24-word phrase
const ENTROPY_LEN: usize = 32;

const PBKDF2_ROUNDS: u32 = 4096;
const HARDENED: u32 = 0x8000_0000;

const PURPOSE: u32 = 1852;
const COIN_TYPE: u32 = 1815;
const ACCOUNT: u32 = 0;
const PAYMENT_ROLE: u32 = 0;
const STAKE_ROLE: u32 = 2;
const ADDRESS_INDEX: u32 = 0;

/// Verification key and signature over a transaction body hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VKeyWitness {
    #[serde(with = "hex_bytes")]
    pub vkey: [u8; 32],
    #[serde(with = "hex_bytes")]
    pub signature: [u8; 64],
}

impl VKeyWitness {
    /// Key hash of the signing key
    pub fn key_hash(&self) -> KeyHash {
        KeyHash::of_key(&self.vkey)
    }

    /// Check the signature against `message`
    pub fn verify(&self, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.vkey) else {
            return false;
        };
        key.verify(message, &Signature::from_bytes(&self.signature))
            .is_ok()
    }
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}

/// BIP32-Ed25519 extended private key
#[derive(Clone)]
struct ExtendedKey {
    kl: [u8; 32],
    kr: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Icarus root key for the mnemonic's entropy
    fn root(entropy: &[u8]) -> Self {
        let mut bytes = [0u8; 96];
        pbkdf2_hmac::<Sha512>(b"", entropy, PBKDF2_ROUNDS, &mut bytes);
        bytes[0] &= 0b1111_1000;
        bytes[31] &= 0b0001_1111;
        bytes[31] |= 0b0100_0000;

        let mut key = Self {
            kl: [0; 32],
            kr: [0; 32],
            chain_code: [0; 32],
        };
        key.kl.copy_from_slice(&bytes[..32]);
        key.kr.copy_from_slice(&bytes[32..64]);
        key.chain_code.copy_from_slice(&bytes[64..]);
        key
    }

    fn expanded(&self) -> ExpandedSecretKey {
        ExpandedSecretKey {
            scalar: Scalar::from_bytes_mod_order(self.kl),
            hash_prefix: self.kr,
        }
    }

    fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey::from(&self.expanded())
    }

    fn sign(&self, message: &[u8]) -> Signature {
        let expanded = self.expanded();
        raw_sign::<Sha512>(&expanded, message, &VerifyingKey::from(&expanded))
    }

    /// Child key at `index`; indexes from 2^31 up are hardened
    fn derive(&self, index: u32) -> TxResult<Self> {
        let suffix = index.to_le_bytes();
        let (z, c) = if index >= HARDENED {
            (
                hmac_sha512(&self.chain_code, &[&[0x00], &self.kl, &self.kr, &suffix])?,
                hmac_sha512(&self.chain_code, &[&[0x01], &self.kl, &self.kr, &suffix])?,
            )
        } else {
            let public = self.verifying_key().to_bytes();
            (
                hmac_sha512(&self.chain_code, &[&[0x02], &public, &suffix])?,
                hmac_sha512(&self.chain_code, &[&[0x03], &public, &suffix])?,
            )
        };

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&c[32..]);
        Ok(Self {
            kl: add_28_mul8(&self.kl, &z[..28]),
            kr: add_256(&self.kr, &z[32..]),
            chain_code,
        })
    }

    fn derive_path(&self, path: &[u32]) -> TxResult<Self> {
        path.iter().try_fold(self.clone(), |key, index| key.derive(*index))
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> TxResult<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|_| TxError::Wallet("invalid chain code length".to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// `kl + 8 * zl` over the low 28 bytes of `zl`, little-endian
fn add_28_mul8(kl: &[u8; 32], zl: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    for i in 0..32 {
        let z = if i < 28 { (zl[i] as u16) << 3 } else { 0 };
        let sum = kl[i] as u16 + z + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    out
}

/// `kr + zr` modulo 2^256, little-endian
fn add_256(kr: &[u8; 32], zr: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    for i in 0..32 {
        let sum = kr[i] as u16 + zr[i] as u16 + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    out
}

const fn hardened(index: u32) -> u32 {
    index | HARDENED
}

/// Signing wallet
pub struct Wallet {
    mnemonic: Mnemonic,
    payment_key: ExtendedKey,
    stake_key: ExtendedKey,
    network: Network,
}

impl Wallet {
    /// Generate a fresh wallet with a random 24-word mnemonic
    pub fn generate(network: Network) -> TxResult<Self> {
        let mut entropy = [0u8; ENTROPY_LEN];
        rand::thread_rng().fill_bytes(&mut entropy);
        let mnemonic =
            Mnemonic::from_entropy(&entropy).map_err(|e| TxError::Wallet(e.to_string()))?;
        Self::from_mnemonic(mnemonic, network)
    }

    /// Restore a wallet from its space-separated phrase
    pub fn from_phrase(phrase: &str, network: Network) -> TxResult<Self> {
        let mnemonic = Mnemonic::parse_normalized(phrase.trim())
            .map_err(|e| TxError::Wallet(format!("Invalid mnemonic: {}", e)))?;
        Self::from_mnemonic(mnemonic, network)
    }

    /// Restore a wallet from a file holding the phrase
    pub fn from_seed_file(path: &Path, network: Network) -> TxResult<Self> {
        let phrase = std::fs::read_to_string(path).map_err(|e| {
            TxError::Wallet(format!("Cannot read seed file {}: {}", path.display(), e))
        })?;
        Self::from_phrase(&phrase, network)
    }

    fn from_mnemonic(mnemonic: Mnemonic, network: Network) -> TxResult<Self> {
        let account = ExtendedKey::root(&mnemonic.to_entropy()).derive_path(&[
            hardened(PURPOSE),
            hardened(COIN_TYPE),
            hardened(ACCOUNT),
        ])?;
        Ok(Self {
            payment_key: account.derive_path(&[PAYMENT_ROLE, ADDRESS_INDEX])?,
            stake_key: account.derive_path(&[STAKE_ROLE, ADDRESS_INDEX])?,
            mnemonic,
            network,
        })
    }

    /// The mnemonic phrase
    pub fn phrase(&self) -> String {
        self.mnemonic.to_string()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn verifying_key(&self) -> [u8; 32] {
        self.payment_key.verifying_key().to_bytes()
    }

    /// Payment key hash (the owner credential)
    pub fn key_hash(&self) -> KeyHash {
        KeyHash::of_key(&self.verifying_key())
    }

    pub fn stake_key_hash(&self) -> KeyHash {
        KeyHash::of_key(&self.stake_key.verifying_key().to_bytes())
    }

    /// Base address: payment key + stake key
    pub fn address(&self) -> Address {
        Address::base(
            self.network,
            Credential::Key(self.key_hash()),
            Credential::Key(self.stake_key_hash()),
        )
    }

    /// Sign a message with the payment key
    pub fn sign(&self, message: &[u8]) -> VKeyWitness {
        VKeyWitness {
            vkey: self.verifying_key(),
            signature: self.payment_key.sign(message).to_bytes(),
        }
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_has_24_words() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        assert_eq!(wallet.phrase().split_whitespace().count(), 24);
    }

    #[test]
    fn test_phrase_restores_same_keys() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let restored = Wallet::from_phrase(&wallet.phrase(), Network::Emulator).unwrap();
        assert_eq!(restored.key_hash(), wallet.key_hash());
        assert_eq!(restored.address(), wallet.address());
    }

    #[test]
    fn test_seed_file_tolerates_trailing_newline() {
        let wallet = Wallet::generate(Network::Mainnet).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.txt");
        std::fs::write(&path, format!("{}\n", wallet.phrase())).unwrap();

        let restored = Wallet::from_seed_file(&path, Network::Mainnet).unwrap();
        assert_eq!(restored.key_hash(), wallet.key_hash());
        assert!(restored.address().to_bech32().starts_with("addr1"));
    }

    #[test]
    fn test_invalid_phrase_rejected() {
        assert!(matches!(
            Wallet::from_phrase("not a real mnemonic", Network::Emulator),
            Err(TxError::Wallet(_))
        ));
    }

    #[test]
    fn test_signature_verifies() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let witness = wallet.sign(b"body hash");
        assert!(witness.verify(b"body hash"));
        assert!(!witness.verify(b"other"));
        assert_eq!(witness.key_hash(), wallet.key_hash());
    }

    // Published CIP-19 vector: base address of m/1852'/1815'/0'/0/0 and
    // m/1852'/1815'/0'/2/0 for this phrase
    const VECTOR_PHRASE: &str =
        "test walk nut penalty hip pave soap entry language right filter choice";

    #[test]
    fn test_cip1852_base_address_vector() {
        let mainnet = Wallet::from_phrase(VECTOR_PHRASE, Network::Mainnet).unwrap();
        assert_eq!(
            mainnet.address().to_bech32(),
            "addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x"
        );

        let testnet = Wallet::from_phrase(VECTOR_PHRASE, Network::Preprod).unwrap();
        assert_eq!(
            testnet.address().to_bech32(),
            "addr_test1qz2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgs68faae"
        );
    }

    #[test]
    fn test_root_key_is_clamped() {
        let mnemonic = Mnemonic::parse_normalized(VECTOR_PHRASE).unwrap();
        let root = ExtendedKey::root(&mnemonic.to_entropy());
        assert_eq!(root.kl[0] & 0b0000_0111, 0);
        assert_eq!(root.kl[31] & 0b1110_0000, 0b0100_0000);
    }

    #[test]
    fn test_hardened_and_soft_children_differ() {
        let mnemonic = Mnemonic::parse_normalized(VECTOR_PHRASE).unwrap();
        let root = ExtendedKey::root(&mnemonic.to_entropy());
        let soft = root.derive(0).unwrap();
        let hard = root.derive(hardened(0)).unwrap();
        assert_ne!(soft.kl, hard.kl);
        assert_ne!(soft.chain_code, hard.chain_code);
        // Same path, same key
        let stepwise = root.derive(hardened(1)).unwrap().derive(7).unwrap();
        assert_eq!(root.derive_path(&[hardened(1), 7]).unwrap().kl, stepwise.kl);
    }

    #[test]
    fn test_child_scalar_addition_carries() {
        let mut kl = [0u8; 32];
        kl[0] = 0xf8;
        let mut zl = [0u8; 28];
        zl[0] = 0x01;
        // 0xf8 + 8 = 0x100
        let sum = add_28_mul8(&kl, &zl);
        assert_eq!(sum[0], 0x00);
        assert_eq!(sum[1], 0x01);

        let wrapped = add_256(&[0xff; 32], &{
            let mut one = [0u8; 32];
            one[0] = 1;
            one
        });
        assert_eq!(wrapped, [0u8; 32]);
    }

    #[test]
    fn test_payment_and_stake_keys_differ() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        assert_ne!(wallet.key_hash(), wallet.stake_key_hash());
    }

    #[test]
    fn test_debug_hides_mnemonic() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let rendered = format!("{:?}", wallet);
        assert!(rendered.contains("address"));
        assert!(!rendered.contains(&wallet.phrase()));
    }
}
