//! Transaction signing with ed25519 keypairs.

use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use stellar_strkey::Strkey;
use stellar_xdr::curr::{
    DecoratedSignature, Limits, Signature, SignatureHint, TransactionEnvelope, WriteXdr,
};

use crate::error::ClientError;

/// Decode a Stellar secret key (`S...` format) into an ed25519 `SigningKey`.
pub fn decode_secret_key(secret: &str) -> Result<SigningKey, ClientError> {
    match Strkey::from_string(secret) {
        Ok(Strkey::PrivateKeyEd25519(sk)) => Ok(SigningKey::from_bytes(&sk.0)),
        Ok(_) => Err(ClientError::InvalidSecretKey(
            "expected S... secret key, got different key type".into(),
        )),
        Err(e) => Err(ClientError::InvalidSecretKey(format!(
            "invalid secret key format: {}",
            e
        ))),
    }
}

/// The `G...` account address corresponding to a signing key.
pub fn account_address(signing_key: &SigningKey) -> String {
    let pk = signing_key.verifying_key();
    Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(*pk.as_bytes())).to_string()
}

/// Sign a `TransactionEnvelope` with the given keypair and network passphrase.
///
/// Computes `SHA256(SHA256(passphrase) || EnvelopeTypeTx [0x00000002] || tx_xdr)`,
/// signs the 32-byte hash with ed25519, and appends a `DecoratedSignature`.
pub fn sign_transaction_envelope(
    envelope: TransactionEnvelope,
    signing_key: &SigningKey,
    network_passphrase: &str,
) -> Result<TransactionEnvelope, ClientError> {
    let TransactionEnvelope::Tx(mut v1) = envelope else {
        return Err(ClientError::SigningFailed(
            "expected Tx envelope variant".into(),
        ));
    };

    let tx_hash = compute_transaction_hash(&v1.tx, network_passphrase)?;
    let signature = signing_key.sign(&tx_hash);

    // Hint is the last 4 bytes of the public key
    let public_key = signing_key.verifying_key();
    let pk_bytes = public_key.as_bytes();
    let hint = SignatureHint([pk_bytes[28], pk_bytes[29], pk_bytes[30], pk_bytes[31]]);

    let sig_bytes: Vec<u8> = signature.to_bytes().to_vec();
    let decorated = DecoratedSignature {
        hint,
        signature: Signature(
            sig_bytes
                .try_into()
                .map_err(|e| ClientError::SigningFailed(format!("signature: {}", e)))?,
        ),
    };

    let sigs: Vec<DecoratedSignature> = vec![decorated];
    v1.signatures = sigs
        .try_into()
        .map_err(|e| ClientError::SigningFailed(format!("signatures vec: {}", e)))?;

    Ok(TransactionEnvelope::Tx(v1))
}

/// Compute the Stellar transaction hash:
/// `SHA256( SHA256(network_passphrase) || EnvelopeTypeTx (0x00000002 BE) || tx_xdr )`
fn compute_transaction_hash(
    tx: &stellar_xdr::curr::Transaction,
    network_passphrase: &str,
) -> Result<[u8; 32], ClientError> {
    let network_id: [u8; 32] = Sha256::digest(network_passphrase.as_bytes()).into();
    let envelope_type_tx: [u8; 4] = 2_i32.to_be_bytes();

    let tx_xdr = tx
        .to_xdr(Limits::none())
        .map_err(|e| ClientError::SigningFailed(format!("serialize tx: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(network_id);
    hasher.update(envelope_type_tx);
    hasher.update(&tx_xdr);
    let hash: [u8; 32] = hasher.finalize().into();

    Ok(hash)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;
    use stellar_xdr::curr::ScVal;

    use crate::config::TESTNET_PASSPHRASE;
    use crate::transaction::build_invoke_envelope;

    /// Stellar secret key generated from seed bytes [1u8; 32].
    fn test_secret_key_str() -> String {
        Strkey::PrivateKeyEd25519(stellar_strkey::ed25519::PrivateKey([1u8; 32])).to_string()
    }

    fn make_test_envelope() -> TransactionEnvelope {
        build_invoke_envelope(
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF",
            "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4",
            "register_for_quest",
            vec![ScVal::U64(1)],
            42,
            100,
            0,
        )
        .unwrap()
    }

    #[test]
    fn decode_valid_secret_key() {
        let sk_str = test_secret_key_str();
        let sk = decode_secret_key(&sk_str).unwrap();
        assert_eq!(sk.to_bytes(), [1u8; 32]);
    }

    #[test]
    fn decode_invalid_secret_key() {
        match decode_secret_key("INVALID_KEY").unwrap_err() {
            ClientError::InvalidSecretKey(msg) => {
                assert!(msg.contains("invalid secret key format"), "msg: {}", msg);
            }
            other => panic!("expected InvalidSecretKey, got {:?}", other),
        }
    }

    #[test]
    fn decode_g_address_as_secret_key_fails() {
        // G... is a public key, not a secret key
        let result =
            decode_secret_key("GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF");
        match result.unwrap_err() {
            ClientError::InvalidSecretKey(msg) => {
                assert!(msg.contains("expected S... secret key"), "msg: {}", msg);
            }
            other => panic!("expected InvalidSecretKey, got {:?}", other),
        }
    }

    #[test]
    fn account_address_is_g_strkey() {
        let sk = decode_secret_key(&test_secret_key_str()).unwrap();
        let addr = account_address(&sk);
        assert!(addr.starts_with('G'), "addr: {}", addr);
        assert_eq!(addr.len(), 56);
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let signing_key = decode_secret_key(&test_secret_key_str()).unwrap();
        let envelope = make_test_envelope();

        let signed =
            sign_transaction_envelope(envelope, &signing_key, TESTNET_PASSPHRASE).unwrap();

        match &signed {
            TransactionEnvelope::Tx(v1) => {
                assert_eq!(v1.signatures.len(), 1);

                let pk = signing_key.verifying_key();
                let pk_bytes = pk.as_bytes();
                assert_eq!(
                    v1.signatures[0].hint.0,
                    [pk_bytes[28], pk_bytes[29], pk_bytes[30], pk_bytes[31]]
                );

                let tx_hash = compute_transaction_hash(&v1.tx, TESTNET_PASSPHRASE).unwrap();
                let sig_bytes = &v1.signatures[0].signature.0.to_vec();
                let sig = ed25519_dalek::Signature::from_slice(sig_bytes).unwrap();
                assert!(pk.verify(&tx_hash, &sig).is_ok(), "signature should verify");
            }
            other => panic!("expected Tx variant, got {:?}", other),
        }
    }

    #[test]
    fn different_passphrases_produce_different_hashes() {
        let TransactionEnvelope::Tx(v1) = make_test_envelope() else {
            panic!("expected Tx variant");
        };
        let h1 = compute_transaction_hash(&v1.tx, TESTNET_PASSPHRASE).unwrap();
        let h2 =
            compute_transaction_hash(&v1.tx, crate::config::MAINNET_PASSPHRASE).unwrap();
        assert_ne!(h1, h2);
    }
}
