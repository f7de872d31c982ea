use crate::common::types::RandomWord;
use crate::errors::OracleError;
use rand_core::OsRng;
use schnorrkel::context::SigningContext;
use schnorrkel::vrf::{VRFPreOut, VRFProof};
use schnorrkel::{ExpansionMode, Keypair, MiniSecretKey, PublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

const VRF_SIGNING_CONTEXT: &[u8] = b"guess-game-vrf";
const VRF_OUTPUT_CONTEXT: &[u8] = b"guess-game-output";

/// Everything a third party needs to check a delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VrfProofBundle {
    /// Hex-encoded VRF output (32 bytes)
    pub vrf_output: String,
    /// Hex-encoded VRF pre-output (32 bytes)
    pub vrf_preout: String,
    /// Hex-encoded VRF proof (64 bytes)
    pub vrf_proof: String,
    /// Hex-encoded public key (32 bytes)
    pub public_key: String,
    /// Input message used for VRF
    pub input_message: String,
}

/// Holds the coordinator's VRF key and produces proofs
pub struct VrfProver {
    keypair: Arc<Keypair>,
}

impl VrfProver {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Random keypair (for testing)
    pub fn new_random() -> Self {
        Self::new(Keypair::generate_with(OsRng))
    }

    /// Deterministic keypair, so a restarted coordinator keeps its public key
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, OracleError> {
        let mini = MiniSecretKey::from_bytes(seed)
            .map_err(|e| OracleError::MalformedProof(format!("Invalid VRF seed: {:?}", e)))?;
        Ok(Self::new(mini.expand_to_keypair(ExpansionMode::Ed25519)))
    }

    /// Evaluate the VRF on `input_message`
    pub fn prove(&self, input_message: &str) -> (VrfProofBundle, [u8; 32]) {
        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let (inout, proof, _) = self.keypair.vrf_sign(ctx.bytes(input_message.as_bytes()));
        let output: [u8; 32] = inout.make_bytes(VRF_OUTPUT_CONTEXT);

        let bundle = VrfProofBundle {
            vrf_output: hex::encode(output),
            vrf_preout: hex::encode(inout.to_preout().to_bytes()),
            vrf_proof: hex::encode(proof.to_bytes()),
            public_key: self.public_key_hex(),
            input_message: input_message.to_string(),
        };

        (bundle, output)
    }

    /// Verify a proof bundle against the input the verifier expects.
    ///
    /// `Ok(false)` means well-formed but wrong; `Err` means undecodable.
    pub fn verify(bundle: &VrfProofBundle, expected_input: &str) -> Result<bool, OracleError> {
        if bundle.input_message != expected_input {
            return Ok(false);
        }

        let public_key = PublicKey::from_bytes(&decode_hex("public key", &bundle.public_key)?)
            .map_err(|e| OracleError::MalformedProof(format!("Invalid public key: {:?}", e)))?;
        let preout = VRFPreOut::from_bytes(&decode_hex("pre-output", &bundle.vrf_preout)?)
            .map_err(|e| OracleError::MalformedProof(format!("Invalid pre-output: {:?}", e)))?;
        let proof = VRFProof::from_bytes(&decode_hex("proof", &bundle.vrf_proof)?)
            .map_err(|e| OracleError::MalformedProof(format!("Invalid proof: {:?}", e)))?;
        let claimed_output = decode_hex("output", &bundle.vrf_output)?;

        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let transcript = ctx.bytes(expected_input.as_bytes());
        let inout = match public_key.vrf_verify(transcript, &preout, &proof) {
            Ok((inout, _)) => inout,
            Err(_) => return Ok(false),
        };

        let output: [u8; 32] = inout.make_bytes(VRF_OUTPUT_CONTEXT);
        Ok(output.as_slice() == claimed_output.as_slice())
    }

    /// Stretch one VRF output into `num_words` independent words
    pub fn expand_words(output: &[u8], num_words: u32) -> Vec<RandomWord> {
        (0..num_words)
            .map(|index| {
                let mut hasher = Sha256::new();
                hasher.update(output);
                hasher.update(index.to_be_bytes());
                let digest = hasher.finalize();

                let mut word = [0u8; 16];
                word.copy_from_slice(&digest[..16]);
                RandomWord::from_be_bytes(word)
            })
            .collect()
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.keypair.public.to_bytes().to_vec()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }
}

fn decode_hex(what: &str, value: &str) -> Result<Vec<u8>, OracleError> {
    hex::decode(value)
        .map_err(|e| OracleError::MalformedProof(format!("Invalid {} hex: {}", what, e)))
}
