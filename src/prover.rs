//! Proving engine port and the snarkjs adapter behind it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use crate::constants::withdraw_idx;
use crate::error::{PoolError, Result};
use crate::field::{field_hex, Fr};
use crate::hasher::Hasher;
use crate::withdrawal::WithdrawalInputs;
use crate::zk_verifier::solana_verifier::encode_verifier_payload;
use crate::zk_verifier::types::{public_signals_from_json, ProofArtifact, WithdrawPublicSignals};

/// Turns a withdrawal record into a proof plus the circuit's public signals
/// (in the order the circuit emits them).
pub trait ProvingEngine: Send + Sync {
    fn prove(&self, inputs: &WithdrawalInputs) -> Result<(ProofArtifact, Vec<Fr>)>;
}

pub const ENV_SNARKJS: &str = "PRIVACY_POOL_SNARKJS";
pub const ENV_WASM: &str = "PRIVACY_POOL_WASM";
pub const ENV_ZKEY: &str = "PRIVACY_POOL_ZKEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProverConfig {
    /// Program plus leading arguments, e.g. `["npx", "snarkjs"]`.
    pub snarkjs_cmd: Vec<String>,
    pub wasm_path: PathBuf,
    pub zkey_path: PathBuf,
}

impl ProverConfig {
    pub fn new(wasm_path: impl Into<PathBuf>, zkey_path: impl Into<PathBuf>) -> Self {
        Self {
            snarkjs_cmd: vec!["snarkjs".to_string()],
            wasm_path: wasm_path.into(),
            zkey_path: zkey_path.into(),
        }
    }

    /// `PRIVACY_POOL_WASM` and `PRIVACY_POOL_ZKEY` are required;
    /// `PRIVACY_POOL_SNARKJS` defaults to `snarkjs` and is split on whitespace.
    pub fn from_env() -> Result<Self> {
        let required = |key: &str| {
            env::var(key).map_err(|_| PoolError::invalid(format!("{key} is not set")))
        };
        let mut config = Self::new(required(ENV_WASM)?, required(ENV_ZKEY)?);
        if let Ok(cmd) = env::var(ENV_SNARKJS) {
            let parts: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            if parts.is_empty() {
                return Err(PoolError::invalid(format!("{ENV_SNARKJS} is empty")));
            }
            config.snarkjs_cmd = parts;
        }
        Ok(config)
    }

    /// Fail fast on missing circuit artifacts, before anything is spawned.
    pub fn preflight(&self) -> Result<()> {
        for (what, path) in [("wasm", &self.wasm_path), ("zkey", &self.zkey_path)] {
            if !path.is_file() {
                return Err(PoolError::ProvingFailed(format!(
                    "{what} not found at {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Runs `snarkjs groth16 fullprove` in a scratch directory per call.
#[derive(Debug, Clone)]
pub struct SnarkjsProver {
    config: ProverConfig,
}

impl SnarkjsProver {
    pub fn new(config: ProverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    fn run_fullprove(&self, input: &Path, proof: &Path, public: &Path) -> Result<()> {
        let (program, leading) = self
            .config
            .snarkjs_cmd
            .split_first()
            .ok_or_else(|| PoolError::invalid("empty snarkjs command"))?;

        let output = Command::new(program)
            .args(leading)
            .args(["groth16", "fullprove"])
            .arg(input)
            .arg(&self.config.wasm_path)
            .arg(&self.config.zkey_path)
            .arg(proof)
            .arg(public)
            .output()
            .map_err(|e| PoolError::ProvingFailed(format!("failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PoolError::ProvingFailed(format!(
                "snarkjs exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl ProvingEngine for SnarkjsProver {
    fn prove(&self, inputs: &WithdrawalInputs) -> Result<(ProofArtifact, Vec<Fr>)> {
        self.config.preflight()?;

        let dir = tempfile::Builder::new().prefix("withdraw_fullprove").tempdir()?;
        let input_path = dir.path().join("input.json");
        let proof_path = dir.path().join("proof.json");
        let public_path = dir.path().join("public.json");
        fs::write(&input_path, inputs.to_circuit_json()?)?;

        trace!("prover: fullprove in {}", dir.path().display());
        self.run_fullprove(&input_path, &proof_path, &public_path)?;

        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|e| {
                PoolError::ProvingFailed(format!("snarkjs produced no {}: {e}", path.display()))
            })
        };
        let artifact = ProofArtifact::from_snarkjs_json(&read(&proof_path)?)?;
        let signals = public_signals_from_json(&read(&public_path)?)?;
        Ok((artifact, signals))
    }
}

/// A proof whose signals matched the record it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenWithdrawal {
    pub artifact: ProofArtifact,
    pub signals: WithdrawPublicSignals,
}

impl ProvenWithdrawal {
    /// Instruction bytes for the on-chain verifier.
    pub fn payload(&self) -> Result<Vec<u8>> {
        encode_verifier_payload(&self.artifact, &self.signals.to_vec())
    }
}

const SIGNAL_NAMES: [&str; 8] = [
    "withdrawnValue",
    "stateRoot",
    "stateTreeDepth",
    "ASPRoot",
    "ASPTreeDepth",
    "context",
    "newCommitmentHash",
    "existingNullifierHash",
];

/// Prove one withdrawal and check the engine's signals against the record.
pub fn prove_withdrawal<E, H>(
    engine: &E,
    hasher: &H,
    inputs: &WithdrawalInputs,
) -> Result<ProvenWithdrawal>
where
    E: ProvingEngine + ?Sized,
    H: Hasher + ?Sized,
{
    let expected = inputs.expected_public_signals(hasher)?;
    let (artifact, raw) = engine.prove(inputs)?;
    let signals = WithdrawPublicSignals::from_signals(&raw)
        .map_err(|e| PoolError::ProvingFailed(format!("engine output: {e}")))?;

    for (i, (got, want)) in signals.to_vec().iter().zip(expected.to_vec()).enumerate() {
        if *got == want {
            continue;
        }
        if i == withdraw_idx::STATE_ROOT || i == withdraw_idx::ASP_ROOT {
            return Err(PoolError::RootMismatch {
                expected: field_hex(&want),
                computed: field_hex(got),
            });
        }
        return Err(PoolError::ProvingFailed(format!(
            "{} mismatch: expected {}, engine returned {}",
            SIGNAL_NAMES[i],
            field_hex(&want),
            field_hex(got)
        )));
    }

    trace!("prover: withdrawal of {} proven", inputs.withdrawn_value);
    Ok(ProvenWithdrawal { artifact, signals })
}

/// One scoped worker per record; results keep the input order.
pub fn prove_withdrawals_parallel<E, H>(
    engine: &E,
    hasher: &H,
    records: &[WithdrawalInputs],
) -> Vec<Result<ProvenWithdrawal>>
where
    E: ProvingEngine + ?Sized,
    H: Hasher + ?Sized,
{
    thread::scope(|s| {
        let handles: Vec<_> = records
            .iter()
            .map(|record| s.spawn(move || prove_withdrawal(engine, hasher, record)))
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    Err(PoolError::ProvingFailed("prover thread panicked".into()))
                })
            })
            .collect()
    })
}
