//! Solvency CLI - Command-line tool for proof-of-solvency epochs
//!
//! This tool provides commands for:
//! - Committing a liabilities file to a Merkle root
//! - Issuing and verifying per-user inclusion proofs
//! - Comparing reserves against liabilities
//! - Running an off-chain session end to end (stress demo)
//! - Publishing an epoch report from liabilities and a reserve snapshot
//!
//! Liabilities files are either a JSON list of `{ "userId", "amount" }` or a
//! two-column `userId,amount` CSV (chosen by the `.csv` extension).

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use solvency_channel::{Allocations, ChannelConfig, LocalAnchor, SessionManager};
use solvency_evaluator::{
    CommitmentOnlyProver, EpochReport, ReportBuilder, ReserveSnapshot, SolvencyEvaluator,
};
use solvency_merkle::{LiabilityLedger, LiabilitySnapshot, SerializableInclusionProof};
use solvency_primitives::{Amount, Digest, UserId};

use crate::logging::LogLevel;

/// Smallest random delta of the session demo (0.01 ETH in wei)
const DEMO_MIN_DELTA_WEI: u64 = 10_000_000_000_000_000;
/// Upper bound (exclusive) of the session demo delta (0.05 ETH in wei)
const DEMO_MAX_DELTA_WEI: u64 = 50_000_000_000_000_000;

/// Solvency - liability commitments, inclusion proofs and solvency reports
#[derive(Parser)]
#[command(name = "solvency")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Commit liabilities, issue inclusion proofs and publish solvency reports",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the liabilities tree and print its commitment
    BuildTree {
        /// Liabilities file (JSON or CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Epoch identifier recorded in the commitment
        #[arg(short, long)]
        epoch: String,

        /// Output file for the commitment JSON (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Issue an inclusion proof for one user
    ProveInclusion {
        /// Liabilities file (JSON or CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// User id to prove
        #[arg(short, long)]
        user: String,

        /// Output file for the proof JSON (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify an inclusion proof against a published root
    VerifyInclusion {
        /// Path to the proof JSON
        #[arg(short = 'f', long)]
        proof: PathBuf,

        /// Expected root (0x-prefixed hex)
        #[arg(short, long, conflicts_with = "report", required_unless_present = "report")]
        root: Option<String>,

        /// Epoch report whose liabilities root is expected
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compare a reserves total against a liabilities total
    Evaluate {
        /// Reserves total (decimal integer, smallest unit)
        #[arg(short, long)]
        reserves: String,

        /// Liabilities total (decimal integer, smallest unit)
        #[arg(short, long)]
        liabilities: String,
    },

    /// Run a session end to end: random updates, close, settle, export, evaluate
    SessionDemo {
        /// Number of random balance updates
        #[arg(short = 'n', long, default_value = "10")]
        num_updates: usize,

        /// Session participants
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_value = "user_alice,user_bob,user_charlie"
        )]
        participants: Vec<String>,

        /// Reserves total to evaluate against (decimal wei)
        #[arg(short, long, default_value = "1000000000000000000")]
        reserves: String,

        /// Epoch identifier for the resulting report
        #[arg(short, long, default_value = "demo")]
        epoch: String,

        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Build an epoch report from liabilities and a reserve snapshot
    Publish {
        /// Liabilities file (JSON or CSV)
        #[arg(short, long)]
        liabilities: PathBuf,

        /// Reserve snapshot JSON from the scanner
        #[arg(short, long)]
        reserves: PathBuf,

        /// Output file for the report JSON (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip proof generation
        #[arg(long)]
        no_proof: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::try_init(LogLevel::from_verbosity(cli.verbose))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::BuildTree {
            input,
            epoch,
            output,
        } => build_tree(input, epoch, output),

        Commands::ProveInclusion {
            input,
            user,
            output,
        } => prove_inclusion(input, user, output),

        Commands::VerifyInclusion {
            proof,
            root,
            report,
        } => verify_inclusion(proof, root, report),

        Commands::Evaluate {
            reserves,
            liabilities,
        } => evaluate(reserves, liabilities),

        Commands::SessionDemo {
            num_updates,
            participants,
            reserves,
            epoch,
            seed,
        } => session_demo(num_updates, participants, reserves, epoch, seed),

        Commands::Publish {
            liabilities,
            reserves,
            output,
            no_proof,
        } => publish(liabilities, reserves, output, no_proof),
    }
}

fn load_ledger(path: &Path) -> Result<LiabilityLedger> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read liabilities file: {}", path.display()))?;

    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let snapshot = if is_csv {
        LiabilitySnapshot::from_csv(&contents)
    } else {
        LiabilitySnapshot::from_json(&contents)
    }
    .with_context(|| format!("Failed to parse liabilities file: {}", path.display()))?;

    debug!(
        path = %path.display(),
        entries = snapshot.entries.len(),
        csv = is_csv,
        "loaded liability snapshot"
    );
    snapshot
        .into_ledger()
        .with_context(|| format!("Invalid liabilities in {}", path.display()))
}

fn write_output(json: &str, output: Option<PathBuf>, what: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!(path = %path.display(), bytes = json.len(), "{} written", what);
            eprintln!("{} written to: {}", what, path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn build_tree(input: PathBuf, epoch: String, output: Option<PathBuf>) -> Result<()> {
    let ledger = load_ledger(&input)?;

    eprintln!("Building liabilities tree...");
    eprintln!("  Users: {}", ledger.len());

    let start = Instant::now();
    let commitment = ledger
        .commit(epoch)
        .context("Failed to build liabilities tree")?;
    let elapsed = start.elapsed();

    eprintln!("Tree built in {:?}", elapsed);
    eprintln!("  Root: {}", commitment.root);
    eprintln!("  Total: {}", commitment.total);

    let json = serde_json::to_string_pretty(&commitment)?;
    write_output(&json, output, "Commitment")
}

fn prove_inclusion(input: PathBuf, user: String, output: Option<PathBuf>) -> Result<()> {
    let ledger = load_ledger(&input)?;
    let tree = ledger
        .build_tree()
        .context("Failed to build liabilities tree")?;

    let proof = tree
        .prove_inclusion(&UserId::from(user.as_str()))
        .with_context(|| format!("Cannot prove inclusion for '{}'", user))?;

    eprintln!("Inclusion proof issued");
    eprintln!("  User: {}", user);
    eprintln!("  Leaf: {} of {}", proof.leaf_index, proof.leaf_count);
    eprintln!("  Root: {}", proof.root);

    let json = SerializableInclusionProof::from(&proof).to_json()?;
    write_output(&json, output, "Proof")
}

fn verify_inclusion(
    proof_path: PathBuf,
    root: Option<String>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let proof_str = fs::read_to_string(&proof_path)
        .with_context(|| format!("Failed to read proof file: {}", proof_path.display()))?;
    let wire = SerializableInclusionProof::from_json(&proof_str)
        .with_context(|| "Failed to parse inclusion proof JSON")?;

    let expected_root = match (root, report_path) {
        (Some(hex), _) => {
            Digest::from_hex(&hex).with_context(|| format!("Invalid root: {}", hex))?
        }
        (None, Some(path)) => {
            let report_str = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read report file: {}", path.display()))?;
            EpochReport::from_json(&report_str)
                .with_context(|| "Failed to parse epoch report JSON")?
                .liabilities
                .root
        }
        (None, None) => anyhow::bail!("Either --root or --report is required"),
    };

    eprintln!("Verifying inclusion proof...");
    eprintln!("  User: {}", wire.user_id);
    eprintln!("  Amount: {}", wire.amount);
    eprintln!("  Expected root: {}", expected_root);

    let valid = match wire.into_proof() {
        Ok(proof) => proof.verify(&expected_root),
        Err(e) => {
            eprintln!("  Malformed proof: {}", e);
            false
        }
    };

    if valid {
        eprintln!("Proof VALID");
        println!("VALID");
        Ok(())
    } else {
        eprintln!("Proof INVALID");
        println!("INVALID");
        std::process::exit(1);
    }
}

fn evaluate(reserves: String, liabilities: String) -> Result<()> {
    let result = SolvencyEvaluator::new()
        .evaluate_decimal(&reserves, &liabilities)
        .context("Failed to evaluate solvency")?;

    if result.is_solvent {
        eprintln!("SOLVENT (surplus {})", result.surplus);
    } else {
        eprintln!("INSOLVENT (deficit {})", result.deficit().unwrap_or_default());
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn session_demo(
    num_updates: usize,
    participants: Vec<String>,
    reserves: String,
    epoch: String,
    seed: Option<u64>,
) -> Result<()> {
    let reserves = Amount::parse_decimal(&reserves).context("Invalid reserves total")?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!("Session Demo");
    println!("============");
    println!("Participants: {}", participants.join(", "));
    println!("Updates: {}", num_updates);
    println!();

    let manager = SessionManager::in_memory(ChannelConfig::default());
    let session = manager
        .create_session(participants.iter().map(String::as_str))
        .context("Failed to create session")?;
    let id = session.id();
    println!("Session {} opened", id);
    println!("  Channel: {}", session.channel_id());

    let start = Instant::now();
    let mut balances: Vec<Amount> = vec![Amount::zero(); participants.len()];
    for i in 0..num_updates {
        let slot = rng.gen_range(0..participants.len());
        let delta = rng.gen_range(DEMO_MIN_DELTA_WEI..DEMO_MAX_DELTA_WEI);
        balances[slot] += &Amount::from(delta);

        let partial: Allocations = [(
            UserId::from(participants[slot].as_str()),
            balances[slot].to_signed(),
        )]
        .into_iter()
        .collect();
        let updated = manager
            .update_allocations(&id, &partial)
            .with_context(|| format!("Update {} failed", i + 1))?;
        debug!(session_id = %id, nonce = updated.nonce(), "applied demo update");
        println!(
            "  [{:>3}] {} += {} (nonce {})",
            i + 1,
            participants[slot],
            delta,
            updated.nonce()
        );
    }
    let update_time = start.elapsed();

    let settled = manager
        .close_and_settle(&id, &LocalAnchor::new())
        .context("Failed to close and settle session")?;
    info!(
        session_id = %id,
        nonce = settled.nonce(),
        updates = num_updates,
        elapsed_ms = update_time.as_millis() as u64,
        "demo session settled"
    );
    println!();
    println!("Session settled");
    println!("  Nonce: {}", settled.nonce());
    println!("  State hash: {}", settled.state_hash());
    if let Some(reference) = settled.settlement_ref() {
        println!("  Settlement: {}", reference.tx_ref);
    }

    let ledger = manager
        .export_to_ledger(&id)
        .context("Failed to export session allocations")?;
    let commitment = ledger.commit(epoch).context("Failed to commit liabilities")?;

    let prover = CommitmentOnlyProver::new();
    let report = ReportBuilder::new(commitment)
        .reserves_total(reserves)
        .prover(&prover)
        .build()
        .context("Failed to build epoch report")?;

    let tree = ledger.build_tree()?;
    let mut verified = 0;
    for leaf in tree.leaves() {
        let proof = tree.prove_inclusion(leaf.key())?;
        if report.verify_inclusion(&proof) {
            verified += 1;
        }
    }

    println!();
    println!("Summary");
    println!("=======");
    println!("Update time: {:?}", update_time);
    println!("Liabilities root: {}", report.liabilities.root);
    println!("Liabilities total: {}", report.liabilities.total);
    println!("Reserves total: {}", report.reserves_total);
    println!(
        "Solvent: {} (surplus {})",
        report.solvency.is_solvent, report.solvency.surplus
    );
    println!("Inclusion proofs verified: {}/{}", verified, tree.leaf_count());
    println!(
        "Proof: {}",
        report
            .proof
            .as_ref()
            .map(|p| p.system.as_str())
            .unwrap_or("none")
    );

    Ok(())
}

fn publish(
    liabilities_path: PathBuf,
    reserves_path: PathBuf,
    output: Option<PathBuf>,
    no_proof: bool,
) -> Result<()> {
    let ledger = load_ledger(&liabilities_path)?;
    let reserves_str = fs::read_to_string(&reserves_path)
        .with_context(|| format!("Failed to read reserves file: {}", reserves_path.display()))?;
    let snapshot = ReserveSnapshot::from_json(&reserves_str)
        .with_context(|| "Failed to parse reserve snapshot JSON")?;

    eprintln!("Publishing epoch {}...", snapshot.epoch_id);
    eprintln!("  Users: {}", ledger.len());
    eprintln!("  Reserve addresses: {}", snapshot.addresses.len());

    let commitment = ledger
        .commit(snapshot.epoch_id.clone())
        .context("Failed to commit liabilities")?;

    let prover = CommitmentOnlyProver::new();
    let mut builder = ReportBuilder::new(commitment)
        .reserves(&snapshot)
        .context("Reserve snapshot rejected")?;
    if !no_proof {
        builder = builder.prover(&prover);
    }
    let report = builder.build().context("Failed to build epoch report")?;
    info!(
        epoch_id = %report.epoch_id,
        root = %report.liabilities.root,
        solvent = report.solvency.is_solvent,
        proof = report.proof.is_some(),
        "epoch report built"
    );

    eprintln!("  Root: {}", report.liabilities.root);
    eprintln!(
        "  {} (reserves {}, liabilities {})",
        if report.solvency.is_solvent {
            "SOLVENT"
        } else {
            "INSOLVENT"
        },
        report.reserves_total,
        report.liabilities.total
    );

    let json = report.to_json()?;
    write_output(&json, output, "Report")
}
