//! Facekey CLI
//!
//! Enrolls or verifies an identity against a credential service. The
//! embedding model is external, so the binary runs the protocol on mock
//! camera input with the synthetic stand-in embedder.

use clap::{Parser, Subcommand};
use facekey::{
    capture::MockCamera,
    config::FileConfig,
    embedding::SyntheticEmbedder,
    extractor::SampleLockExtractor,
    flow::{EnrollmentFlow, FlowError, VerificationFlow, VerificationOutcome},
    service::{CredentialService, HttpCredentialService, InMemoryCredentialService},
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "facekey", version, about = "Face-derived key enrollment and verification")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Credential service base URL (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enroll an identity from a fresh capture
    Enroll {
        #[arg(long)]
        identity: String,
    },
    /// Verify an identity against a fresh capture
    Verify {
        #[arg(long)]
        identity: String,
    },
    /// Enroll, then verify, against an in-process credential service
    Demo {
        #[arg(long)]
        identity: String,
    },
}

/// Exit status for a failed flow.
fn failure_code(err: &FlowError) -> ExitCode {
    if err.is_recoverable() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Facekey v{}", facekey::VERSION);

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::from(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(url) = &cli.server {
        config.service.base_url = url.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::from(1);
    }

    let extractor = match SampleLockExtractor::new(config.extractor_params()) {
        Ok(extractor) => extractor,
        Err(e) => {
            eprintln!("Failed to set up extractor: {}", e);
            return ExitCode::from(1);
        }
    };
    info!(
        lockers = extractor.locker_count(),
        tolerance_bits = config.flow.extractor_tolerance_bits,
        "Extractor ready"
    );

    match &cli.command {
        Command::Demo { identity } => run_demo(&config, &extractor, identity),
        Command::Enroll { identity } => {
            let service = match http_service(&config) {
                Ok(service) => service,
                Err(code) => return code,
            };
            match run_enroll(&config, &extractor, &service, identity) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Enrollment failed: {}", e);
                    failure_code(&e)
                }
            }
        }
        Command::Verify { identity } => match http_service(&config) {
            Ok(service) => run_verify(&config, &extractor, &service, identity),
            Err(code) => code,
        },
    }
}

fn http_service(config: &FileConfig) -> Result<HttpCredentialService, ExitCode> {
    match HttpCredentialService::new(&config.service) {
        Ok(service) => {
            info!(base_url = service.base_url(), "Using credential service");
            Ok(service)
        }
        Err(e) => {
            eprintln!("Failed to create service client: {}", e);
            Err(ExitCode::from(1))
        }
    }
}

/// Enrolls and verifies in one process against an in-memory service.
fn run_demo(config: &FileConfig, extractor: &SampleLockExtractor, identity: &str) -> ExitCode {
    let service = InMemoryCredentialService::new();
    info!("Running against an in-memory credential service");
    if let Err(e) = run_enroll(config, extractor, &service, identity) {
        error!("Enrollment failed: {}", e);
        return failure_code(&e);
    }
    run_verify(config, extractor, &service, identity)
}

fn run_enroll<S: CredentialService>(
    config: &FileConfig,
    extractor: &SampleLockExtractor,
    service: S,
    identity: &str,
) -> Result<(), FlowError> {
    let embedder = SyntheticEmbedder::standing_in_for(
        config.flow.embedding_model_id.as_str(),
        config.flow.bitstring_length,
    );
    let mut flow = EnrollmentFlow::new(
        config.flow.clone(),
        MockCamera::new(),
        embedder,
        extractor,
        service,
    )?
    .with_capture_config(config.capture.clone());

    let outcome = flow.enroll(identity)?;
    println!("Enrolled '{}': {}", outcome.identity, outcome.ack.status);
    if let Some(message) = &outcome.ack.message {
        println!("  {}", message);
    }
    Ok(())
}

fn run_verify<S: CredentialService>(
    config: &FileConfig,
    extractor: &SampleLockExtractor,
    service: S,
    identity: &str,
) -> ExitCode {
    let embedder = SyntheticEmbedder::standing_in_for(
        config.flow.embedding_model_id.as_str(),
        config.flow.bitstring_length,
    );
    let result = VerificationFlow::new(
        config.flow.clone(),
        MockCamera::new(),
        embedder,
        extractor,
        service,
    )
    .map(|flow| flow.with_capture_config(config.capture.clone()))
    .and_then(|mut flow| flow.verify(identity));

    match result {
        Ok(VerificationOutcome::Verified) => {
            println!("Verified '{}'", identity);
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            warn!(identity, %outcome, "Verification did not succeed");
            println!("Not verified: {}", outcome);
            ExitCode::from(3)
        }
        Err(e) => {
            error!("Verification failed: {}", e);
            failure_code(&e)
        }
    }
}
