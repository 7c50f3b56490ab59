//! TeeGate CLI — inspect trusted-application identities and exercise the
//! session lifecycle against the simulated transport.
//!
//! Commands:
//!   teegate resolve <path>   — decode a trusted-application path
//!   teegate open <path>      — open an enclave session on the sim backend
//!   teegate demo             — walk the lifecycle, including a failed open

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use teegate_core::{
    Enclave, EnclaveKind, ErrorOrigin, HostCallFn, SimTransport, TaUuid, TeeStatus,
};

static HOST_CALLS: [HostCallFn; 1] = [echo];

fn echo(input: &[u8]) -> Vec<u8> {
    input.to_vec()
}

fn print_usage() {
    println!(
        r#"teegate — host-side TEE session lifecycle

Usage: teegate <command> [options]

Commands:
  resolve <path>   Decode a trusted-application path into its binary identity
  open <path>      Open an enclave session against the simulated transport
  demo             Walk the full lifecycle, including a failed session open

Examples:
  teegate resolve 12345678-1234-1234-1234-123456789abc.ta
  teegate open 12345678-1234-1234-1234-123456789abc.ta
  teegate demo
"#
    );
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let result = match args[1].as_str() {
        "resolve" => cmd_resolve(&args[2..]),
        "open" => cmd_open(&args[2..]),
        "demo" => cmd_demo(),
        other => {
            eprintln!("unknown command: {other}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_resolve(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.first().ok_or("resolve needs a trusted-application path")?;
    let uuid = TaUuid::from_path(path)?;

    println!("canonical: {uuid}");
    println!("time_low:            {:#010x}", uuid.time_low);
    println!("time_mid:            {:#06x}", uuid.time_mid);
    println!("time_hi_and_version: {:#06x}", uuid.time_hi_and_version);
    println!("clock_seq_and_node:  {}", hex::encode(uuid.clock_seq_and_node));
    Ok(())
}

fn cmd_open(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.first().ok_or("open needs a trusted-application path")?;

    let sim = Arc::new(SimTransport::new());
    let enclave = Enclave::create(sim, path, EnclaveKind::Optee, 0, None, &HOST_CALLS)?;
    println!("{}", serde_json::to_string_pretty(&enclave.status())?);
    Ok(())
}

fn cmd_demo() -> Result<(), Box<dyn std::error::Error>> {
    let path = "12345678-1234-1234-1234-123456789abc.ta";
    let sim = Arc::new(SimTransport::new());

    println!("-- opening a session against {path}");
    {
        let enclave = Enclave::create(
            sim.clone(),
            path,
            EnclaveKind::Optee,
            0,
            None,
            &HOST_CALLS,
        )?;
        println!("{}", serde_json::to_string_pretty(&enclave.status())?);
        // Dropping the handle releases session, then context.
    }

    println!("-- injecting a session-open failure to show the unwind");
    sim.fail_next_session_open(TeeStatus::ITEM_NOT_FOUND, ErrorOrigin::Tee);
    match Enclave::create(
        sim.clone(),
        path,
        EnclaveKind::Optee,
        0,
        None,
        &HOST_CALLS,
    ) {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("creation failed as injected: {err}"),
    }

    let counters = sim.counters();
    println!(
        "-- transport counters: contexts {}/{} sessions {}/{} (opened/released)",
        counters.contexts_opened,
        counters.contexts_finalized,
        counters.sessions_opened,
        counters.sessions_closed,
    );
    println!(
        "-- live contexts: {}, live sessions: {}",
        sim.live_contexts(),
        sim.live_sessions()
    );
    Ok(())
}
