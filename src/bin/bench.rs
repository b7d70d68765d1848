//! Batch similarity benchmark driver.
//!
//! Builds a probe container and a reference container, runs the four batched
//! set-operation-count kernels through the host backend (serial and parallel)
//! and the device backend, checks that all three agree elementwise, and
//! reports timings.

use std::time::Instant;

use clap::Parser;
use densebit::{batch, Bitset, BitsetPack, DeviceOptions, SetOp, MAX_WORKERS};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "densebit-bench")]
#[command(about = "Benchmark the batched set-operation-count kernels")]
struct Cli {
    /// Element capacity in bits (at least 128)
    nbits: usize,

    /// Number of probe bitsets
    nprobes: usize,

    /// Number of reference bitsets
    nrefs: usize,

    /// Maximum worker count for the host backend (at most 1024)
    workers: usize,
}

fn validate(cli: &Cli) -> Result<(), String> {
    if cli.nbits < 128 {
        return Err(format!("element capacity must be at least 128 bits, got {}", cli.nbits));
    }
    if cli.nprobes == 0 || cli.nrefs == 0 {
        return Err("probe and reference counts must be positive".into());
    }
    if cli.workers == 0 || cli.workers > MAX_WORKERS {
        return Err(format!("worker count must be in 1..={MAX_WORKERS}, got {}", cli.workers));
    }
    Ok(())
}

/// Probe pattern: a long prefix run plus a per-slot marker bit.
fn build_probes(nbits: usize, nelem: usize) -> BitsetPack {
    let mut pack = BitsetPack::new(nbits, nelem);
    let mut template = Bitset::new(nbits);
    template.set_range(0, nbits / 2);
    for i in 0..nelem {
        let mut b = template.clone();
        b.set(i % nbits);
        pack.put(i, &b);
    }
    pack
}

/// Reference pattern: a narrow band in the middle of the element.
fn build_refs(nbits: usize, nelem: usize) -> BitsetPack {
    let mut pack = BitsetPack::new(nbits, nelem);
    let lo = nbits / 2 - 5;
    let mut template = Bitset::new(nbits);
    template.set_range(lo, lo + 9);
    for i in 0..nelem {
        pack.put(i, &template);
    }
    pack
}

fn checksum(counts: &[i32]) -> i64 {
    counts.iter().map(|&c| i64::from(c)).sum()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    validate(&cli).map_err(|msg| -> Box<dyn std::error::Error> { msg.into() })?;

    println!(
        "{} probes x {} refs, {} bits/element, host workers <= {}",
        cli.nprobes, cli.nrefs, cli.nbits, cli.workers
    );

    let probes = build_probes(cli.nbits, cli.nprobes);
    let refs = build_refs(cli.nbits, cli.nrefs);

    for op in SetOp::ALL {
        let start = Instant::now();
        let serial = batch::host::count_matrix(op, &probes, &refs, 1);
        let serial_time = start.elapsed();

        let start = Instant::now();
        let parallel = batch::host::count_matrix(op, &probes, &refs, cli.workers as i32);
        let parallel_time = start.elapsed();

        let opts = DeviceOptions {
            release_first: true,
            release_second: true,
            release_counts: true,
            ..DeviceOptions::default()
        };
        let start = Instant::now();
        let device = batch::device::count_matrix(op, &probes, &refs, &opts);
        let device_time = start.elapsed();

        assert_eq!(serial, parallel, "host worker counts disagree for {}", op.name());
        assert_eq!(serial, device, "host and device disagree for {}", op.name());

        println!(
            "{:<20} host(1): {:>10.3?}  host({}): {:>10.3?}  device: {:>10.3?}  checksum: {}",
            op.name(),
            serial_time,
            cli.workers,
            parallel_time,
            device_time,
            checksum(&serial)
        );
    }

    Ok(())
}
