// Demo driver: producers and consumers sharing one bounded queue until a
// deadline or Ctrl+C, then the canonical drain-and-stop shutdown.
//
// Usage: boundq_demo [--capacity N] [--producers N] [--consumers N]
//                    [--timeout-secs N] [--max-jitter-ms N]

use anyhow::{bail, Context, Result};
use boundq::{telemetry, Message, SupervisorBuilder};
use sha2::{Digest, Sha256};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const CAPACITY: usize = 10;
const NUM_WORKERS: usize = 1;
const TIMEOUT_SECS: u64 = 20;
const PRODUCER_JITTER_MS: u64 = 300;
const CONSUMER_JITTER_MS: u64 = 500;

#[derive(Debug)]
struct DemoArgs {
    capacity: usize,
    producers: usize,
    consumers: usize,
    timeout: Duration,
    producer_jitter: Duration,
    consumer_jitter: Duration,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            capacity: CAPACITY,
            producers: NUM_WORKERS,
            consumers: NUM_WORKERS,
            timeout: Duration::from_secs(TIMEOUT_SECS),
            producer_jitter: Duration::from_millis(PRODUCER_JITTER_MS),
            consumer_jitter: Duration::from_millis(CONSUMER_JITTER_MS),
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<DemoArgs> {
    let mut parsed = DemoArgs::default();

    while let Some(flag) = args.next() {
        let value = args
            .next()
            .with_context(|| format!("missing value for {flag}"))?;
        let number: u64 = value
            .parse()
            .with_context(|| format!("invalid value for {flag}: {value}"))?;
        match flag.as_str() {
            "--capacity" => parsed.capacity = to_usize(&flag, number)?,
            "--producers" => parsed.producers = to_usize(&flag, number)?,
            "--consumers" => parsed.consumers = to_usize(&flag, number)?,
            "--timeout-secs" => parsed.timeout = Duration::from_secs(number),
            "--max-jitter-ms" => {
                // Consumers pace slower than producers.
                parsed.producer_jitter = Duration::from_millis(number);
                parsed.consumer_jitter = Duration::from_millis(number.saturating_mul(5) / 3);
            }
            other => bail!("unknown flag {other}"),
        }
    }
    Ok(parsed)
}

fn to_usize(flag: &str, number: u64) -> Result<usize> {
    usize::try_from(number).with_context(|| format!("value for {flag} out of range: {number}"))
}

fn digest(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Payload format: "message_<producer>_<n>:<sha256 of the part before ':'>"
fn make_payload(producer_id: u32, n: u64) -> Vec<u8> {
    let body = format!("message_{producer_id}_{n}");
    let hash = digest(&body);
    format!("{body}:{hash}").into_bytes()
}

fn verify_payload(payload: &[u8]) -> bool {
    let text = String::from_utf8_lossy(payload);
    match text.split_once(':') {
        Some((body, hash)) => digest(body) == hash,
        None => false,
    }
}

fn main() -> Result<()> {
    if let Err(e) = telemetry::init_logging() {
        eprintln!("logging already initialised: {e}");
    }

    let args = parse_args(env::args().skip(1))?;
    info!(
        capacity = args.capacity,
        producers = args.producers,
        consumers = args.consumers,
        timeout_secs = args.timeout.as_secs(),
        "starting demo"
    );

    let supervisor = SupervisorBuilder::new()
        .with_capacity(args.capacity)
        .with_producers(args.producers)
        .with_consumers(args.consumers)
        .with_timeout(args.timeout)
        .with_producer_pacing(args.producer_jitter)
        .with_consumer_pacing(args.consumer_jitter)
        .build::<Message>()?;

    // Handle Ctrl+C by firing the shutdown token early
    let token = supervisor.token().clone();
    ctrlc::set_handler(move || {
        if token.cancel() {
            eprintln!("interrupt received, shutting down");
        }
    })
    .context("error setting Ctrl+C handler")?;

    let corrupted = Arc::new(AtomicU64::new(0));

    let running = supervisor.spawn(
        |producer_id| {
            move |n: u64| Some(Message::from_producer(producer_id, n, make_payload(producer_id, n)))
        },
        |consumer_id| {
            let corrupted = Arc::clone(&corrupted);
            move |msg: Message| {
                if verify_payload(msg.payload()) {
                    info!(
                        consumer_id,
                        producer_id = msg.producer_id(),
                        message_id = msg.id(),
                        "message received"
                    );
                } else {
                    warn!(consumer_id, message_id = msg.id(), "payload digest mismatch");
                    corrupted.fetch_add(1, Ordering::Relaxed);
                }
            }
        },
    )?;

    let report = running.shutdown()?;
    let corrupted = corrupted.load(Ordering::Relaxed);

    info!(
        reason = %report.reason,
        produced = report.produced(),
        consumed = report.consumed(),
        corrupted,
        "demo finished"
    );

    if !report.is_lossless() || corrupted > 0 {
        bail!(
            "lost or corrupted messages: produced {}, consumed {}, corrupted {}",
            report.produced(),
            report.consumed(),
            corrupted
        );
    }
    Ok(())
}
