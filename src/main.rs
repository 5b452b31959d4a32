//! Espresso - headless debug session driver
//!
//! Runs synthetic cores against the debug controller and walks through a
//! pre-launch stop and a breakpoint stop over an in-process debugger link.
//!
//! Usage: `espresso [breakpoint-address]`

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam::channel::Receiver;
use es_core::config::Config;
use es_core::cpu_debug;
use es_debug::{ChannelTransport, Debugger, ExecutionHook, Notification, NullWaker};

/// Entry point of core 0's synthetic program
const ENTRY_POINT: u32 = 0x0200_0000;
/// Distance between the programs of consecutive cores
const CORE_STRIDE: u32 = 0x0001_0000;
/// Instructions in each synthetic program loop
const PROGRAM_LENGTH: u32 = 0x40;
/// Most cores whose programs fit between `ENTRY_POINT` and the end of the
/// address space
const MAX_CORE_COUNT: usize = 256;
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    es_core::logging::init(&config);

    let breakpoint = match env::args().nth(1) {
        Some(arg) => parse_address(&arg)?,
        None => ENTRY_POINT + 0x20,
    };
    // Only core 0 can reach the breakpoint, so exactly one hit is reported
    let program = ENTRY_POINT..ENTRY_POINT + PROGRAM_LENGTH * 4;
    if !program.contains(&breakpoint) || breakpoint % 4 != 0 {
        bail!(
            "Breakpoint 0x{:08x} is not an instruction of core 0 (0x{:08x}..0x{:08x})",
            breakpoint,
            program.start,
            program.end
        );
    }

    let core_count = check_core_count(config.cpu.core_count)?;
    tracing::info!("Starting espresso with {} cores", core_count);

    let (transport, notifications) = ChannelTransport::new();
    let debugger = Arc::new(Debugger::new(
        core_count,
        Arc::new(transport),
        Arc::new(NullWaker),
    ));
    if !debugger.initialise(&config.debugger)? {
        bail!("Debugger link unavailable");
    }
    debugger.add_breakpoint(breakpoint, 1);

    let running = Arc::new(AtomicBool::new(true));
    let cores = (0..core_count as u32)
        .map(|core_id| spawn_core(&debugger, core_id, &running))
        .collect::<Result<Vec<_>>>()?;

    let notification = next_notification(&notifications)?;
    println!("Debugger: {}", notification);
    debugger.resume();

    let notification = next_notification(&notifications)?;
    println!("Debugger: {}", notification);

    debugger.remove_breakpoint(breakpoint);
    running.store(false, Ordering::Release);
    debugger.resume();

    for (core_id, core) in cores.into_iter().enumerate() {
        let executed = core.join().map_err(|_| anyhow!("Core {} panicked", core_id))?;
        println!("Core {} executed {} instructions", core_id, executed);
    }

    debugger.shutdown();
    tracing::info!("Session finished");
    Ok(())
}

fn check_core_count(core_count: usize) -> Result<usize> {
    if core_count == 0 {
        bail!("At least one core is required");
    }
    if core_count > MAX_CORE_COUNT {
        bail!(
            "Too many cores: {} (at most {} are supported)",
            core_count,
            MAX_CORE_COUNT
        );
    }
    Ok(core_count)
}

/// Address of the first instruction of `core_id`'s program
fn program_base(core_id: u32) -> u32 {
    ENTRY_POINT + core_id * CORE_STRIDE
}

fn parse_address(arg: &str) -> Result<u32> {
    let digits = arg.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).with_context(|| format!("Invalid address '{}'", arg))
}

fn next_notification(notifications: &Receiver<Notification>) -> Result<Notification> {
    notifications
        .recv_timeout(NOTIFY_TIMEOUT)
        .context("Timed out waiting for the debugger")
}

fn spawn_core(
    debugger: &Arc<Debugger>,
    core_id: u32,
    running: &Arc<AtomicBool>,
) -> Result<JoinHandle<u64>> {
    let debugger = Arc::clone(debugger);
    let running = Arc::clone(running);

    thread::Builder::new()
        .name(format!("core{}", core_id))
        .spawn(move || run_core(&debugger, core_id, &running))
        .with_context(|| format!("Failed to spawn core {}", core_id))
}

/// Step through a looping synthetic program, calling the checkpoint hook
/// before every instruction
fn run_core(debugger: &Debugger, core_id: u32, running: &AtomicBool) -> u64 {
    if core_id == 0 {
        debugger.on_pre_launch(core_id);
    }

    let base = program_base(core_id);
    let end = base + PROGRAM_LENGTH * 4;
    let mut pc = base;
    let mut executed = 0u64;

    while running.load(Ordering::Acquire) {
        debugger.on_checkpoint(pc, core_id);
        executed += 1;
        pc = if pc + 4 >= end { base } else { pc + 4 };
    }

    cpu_debug!("Core {} stopped at 0x{:08x}", core_id, pc);
    executed
}
