//! Sleep-based demonstration workload
//!
//! `a` sleeps one unit, `b` two units, `choose` calls one of them at random
//! and `run` calls `choose` five times. Every function is wrapped by the
//! given timer under its own name.

use crate::error::Result;
use crate::timer::Timer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Number of `choose` calls per `run`
pub const CHOICES_PER_RUN: usize = 5;

/// Label used for block timings of `run`
pub const BLOCK_LABEL: &str = "sample_block";

/// How much of the workload to execute
#[derive(Debug, Clone, Copy)]
pub struct DemoPlan {
    /// Direct calls of the wrapped `run`
    pub runs: u32,
    /// Block timings, each calling `run` once
    pub blocks: u32,
    /// Sleep length of `a`; `b` sleeps twice as long
    pub unit: Duration,
    pub seed: u64,
}

/// Build the wrapped `run` function
pub fn build_run(timer: &Timer, unit: Duration, seed: u64) -> impl Fn(()) {
    let a = timer.wrap("a", move |_: ()| thread::sleep(unit));
    let b = timer.wrap("b", move |_: ()| thread::sleep(unit * 2));

    let rng = RefCell::new(StdRng::seed_from_u64(seed));
    let choose = timer.wrap("choose", move |_: ()| {
        let roll = rng.borrow_mut().gen_range(1..=100);
        if roll < 51 {
            a(())
        } else {
            b(())
        }
    });

    timer.wrap("run", move |_: ()| {
        for _ in 0..CHOICES_PER_RUN {
            choose(())
        }
    })
}

/// Execute the plan, then write a final report
pub fn run_demo(timer: &Timer, plan: &DemoPlan) -> Result<()> {
    let run = build_run(timer, plan.unit, plan.seed);

    info!(runs = plan.runs, blocks = plan.blocks, "starting demo workload");
    for _ in 0..plan.runs {
        run(());
    }
    for _ in 0..plan.blocks {
        timer.time_block(BLOCK_LABEL, || run(()))?;
    }

    timer.show_times()
}
