// src/scheduler.rs
//! Run-forever loop. Runs are strictly sequential: the ticker only advances
//! after the previous run returns, so two runs can never overlap a write.
//! Shutdown abandons any in-flight run; persistence is the final step of a
//! run, so an abandoned run simply never reaches it.

use anyhow::Result;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::PipelineConfig;
use crate::ingest::providers_from_config;
use crate::insight::reasoning::DynReasoningClient;
use crate::insight::ThreadRngJitter;
use crate::pipeline;

pub async fn run_forever(
    cfg: PipelineConfig,
    reasoning: DynReasoningClient,
    limit: Option<usize>,
) -> Result<()> {
    let providers = providers_from_config(&cfg.sources, &cfg.fetch)?;

    let mut ticker = interval(Duration::from_secs(cfg.schedule.interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut jitter = ThreadRngJitter;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown signal, stopping scheduler");
                return Ok(());
            }
            _ = ticker.tick() => {
                let run = pipeline::run_once(
                    &cfg,
                    providers.clone(),
                    reasoning.as_ref(),
                    &mut jitter,
                    limit,
                );
                tokio::select! {
                    _ = &mut shutdown => {
                        tracing::info!("shutdown mid-run, abandoned before persist");
                        return Ok(());
                    }
                    res = run => {
                        if let Err(e) = res {
                            // Old snapshot stays in place; next tick retries.
                            tracing::error!(error = ?e, "run failed");
                        }
                    }
                }
            }
        }
    }
}
