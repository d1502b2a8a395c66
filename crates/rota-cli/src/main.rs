use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rota_core::app::{ReassignmentLoop, ServiceBuilder};
use rota_core::config::RotaConfig;
use rota_core::domain::{DomainEvent, Task, TaskState, Worker};
use rota_core::impls::InMemoryStore;
use rota_core::ports::{IdGenerator, SystemClock, TaskStore, UlidGenerator};

/// Rotate tasks through a pool of workers (in-memory demo host).
#[derive(Debug, Parser)]
#[command(name = "rota")]
struct Args {
    /// Worker names, comma separated.
    #[arg(long = "workers", value_delimiter = ',', default_value = "alice,bob,carol")]
    workers: Vec<String>,

    /// Task titles, comma separated.
    #[arg(long = "tasks", value_delimiter = ',', default_value = "triage inbox,review backlog")]
    tasks: Vec<String>,

    /// Seconds between passes (overrides ROTA_INTERVAL_SECS).
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Stop once every task is completed instead of waiting for Ctrl-C.
    #[arg(long)]
    until_complete: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    workers: &'a [Worker],
    tasks: Vec<Task>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let mut config = RotaConfig::from_env().context("loading configuration")?;
    if let Some(secs) = args.interval_secs {
        anyhow::ensure!(secs > 0, "--interval-secs must be positive");
        config.interval = Duration::from_secs(secs);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // (A) worker プールとストアを用意
    let ids = UlidGenerator::new(SystemClock);
    let workers: Vec<Worker> = args
        .workers
        .iter()
        .map(|name| Worker::new(ids.generate_worker_id(), name.trim()))
        .collect();
    let store = Arc::new(InMemoryStore::with_workers(workers.clone()));

    let service = Arc::new(
        ServiceBuilder::from_config(&config)
            .worker_pool(store.clone())
            .task_store(store.clone())
            .history_store(store.clone())
            .build()?,
    );
    tracing::info!(
        workers = workers.len(),
        eligibility = %config.policy.eligibility,
        completion = %config.policy.completion,
        "service ready"
    );

    // (B) タスク作成 → TaskCreated イベント（ループ起動前に初回割り当てを済ませる）
    let cancel = CancellationToken::new();
    let mut task_ids = Vec::new();
    for title in &args.tasks {
        let task = Task::new(ids.generate_task_id(), title.trim());
        store.save_task(&task).await?;
        task_ids.push(task.id);
        if let Err(err) = service.handle(DomainEvent::TaskCreated { task }, &cancel).await {
            tracing::error!(error = %err, "initial assignment failed");
        }
    }

    // (C) 定期ループを起動
    let rotation = Arc::new(ReassignmentLoop::new(service.clone(), config.interval));
    let join = rotation.clone().spawn(cancel.clone());

    // (D) 完了待ち or Ctrl-C
    if args.until_complete {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
            _ = async {
                loop {
                    let tasks = store.all_tasks().await;
                    if tasks.iter().all(|t| t.state == TaskState::Completed) {
                        break;
                    }
                    sleep(Duration::from_millis(200)).await;
                }
            } => tracing::info!(tasks = task_ids.len(), "every task completed"),
        }
    } else {
        tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl-C")?;
    }

    // (E) 停止して結果を出力
    cancel.cancel();
    join.await.context("reassignment loop panicked")?;

    let summary = Summary {
        workers: &workers,
        tasks: store.all_tasks().await,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
