//! Application services and use cases

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::execution::{ExecutionReceipt, FlashArbExecutor};
use crate::domain::plan::ArbitragePlan;
use crate::shared::errors::{AppError, ExecutionError};
use crate::shared::types::{AccountId, Amount, LoanRequest};

/// One queued cycle
struct ExecutionJob {
    caller: AccountId,
    request: LoanRequest,
    plan: ArbitragePlan,
    min_profit: Amount,
    reply: oneshot::Sender<Result<ExecutionReceipt, ExecutionError>>,
}

/// Serializes cycles through a single worker task.
///
/// Callers on any task may submit; the worker runs one cycle at a time on
/// the blocking pool and answers each submission on its own channel.
pub struct ExecutionService {
    sender: mpsc::Sender<ExecutionJob>,
    worker: JoinHandle<()>,
}

impl ExecutionService {
    /// Spawn the worker. Must be called within a tokio runtime.
    pub fn start(executor: Arc<FlashArbExecutor>, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let worker = tokio::spawn(Self::run(executor, receiver));
        Self { sender, worker }
    }

    async fn run(executor: Arc<FlashArbExecutor>, mut receiver: mpsc::Receiver<ExecutionJob>) {
        info!("execution worker started");
        let mut processed: u64 = 0;

        while let Some(job) = receiver.recv().await {
            let ExecutionJob {
                caller,
                request,
                plan,
                min_profit,
                reply,
            } = job;

            let executor = Arc::clone(&executor);
            let outcome = tokio::task::spawn_blocking(move || {
                executor.request_loan(&caller, request, plan, min_profit)
            })
            .await;

            processed += 1;
            match outcome {
                Ok(result) => {
                    if reply.send(result).is_err() {
                        debug!("submitter went away before the cycle finished");
                    }
                }
                Err(e) => {
                    // Dropping `reply` tells the submitter the cycle never reported
                    error!(error = %e, "execution task panicked");
                }
            }
        }

        info!(processed, "execution worker stopped");
    }

    /// Queue a cycle and wait for its result
    pub async fn submit(
        &self,
        caller: AccountId,
        request: LoanRequest,
        plan: ArbitragePlan,
        min_profit: Amount,
    ) -> Result<ExecutionReceipt, AppError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(ExecutionJob {
                caller,
                request,
                plan,
                min_profit,
                reply,
            })
            .await
            .map_err(|_| AppError::ServiceUnavailable("execution worker stopped".to_string()))?;

        let result = response.await.map_err(|_| {
            AppError::ServiceUnavailable("execution worker dropped the request".to_string())
        })?;
        Ok(result?)
    }

    /// Stop accepting work and wait for queued cycles to drain
    pub async fn shutdown(self) -> Result<(), AppError> {
        drop(self.sender);
        self.worker
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("execution worker failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::SwapStep;
    use crate::infrastructure::SimulatedEnvironment;
    use crate::shared::config::AppConfig;

    const CONFIG: &str = r#"
        [executor]
        address = "executor"
        owner = "owner"
        min_profit_bps = 0

        [lender]
        address = "lender"
        fee_bps = 30

        [[venues]]
        type = "scripted"
        id = "ab"
        address = "ab-pool"
        outputs = [2000]
        funding = [{ asset = "B", amount = 100000 }]
        cycle = true

        [[venues]]
        type = "scripted"
        id = "ba"
        address = "ba-pool"
        outputs = [1050]
        funding = [{ asset = "A", amount = 100000 }]
        cycle = true

        [[balances]]
        account = "lender"
        asset = "A"
        amount = 1000000
    "#;

    fn environment() -> SimulatedEnvironment {
        let config: AppConfig = toml::from_str(CONFIG).unwrap();
        SimulatedEnvironment::from_config(&config).unwrap()
    }

    fn plan() -> ArbitragePlan {
        ArbitragePlan::new(vec![
            SwapStep::new("ab", "A", "B", 1000, 1900),
            SwapStep::new("ba", "B", "A", 2000, 1003),
        ])
    }

    #[tokio::test]
    async fn test_submit_runs_cycle() {
        let env = environment();
        let service = ExecutionService::start(Arc::clone(&env.executor), 4);

        let receipt = service
            .submit(
                AccountId::from("owner"),
                LoanRequest::new("A", 1000),
                plan(),
                Amount::ZERO,
            )
            .await
            .unwrap();

        assert_eq!(receipt.profit, Amount::new(47));
        assert_eq!(receipt.amount_owed, Amount::new(1003));
        service.shutdown().await.unwrap();
        assert_eq!(env.executor.stats().total_executions(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_are_serialized() {
        let env = environment();
        let service = Arc::new(ExecutionService::start(Arc::clone(&env.executor), 2));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .submit(
                        AccountId::from("owner"),
                        LoanRequest::new("A", 1000),
                        plan(),
                        Amount::ZERO,
                    )
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let stats = env.executor.stats();
        assert_eq!(stats.total_executions(), 5);
        assert_eq!(stats.total_profit(&"A".into()), 235);
    }

    #[tokio::test]
    async fn test_failed_cycle_reports_execution_error() {
        let env = environment();
        let service = ExecutionService::start(Arc::clone(&env.executor), 1);

        let result = service
            .submit(
                AccountId::from("intruder"),
                LoanRequest::new("A", 1000),
                plan(),
                Amount::ZERO,
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::ExecutionError(ExecutionError::NotOwner))
        ));
        service.shutdown().await.unwrap();
    }
}
