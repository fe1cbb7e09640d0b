//! CLI commands and handlers
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::services::ExecutionService;
use crate::domain::lending::FeeRounding;
use crate::domain::plan::PathHop;
use crate::infrastructure::SimulatedEnvironment;
use crate::report::{CycleFailure, QuoteReport, SimulationReport};
use crate::shared::config::ConfigLoader;
use crate::shared::errors::AppError;
use crate::shared::types::{Amount, AssetId, LoanRequest};
use crate::shared::utils::format_bps;

#[derive(Parser)]
#[command(name = "flasharb")]
#[command(version, about = "Flash-loan arbitrage executor with an in-process simulated market")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a plan through the simulated environment
    Simulate {
        /// Environment configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Plan file (TOML)
        #[arg(short, long)]
        plan: PathBuf,

        /// Number of times to run the plan
        #[arg(short, long, default_value_t = 1)]
        repeat: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a plan against the configured venues and limits without borrowing
    Validate {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        plan: PathBuf,
    },

    /// Quote a path and print it as a plan file
    Quote {
        #[arg(short, long)]
        config: PathBuf,

        /// Asset to borrow
        #[arg(long)]
        asset: String,

        /// Amount to borrow, in the asset's smallest unit
        #[arg(long)]
        amount: u64,

        /// Comma-separated hops, each `venue:TOKEN_OUT`
        #[arg(long, value_delimiter = ',', required = true)]
        path: Vec<PathHop>,

        /// Per-hop slippage tolerance (defaults to the configured value)
        #[arg(long)]
        slippage_bps: Option<u16>,

        /// Deadline for every hop, in seconds from now
        #[arg(long)]
        deadline_secs: Option<i64>,

        /// Minimum profit written into the plan file
        #[arg(long, default_value_t = 0)]
        min_profit: u64,

        /// Print the quote as JSON instead of a plan file
        #[arg(long)]
        json: bool,
    },

    /// List configured venues and their balances
    Venues {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Simulate {
                config,
                plan,
                repeat,
                json,
            } => Self::execute_simulate_command(config, plan, repeat, json).await,
            Commands::Validate { config, plan } => Self::execute_validate_command(config, plan),
            Commands::Quote {
                config,
                asset,
                amount,
                path,
                slippage_bps,
                deadline_secs,
                min_profit,
                json,
            } => Self::execute_quote_command(
                config,
                LoanRequest::new(asset, amount),
                path,
                slippage_bps,
                deadline_secs,
                Amount::new(min_profit),
                json,
            ),
            Commands::Venues { config } => Self::execute_venues_command(config),
        }
    }

    /// Execute simulate command
    async fn execute_simulate_command(
        config_path: PathBuf,
        plan_path: PathBuf,
        repeat: usize,
        json: bool,
    ) -> Result<(), AppError> {
        let config = ConfigLoader::load_config(&config_path)?;
        let plan = ConfigLoader::load_plan(&plan_path)?;
        let env = SimulatedEnvironment::from_config(&config)?;
        let owner = config.executor.owner.clone();

        info!(
            asset = %plan.loan.asset,
            amount = %plan.loan.amount,
            hops = plan.steps.len(),
            repeat,
            "starting simulation"
        );

        let service = ExecutionService::start(Arc::clone(&env.executor), repeat.max(1));
        let mut receipts = Vec::new();
        let mut failures = Vec::new();

        for attempt in 1..=repeat {
            match service
                .submit(
                    owner.clone(),
                    plan.loan.clone(),
                    plan.steps.clone(),
                    plan.min_profit,
                )
                .await
            {
                Ok(receipt) => receipts.push(receipt),
                Err(AppError::ExecutionError(e)) => {
                    warn!(attempt, error = %e, "cycle aborted");
                    failures.push(CycleFailure {
                        attempt,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        service.shutdown().await?;

        let report = SimulationReport::new(env.executor.address().clone(), env.executor.stats())
            .with_receipts(receipts)
            .with_failures(failures)
            .with_balances(env.bank.balances_of(env.executor.address()))
            .with_events_emitted(env.events.len());

        if json {
            let rendered = report.to_json().map_err(|e| {
                AppError::EnvironmentError(format!("Failed to encode report: {}", e))
            })?;
            println!("{}", rendered);
        } else {
            print!("{}", report.render_text());
        }
        Ok(())
    }

    /// Execute validate command
    fn execute_validate_command(config_path: PathBuf, plan_path: PathBuf) -> Result<(), AppError> {
        let config = ConfigLoader::load_config(&config_path)?;
        let plan = ConfigLoader::load_plan(&plan_path)?;
        let env = SimulatedEnvironment::from_config(&config)?;

        env.executor.validate_plan(&plan.loan, &plan.steps)?;
        let fee = env.executor.loan_fee(&plan.loan.asset, plan.loan.amount)?;
        let liquidity = env.lender.liquidity(&plan.loan.asset);
        if liquidity < plan.loan.amount {
            warn!(
                requested = %plan.loan.amount,
                available = %liquidity,
                "lender cannot fund this loan"
            );
        }

        println!(
            "Plan OK: borrow {} {}, {} hops, fee {}, repay {}",
            plan.loan.amount,
            plan.loan.asset,
            plan.steps.len(),
            fee,
            plan.loan
                .amount
                .checked_add(fee)
                .map(|owed| owed.to_string())
                .unwrap_or_else(|| "overflow".to_string())
        );
        Ok(())
    }

    /// Execute quote command
    fn execute_quote_command(
        config_path: PathBuf,
        loan: LoanRequest,
        path: Vec<PathHop>,
        slippage_bps: Option<u16>,
        deadline_secs: Option<i64>,
        min_profit: Amount,
        json: bool,
    ) -> Result<(), AppError> {
        let config = ConfigLoader::load_config(&config_path)?;
        let env = SimulatedEnvironment::from_config(&config)?;
        let slippage_bps = slippage_bps.unwrap_or(config.executor.default_slippage_bps);
        let deadline = deadline_secs.map(|secs| env.clock.unix_now().saturating_add(secs));

        let quoted = env.executor.quote_path(&loan, &path, slippage_bps, deadline)?;
        let fee = env.executor.loan_fee(&loan.asset, loan.amount)?;
        let report = QuoteReport::new(quoted, fee, env.lender.fee_bps(), slippage_bps);

        if json {
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|e| AppError::EnvironmentError(format!("Failed to encode quote: {}", e)))?;
            println!("{}", rendered);
        } else {
            eprint!("{}", report.render_text());
            let rendered = report
                .to_plan_toml(min_profit)
                .map_err(|e| AppError::EnvironmentError(format!("Failed to encode plan: {}", e)))?;
            print!("{}", rendered);
        }
        Ok(())
    }

    /// Execute venues command
    fn execute_venues_command(config_path: PathBuf) -> Result<(), AppError> {
        let config = ConfigLoader::load_config(&config_path)?;
        let env = SimulatedEnvironment::from_config(&config)?;

        let rounding = match env.lender.rounding() {
            FeeRounding::Down => "rounded down",
            FeeRounding::Up => "rounded up",
        };
        println!(
            "Executor {} (owner {}), lender {} charging {} {}",
            env.executor.address(),
            env.executor.owner(),
            env.executor.lender_address(),
            format_bps(env.lender.fee_bps()),
            rounding
        );

        let listed = env.executor.venues();
        println!("{} venues", listed.len());
        for info in listed {
            let balances = env
                .bank
                .balances_of(&info.address)
                .into_iter()
                .map(|(asset, amount): (AssetId, Amount)| format!("{} {}", amount, asset))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {} [{}] {} at {}: {}",
                info.id,
                info.kind,
                if info.enabled { "enabled" } else { "disabled" },
                info.address,
                balances
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_quote_path() {
        let cli = Cli::try_parse_from([
            "flasharb",
            "quote",
            "--config",
            "env.toml",
            "--asset",
            "USDC",
            "--amount",
            "1000",
            "--path",
            "alpha:WETH,beta:USDC",
        ])
        .unwrap();

        match cli.command {
            Commands::Quote { path, slippage_bps, .. } => {
                assert_eq!(path.len(), 2);
                assert_eq!(path[1].venue.as_str(), "beta");
                assert_eq!(slippage_bps, None);
            }
            _ => panic!("expected quote command"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_hop() {
        let result = Cli::try_parse_from([
            "flasharb", "quote", "-c", "env.toml", "--asset", "A", "--amount", "1", "--path",
            "alpha",
        ]);
        assert!(result.is_err());
    }
}
