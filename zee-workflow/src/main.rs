//! `zee` - run a multi-agent workflow for a goal from the command line
//!
//! Usage:
//!   ZEE_API_KEY="your-api-key" cargo run -- "Summarize the top three Rust web frameworks"
//!
//! The goal may also come from `ZEE_GOAL`. Setting `GOLDRUSH_API_KEY` adds an agent
//! with blockchain data tools.

use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use zee_workflow::ai::multi_agent::{Agent, AgentConfig, WorkflowResponse, ZeeWorkflow, ZeeWorkflowOptions};
use zee_workflow::ai::{AiClient, OpenAIClient};
use zee_workflow::config::Config;
use zee_workflow::error::Result;
use zee_workflow::tools::builtin::goldrush_tools;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let goal = {
        let args: Vec<String> = env::args().skip(1).collect();
        if args.is_empty() {
            env::var("ZEE_GOAL").unwrap_or_default()
        } else {
            args.join(" ")
        }
    };
    if goal.trim().is_empty() {
        eprintln!("Usage: zee <goal>   (or set ZEE_GOAL)");
        std::process::exit(2);
    }

    match run(goal).await {
        Ok(response) => print_response(&response),
        Err(e) => {
            log::error!("[ZEE] Workflow failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(goal: String) -> Result<WorkflowResponse> {
    let config = Config::from_env()?;
    log::info!("[ZEE] Loaded {:?}", config);

    let client = match config.endpoint.as_deref() {
        Some(endpoint) => OpenAIClient::new(
            &config.api_key,
            Some(endpoint),
            config.model.as_deref(),
            config.max_tokens,
        )?,
        None => OpenAIClient::for_provider(
            config.provider,
            &config.api_key,
            config.model.as_deref(),
            config.max_tokens,
        )?,
    };
    log::info!("[ZEE] Using model {}", client.model());
    let model = Arc::new(AiClient::OpenAI(client));

    let mut agents = vec![Agent::new(
        AgentConfig::new(
            "assistant",
            "A general-purpose assistant that researches, reasons and writes.",
            model.clone(),
        )
        .instructions([
            "Answer precisely and concisely.",
            "State any assumption you had to make.",
        ]),
    )?];

    if config.goldrush_api_key.is_some() {
        agents.push(Agent::new(
            AgentConfig::new(
                "blockchain-analyst",
                "An on-chain data analyst with access to token balances, NFT holdings, transactions and historical token prices.",
                model.clone(),
            )
            .instruction("Use the tools to fetch on-chain data before answering.")
            .tools(goldrush_tools(config.goldrush_api_key.clone())?),
        )?);
    }

    let options = ZeeWorkflowOptions::new(goal, agents, model).config(config.workflow.clone());
    ZeeWorkflow::new(options)?.run().await
}

fn print_response(response: &WorkflowResponse) {
    println!("{}", response.content);
    println!();
    println!("---- context ({} iterations) ----", response.iterations);
    for item in &response.context {
        println!("{}", item.render());
    }
}
