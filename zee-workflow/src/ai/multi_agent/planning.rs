//! Built-in planner, router and endgame agents, their prompts, and plan parsing

use super::agent::{Agent, AgentConfig};
use super::registry::AgentRegistry;
use super::tools::ExecuteAgentTool;
use super::types::{RawTask, ZeeTask, ENDGAME, PLANNER, ROUTER};
use crate::ai::AiClient;
use crate::error::{Result, WorkflowError};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const PLANNER_FORMAT: &str = include_str!("prompts/planner_format.md");
const ROUTER_ASSIGN: &str = include_str!("prompts/router_assign.md");
const WORKER_DIRECTIVE: &str = include_str!("prompts/worker_directive.md");
const ROUTER_FOLLOWUP: &str = include_str!("prompts/router_followup.md");

pub fn planner_agent(goal: &str, model: Arc<AiClient>, temperature: f32) -> Result<Agent> {
    Agent::new(
        AgentConfig::new(
            PLANNER,
            format!(
                "You are a task planner that wants to complete the user's goal - \"{}\".",
                goal
            ),
            model,
        )
        .instructions([
            "Plan the user's goal into smaller sequential tasks.",
            "Do NOT create a task that is not directly related to the user's goal.",
            "Do NOT create a final compilation task.",
            PLANNER_FORMAT.trim_end(),
            "Return ONLY the JSON array, no other text",
        ])
        .temperature(temperature),
    )
}

pub fn router_agent(model: Arc<AiClient>, temperature: f32, workers: Arc<AgentRegistry>) -> Result<Agent> {
    let roster = format!("Agents you can call: {}", roster_json(&workers));
    Agent::new(
        AgentConfig::new(
            ROUTER,
            "You coordinate information flow between agents and assign tasks to achieve the user's goal.",
            model,
        )
        .instructions([
            roster.as_str(),
            "When asked for information, your ONLY task is to find and call the right agent.",
            "1. Identify which agent has the information",
            "2. Call that agent ONCE using execute_agent",
            "3. Return their response without modification",
            "Do not try to process, validate, or get additional information.",
        ])
        .tool(Arc::new(ExecuteAgentTool::new(workers)))
        .temperature(temperature),
    )
}

pub fn endgame_agent(model: Arc<AiClient>, temperature: f32) -> Result<Agent> {
    Agent::new(
        AgentConfig::new(
            ENDGAME,
            "You conclude the workflow based on all completed tasks.",
            model,
        )
        .instructions([
            "Review all completed tasks and compile in a single response.",
            "Ensure the response addresses the original goal.",
        ])
        .temperature(temperature),
    )
}

/// System prompt for the assignment step, listing every worker
pub fn assignment_prompt(workers: &AgentRegistry) -> String {
    ROUTER_ASSIGN
        .replace("{agents}", &roster_json(workers))
        .trim_end()
        .to_string()
}

/// Name, description and instructions of every worker as a JSON array
fn roster_json(workers: &AgentRegistry) -> String {
    let roster: Vec<Value> = workers
        .agents()
        .map(|agent| {
            json!({
                "name": agent.name(),
                "description": agent.description(),
                "instructions": agent.instructions(),
            })
        })
        .collect();
    serde_json::to_string(&roster).unwrap_or_else(|_| "[]".to_string())
}

/// Prefix protocol every worker is told to follow
pub fn worker_directive() -> &'static str {
    WORKER_DIRECTIVE.trim_end()
}

/// Prompt for the router while it answers a follow-up from `question_from`
pub fn followup_directive(question_from: &str, original_task: &str) -> String {
    ROUTER_FOLLOWUP
        .replace("{question_from}", question_from)
        .replace("{original_task}", original_task)
        .trim_end()
        .to_string()
}

/// Tasks from the planner's reply
pub fn parse_raw_tasks(response: &str) -> Result<Vec<RawTask>> {
    parse_task_array(PLANNER, response, false)
}

/// Assigned tasks from the router's reply
pub fn parse_routed_tasks(response: &str) -> Result<Vec<ZeeTask>> {
    let tasks: Vec<ZeeTask> = parse_task_array(ROUTER, response, true)?;
    warn_on_dependency_order(&tasks);
    Ok(tasks)
}

/// Models often wrap JSON in a markdown fence despite being told not to
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening line
    match body.split_once('\n') {
        Some((info, inner)) if !info.trim().contains(['[', '{']) => inner.trim(),
        _ => body.trim(),
    }
}

fn parse_task_array<T: DeserializeOwned>(agent: &str, response: &str, assigned: bool) -> Result<Vec<T>> {
    let body = strip_code_fence(response);
    let value: Value = serde_json::from_str(body).map_err(|e| {
        log::error!("[ZEE] Unparseable '{}' response: {}", agent, response);
        WorkflowError::plan_parse(agent, e.to_string())
    })?;

    let Value::Array(items) = value else {
        return Err(WorkflowError::plan_parse(
            agent,
            format!("'{}' response must be an array", agent),
        ));
    };

    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let instructions_ok = item
            .get("instructions")
            .and_then(Value::as_array)
            .is_some_and(|list| list.iter().all(Value::is_string));
        let agent_ok = !assigned
            || item
                .get("agentName")
                .and_then(Value::as_str)
                .is_some_and(|name| !name.trim().is_empty());
        if !instructions_ok || !agent_ok {
            return Err(WorkflowError::plan_parse(
                agent,
                format!("Invalid task format at index {}", index),
            ));
        }

        if let Some(attachments) = item.get("attachments") {
            if !attachments.is_null() && !attachments.is_array() {
                return Err(WorkflowError::plan_parse(
                    agent,
                    format!("Invalid attachments format at index {}", index),
                ));
            }
        }

        let task = serde_json::from_value(item).map_err(|e| {
            WorkflowError::plan_parse(agent, format!("Invalid task format at index {}: {}", index, e))
        })?;
        tasks.push(task);
    }

    log::info!("[ZEE] Parsed {} tasks from '{}'", tasks.len(), agent);
    Ok(tasks)
}

/// Tasks are kept in the router's order; an order that breaks a dependency is only reported
fn warn_on_dependency_order(tasks: &[ZeeTask]) {
    let mut first_position: HashMap<&str, usize> = HashMap::new();
    for (i, task) in tasks.iter().enumerate() {
        first_position.entry(task.agent_name.as_str()).or_insert(i);
    }

    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.dependencies {
            if let Some(&pos) = first_position.get(dep.agent_name.as_str()) {
                if pos > i {
                    log::warn!(
                        "[ZEE] Task {} for '{}' depends on '{}', which is scheduled later",
                        i + 1,
                        task.agent_name,
                        dep.agent_name
                    );
                }
            }
        }
    }
}
