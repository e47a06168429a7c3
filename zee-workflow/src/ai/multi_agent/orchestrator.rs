//! Workflow engine - plans the goal, drains the action queue, compiles the answer

use super::agent::Agent;
use super::context::{ContextStore, ContextView};
use super::planning::{
    assignment_prompt, endgame_agent, followup_directive, parse_raw_tasks, parse_routed_tasks,
    planner_agent, router_agent, worker_directive,
};
use super::protocol::AgentReply;
use super::queue::ActionQueue;
use super::registry::AgentRegistry;
use super::types::{
    dependency_note, AgentAction, ContextItem, FollowupOrigin, ZeeTask, ENDGAME, PLANNER,
    RESERVED_AGENT_NAMES, ROUTER,
};
use crate::ai::{AiClient, Message};
use crate::config::{WorkflowConfig, WorkflowSettings};
use crate::error::{Result, WorkflowError};
use crate::events::{EventBroadcaster, WorkflowEvent};
use crate::tools::ToolContext;
use serde::Serialize;
use std::sync::Arc;

/// Everything needed to build a [`ZeeWorkflow`]
pub struct ZeeWorkflowOptions {
    pub goal: String,
    /// Worker agents. Names must be unique and must not collide with the built-in agents.
    pub agents: Vec<Agent>,
    /// Model shared by the planner, router and endgame agents
    pub model: Arc<AiClient>,
    pub config: WorkflowConfig,
}

impl ZeeWorkflowOptions {
    pub fn new(goal: impl Into<String>, agents: Vec<Agent>, model: Arc<AiClient>) -> Self {
        Self {
            goal: goal.into(),
            agents,
            model,
            config: WorkflowConfig::default(),
        }
    }

    pub fn config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }
}

/// Result of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    /// Endgame agent's compiled answer
    pub content: String,
    /// Full context log, goal first
    pub context: Vec<ContextItem>,
    pub iterations: usize,
}

impl WorkflowResponse {
    pub fn errors(&self) -> impl Iterator<Item = &ContextItem> {
        self.context.iter().filter(|item| item.is_error())
    }
}

pub struct ZeeWorkflow {
    run_id: String,
    planner: Arc<Agent>,
    router: Arc<Agent>,
    endgame: Arc<Agent>,
    workers: Arc<AgentRegistry>,
    context: ContextStore,
    queue: ActionQueue,
    settings: WorkflowSettings,
    iterations: usize,
    broadcaster: Option<Arc<EventBroadcaster>>,
}

impl ZeeWorkflow {
    /// Validates the configuration and the agent roster. Nothing is dispatched yet.
    pub fn new(options: ZeeWorkflowOptions) -> Result<Self> {
        let settings = options.config.resolve()?;
        let workers = Arc::new(AgentRegistry::new(options.agents, &RESERVED_AGENT_NAMES)?);

        let planner = planner_agent(&options.goal, options.model.clone(), settings.temperature)?;
        let router = router_agent(options.model.clone(), settings.temperature, workers.clone())?;
        let endgame = endgame_agent(options.model, settings.temperature)?;

        log::info!(
            "[ZEE] Workflow created with {} workers (max_iterations: {}, temperature: {})",
            workers.len(),
            settings.max_iterations,
            settings.temperature
        );

        Ok(Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            planner: Arc::new(planner),
            router: Arc::new(router),
            endgame: Arc::new(endgame),
            workers,
            context: ContextStore::new(options.goal),
            queue: ActionQueue::new(),
            settings,
            iterations: 0,
            broadcaster: None,
        })
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<EventBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn goal(&self) -> &str {
        self.context.goal()
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn settings(&self) -> WorkflowSettings {
        self.settings
    }

    pub fn workers(&self) -> &AgentRegistry {
        &self.workers
    }

    /// Plan, dispatch and compile. Only configuration, planning and endgame failures
    /// are returned; everything else ends up as `error` entries in the context.
    pub async fn run(mut self) -> Result<WorkflowResponse> {
        log::info!("[ZEE] Starting workflow {} for goal: {}", self.run_id, self.goal());
        self.emit(WorkflowEvent::workflow_started(
            &self.run_id,
            self.context.goal(),
            self.settings.max_iterations,
            &self.workers.names(),
        ));

        let tasks = self.plan().await?;
        self.seed(tasks);
        self.drain().await;
        let content = self.compile().await?;

        let errors = self.context.errors().count();
        log::info!(
            "[ZEE] Workflow {} finished after {} iterations ({} context entries, {} errors)",
            self.run_id,
            self.iterations,
            self.context.len(),
            errors
        );
        self.emit(WorkflowEvent::workflow_completed(
            &self.run_id,
            self.iterations,
            self.context.len(),
            errors,
        ));

        Ok(WorkflowResponse {
            content,
            context: self.context.into_items(),
            iterations: self.iterations,
        })
    }

    /// Ask the planner to break the goal down, then the router to assign each task
    pub async fn plan(&mut self) -> Result<Vec<ZeeTask>> {
        let goal = self.context.goal().to_string();
        let planned = self
            .planner
            .generate_with_context(vec![Message::user(goal)], &self.tool_context(PLANNER))
            .await?;
        let raw_tasks = parse_raw_tasks(&planned)?;

        let raw_json = serde_json::to_string(&raw_tasks)
            .map_err(|e| WorkflowError::plan_parse(PLANNER, e.to_string()))?;
        let routed = self
            .router
            .generate_with_context(
                vec![
                    Message::system(assignment_prompt(&self.workers)),
                    Message::user(raw_json),
                ],
                &self.tool_context(ROUTER),
            )
            .await?;
        let tasks = parse_routed_tasks(&routed)?;

        let assignments: Vec<&str> = tasks.iter().map(|t| t.agent_name.as_str()).collect();
        log::info!("[ZEE] Plan ready: {}", assignments.join(" -> "));
        self.emit(WorkflowEvent::plan_produced(&self.run_id, &assignments));

        Ok(tasks)
    }

    /// Queue one request per task, keeping the router's order. Returns how many were queued.
    pub fn seed(&mut self, tasks: Vec<ZeeTask>) -> usize {
        let count = tasks.len();
        for task in tasks {
            self.queue.push_task(task.into_action());
        }
        count
    }

    /// Append a planned action behind everything already queued
    pub fn enqueue(&mut self, action: AgentAction) {
        self.queue.push_task(action);
    }

    /// Process queued actions until the queue empties or the iteration budget runs out
    pub async fn drain(&mut self) {
        while !self.queue.is_empty() && self.iterations < self.settings.max_iterations {
            let Some(action) = self.queue.pop() else {
                break;
            };
            self.iterations += 1;

            log::info!(
                "[ZEE] Iteration {} - {} from '{}' to '{}' ({} pending)",
                self.iterations,
                action.kind(),
                action.from(),
                action.to(),
                self.queue.len()
            );
            self.emit(WorkflowEvent::action_dispatched(
                &self.run_id,
                self.iterations,
                action.kind().as_str(),
                action.from(),
                action.to(),
            ));

            let from = action.from().to_string();
            let to = action.to().to_string();
            if let Err(e) = self.process_action(action).await {
                self.record_error(&from, &to, &e.to_string());
            }
        }

        if self.queue.is_empty() {
            log::info!("[ZEE] All agents have completed their tasks");
        } else {
            log::warn!(
                "[ZEE] Reached maximum iterations ({}) with {} actions pending",
                self.settings.max_iterations,
                self.queue.len()
            );
            self.emit(WorkflowEvent::budget_exhausted(
                &self.run_id,
                self.iterations,
                self.queue.len(),
            ));
        }
    }

    /// Hand the whole context log to the endgame agent
    pub async fn compile(&mut self) -> Result<String> {
        let context_json = self.context.to_json();
        let answer = self
            .endgame
            .generate_with_context(vec![Message::user(context_json)], &self.tool_context(ENDGAME))
            .await?;
        Ok(answer)
    }

    /// Handle a single action. Completed work is recorded; anything else is sent to
    /// its destination agent and the decoded reply is queued ahead of planned tasks.
    pub async fn process_action(&mut self, action: AgentAction) -> Result<()> {
        if action.is_completed() {
            self.record_completion(&action);
            return Ok(());
        }

        let Some(agent) = self.resolve(action.to()) else {
            return self.handle_unresolved(action);
        };

        let answering_followup = matches!(action, AgentAction::Followup { .. }) && agent.name() == ROUTER;
        let messages = self.build_messages(&action, agent.name(), answering_followup);

        log::debug!("[ZEE] '{}' thinking on: {}", agent.name(), action.content());
        let response = agent
            .generate_with_context(messages, &self.tool_context(agent.name()))
            .await?;

        let reply = AgentReply::decode(&response, answering_followup);
        let continuations = self.continuations_for(&action, agent.name(), reply);
        self.queue.push_continuations(continuations);
        Ok(())
    }

    /// Legacy names `mastermind` and `breakdown` reach the router and planner
    fn resolve(&self, name: &str) -> Option<Arc<Agent>> {
        match name {
            ROUTER | "mastermind" => Some(self.router.clone()),
            PLANNER | "breakdown" => Some(self.planner.clone()),
            ENDGAME => Some(self.endgame.clone()),
            _ => self.workers.get(name),
        }
    }

    fn all_agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = [PLANNER, ROUTER, ENDGAME].iter().map(|n| n.to_string()).collect();
        names.extend(self.workers.names());
        names
    }

    /// Follow-ups to unknown agents go to the router instead, once
    fn handle_unresolved(&mut self, action: AgentAction) -> Result<()> {
        match action {
            AgentAction::Followup {
                from,
                to,
                question,
                note,
                redirected_from: None,
                origin,
            } => {
                log::warn!("[ZEE] Agent '{}' not found, redirecting follow-up from '{}' to router", to, from);
                self.queue.push_continuations(vec![AgentAction::Followup {
                    from,
                    to: ROUTER.to_string(),
                    question,
                    note,
                    redirected_from: Some(to),
                    origin,
                }]);
                Ok(())
            }
            other => Err(WorkflowError::AgentNotFound {
                name: other.to().to_string(),
                available: self.all_agent_names(),
            }),
        }
    }

    fn context_view<'a>(&self, action: &'a AgentAction, recipient: &str, answering_followup: bool) -> ContextView<'a> {
        if recipient == ROUTER {
            if answering_followup {
                ContextView::Full
            } else {
                ContextView::WithoutUser
            }
        } else {
            ContextView::Roles(action.dependencies().iter().map(|d| d.agent_name.as_str()).collect())
        }
    }

    fn build_messages(&self, action: &AgentAction, recipient: &str, answering_followup: bool) -> Vec<Message> {
        let mut messages = Vec::new();

        if recipient != ROUTER {
            messages.push(Message::system(worker_directive()));
        } else if let AgentAction::Followup { from, origin, .. } = action {
            messages.push(Message::system(followup_directive(from, &origin.task)));
        }

        let view = self.context_view(action, recipient, answering_followup);
        let task = match self.context.render(&view) {
            Some(relevant) => format!("Relevant context -> {}\nCurrent task -> {}", relevant, action.content()),
            None => format!("Current task -> {}", action.content()),
        };
        messages.push(Message::user(task));

        messages.extend(
            action
                .attachments()
                .iter()
                .filter(|group| !group.is_empty())
                .map(|group| Message::user_attachments(group.clone())),
        );

        messages
    }

    fn continuations_for(&self, action: &AgentAction, responder: &str, reply: AgentReply) -> Vec<AgentAction> {
        match reply {
            AgentReply::Followup(question) => {
                log::info!("[ZEE] '{}' needs more information: {}", responder, question);
                // The router cannot ask itself; keep the pending follow-up and its origin
                if let AgentAction::Followup {
                    from: asker,
                    question: pending,
                    note,
                    redirected_from,
                    origin,
                    ..
                } = action
                {
                    if responder == ROUTER {
                        return vec![AgentAction::Followup {
                            from: asker.clone(),
                            to: ROUTER.to_string(),
                            question: pending.clone(),
                            note: format!("{}\n\nThe router still needs: {}", note, question),
                            redirected_from: redirected_from.clone(),
                            origin: origin.clone(),
                        }];
                    }
                }
                vec![AgentAction::Followup {
                    from: responder.to_string(),
                    to: ROUTER.to_string(),
                    question,
                    note: dependency_note(action.dependencies()),
                    redirected_from: None,
                    origin: FollowupOrigin {
                        task: action.content().into_owned(),
                        from: action.from().to_string(),
                        dependencies: action.dependencies().to_vec(),
                        attachments: action.attachments().to_vec(),
                    },
                }]
            }
            AgentReply::Answer { content, prefixed } => {
                let AgentAction::Followup {
                    from: asker,
                    question,
                    origin,
                    ..
                } = action
                else {
                    return Vec::new();
                };
                if !prefixed {
                    log::warn!("[ZEE] Router answered '{}' without the ANSWER: prefix", asker);
                }

                let resumed = format!(
                    "{}\n\nYou previously asked: \"{}\"\n\nAnswer from router: {}\n\nPlease complete your task with this information.",
                    origin.task, question, content
                );
                vec![
                    AgentAction::Response {
                        from: ROUTER.to_string(),
                        to: asker.clone(),
                        content,
                    },
                    AgentAction::Request {
                        from: ROUTER.to_string(),
                        to: asker.clone(),
                        content: resumed,
                        dependencies: origin.dependencies.clone(),
                        attachments: origin.attachments.clone(),
                    },
                ]
            }
            AgentReply::Complete { content, prefixed } => {
                if !prefixed {
                    log::warn!("[ZEE] '{}' replied without a prefix, treating it as complete", responder);
                }
                vec![AgentAction::Complete {
                    from: responder.to_string(),
                    to: action.from().to_string(),
                    content,
                }]
            }
        }
    }

    fn record_completion(&mut self, action: &AgentAction) {
        let content = action.content();
        log::info!("[ZEE] {} recorded from '{}'", action.kind(), action.from());
        self.emit(WorkflowEvent::action_completed(
            &self.run_id,
            action.kind().as_str(),
            action.from(),
            action.to(),
            &content,
        ));
        self.context.push(ContextItem::new(action.from(), content.into_owned()));
    }

    fn record_error(&mut self, from: &str, to: &str, message: &str) {
        log::error!("[ZEE] Error in communication between {} -> {}: {}", from, to, message);
        self.emit(WorkflowEvent::error_recorded(&self.run_id, from, to, message));
        self.context.push(ContextItem::error(format!(
            "Error in communication between {} -> {}: {}",
            from, to, message
        )));
    }

    fn tool_context(&self, agent_name: &str) -> ToolContext {
        let context = ToolContext::for_agent(agent_name).with_run_id(&self.run_id);
        match &self.broadcaster {
            Some(broadcaster) => context.with_broadcaster(broadcaster.clone()),
            None => context,
        }
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::multi_agent::agent::AgentConfig;
    use crate::ai::multi_agent::types::Dependency;
    use crate::ai::{AiResponse, AttachmentPart, MessageRole, MockAiClient};

    fn workflow_with(worker_replies: &[&str], router_replies: &[&str]) -> (ZeeWorkflow, Arc<AiClient>, Arc<AiClient>) {
        let worker_model = Arc::new(AiClient::Mock(MockAiClient::from_texts(worker_replies.iter().copied())));
        let router_model = Arc::new(AiClient::Mock(MockAiClient::from_texts(router_replies.iter().copied())));
        let researcher =
            Agent::new(AgentConfig::new("researcher", "You research", worker_model.clone())).unwrap();
        let writer = Agent::new(AgentConfig::new("writer", "You write", worker_model.clone())).unwrap();
        let workflow = ZeeWorkflow::new(ZeeWorkflowOptions::new(
            "Write about Paris",
            vec![researcher, writer],
            router_model.clone(),
        ))
        .unwrap();
        (workflow, worker_model, router_model)
    }

    fn mock(model: &AiClient) -> &MockAiClient {
        match model {
            AiClient::Mock(mock) => mock,
            _ => unreachable!(),
        }
    }

    fn request(to: &str, content: &str, dependencies: Vec<Dependency>) -> AgentAction {
        AgentAction::Request {
            from: ROUTER.to_string(),
            to: to.to_string(),
            content: content.to_string(),
            dependencies,
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn test_completion_is_recorded_trimmed() {
        let (mut workflow, _, _) = workflow_with(&["COMPLETE:  Paris is in France.  "], &[]);
        workflow.enqueue(request("researcher", "Find facts", vec![]));
        workflow.drain().await;

        let last = workflow.context().items().last().unwrap();
        assert_eq!(last.role, "researcher");
        assert_eq!(last.content, "Paris is in France.");
        assert_eq!(workflow.iterations(), 2);
    }

    #[tokio::test]
    async fn test_worker_sees_only_dependency_context() {
        let (mut workflow, worker_model, _) = workflow_with(&["COMPLETE: facts", "COMPLETE: essay"], &[]);
        workflow.context.push(ContextItem::new("editor", "unrelated"));
        workflow.enqueue(request("researcher", "Find facts", vec![]));
        workflow.enqueue(request(
            "writer",
            "Write",
            vec![Dependency::new("researcher", "facts")],
        ));
        workflow.drain().await;

        let requests = mock(&worker_model).requests();
        let writer_task = &requests[1].last_user_message().unwrap().content;
        assert_eq!(
            writer_task,
            "Relevant context -> user: Write about Paris\nresearcher: facts\nCurrent task -> Write"
        );
        assert!(requests[1].system_contains("\"COMPLETE:\""));
    }

    #[tokio::test]
    async fn test_followup_answer_resumes_original_task() {
        let (mut workflow, worker_model, router_model) = workflow_with(
            &["FOLLOWUP: Which city?", "COMPLETE: Paris facts"],
            &["ANSWER: Paris"],
        );
        workflow.enqueue(request("researcher", "Find facts", vec![]));
        workflow.enqueue(request("writer", "Write", vec![]));

        // request -> followup -> response -> resumed request -> complete
        for _ in 0..5 {
            let action = workflow.queue.pop().unwrap();
            workflow.process_action(action).await.unwrap();
        }

        let router_request = &mock(&router_model).requests()[0];
        assert!(router_request.system_contains("Question from: 'researcher'"));
        assert!(router_request.last_user_message().unwrap().content.contains("Which city?"));

        let resumed = &mock(&worker_model).requests()[1];
        assert_eq!(
            resumed.last_user_message().unwrap().content,
            "Relevant context -> user: Write about Paris\nCurrent task -> Find facts\n\nYou previously asked: \"Which city?\"\n\nAnswer from router: Paris\n\nPlease complete your task with this information."
        );

        let roles: Vec<&str> = workflow.context().items().iter().map(|i| i.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "router", "researcher"]);
        assert_eq!(workflow.queue().peek().unwrap().to(), "writer");
    }

    #[tokio::test]
    async fn test_attachment_groups_follow_task_message() {
        let (mut workflow, worker_model, _) = workflow_with(&["COMPLETE: seen"], &[]);
        let chart = AttachmentPart::image("https://example.com/chart.png");
        let report = AttachmentPart::file("https://example.com/report.pdf", "application/pdf");
        workflow.enqueue(AgentAction::Request {
            from: ROUTER.to_string(),
            to: "researcher".to_string(),
            content: "Describe".to_string(),
            dependencies: vec![],
            attachments: vec![vec![chart.clone()], vec![], vec![report.clone()]],
        });
        workflow.drain().await;

        let request = &mock(&worker_model).requests()[0];
        let users: Vec<&Message> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .collect();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].content, "Relevant context -> user: Write about Paris\nCurrent task -> Describe");
        assert!(users[0].attachments.is_empty());
        assert_eq!(users[1].attachments, vec![chart]);
        assert_eq!(users[2].attachments, vec![report]);
        assert!(users[2].content.is_empty());
    }

    #[tokio::test]
    async fn test_resumed_request_keeps_origin_dependencies_and_attachments() {
        let (mut workflow, _, _) = workflow_with(&["FOLLOWUP: Which year?"], &["ANSWER: 2024"]);
        let dependencies = vec![Dependency::new("researcher", "facts")];
        let attachments = vec![vec![AttachmentPart::image("https://example.com/map.png")]];
        workflow.enqueue(AgentAction::Request {
            from: ROUTER.to_string(),
            to: "writer".to_string(),
            content: "Write".to_string(),
            dependencies: dependencies.clone(),
            attachments: attachments.clone(),
        });

        // request -> followup, then followup -> response + resumed request
        for _ in 0..2 {
            let action = workflow.queue.pop().unwrap();
            workflow.process_action(action).await.unwrap();
        }

        let queued: Vec<&AgentAction> = workflow.queue().iter().collect();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].kind().as_str(), "response");
        let resumed = queued[1];
        assert!(matches!(resumed, AgentAction::Request { .. }));
        assert_eq!(resumed.to(), "writer");
        assert_eq!(resumed.dependencies(), dependencies.as_slice());
        assert_eq!(resumed.attachments(), attachments.as_slice());
    }

    #[tokio::test]
    async fn test_router_request_hides_user_goal() {
        let (mut workflow, worker_model, router_model) = workflow_with(&[], &["COMPLETE: summary"]);
        workflow.context.push(ContextItem::new("researcher", "facts"));
        workflow.enqueue(request(ROUTER, "Summarize", vec![Dependency::new("writer", "draft")]));
        workflow.drain().await;

        let router_request = &mock(&router_model).requests()[0];
        assert_eq!(
            router_request.last_user_message().unwrap().content,
            "Relevant context -> researcher: facts\nCurrent task -> Summarize"
        );
        assert!(!router_request.system_contains("\"COMPLETE:\""));
        assert!(!router_request.system_contains("Question from:"));
        assert_eq!(mock(&worker_model).request_count(), 0);
        assert_eq!(workflow.context().items().last().unwrap().content, "summary");
    }

    #[tokio::test]
    async fn test_legacy_names_reach_builtin_agents() {
        let (mut workflow, _, model) = workflow_with(&[], &["COMPLETE: routed", "COMPLETE: planned"]);
        workflow.enqueue(request("mastermind", "Coordinate", vec![]));
        workflow.enqueue(request("breakdown", "Split", vec![]));
        workflow.drain().await;

        assert!(workflow.context().errors().next().is_none());
        let requests = mock(&model).requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].last_user_message().unwrap().content, "Current task -> Coordinate");
        assert!(requests[1].system_contains("task planner"));

        let roles: Vec<&str> = workflow.context().items().iter().map(|i| i.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "router", "planner"]);
    }

    #[tokio::test]
    async fn test_unknown_followup_destination_redirects_once() {
        let (mut workflow, _, router_model) = workflow_with(&[], &["ANSWER: blue"]);
        let followup = AgentAction::Followup {
            from: "writer".to_string(),
            to: "ghost".to_string(),
            question: "What color?".to_string(),
            note: dependency_note(&[]),
            redirected_from: None,
            origin: FollowupOrigin {
                task: "Paint".to_string(),
                from: ROUTER.to_string(),
                dependencies: vec![],
                attachments: vec![],
            },
        };

        workflow.process_action(followup).await.unwrap();
        assert_eq!(workflow.queue().len(), 1);
        let redirected = workflow.queue().peek().unwrap().clone();
        assert_eq!(redirected.to(), ROUTER);
        assert!(redirected.content().contains("originally directed to 'ghost'"));

        workflow.queue.pop();
        workflow.process_action(redirected).await.unwrap();
        assert_eq!(mock(&router_model).request_count(), 1);
        assert_eq!(workflow.queue().peek().unwrap().kind().as_str(), "response");
    }

    #[tokio::test]
    async fn test_unknown_request_destination_is_recorded() {
        let (mut workflow, _, _) = workflow_with(&[], &[]);
        workflow.enqueue(request("ghost", "Haunt", vec![]));
        workflow.drain().await;

        let error = workflow.context().errors().next().unwrap();
        assert_eq!(
            error.content,
            "Error in communication between router -> ghost: Agent 'ghost' not found. Available agents: planner, router, endgame, researcher, writer."
        );
    }

    #[tokio::test]
    async fn test_generation_error_is_recorded_and_loop_continues() {
        let worker_model = Arc::new(AiClient::Mock(MockAiClient::new(vec![
            Err(crate::ai::AiError::with_status("rate limited", 429)),
            Ok(AiResponse::text("COMPLETE: done")),
        ])));
        let worker = Agent::new(AgentConfig::new("researcher", "r", worker_model)).unwrap();
        let router_model = Arc::new(AiClient::Mock(MockAiClient::new(vec![])));
        let mut workflow =
            ZeeWorkflow::new(ZeeWorkflowOptions::new("goal", vec![worker], router_model)).unwrap();

        workflow.enqueue(request("researcher", "one", vec![]));
        workflow.enqueue(request("researcher", "two", vec![]));
        workflow.drain().await;

        let contents: Vec<&str> = workflow.context().items().iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents.len(), 3);
        assert!(contents[1].starts_with("Error in communication between router -> researcher: "));
        assert!(contents[1].contains("rate limited"));
        assert_eq!(contents[2], "done");
    }

    #[test]
    fn test_reserved_names_rejected_at_construction() {
        let model = Arc::new(AiClient::Mock(MockAiClient::new(vec![])));
        let router = Agent::new(AgentConfig::new("router", "fake", model.clone())).unwrap();
        let err = ZeeWorkflow::new(ZeeWorkflowOptions::new("goal", vec![router], model))
            .err()
            .unwrap();
        assert!(matches!(err, WorkflowError::DuplicateAgents(_)));
    }
}
