//! Tests for graph construction and transfer tool synthesis

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use common::EchoTool;
use wei_agent::{
    configs, AgentDef, AgentGraph, GraphError, ToolContext, ToolError, ToolTrait,
    TRANSFER_TOOL_NAME,
};
use wei_scoring::ScoringCaps;
use wei_store::MemoryStore;

fn agent(name: &str) -> AgentDef {
    AgentDef::new(name, format!("{name} description"), format!("You are {name}."))
}

#[test]
fn test_cyclic_triangle_builds() {
    let graph = AgentGraph::build(vec![
        agent("rewardsManager").with_handoffs(["pointsCalculator", "habitTracker"]),
        agent("pointsCalculator").with_handoffs(["rewardsManager", "habitTracker"]),
        agent("habitTracker").with_handoffs(["rewardsManager", "pointsCalculator"]),
    ])
    .unwrap();

    assert_eq!(graph.len(), 3);
    for name in ["rewardsManager", "pointsCalculator", "habitTracker"] {
        let a = graph.get(name).unwrap();
        assert_eq!(a.handoff_targets().len(), 2);
    }
}

#[test]
fn test_forward_references_are_fine() {
    // "later" is declared after the agent that targets it.
    let graph = AgentGraph::build(vec![
        agent("early").with_handoffs(["later"]),
        agent("later"),
    ])
    .unwrap();
    assert!(graph.get("early").unwrap().can_handoff_to("later"));
}

#[test]
fn test_duplicate_agent_name_rejected() {
    let result = AgentGraph::build(vec![agent("wei"), agent("wei")]);
    assert!(matches!(result, Err(GraphError::DuplicateAgent(name)) if name == "wei"));
}

#[test]
fn test_unknown_handoff_target_rejected() {
    let result = AgentGraph::build(vec![agent("habitCoach").with_handoffs(["nope"])]);
    match result {
        Err(GraphError::UnknownHandoffTarget { agent, target }) => {
            assert_eq!(agent, "habitCoach");
            assert_eq!(target, "nope");
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("expected UnknownHandoffTarget"),
    }
}

#[test]
fn test_transfer_tool_enum_matches_edges() {
    let graph = AgentGraph::build(vec![
        agent("a").with_handoffs(["b", "c"]),
        agent("b"),
        agent("c"),
    ])
    .unwrap();

    let tools = graph.get("a").unwrap().advertised_tools();
    let transfer = tools
        .iter()
        .find(|t| t.function.name == TRANSFER_TOOL_NAME)
        .expect("transfer tool synthesized");

    let allowed = &transfer.function.parameters["properties"]["destination"]["enum"];
    assert_eq!(allowed, &json!(["b", "c"]));
    assert_eq!(
        transfer.function.parameters["required"],
        json!(["destination"])
    );
}

#[test]
fn test_no_transfer_tool_without_edges() {
    let graph = AgentGraph::build(vec![agent("leaf")]).unwrap();
    let tools = graph.get("leaf").unwrap().advertised_tools();
    assert!(tools.iter().all(|t| t.function.name != TRANSFER_TOOL_NAME));
}

#[test]
fn test_reserved_tool_name_rejected() {
    let result = AgentGraph::build(vec![
        agent("a").with_tool(EchoTool::named(TRANSFER_TOOL_NAME))
    ]);
    assert!(matches!(result, Err(GraphError::ReservedToolName { .. })));
}

#[test]
fn test_duplicate_tool_rejected() {
    let result = AgentGraph::build(vec![agent("a")
        .with_tool(EchoTool::named("echo"))
        .with_tool(EchoTool::named("echo"))]);
    assert!(matches!(result, Err(GraphError::DuplicateTool { .. })));
}

struct BadSchemaTool;

#[async_trait]
impl ToolTrait for BadSchemaTool {
    fn name(&self) -> &str {
        "bad_schema"
    }

    fn description(&self) -> &str {
        "Schema is not an object schema."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "string" })
    }

    async fn execute(&self, _ctx: &ToolContext, _args: Value) -> Result<String, ToolError> {
        Ok("{}".to_string())
    }
}

#[test]
fn test_malformed_tool_schema_rejected() {
    let result = AgentGraph::build(vec![agent("a").with_tool(Arc::new(BadSchemaTool))]);
    assert!(matches!(result, Err(GraphError::MalformedToolSchema { .. })));
}

#[test]
fn test_graph_registry_is_scoped_per_agent() {
    let graph = AgentGraph::build(vec![
        agent("a").with_tool(EchoTool::named("a_only")),
        agent("b").with_tool(EchoTool::named("b_only")),
    ])
    .unwrap();

    let registry = graph.registry();
    assert!(registry.resolve("a", "a_only").is_some());
    assert!(registry.resolve("b", "b_only").is_some());
    // No privilege leakage across personas.
    assert!(registry.resolve("a", "b_only").is_none());
    assert!(registry.resolve("b", "a_only").is_none());
}

#[test]
fn test_bundled_sets_build() {
    let store = Arc::new(MemoryStore::with_demo_data(Utc::now()));
    let caps = ScoringCaps::default();

    for set in configs::set_names() {
        let defs = configs::agent_set(set, store.clone(), caps).unwrap();
        let graph = AgentGraph::build(defs).unwrap();
        let entry = configs::entry_agent(set).unwrap();
        assert!(graph.get(entry).is_some(), "entry agent of {set} exists");
    }

    assert!(configs::agent_set("unknown", store, caps).is_none());
    assert!(configs::entry_agent("unknown").is_none());
}

#[test]
fn test_wellbeing_triangle_is_cyclic() {
    let store = Arc::new(MemoryStore::with_demo_data(Utc::now()));
    let defs = configs::wellbeing_agents(store, ScoringCaps::default());
    let graph = AgentGraph::build(defs).unwrap();

    let tracker = graph.get("habitTracker").unwrap();
    let calculator = graph.get("pointsCalculator").unwrap();
    let manager = graph.get("rewardsManager").unwrap();

    assert!(tracker.can_handoff_to("pointsCalculator"));
    assert!(calculator.can_handoff_to("habitTracker"));
    assert!(manager.can_handoff_to("pointsCalculator"));
    assert!(calculator.can_handoff_to("rewardsManager"));
}
