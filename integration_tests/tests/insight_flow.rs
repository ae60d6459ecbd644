mod common;

use async_trait::async_trait;
use radar_core::{InsightStatus, RadarState};
use radar_runtime::{get_insight, InsightError, TextGenerator};
use radar_schema::sample_items;

struct Canned(&'static str);

#[async_trait]
impl TextGenerator for Canned {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        assert!(prompt.contains("Trend:"));
        Ok(self.0.to_string())
    }
}

struct Unreachable;

#[async_trait]
impl TextGenerator for Unreachable {
    async fn generate(&self, _prompt: &str) -> Result<String, InsightError> {
        Err(InsightError::EmptyResponse)
    }
}

#[tokio::test]
async fn selected_item_receives_its_insight() {
    let config = common::test_config();
    let mut state = RadarState::new(config, sample_items(), 1);

    let ticket = state.select_item(4).expect("item 4 exists");
    let trend = state.insight().map(|view| view.item.text.clone()).unwrap_or_default();
    assert!(state.insight().is_some_and(|view| view.is_loading()));

    let text = get_insight(&Canned("- Risk: churn\n- Opportunity: upsell"), &trend).await;
    assert!(state.resolve_insight(ticket, text));
    match state.insight().map(|view| &view.status) {
        Some(InsightStatus::Ready(text)) => assert!(text.contains("upsell")),
        other => panic!("unexpected insight state {other:?}"),
    }
}

#[tokio::test]
async fn stale_and_failed_insights() {
    let config = common::test_config();
    let mut state = RadarState::new(config, sample_items(), 1);

    let first = state.select_item(1).expect("item 1 exists");
    let second = state.select_item(2).expect("item 2 exists");
    assert!(!state.resolve_insight(first, "late answer".to_string()));

    let text = get_insight(&Unreachable, "anything").await;
    assert!(text.starts_with("Failed to retrieve AI insight. Error: "));
    assert!(state.resolve_insight(second, text));

    state.close_insight();
    assert!(state.insight().is_none());
    assert!(state.select_item(999).is_none());
}
