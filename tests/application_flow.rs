mod common;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use common::{job_url, simple_job, Action, El, FakePage, Harness, BASE_URL};
use quick_apply::models::{
    AttemptResult, FailureReason, FieldKind, FieldSnapshot, JobListing, Provider, SkipReason,
};
use quick_apply::services::{AutoApproveGate, InterventionRequest, ManualGate};
use quick_apply::workflow::{ApplicationFlow, JobCtx};
use quick_apply::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn listing(id: &str) -> JobListing {
    JobListing {
        title: format!("Engineer {}", id),
        company: "Acme".into(),
        provider_job_id: id.into(),
        url: job_url(id),
        provider: Provider::LinkedIn,
        previously_applied: false,
        discovered_at: Utc::now(),
    }
}

fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

async fn apply(
    page: &FakePage,
    gate: &dyn ManualGate,
    listing: &JobListing,
) -> Result<AttemptResult, AppError> {
    let harness = Harness::new();
    let flow = ApplicationFlow::new(harness.ctx(page), gate, 5, None);
    flow.run(listing, &JobCtx::new(1, 1, listing)).await
}

fn failure(result: &AttemptResult) -> Option<&FailureReason> {
    match result {
        AttemptResult::Completed(outcome) => outcome.failure_reason.as_ref(),
        AttemptResult::Skipped(_) => None,
    }
}

fn succeeded(result: &AttemptResult) -> bool {
    matches!(result, AttemptResult::Completed(outcome) if outcome.success)
}

/// 一直不返回的闸门
struct StuckGate;

#[async_trait]
impl ManualGate for StuckGate {
    async fn await_human_ack(&self, _request: &InterventionRequest) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// 记录每次请求中未填写的字段
#[derive(Default)]
struct RecordingGate {
    requests: Mutex<Vec<Vec<String>>>,
}

impl RecordingGate {
    fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManualGate for RecordingGate {
    async fn await_human_ack(&self, request: &InterventionRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.fields.clone());
        Ok(())
    }
}

/// 第一次请求时由操作者自己点了下一步
struct OperatorGate<'a> {
    page: &'a FakePage,
    advance_to: String,
    calls: AtomicUsize,
}

#[async_trait]
impl ManualGate for OperatorGate<'_> {
    async fn await_human_ack(&self, _request: &InterventionRequest) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.page.navigate_to(&self.advance_to).await;
        }
        Ok(())
    }
}

#[tokio::test]
async fn submits_without_questions_or_done_button() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1")).text("Easy Apply")]);
    page.screen(
        &url("/apply/1"),
        vec![El::new("header").text("Contact info"), El::button("submit", &url("/apply/1/sent"))],
    );
    page.screen(&url("/apply/1/sent"), vec![El::new("header").text("Your application was sent")]);
    let gate = AutoApproveGate::new();

    let result = apply(&page, &gate, &listing("1")).await.unwrap();

    assert!(succeeded(&result));
    assert_eq!(gate.calls(), 0);
    assert_eq!(page.clicks(), vec!["apply", "submit"]);
}

#[tokio::test]
async fn empty_required_field_invokes_gate_once() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/step1"))]);
    page.screen(
        &url("/apply/1/step1"),
        vec![
            El::new("header").text("Additional questions"),
            El::new("questions").child(
                El::new("field").fields(vec![FieldSnapshot::text("Years of Rust experience", "")]),
            ),
            El::button("next", &url("/apply/1/review")),
        ],
    );
    page.screen(
        &url("/apply/1/review"),
        vec![
            El::new("header").text("Review your application"),
            El::button("submit", &url("/apply/1/sent")),
        ],
    );
    page.screen(&url("/apply/1/sent"), vec![El::button("done", "about:blank").text("Done")]);
    let gate = AutoApproveGate::new();

    let result = apply(&page, &gate, &listing("1")).await.unwrap();

    assert!(succeeded(&result));
    assert_eq!(gate.calls(), 1);
    assert_eq!(page.clicks(), vec!["apply", "next", "submit", "done"]);
}

#[tokio::test]
async fn every_question_module_is_assessed() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/final"))]);
    page.screen(
        &url("/apply/1/final"),
        vec![
            El::new("questions")
                .child(El::new("field").fields(vec![FieldSnapshot::text("Years of Rust experience", "8")])),
            El::new("questions")
                .child(El::new("field").fields(vec![FieldSnapshot::text("Expected salary", "")])),
            El::button("submit", &url("/apply/1/sent")),
        ],
    );
    let gate = RecordingGate::default();

    let result = apply(&page, &gate, &listing("1")).await.unwrap();

    assert!(succeeded(&result));
    assert_eq!(gate.requests(), vec![vec!["Expected salary".to_string()]]);
}

#[tokio::test]
async fn operator_advancing_the_form_is_not_clicked_twice() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/step1"))]);
    page.screen(
        &url("/apply/1/step1"),
        vec![
            El::new("header").text("Step 1 of 2"),
            El::new("questions").child(El::new("field").fields(vec![FieldSnapshot::text("Salary", "")])),
            El::button("next", &url("/apply/1/step2")),
        ],
    );
    page.screen(
        &url("/apply/1/step2"),
        vec![
            El::new("header").text("Step 2 of 2"),
            El::new("questions").child(El::new("field").fields(vec![FieldSnapshot::text("Visa", "")])),
            El::button("submit", &url("/apply/1/sent")),
        ],
    );
    page.screen(&url("/apply/1/sent"), vec![El::button("done", "about:blank").text("Done")]);
    let gate = OperatorGate {
        page: &page,
        advance_to: url("/apply/1/step2"),
        calls: AtomicUsize::new(0),
    };

    let result = apply(&page, &gate, &listing("1")).await.unwrap();

    assert!(succeeded(&result));
    assert_eq!(gate.calls.load(Ordering::SeqCst), 2);
    assert_eq!(page.clicks(), vec!["apply", "submit", "done"]);
}

#[tokio::test]
async fn filled_fields_do_not_invoke_gate() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/step1"))]);
    page.screen(
        &url("/apply/1/step1"),
        vec![
            El::new("questions").child(El::new("field").fields(vec![
                FieldSnapshot::text("Years of Rust experience", "8"),
                FieldSnapshot::select("Work authorization", "yes", "Yes"),
                FieldSnapshot::group(FieldKind::RadioGroup, "Relocate?", true),
            ])),
            El::button("review", &url("/apply/1/review")),
        ],
    );
    page.screen(&url("/apply/1/review"), vec![El::button("submit", &url("/apply/1/sent"))]);
    let gate = AutoApproveGate::new();

    let result = apply(&page, &gate, &listing("1")).await.unwrap();

    assert!(succeeded(&result));
    assert_eq!(gate.calls(), 0);
}

#[tokio::test]
async fn placeholder_value_on_submit_screen_invokes_gate() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/final"))]);
    page.screen(
        &url("/apply/1/final"),
        vec![
            El::new("questions").child(El::new("field").fields(vec![
                FieldSnapshot::text("Phone", "Enter phone").with_placeholder("Enter phone"),
            ])),
            El::button("submit", &url("/apply/1/sent")),
        ],
    );
    let gate = AutoApproveGate::new();

    let result = apply(&page, &gate, &listing("1")).await.unwrap();

    assert!(succeeded(&result));
    assert_eq!(gate.calls(), 1);
}

#[tokio::test]
async fn error_mid_form_step_cleans_up_and_next_job_proceeds() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/step1"))]);
    page.screen(
        &url("/apply/1/step1"),
        vec![
            El::new("next").on_click(Action::Fail("element detached from DOM".into())),
            El::button("close", &url("/apply/1/confirm")),
        ],
    );
    page.screen(&url("/apply/1/confirm"), vec![El::button("discard", "about:blank")]);
    simple_job(&page, "2");

    let harness = Harness::new();
    let gate = AutoApproveGate::new();
    let flow = ApplicationFlow::new(harness.ctx(&page), &gate, 5, None);

    let first = listing("1");
    let result = flow.run(&first, &JobCtx::new(1, 2, &first)).await.unwrap();
    assert!(matches!(failure(&result), Some(FailureReason::FormInteraction(msg)) if msg.contains("detached")));
    assert!(page.clicked("close"));
    assert!(page.clicked("discard"));

    let second = listing("2");
    let result = flow.run(&second, &JobCtx::new(2, 2, &second)).await.unwrap();
    assert!(succeeded(&result));
    assert!(page.navigations().contains(&job_url("2")));
}

#[tokio::test]
async fn previously_applied_never_touches_the_page() {
    let page = FakePage::new();
    simple_job(&page, "1");
    let mut job = listing("1");
    job.previously_applied = true;

    let result = apply(&page, &AutoApproveGate::new(), &job).await.unwrap();

    assert!(matches!(result, AttemptResult::Skipped(SkipReason::PreviouslyApplied)));
    assert!(page.navigations().is_empty());
    assert!(page.clicks().is_empty());
}

#[tokio::test]
async fn already_applied_marker_on_details_skips() {
    let page = FakePage::new();
    page.screen(
        &job_url("1"),
        vec![El::new("status").text("Applied on 2024-05-01 · See application")],
    );

    let result = apply(&page, &AutoApproveGate::new(), &listing("1")).await.unwrap();

    assert!(matches!(result, AttemptResult::Skipped(SkipReason::AlreadyAppliedMarker)));
    assert!(page.clicks().is_empty());
}

#[tokio::test]
async fn missing_apply_button_fails_without_cleanup() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::new("external").text("Apply on company site")]);

    let result = apply(&page, &AutoApproveGate::new(), &listing("1")).await.unwrap();

    assert_eq!(failure(&result), Some(&FailureReason::NoApplyButton));
    assert_eq!(page.escapes(), 0);
}

#[tokio::test]
async fn missing_submit_button_fails_and_escapes_modal() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/broken"))]);
    page.screen(&url("/apply/1/broken"), vec![El::new("header").text("Something went wrong")]);

    let result = apply(&page, &AutoApproveGate::new(), &listing("1")).await.unwrap();

    assert_eq!(failure(&result), Some(&FailureReason::NoSubmitButton));
    assert_eq!(page.escapes(), 1);
}

#[tokio::test]
async fn endless_form_hits_step_cap() {
    let page = FakePage::new();
    let step = url("/apply/1/loop");
    page.screen(&job_url("1"), vec![El::button("apply", &step)]);
    page.screen(&step, vec![El::button("next", &step)]);

    let harness = Harness::new();
    let gate = AutoApproveGate::new();
    let flow = ApplicationFlow::new(harness.ctx(&page), &gate, 3, None);
    let job = listing("1");
    let result = flow.run(&job, &JobCtx::new(1, 1, &job)).await.unwrap();

    assert_eq!(failure(&result), Some(&FailureReason::TooManySteps));
    assert_eq!(page.clicks(), vec!["apply", "next", "next", "next"]);
}

#[tokio::test]
async fn manual_intervention_can_time_out() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::button("apply", &url("/apply/1/step1"))]);
    page.screen(
        &url("/apply/1/step1"),
        vec![
            El::new("questions").child(
                El::new("field").fields(vec![FieldSnapshot::group(FieldKind::CheckboxGroup, "Skills", false)]),
            ),
            El::button("next", &url("/apply/1/review")),
        ],
    );

    let harness = Harness::new();
    let flow = ApplicationFlow::new(harness.ctx(&page), &StuckGate, 5, Some(Duration::from_millis(30)));
    let job = listing("1");
    let result = flow.run(&job, &JobCtx::new(1, 1, &job)).await.unwrap();

    assert_eq!(failure(&result), Some(&FailureReason::ManualInterventionTimedOut));
    assert!(!page.clicked("next"));
}

#[tokio::test]
async fn session_loss_is_fatal() {
    let page = FakePage::new();
    page.screen(&job_url("1"), vec![El::new("apply").on_click(Action::KillSession)]);

    let result = apply(&page, &AutoApproveGate::new(), &listing("1")).await;

    assert!(matches!(result, Err(AppError::SessionLost { .. })));
}
