use crate::coordinator::Coordinator;
use crate::coordinator::audit;
use crate::coordinator::handlers;
use crate::coordinator::paths::BriefPaths;
use crate::coordinator::warn;
use crate::error::BriefError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

pub type HandlerFn = fn(&Coordinator, Value) -> Result<Value, BriefError>;

/// Inbound message from the UI or a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(action: &str, payload: Value) -> Self {
        Self {
            action: action.to_string(),
            payload,
        }
    }
}

/// The response half of one request. Sending consumes it, so a second
/// response cannot be expressed; dropping it unsent answers with an
/// internal error, so no request is left hanging.
pub struct Responder {
    tx: Option<Sender<Value>>,
    action: String,
    paths: BriefPaths,
}

impl Responder {
    fn new(tx: Sender<Value>, action: &str, paths: &BriefPaths) -> Self {
        Self {
            tx: Some(tx),
            action: action.to_string(),
            paths: paths.clone(),
        }
    }

    pub fn finish(mut self, result: Result<Value, BriefError>) {
        let response = match result {
            Ok(value) => {
                audit::record(&self.paths, "router", "ok", &self.action);
                value
            }
            Err(err) => {
                audit::record(&self.paths, "router", err.kind().as_str(), &self.action);
                err.to_response()
            }
        };
        if let Some(tx) = self.tx.take() {
            // The requester may have gone away; that is not our failure.
            let _ = tx.send(response);
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        warn::emit(
            "RESPONDER_DROPPED",
            "router",
            &self.action,
            "handler ended without a response",
            "na",
        );
        let err = BriefError::Internal(format!("{} did not produce a response", self.action));
        let _ = tx.send(err.to_response());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    /// Answered on the dispatching thread.
    Inline,
    /// Answered later from a worker thread (network calls).
    Worker,
}

#[derive(Clone, Copy)]
struct Route {
    handler: HandlerFn,
    completion: Completion,
}

pub struct Router {
    coordinator: Arc<Coordinator>,
    routes: HashMap<&'static str, Route>,
}

impl Router {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        let mut router = Self {
            coordinator,
            routes: HashMap::new(),
        };
        for (action, handler, worker) in handlers::ROUTES {
            let completion = if worker {
                Completion::Worker
            } else {
                Completion::Inline
            };
            router.register(action, handler, completion);
        }
        router
    }

    fn register(&mut self, action: &'static str, handler: HandlerFn, completion: Completion) {
        self.routes.insert(
            action,
            Route {
                handler,
                completion,
            },
        );
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<_> = self.routes.keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    /// Start handling `envelope`; exactly one response arrives on the
    /// returned channel.
    pub fn dispatch(&self, envelope: Envelope) -> Receiver<Value> {
        let (tx, rx) = mpsc::channel();
        let responder = Responder::new(tx, &envelope.action, &self.coordinator.paths);

        let Some(route) = self.routes.get(envelope.action.as_str()).copied() else {
            responder.finish(Err(BriefError::UserInput(format!(
                "Unknown action: {}",
                envelope.action
            ))));
            return rx;
        };

        match route.completion {
            Completion::Inline => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    (route.handler)(&self.coordinator, envelope.payload)
                }));
                let result = outcome.unwrap_or_else(|_| {
                    Err(BriefError::Internal(format!("{} handler panicked", envelope.action)))
                });
                responder.finish(result);
            }
            Completion::Worker => {
                let coordinator = Arc::clone(&self.coordinator);
                let payload = envelope.payload;
                let spawned = thread::Builder::new()
                    .name(format!("route-{}", envelope.action))
                    .spawn(move || {
                        let result = (route.handler)(&coordinator, payload);
                        responder.finish(result);
                    });
                // On spawn failure the closure, and its responder, is dropped,
                // which still answers the request.
                if let Err(err) = spawned {
                    warn::emit(
                        "WORKER_SPAWN",
                        "router",
                        &envelope.action,
                        "could not start worker thread",
                        &err.to_string(),
                    );
                }
            }
        }
        rx
    }

    /// Dispatch and wait for the single response.
    pub fn call(&self, action: &str, payload: Value) -> Value {
        self.dispatch(Envelope::new(action, payload))
            .recv()
            .unwrap_or_else(|_| {
                BriefError::Internal(format!("{action} response channel closed")).to_response()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::testing::{FakeSummarizer, Fixture, article_page, fixture};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn router(root: &std::path::Path, summarizer: FakeSummarizer) -> (Router, Fixture) {
        let fx = fixture(root, summarizer, true);
        (Router::new(fx.coordinator.clone()), fx)
    }

    #[test]
    fn unknown_action_gets_exactly_one_error_response() {
        let tmp = tempdir().expect("tempdir");
        let (router, _fx) = router(tmp.path(), FakeSummarizer::ok());
        let rx = router.dispatch(Envelope::new("launchRockets", json!({})));

        let first = rx.recv_timeout(Duration::from_secs(2)).expect("response");
        assert_eq!(first["kind"], "user_input");
        assert!(first["error"].as_str().unwrap().contains("launchRockets"));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn worker_routes_answer_once_from_another_thread() {
        let tmp = tempdir().expect("tempdir");
        let (router, _fx) = router(tmp.path(), FakeSummarizer::ok());
        let rx = router.dispatch(Envelope::new("checkServerStatus", json!({})));
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).expect("response"),
            json!({"healthy": true})
        );
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn dropped_responder_still_answers() {
        let (tx, rx) = mpsc::channel();
        let tmp = tempdir().expect("tempdir");
        let paths = BriefPaths::under(tmp.path().to_path_buf());
        let responder = Responder::new(tx, "getStoredText", &paths);
        drop(responder);
        let got = rx.recv().expect("response");
        assert_eq!(got["kind"], "internal");
        assert!(rx.recv().is_err());
    }

    fn explode(_: &Coordinator, _: Value) -> Result<Value, BriefError> {
        panic!("handler blew up")
    }

    #[test]
    fn panicking_handlers_answer_once_with_internal_error() {
        let tmp = tempdir().expect("tempdir");
        let (mut router, _fx) = router(tmp.path(), FakeSummarizer::ok());
        router.register("explodeInline", explode, Completion::Inline);
        router.register("explodeWorker", explode, Completion::Worker);

        for action in ["explodeInline", "explodeWorker"] {
            let rx = router.dispatch(Envelope::new(action, json!({})));
            let first = rx.recv_timeout(Duration::from_secs(5)).expect("response");
            assert_eq!(first["kind"], "internal", "{action}");
            assert!(rx.recv_timeout(Duration::from_millis(100)).is_err(), "{action}");
        }
        assert_eq!(router.call("checkServerStatus", json!({})), json!({"healthy": true}));
    }

    #[test]
    fn short_text_is_rejected_before_the_summarizer_counts_a_call() {
        let tmp = tempdir().expect("tempdir");
        let (router, fx) = router(tmp.path(), FakeSummarizer::ok());
        let got = router.call("summarizeText", json!({"data": {"text": "x".repeat(30)}}));
        assert_eq!(got["kind"], "user_input");
        assert_eq!(fx.summarizer.calls(), 0);
    }

    #[test]
    fn concurrent_requests_are_independent() {
        let tmp = tempdir().expect("tempdir");
        let (router, fx) = router(tmp.path(), FakeSummarizer::ok());
        fx.pages.insert(1, article_page("https://example.com/a", ""));
        fx.pages.insert(2, article_page("https://example.com/b", ""));

        thread::scope(|scope| {
            for i in 0..8u64 {
                let router = &router;
                scope.spawn(move || {
                    let got = router.call(
                        "updateTabState",
                        json!({"tabId": i % 2 + 1, "state": {"n": i}}),
                    );
                    assert_eq!(got, json!({"success": true}));
                });
            }
        });
        let listed = fx.coordinator.tabs.tabs().expect("tabs");
        assert_eq!(listed, vec![1, 2]);
    }

    #[test]
    fn every_documented_action_is_routed() {
        let tmp = tempdir().expect("tempdir");
        let (router, _fx) = router(tmp.path(), FakeSummarizer::ok());
        let actions = router.actions();
        for action in [
            "getSelectedText",
            "getFullPageText",
            "getTabContent",
            "highlightText",
            "removeHighlight",
            "summarizeText",
            "openPopupWithText",
            "checkApiHealth",
            "checkServerStatus",
            "getStoredText",
            "clearStoredText",
            "updateTabState",
            "getTabState",
        ] {
            assert!(actions.contains(&action), "missing route {action}");
        }
    }
}
