use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::Result,
    events::{Listener, Subscription},
    protocol::{EventChannel, NativeRequest, Permission, PermissionStatus},
};

/// Binding to the platform fitness module
///
/// Implemented by the host for its platform. Every request resolves exactly
/// once; failures are reported as [`crate::FitError::Native`]. Events the
/// platform emits are delivered to listeners registered through
/// [`NativeBridge::add_listener`].
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Execute a request and return the raw payload
    ///
    /// # Errors
    ///
    /// Returns [`crate::FitError::Native`] when the platform call fails, or
    /// [`crate::FitError::Disconnected`] when the platform module is gone.
    async fn call(&self, request: NativeRequest) -> Result<Value>;

    /// Attach a listener to a native event channel
    fn add_listener(&self, channel: EventChannel, listener: Listener) -> Box<dyn Subscription>;

    /// Whether a device permission is currently granted
    async fn has_permission(&self, permission: Permission) -> bool;

    /// Prompt the user for a device permission
    async fn request_permission(&self, permission: Permission) -> PermissionStatus;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::{error::FitError, events::EventEmitter};
    use std::{
        collections::{HashMap, HashSet},
        sync::{Arc, Mutex},
    };

    /// In-memory bridge recording every request it receives
    #[derive(Clone, Default)]
    pub(crate) struct MockBridge {
        pub(crate) emitter: EventEmitter,
        requests: Arc<Mutex<Vec<NativeRequest>>>,
        responses: Arc<Mutex<HashMap<&'static str, std::result::Result<Value, String>>>>,
        granted: Arc<Mutex<HashSet<Permission>>>,
        prompt_answer: Arc<Mutex<Option<PermissionStatus>>>,
        authorize_outcome: Arc<Mutex<Option<std::result::Result<(), String>>>>,
        authorize_listeners: Arc<Mutex<Option<(usize, usize)>>>,
    }

    impl MockBridge {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Answer `method` with a payload
        pub(crate) fn respond(&self, method: &'static str, payload: Value) {
            self.responses.lock().unwrap().insert(method, Ok(payload));
        }

        /// Fail `method` with a native error
        pub(crate) fn fail(&self, method: &'static str, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .insert(method, Err(message.to_string()));
        }

        /// Emit an authorize outcome event when `authorize` is called
        pub(crate) fn authorize_with(&self, outcome: std::result::Result<(), String>) {
            *self.authorize_outcome.lock().unwrap() = Some(outcome);
        }

        pub(crate) fn grant(&self, permission: Permission) {
            self.granted.lock().unwrap().insert(permission);
        }

        pub(crate) fn answer_prompt(&self, status: PermissionStatus) {
            *self.prompt_answer.lock().unwrap() = Some(status);
        }

        pub(crate) fn requests(&self) -> Vec<NativeRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn calls_to(&self, method: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.method() == method)
                .count()
        }

        pub(crate) fn last_request(&self) -> Option<NativeRequest> {
            self.requests.lock().unwrap().last().cloned()
        }

        /// Success and failure listener counts seen when `authorize` arrived
        pub(crate) fn authorize_listeners(&self) -> Option<(usize, usize)> {
            *self.authorize_listeners.lock().unwrap()
        }
    }

    #[async_trait]
    impl NativeBridge for MockBridge {
        async fn call(&self, request: NativeRequest) -> Result<Value> {
            let method = request.method();
            self.requests.lock().unwrap().push(request);

            if method == "authorize" {
                *self.authorize_listeners.lock().unwrap() = Some((
                    self.emitter
                        .listener_count(EventChannel::AuthorizeSuccess.name()),
                    self.emitter
                        .listener_count(EventChannel::AuthorizeFailure.name()),
                ));

                let outcome = self.authorize_outcome.lock().unwrap().clone();
                match outcome {
                    Some(Ok(())) => {
                        self.emitter
                            .emit(EventChannel::AuthorizeSuccess.name(), &Value::Null);
                    }
                    Some(Err(message)) => {
                        self.emitter.emit(
                            EventChannel::AuthorizeFailure.name(),
                            &serde_json::json!({ "message": message }),
                        );
                    }
                    None => {}
                }
            }

            match self.responses.lock().unwrap().get(method) {
                Some(Ok(payload)) => Ok(payload.clone()),
                Some(Err(message)) => Err(FitError::Native(message.clone())),
                None => Ok(Value::Null),
            }
        }

        fn add_listener(&self, channel: EventChannel, listener: Listener) -> Box<dyn Subscription> {
            Box::new(self.emitter.add_listener(channel.name(), listener))
        }

        async fn has_permission(&self, permission: Permission) -> bool {
            self.granted.lock().unwrap().contains(&permission)
        }

        async fn request_permission(&self, permission: Permission) -> PermissionStatus {
            let answer = self
                .prompt_answer
                .lock()
                .unwrap()
                .unwrap_or(PermissionStatus::Denied);
            if answer.is_granted() {
                self.grant(permission);
            }
            answer
        }
    }
}
