//! In-memory gateway for tests: records every call and answers from a
//! responder closure.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{Gateway, GatewayError};

#[derive(Debug, Clone)]
pub(crate) struct GatewayCall {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

type Responder = Box<dyn Fn(&GatewayCall) -> Result<String, GatewayError> + Send + Sync>;

pub(crate) struct ScriptedGateway {
    calls: Mutex<Vec<GatewayCall>>,
    responder: Responder,
}

impl ScriptedGateway {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GatewayCall) -> Result<String, GatewayError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Always answer with the same text
    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fail with the given error
    pub fn failing(err: GatewayError) -> Self {
        Self::new(move |_| Err(err.clone()))
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, GatewayError> {
        let call = GatewayCall {
            system: system.to_string(),
            user: user.to_string(),
            max_tokens,
        };
        let result = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        result
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
