//! Two processes on one node: a calculator answering named calls and a
//! driver issuing blocking-style calls from its message handler.
//!
//! Run with:
//!
//! ```sh
//! cargo run --example pingpong
//! ```

use std::sync::Arc;
use std::time::Duration;
use tact::prelude::*;

struct Calculator;

#[async_trait]
impl Reactor for Calculator {
    async fn on_receive(&self, _ctx: &mut ProcessContext) {}

    fn handle_call(&self, method: &str, args: &[u8]) -> Result<Vec<u8>, CallError> {
        match method {
            "add" => {
                let (a, b) = <(i64, i64)>::decode(args)
                    .map_err(|e| CallError::BadResponse(e.to_string()))?;
                Ok((a + b).encode())
            }
            "div" => {
                let (a, b) = <(i64, i64)>::decode(args)
                    .map_err(|e| CallError::BadResponse(e.to_string()))?;
                // A zero divisor panics; the runtime turns that into an
                // error response rather than crashing the process.
                Ok((a / b).encode())
            }
            other => Err(CallError::UnknownMethod(other.to_owned())),
        }
    }
}

struct Driver {
    calculator: Pid,
}

#[async_trait]
impl Reactor for Driver {
    async fn on_receive(&self, ctx: &mut ProcessContext) {
        if ctx.message() != &Message::Started {
            return;
        }
        let timeout = Duration::from_secs(2);

        let sum: i64 = ctx
            .call(self.calculator, "add", &(20i64, 22i64), timeout)
            .await
            .expect("add should succeed");
        println!("20 + 22 = {sum}");

        let div: Result<i64, CallError> =
            ctx.call(self.calculator, "div", &(1i64, 0i64), timeout).await;
        println!("1 / 0 -> {div:?}");

        let missing: Result<i64, CallError> = ctx
            .call(self.calculator, "mul", &(6i64, 7i64), timeout)
            .await;
        println!("mul -> {missing:?}");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let node = Node::start(1);
    let calculator = node.create_process(Arc::new(Calculator));
    let _driver = node.create_process(Arc::new(Driver { calculator }));

    // Give the frame-paced loops time to run the three calls.
    tokio::time::sleep(Duration::from_secs(2)).await;
    node.stop().await;
}
