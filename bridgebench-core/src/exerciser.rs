// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Call-pattern exerciser.
//!
//! The call shapes a driver measures across the bridge:
//!
//! - **echo**: opaque passthrough, base round-trip latency
//! - **echo_bytes**: mutate-and-return over a binary buffer
//! - **countdown**: control bouncing between the two sides until the counter
//!   reaches zero, measuring re-entrant callback overhead
//!
//! `Echo` and `Countdown` are implemented both by local objects and by the
//! remote proxies in [`crate::bridge`], so the same logic runs in-process or
//! across a connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;

use crate::bridge::Value;
use crate::error::{BridgeError, BridgeResult};
use crate::rng::ByteGenerator;
use crate::types::{ObjectId, Seed};

/// Sentinel written to the first byte by `echo_bytes`.
pub const FIRST_BYTE_SENTINEL: u8 = 1;
/// Sentinel written to the last byte by `echo_bytes`.
pub const LAST_BYTE_SENTINEL: u8 = 2;

/// Return the input unchanged.
pub fn echo<T>(value: T) -> T {
    value
}

/// Set the first byte to 1 and the last byte to 2, then return the buffer.
///
/// Empty buffers are rejected. A single-byte buffer ends up as `[2]`: both
/// writes hit the same slot and the last one wins.
pub fn echo_bytes(mut buffer: Vec<u8>) -> BridgeResult<Vec<u8>> {
    let last = buffer
        .len()
        .checked_sub(1)
        .ok_or_else(|| BridgeError::invalid_argument("echo_bytes", "buffer must not be empty"))?;
    buffer[0] = FIRST_BYTE_SENTINEL;
    buffer[last] = LAST_BYTE_SENTINEL;
    Ok(buffer)
}

/// Something that answers `echo`.
#[async_trait]
pub trait Echo: Send + Sync {
    async fn echo(&self, value: Value) -> BridgeResult<Value>;
}

/// Local echo that hands the value straight back.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueEcho;

#[async_trait]
impl Echo for ValueEcho {
    async fn echo(&self, value: Value) -> BridgeResult<Value> {
        Ok(echo(value))
    }
}

/// One side of the countdown ping-pong.
#[async_trait]
pub trait Countdown: Send + Sync {
    /// Return 0 if `count` is 0, otherwise `peer.countdown(count - 1, self)`.
    async fn countdown(&self, count: i64, peer: Arc<dyn Countdown>) -> BridgeResult<i64>;

    /// Id under which the other side of a connection can reach this object.
    ///
    /// Only objects exported by the local side have one; handles are always
    /// passed over the wire as references into the sender's registry.
    fn object_id(&self) -> Option<&ObjectId> {
        None
    }

    /// Whether calls go out over a connection rather than staying in-process.
    fn is_remote(&self) -> bool {
        false
    }
}

/// Local countdown that records how often it was invoked.
#[derive(Debug)]
pub struct CountdownExerciser {
    this: Weak<CountdownExerciser>,
    object_id: Option<ObjectId>,
    calls: AtomicU64,
}

impl CountdownExerciser {
    /// A countdown usable in-process only.
    pub fn new() -> Arc<Self> {
        Self::build(None)
    }

    /// A countdown reachable by the peer under `object_id`.
    pub fn exported(object_id: ObjectId) -> Arc<Self> {
        Self::build(Some(object_id))
    }

    fn build(object_id: Option<ObjectId>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            object_id,
            calls: AtomicU64::new(0),
        })
    }

    /// Number of `countdown` invocations received so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Acquire)
    }

    /// Reset the invocation counter.
    pub fn reset(&self) {
        self.calls.store(0, Ordering::Release);
    }

    /// Start a countdown from this side: `peer.countdown(count, self)`.
    pub async fn start(&self, count: i64, peer: Arc<dyn Countdown>) -> BridgeResult<i64> {
        validate_count("start_countdown", count)?;
        peer.countdown(count, self.handle()?).await
    }

    fn handle(&self) -> BridgeResult<Arc<dyn Countdown>> {
        match self.this.upgrade() {
            Some(this) => Ok(this),
            None => Err(BridgeError::ObjectDropped),
        }
    }
}

#[async_trait]
impl Countdown for CountdownExerciser {
    async fn countdown(&self, count: i64, peer: Arc<dyn Countdown>) -> BridgeResult<i64> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        validate_count("countdown", count)?;

        if count == 0 {
            return Ok(0);
        }

        tracing::trace!(count, "countdown bounce");
        let this = self.handle()?;
        if peer.is_remote() {
            return peer.countdown(count - 1, this).await;
        }

        // Two local sides would nest one future per bounce; run each hop as
        // its own task so the stack stays flat for any count.
        tokio::spawn(async move { peer.countdown(count - 1, this).await }).await?
    }

    fn object_id(&self) -> Option<&ObjectId> {
        self.object_id.as_ref()
    }
}

fn validate_count(method: &'static str, count: i64) -> BridgeResult<()> {
    if count < 0 {
        return Err(BridgeError::invalid_argument(
            method,
            format!("count must be non-negative, got {}", count),
        ));
    }
    Ok(())
}

/// The callee's exported behavior: byte generation plus every call shape.
#[derive(Debug)]
pub struct BenchmarkUtility {
    generator: Mutex<ByteGenerator>,
    countdown: Arc<CountdownExerciser>,
}

impl BenchmarkUtility {
    pub fn new(seed: Seed) -> Self {
        Self {
            generator: Mutex::new(ByteGenerator::new(seed)),
            countdown: CountdownExerciser::exported(ObjectId::entry_point()),
        }
    }

    pub fn seed(&self) -> Seed {
        self.generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seed()
    }

    /// Next `length` bytes from the seeded stream.
    pub fn get_bytes(&self, length: usize) -> Vec<u8> {
        self.generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_bytes(length)
    }

    pub fn echo(&self, value: Value) -> Value {
        echo(value)
    }

    pub fn echo_bytes(&self, buffer: Vec<u8>) -> BridgeResult<Vec<u8>> {
        echo_bytes(buffer)
    }

    /// Countdown entered by the driver.
    pub async fn countdown(&self, count: i64, peer: Arc<dyn Countdown>) -> BridgeResult<i64> {
        self.countdown.countdown(count, peer).await
    }

    /// Countdown started by the callee against the driver's object.
    pub async fn start_countdown(&self, count: i64, peer: Arc<dyn Countdown>) -> BridgeResult<i64> {
        self.countdown.start(count, peer).await
    }

    /// Ask the driver's echo object to answer `value`.
    pub async fn call_echo(&self, peer: &dyn Echo, value: Value) -> BridgeResult<Value> {
        peer.echo(value).await
    }

    /// The countdown object shared by `countdown` and `start_countdown`.
    pub fn countdown_exerciser(&self) -> &Arc<CountdownExerciser> {
        &self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_passthrough() {
        assert_eq!(echo(42), 42);
        assert_eq!(echo("hello"), "hello");
        let value = Value::Bytes(vec![1, 2, 3]);
        assert_eq!(echo(value.clone()), value);
    }

    #[test]
    fn test_echo_bytes_sets_sentinels() {
        let buffer = vec![9u8; 8];
        let result = echo_bytes(buffer).unwrap();
        assert_eq!(result, vec![1, 9, 9, 9, 9, 9, 9, 2]);
    }

    #[test]
    fn test_echo_bytes_two_bytes() {
        assert_eq!(echo_bytes(vec![5, 6]).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_echo_bytes_single_byte_last_write_wins() {
        assert_eq!(echo_bytes(vec![5]).unwrap(), vec![2]);
    }

    #[test]
    fn test_echo_bytes_empty_rejected() {
        let err = echo_bytes(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidArgument {
                method: "echo_bytes",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_countdown_zero_is_terminal() {
        let a = CountdownExerciser::new();
        let b = CountdownExerciser::new();
        assert_eq!(a.countdown(0, b.clone()).await.unwrap(), 0);
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_countdown_bounces_k_times() {
        for k in [1i64, 2, 5, 20, 101] {
            let a = CountdownExerciser::new();
            let b = CountdownExerciser::new();
            assert_eq!(a.countdown(k, b.clone()).await.unwrap(), 0);
            // One direct call plus k cross-side invocations.
            assert_eq!(a.calls() + b.calls(), k as u64 + 1);
            assert_eq!(b.calls(), (k as u64 + 1) / 2);
        }
    }

    #[tokio::test]
    async fn test_countdown_deep_in_process() {
        let k = 50_000i64;
        let a = CountdownExerciser::new();
        let b = CountdownExerciser::new();
        assert_eq!(a.countdown(k, b.clone()).await.unwrap(), 0);
        assert_eq!(a.calls() + b.calls(), k as u64 + 1);
        assert_eq!(b.calls(), (k as u64 + 1) / 2);
    }

    #[tokio::test]
    async fn test_start_countdown_twenty() {
        let callee = CountdownExerciser::new();
        let driver = CountdownExerciser::new();
        assert_eq!(callee.start(20, driver.clone()).await.unwrap(), 0);
        assert_eq!(driver.calls(), 11);
        assert_eq!(callee.calls(), 10);

        driver.reset();
        assert_eq!(driver.calls(), 0);
    }

    #[tokio::test]
    async fn test_countdown_negative_rejected() {
        let a = CountdownExerciser::new();
        let b = CountdownExerciser::new();
        assert!(a.countdown(-1, b.clone()).await.is_err());
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_utility_uses_seed() {
        let utility = BenchmarkUtility::new(Seed::DEFAULT);
        assert_eq!(utility.seed(), Seed::DEFAULT);
        assert_eq!(utility.get_bytes(4), vec![65, 196, 120, 187]);

        let echoed = utility
            .call_echo(&ValueEcho, Value::Int(1))
            .await
            .unwrap();
        assert_eq!(echoed, Value::Int(1));
        assert_eq!(
            utility.countdown_exerciser().object_id(),
            Some(&ObjectId::entry_point())
        );
    }
}
