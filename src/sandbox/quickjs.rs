use rquickjs::function::Rest;
use rquickjs::{Context, Ctx, Exception, Function, Promise, Runtime, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::Interpreter;
use super::capture::{Level, OutputCapture};
use super::error::{ExecutionError, UNKNOWN_ERROR_MESSAGE};
use super::prelude::{CONSOLE_PRELUDE, NATIVE_NAMESPACE_PRELUDE, wrap_body};
use crate::bindings::{BindingSet, BindingValue, CONSOLE_NAME, NativeNamespace};
use crate::config::SandboxConfig;

/// QuickJS-backed interpreter. Every run gets its own runtime and context,
/// so nothing a snippet defines survives into the next run.
#[derive(Debug, Clone, Default)]
pub struct QuickJs {
    config: SandboxConfig,
}

impl QuickJs {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }
}

impl Interpreter for QuickJs {
    fn execute(
        &self,
        body: &str,
        bindings: &BindingSet,
        capture: &OutputCapture,
    ) -> Result<(), ExecutionError> {
        let runtime = Runtime::new().map_err(|e| ExecutionError::Runtime(e.to_string()))?;
        runtime.set_memory_limit(self.config.memory_limit);
        runtime.set_max_stack_size(self.config.max_stack_size);

        let interrupted = Arc::new(AtomicBool::new(false));
        if let Some(timeout) = self.config.timeout() {
            let deadline = Instant::now() + timeout;
            let flag = Arc::clone(&interrupted);
            runtime.set_interrupt_handler(Some(Box::new(move || {
                let expired = Instant::now() >= deadline;
                if expired {
                    flag.store(true, Ordering::Relaxed);
                }
                expired
            })));
        }

        let context =
            Context::full(&runtime).map_err(|e| ExecutionError::Runtime(e.to_string()))?;

        let result = context.with(|ctx| run(&ctx, body, bindings, capture));

        // The interrupt can surface as a thrown error or, when it hits a queued
        // job, as a promise left pending; both mean the budget ran out
        match result {
            Err(_) if interrupted.load(Ordering::Relaxed) => Err(ExecutionError::Interrupted),
            other => other,
        }
    }
}

fn run<'js>(
    ctx: &Ctx<'js>,
    body: &str,
    bindings: &BindingSet,
    capture: &OutputCapture,
) -> Result<(), ExecutionError> {
    let console =
        console_object(ctx, capture).map_err(|e| ExecutionError::Runtime(describe(ctx, e)))?;

    // Parameter list and argument list line up index for index
    let mut params = Vec::with_capacity(bindings.len() + 2);
    let mut args = Vec::with_capacity(bindings.len() + 1);
    params.push(CONSOLE_NAME.to_string());
    args.push(console);

    for binding in bindings.iter() {
        let value = binding_value(ctx, &binding.value).map_err(|e| ExecutionError::Binding {
            name: binding.name.clone(),
            message: describe(ctx, e),
        })?;
        params.push(binding.name.clone());
        args.push(value);
    }
    params.push(wrap_body(body));

    let constructor: Function = ctx
        .globals()
        .get("Function")
        .map_err(|e| ExecutionError::Runtime(describe(ctx, e)))?;
    let callable: Function = constructor
        .call((Rest(params),))
        .map_err(|e| ExecutionError::Construction(describe(ctx, e)))?;

    let pending: Promise<'js> = callable
        .call((Rest(args),))
        .map_err(|e| ExecutionError::Execution(describe(ctx, e)))?;

    match pending.finish::<Value<'js>>() {
        Ok(_) => Ok(()),
        Err(rquickjs::Error::WouldBlock) => {
            // A queued job may have thrown without rejecting the snippet's promise
            let thrown = ctx.catch();
            if thrown.as_exception().is_some() {
                Err(ExecutionError::Execution(describe_thrown(&thrown)))
            } else {
                Err(ExecutionError::Unsettled)
            }
        }
        Err(e) => Err(ExecutionError::Execution(describe(ctx, e))),
    }
}

fn console_object<'js>(ctx: &Ctx<'js>, capture: &OutputCapture) -> rquickjs::Result<Value<'js>> {
    let capture = capture.clone();
    let record = Function::new(ctx.clone(), move |level: String, parts: Rest<String>| {
        capture.record(Level::from_tag(&level), &parts.0);
    })?;

    let factory: Function = ctx.eval(CONSOLE_PRELUDE)?;
    factory.call((record,))
}

fn binding_value<'js>(ctx: &Ctx<'js>, value: &BindingValue) -> rquickjs::Result<Value<'js>> {
    match value {
        // Returned from a function body so an object literal is not read as a
        // block; a trailing `;` or comment after the expression is fine
        BindingValue::Script(source) => ctx.eval(format!(
            "(function () {{\nreturn {}\n}})()",
            skip_leading_comments(source)
        )),
        BindingValue::Json(data) => json_parse(ctx, &data.to_string()),
        BindingValue::Native(namespace) => native_object(ctx, namespace),
    }
}

/// `return` followed by a line break returns `undefined`, so the expression
/// has to start on the same line.
fn skip_leading_comments(source: &str) -> &str {
    let mut rest = source.trim_start();
    loop {
        if let Some(line) = rest.strip_prefix("//") {
            rest = line.split_once('\n').map(|(_, after)| after).unwrap_or("").trim_start();
        } else if let Some(block) = rest.strip_prefix("/*") {
            rest = block.split_once("*/").map(|(_, after)| after).unwrap_or("").trim_start();
        } else {
            return rest;
        }
    }
}

fn native_object<'js>(ctx: &Ctx<'js>, namespace: &NativeNamespace) -> rquickjs::Result<Value<'js>> {
    let methods: Vec<String> = namespace.method_names().map(str::to_string).collect();
    let namespace = namespace.clone();

    let invoke = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, method: String, args: String| -> rquickjs::Result<String> {
            let Some(function) = namespace.method(&method) else {
                return Err(Exception::throw_reference(
                    &ctx,
                    &format!("{} is not a function", method),
                ));
            };
            let args: Vec<serde_json::Value> = serde_json::from_str(&args)
                .map_err(|e| Exception::throw_type(&ctx, &e.to_string()))?;

            match function(&args) {
                Ok(result) => Ok(result.to_string()),
                Err(message) => Err(Exception::throw_message(&ctx, &message)),
            }
        },
    )?;

    let factory: Function = ctx.eval(NATIVE_NAMESPACE_PRELUDE)?;
    factory.call((invoke, methods))
}

fn json_parse<'js>(ctx: &Ctx<'js>, text: &str) -> rquickjs::Result<Value<'js>> {
    let json: rquickjs::Object = ctx.globals().get("JSON")?;
    let parse: Function = json.get("parse")?;
    parse.call((text,))
}

/// Turn an interpreter error into the message shown to the user, taking the
/// pending exception off the context when there is one.
fn describe(ctx: &Ctx<'_>, error: rquickjs::Error) -> String {
    if !matches!(error, rquickjs::Error::Exception) {
        return error.to_string();
    }
    describe_thrown(&ctx.catch())
}

fn describe_thrown(thrown: &Value<'_>) -> String {
    let Some(exception) = thrown.as_exception() else {
        return UNKNOWN_ERROR_MESSAGE.to_string();
    };

    match exception.message() {
        Some(message) if !message.is_empty() => message,
        // `throw new TypeError()` still has a useful name
        _ => thrown
            .as_object()
            .and_then(|object| object.get::<_, String>("name").ok())
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
    }
}
