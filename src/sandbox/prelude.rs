/// Builds the console object handed to snippets.
///
/// Evaluates to a factory taking the native `record(level, ...parts)`
/// function. Arguments are rendered here so that formatting follows the
/// interpreter's own `typeof`, `JSON.stringify` and `String` semantics.
pub const CONSOLE_PRELUDE: &str = r#"
(function (record) {
    function render(value) {
        // typeof null === 'object' as well, which stringifies to "null"
        if (typeof value === 'object') {
            var json = JSON.stringify(value, null, 2);
            return json === undefined ? 'undefined' : json;
        }
        return String(value);
    }

    function emit(level) {
        return function () {
            var parts = [level];
            for (var i = 0; i < arguments.length; i++) {
                parts.push(render(arguments[i]));
            }
            record.apply(null, parts);
        };
    }

    return Object.freeze({
        log: emit('log'),
        info: emit('info'),
        debug: emit('debug'),
        warn: emit('warn'),
        error: emit('error')
    });
})
"#;

/// Builds a namespace object for Rust-backed methods.
///
/// Evaluates to a factory taking the native `invoke(method, argsJson)`
/// function and the list of method names. Values cross as JSON text.
pub const NATIVE_NAMESPACE_PRELUDE: &str = r#"
(function (invoke, methods) {
    var target = {};
    methods.forEach(function (method) {
        target[method] = function () {
            var args = JSON.stringify(Array.prototype.slice.call(arguments));
            return JSON.parse(invoke(method, args));
        };
    });
    return Object.freeze(target);
})
"#;

/// Wrap a normalized snippet so it runs as one asynchronous unit whose
/// promise is returned to the caller.
pub fn wrap_body(body: &str) -> String {
    format!("return (async () => {{\n{}\n}})();", body)
}
