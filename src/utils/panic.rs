pub fn setup() {
    // Full backtraces while debugging, short ones in release builds
    let verbosity = if cfg!(debug_assertions) {
        color_backtrace::Verbosity::Full
    } else {
        color_backtrace::Verbosity::Minimal
    };
    color_backtrace::BacktracePrinter::new()
        .verbosity(verbosity)
        .lib_verbosity(color_backtrace::Verbosity::Minimal)
        .install(color_backtrace::default_output_stream());
}
