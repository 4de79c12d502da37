use pincer::uci::UciEngine;

fn main() {
    #[cfg(feature = "logging")]
    init_logging();

    UciEngine::new().run();
}

/// Route `log` records to stderr so they never interleave with protocol
/// output on stdout.
#[cfg(feature = "logging")]
fn init_logging() {
    struct StderrLogger;

    impl log::Log for StderrLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Info
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                eprintln!("[{}] {}", record.level(), record.args());
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: StderrLogger = StderrLogger;
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(log::LevelFilter::Info));
}
