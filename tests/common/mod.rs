#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod fixtures {
    use dtogen::{DaoAssembly, DaoType};

    pub const BILLING_YAML: &str = r#"
name: Billing
default_connection: Primary
types:
  - name: Invoice
    namespace: Acme.Billing
    table: true
    members:
      - { name: Id, type: int }
      - { name: Number, type: string }
      - { name: Total, type: "decimal?" }
  - name: Customer
    namespace: Acme.Billing
    table: true
    table_name: customers
    members:
      - { name: Id, type: int }
      - { name: Name, type: string }
  - name: AuditHelper
    namespace: Acme.Billing
    members:
      - { name: Note, type: string }
"#;

    /// Two table types plus one plain type, all in `Acme.Billing`.
    pub fn billing_assembly() -> DaoAssembly {
        DaoAssembly::new(
            "Billing",
            vec![
                DaoType::new("Acme.Billing", "Invoice")
                    .as_table()
                    .with_member("Id", "int")
                    .with_member("Number", "string")
                    .with_member("Total", "decimal?"),
                DaoType::new("Acme.Billing", "Customer")
                    .as_table()
                    .with_member("Id", "int")
                    .with_member("Name", "string"),
                DaoType::new("Acme.Billing", "AuditHelper").with_member("Note", "string"),
            ],
        )
    }
}

pub mod stub_compiler {
    use dtogen::generator::{CompileOutput, CompileRequest, Compiler, SOURCE_ENTRY};
    use dtogen::{GeneratorError, Result};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Compiler double that writes the requested artifact and records every call.
    #[derive(Debug, Default)]
    pub struct StubCompiler {
        pub calls: AtomicUsize,
        /// Source units seen at compile time, in call order
        pub sources: Mutex<Vec<String>>,
        pub delay: Option<Duration>,
        pub fail_with: Option<String>,
        in_flight: AtomicBool,
        /// Set when two compilations ever overlapped
        pub overlapped: AtomicBool,
    }

    impl StubCompiler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        pub fn failing(diagnostics: &str) -> Self {
            Self {
                fail_with: Some(diagnostics.to_string()),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Compiler for StubCompiler {
        fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            let source = std::fs::read_to_string(request.source_dir.join(SOURCE_ENTRY))
                .unwrap_or_default();
            self.sources.lock().unwrap().push(source);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.in_flight.store(false, Ordering::SeqCst);

            if let Some(diagnostics) = &self.fail_with {
                return Err(GeneratorError::Compilation {
                    artifact: request
                        .output
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    diagnostics: diagnostics.clone(),
                });
            }
            std::fs::write(request.output, b"rlib").unwrap();
            Ok(CompileOutput {
                artifact_path: PathBuf::from(request.output),
                diagnostics: vec![format!("compiled {}", request.crate_name)],
            })
        }
    }
}

pub mod log_capture {
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink for the current thread's subscriber.
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with JSON logs captured; returns its result and the raw log lines.
    pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(logs.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs.contents())
    }
}

pub mod temp_files {
    use std::path::PathBuf;

    /// Writes `content` into a fresh temp dir as `file_name`; keep the dir alive for the test.
    pub fn write_temp(file_name: &str, content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}
