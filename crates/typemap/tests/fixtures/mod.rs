use std::io;
use std::sync::{Arc, Mutex};
use tessera_typemap::{Category, Definition, EntityRef, FetchOptions, TypeMap};
use tracing_subscriber::fmt::MakeWriter;

/// Lookup options for the `Type` category.
#[must_use]
pub fn types() -> FetchOptions {
    FetchOptions::new().category(Category::Type)
}

/// The `Color` type from the README scenario: key `color`, alias `colour`.
#[must_use]
pub fn color() -> EntityRef {
    Definition::builder("color", "Color").alias("colour").build()
}

/// A map seeded with the `base` scalars `Int` and `String`.
/// # Panics
/// * If registration fails.
#[must_use]
pub fn seeded_map() -> TypeMap {
    let map = TypeMap::new();
    for (key, name) in [("int", "Int"), ("string", "String")] {
        map.register(Definition::builder(key, name).build()).expect("Seeding failed");
    }
    map
}

/// A `MakeWriter` collecting formatted log lines in memory.
#[derive(Clone, Debug, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// # Panics
    /// * If the buffer lock is poisoned.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a thread-local subscriber writing into the returned buffer.
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, logs)
}
