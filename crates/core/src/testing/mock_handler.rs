//! Mock format handler for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::format::{FileData, FileFormat};
use crate::handler::{FormatHandler, HandlerError};

/// A recorded conversion call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// MIME type the handler was asked to read.
    pub input_mime: String,
    /// MIME type the handler was asked to write.
    pub output_mime: String,
    /// Names of the files that were passed in.
    pub input_names: Vec<String>,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the FormatHandler trait.
///
/// Provides controllable behavior for testing:
/// - Declare the formats reported after `init`
/// - Simulate init failures
/// - Fail or empty specific conversions by MIME pair
/// - Track conversion calls for assertions
///
/// Successful conversions return one file per input, renamed to the output
/// extension, with the output MIME type appended to the bytes so tests can
/// follow the hops a file went through.
///
/// # Example
///
/// ```rust,ignore
/// use chainconv_core::testing::MockHandler;
///
/// let handler = MockHandler::new("imagetool")
///     .with_formats(vec![png.clone(), jpeg.clone()]);
/// handler.fail_conversion("image/png", "image/jpeg");
///
/// // ...run conversions...
///
/// assert_eq!(handler.conversion_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockHandler {
    name: String,
    formats: Vec<FileFormat>,
    ready: AtomicBool,
    fail_init: AtomicBool,
    init_calls: AtomicUsize,
    failing: Mutex<Vec<(String, String)>>,
    empty: Mutex<Vec<(String, String)>>,
    conversions: Mutex<Vec<RecordedConversion>>,
}

impl MockHandler {
    /// Create a new mock handler without formats.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formats: Vec::new(),
            ready: AtomicBool::new(false),
            fail_init: AtomicBool::new(false),
            init_calls: AtomicUsize::new(0),
            failing: Mutex::new(Vec::new()),
            empty: Mutex::new(Vec::new()),
            conversions: Mutex::new(Vec::new()),
        }
    }

    /// Set the formats reported once the handler is initialized.
    pub fn with_formats(mut self, formats: Vec<FileFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// Make subsequent `init` calls fail (or succeed again).
    pub fn fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    /// Number of times `init` was called.
    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Make conversions from `input_mime` to `output_mime` fail.
    pub fn fail_conversion(&self, input_mime: &str, output_mime: &str) {
        lock(&self.failing).push((input_mime.to_string(), output_mime.to_string()));
    }

    /// Make conversions from `input_mime` to `output_mime` return no files.
    pub fn empty_conversion(&self, input_mime: &str, output_mime: &str) {
        lock(&self.empty).push((input_mime.to_string(), output_mime.to_string()));
    }

    /// Get all recorded conversions.
    pub fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        lock(&self.conversions).clone()
    }

    /// Get the number of conversions performed.
    pub fn conversion_count(&self) -> usize {
        lock(&self.conversions).len()
    }

    fn matches(list: &Mutex<Vec<(String, String)>>, input: &str, output: &str) -> bool {
        lock(list).iter().any(|(i, o)| i == input && o == output)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl FormatHandler for MockHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn init(&self) -> Result<(), HandlerError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(HandlerError::init_failed(&self.name, "mock init failure"));
        }
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn supported_formats(&self) -> Option<Vec<FileFormat>> {
        self.is_ready().then(|| self.formats.clone())
    }

    async fn convert(
        &self,
        inputs: Vec<FileData>,
        input: &FileFormat,
        output: &FileFormat,
    ) -> Result<Vec<FileData>, HandlerError> {
        if !self.is_ready() {
            return Err(HandlerError::NotReady {
                handler: self.name.clone(),
            });
        }

        let fails = Self::matches(&self.failing, &input.mime, &output.mime);
        let empties = Self::matches(&self.empty, &input.mime, &output.mime);

        lock(&self.conversions).push(RecordedConversion {
            input_mime: input.mime.clone(),
            output_mime: output.mime.clone(),
            input_names: inputs.iter().map(|f| f.name.clone()).collect(),
            success: !fails && !empties,
        });

        if fails {
            return Err(HandlerError::conversion_failed(
                format!("mock failure converting {} to {}", input.mime, output.mime),
                None,
            ));
        }
        if empties {
            return Ok(Vec::new());
        }

        Ok(inputs
            .into_iter()
            .map(|file| {
                let name = file.renamed_for(&output.extension);
                let mut bytes = file.bytes;
                bytes.extend_from_slice(output.mime.as_bytes());
                FileData::new(name, bytes)
            })
            .collect())
    }
}
