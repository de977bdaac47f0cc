use serde::Serialize;
use std::path::PathBuf;

/// What the caller wants reconstructed. Every field is forwarded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub data_file: PathBuf,
    pub process_file: PathBuf,
    pub output_path: PathBuf,
    /// Passed through to the reconstruction module, unparsed.
    pub extra_options: Vec<String>,
}

#[derive(Default)]
pub struct JobRequestBuilder {
    data_file: PathBuf,
    process_file: PathBuf,
    output_path: PathBuf,
    extra_options: Vec<String>,
}

impl JobRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_file(mut self, data_file: impl Into<PathBuf>) -> Self {
        self.data_file = data_file.into();
        self
    }

    pub fn process_file(mut self, process_file: impl Into<PathBuf>) -> Self {
        self.process_file = process_file.into();
        self
    }

    pub fn output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn extra_option(mut self, option: impl Into<String>) -> Self {
        self.extra_options.push(option.into());
        self
    }

    pub fn extra_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_options.extend(options.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> JobRequest {
        JobRequest {
            data_file: self.data_file,
            process_file: self.process_file,
            output_path: self.output_path,
            extra_options: self.extra_options,
        }
    }
}
