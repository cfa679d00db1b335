//! Runtime `.proto` schema loading.
//!
//! Sources are parsed with the pure-Rust `protobuf-parse` parser and linked
//! into dynamic [`FileDescriptor`]s. Imports of `google/protobuf/*.proto`
//! resolve to the descriptors compiled into the `protobuf` crate, so fields of
//! well-known types carry the same descriptors as the generated Rust types.

use protobuf::reflect::{FileDescriptor, MessageDescriptor};
use protobuf_parse::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading or staging a schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reported by the `.proto` parser
    #[error("Protobuf parse error: {0}")]
    ProtobufParse(String),

    /// Error linking parsed files into descriptors
    #[error("Failed to build descriptors: {0}")]
    Descriptor(#[from] protobuf::Error),

    /// Message not present in the schema
    #[error("Message type not found: {0}")]
    MessageTypeNotFound(String),

    /// A short name matched more than one message
    #[error("Ambiguous message name '{name}', candidates: {candidates:?}")]
    AmbiguousMessage {
        name: String,
        candidates: Vec<String>,
    },
}

/// Descriptors of the files shipped with the `protobuf` crate.
///
/// These are passed as dependencies when linking user schemas instead of
/// building dynamic copies of them.
pub fn builtin_file_descriptors() -> Vec<FileDescriptor> {
    use protobuf::well_known_types as wkt;

    vec![
        protobuf::descriptor::file_descriptor().clone(),
        wkt::any::file_descriptor().clone(),
        wkt::api::file_descriptor().clone(),
        wkt::duration::file_descriptor().clone(),
        wkt::empty::file_descriptor().clone(),
        wkt::field_mask::file_descriptor().clone(),
        wkt::source_context::file_descriptor().clone(),
        wkt::struct_::file_descriptor().clone(),
        wkt::timestamp::file_descriptor().clone(),
        wkt::type_::file_descriptor().clone(),
        wkt::wrappers::file_descriptor().clone(),
    ]
}

/// A set of linked protobuf files, indexed by message name.
#[derive(Debug, Clone)]
pub struct ProtoSchema {
    /// Full message name (without leading dot) to descriptor
    messages: HashMap<String, MessageDescriptor>,
}

impl ProtoSchema {
    /// Parse a .proto file, using its parent directory as include path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let p = path.as_ref();
        let includes = vec![include_dir(p)];
        Self::from_files(&[p.to_path_buf()], &includes)
    }

    /// Parse several .proto files with explicit include directories.
    pub fn from_files(inputs: &[PathBuf], includes: &[PathBuf]) -> Result<Self, SchemaError> {
        let mut parser = Parser::new();
        parser.pure();
        for include in includes {
            parser.include(include);
        }
        for input in inputs {
            parser.input(input);
        }

        let parsed = parser
            .parse_and_typecheck()
            .map_err(|e| SchemaError::ProtobufParse(e.to_string()))?;

        let builtin = builtin_file_descriptors();
        let protos = parsed
            .file_descriptors
            .into_iter()
            .filter(|proto| !builtin.iter().any(|b| b.proto().name() == proto.name()))
            .collect();

        let files = FileDescriptor::new_dynamic_fds(protos, &builtin)?;
        Ok(Self::from_descriptors(files))
    }

    /// Parse .proto content from a string.
    pub fn from_string(content: &str) -> Result<Self, SchemaError> {
        use std::io::Write;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("schema.proto");
        let mut file = std::fs::File::create(&path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Self::from_file(&path)
    }

    /// Wrap already-built descriptors, e.g. those of generated code.
    pub fn from_descriptors(files: Vec<FileDescriptor>) -> Self {
        let mut messages = HashMap::new();
        for file in &files {
            for message in file.messages() {
                index_message(&mut messages, message);
            }
        }
        tracing::debug!(
            files = files.len(),
            messages = messages.len(),
            "Indexed protobuf schema"
        );
        Self { messages }
    }

    /// Get a message descriptor by name.
    ///
    /// Accepts a full name (`pkg.Outer.Inner`, optionally with a leading dot)
    /// or a short name when it is unique within the schema.
    pub fn get_message(&self, name: &str) -> Result<MessageDescriptor, SchemaError> {
        let name = name.trim_start_matches('.');
        if let Some(descriptor) = self.messages.get(name) {
            return Ok(descriptor.clone());
        }

        let suffix = format!(".{name}");
        let mut candidates: Vec<&String> = self
            .messages
            .keys()
            .filter(|full| full.ends_with(&suffix))
            .collect();
        candidates.sort();

        match candidates.as_slice() {
            [] => Err(SchemaError::MessageTypeNotFound(name.to_string())),
            [only] => Ok(self.messages[*only].clone()),
            many => Err(SchemaError::AmbiguousMessage {
                name: name.to_string(),
                candidates: many.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    /// List the full names of all message types, sorted.
    pub fn list_messages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.messages.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Directory containing `path`, `.` for a bare file name.
pub fn include_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn index_message(messages: &mut HashMap<String, MessageDescriptor>, message: MessageDescriptor) {
    for nested in message.nested_messages() {
        if !nested.is_map_entry() {
            index_message(messages, nested);
        }
    }
    messages.insert(message.full_name().to_string(), message);
}
