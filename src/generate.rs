//! `generate` and `list` command implementations.

use crate::{GenerateArgs, OutputFormat, SchemaOpts};
use anyhow::Context;
use base64::{engine::general_purpose, Engine as _};
use protobuf::MessageDyn;
use protofuzz_core::{include_dir, GeneratorConfig, ProtoSchema};
use protofuzz_generator::{encode_sorted, validate_message, ByteSource, MessageGenerator};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Load the schema files, using their parent directories as include paths
/// when none are given.
pub fn load_schema(opts: &SchemaOpts) -> anyhow::Result<ProtoSchema> {
    let includes: Vec<PathBuf> = if opts.includes.is_empty() {
        let mut parents: Vec<PathBuf> = opts.protos.iter().map(|p| include_dir(p)).collect();
        parents.dedup();
        parents
    } else {
        opts.includes.clone()
    };

    ProtoSchema::from_files(&opts.protos, &includes)
        .with_context(|| format!("Failed to load schema from {:?}", opts.protos))
}

/// Render one message in the requested output format, without a newline.
pub fn render(message: &dyn MessageDyn, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(protobuf::text_format::print_to_string(message)),
        OutputFormat::Base64 => {
            let bytes = encode_sorted(message).context("Failed to encode message")?;
            Ok(general_purpose::STANDARD.encode(bytes))
        }
    }
}

pub fn run_generate(args: &GenerateArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let schema = load_schema(&args.schema)?;

    let config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load generator config from {path:?}"))?,
        None => GeneratorConfig::default(),
    };
    let generator = MessageGenerator::from_schema(&schema, &args.message, config)
        .with_context(|| format!("Failed to create generator for '{}'", args.message))?;

    info!(
        message = generator.descriptor().full_name(),
        count = args.count,
        "Generating messages"
    );

    let mut emit = |index: u64, message: Box<dyn MessageDyn>| -> anyhow::Result<()> {
        if args.verify {
            validate_message(&*message)
                .with_context(|| format!("Instance {index} failed verification"))?;
        }
        writeln!(out, "{}", render(&*message, args.format)?)?;
        Ok(())
    };

    match &args.input {
        Some(path) => {
            let data =
                std::fs::read(path).with_context(|| format!("Failed to read input {path:?}"))?;
            let mut source = ByteSource::new(&data, generator.limits());
            for index in 0..args.count {
                let message = generator
                    .generate(&mut source)
                    .with_context(|| format!("Failed to generate instance {index}"))?;
                emit(index, message)?;
            }
        }
        None => {
            for (index, message) in generator.instances(args.seed, args.count).enumerate() {
                let message =
                    message.with_context(|| format!("Failed to generate instance {index}"))?;
                emit(index as u64, message)?;
            }
        }
    }

    info!(count = args.count, "Done");
    Ok(())
}

pub fn run_list(opts: &SchemaOpts, out: &mut dyn Write) -> anyhow::Result<()> {
    let schema = load_schema(opts)?;
    for name in schema.list_messages() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}
