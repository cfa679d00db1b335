#![no_main]

use libfuzzer_sys::fuzz_target;
use protofuzz_core::{GeneratorConfig, ProtoSchema};
use protofuzz_generator::{validate_message, MessageGenerator};
use std::sync::OnceLock;

const TEST_PROTO: &str = include_str!("../../protos/test/v1/test.proto");

fn generator() -> &'static MessageGenerator {
    static GENERATOR: OnceLock<MessageGenerator> = OnceLock::new();
    GENERATOR.get_or_init(|| {
        let schema = ProtoSchema::from_string(TEST_PROTO).expect("test.proto parses");
        let descriptor = schema.get_message("test.v1.All").expect("test.v1.All exists");
        MessageGenerator::new(descriptor, GeneratorConfig::default()).expect("default config")
    })
}

// Any input must yield a message that encodes, decodes and still satisfies
// the well-known type constraints.
fuzz_target!(|data: &[u8]| {
    let generator = generator();
    let Ok(message) = generator.generate_from_bytes(data) else {
        return;
    };

    if let Err(e) = validate_message(&*message) {
        panic!("generated message is invalid: {e}");
    }

    let bytes = message.write_to_bytes_dyn().expect("generated message encodes");
    let parsed = generator
        .descriptor()
        .parse_from_bytes(&bytes)
        .expect("encoded message decodes");
    if let Err(e) = validate_message(&*parsed) {
        panic!("decoded message is invalid: {e}");
    }
});
