#![no_main]

use callgate::{ArgFingerprint, FunctionSelector, PackedCall};
use libfuzzer_sys::fuzz_target;

const MAX_ARGS: usize = 256;

fuzz_target!(|data: &[u8]| {
    let args = decode_args(data);

    let packed = PackedCall::pack(FunctionSelector::new("fuzz"), &args);
    assert!(
        packed.words.len() <= args.len(),
        "packing never grows the body"
    );
    if let Some(last) = packed.words.last() {
        assert_ne!(*last, 0, "trimmed body never ends in a zero word");
    }
    assert_eq!(packed.unpack(), args, "packing must be lossless");

    let fp = ArgFingerprint::compute(&args);
    assert_eq!(fp, ArgFingerprint::compute(&args), "fingerprint is deterministic");

    let mut padded = args.clone();
    padded.push(0);
    assert_ne!(
        fp,
        ArgFingerprint::compute(&padded),
        "length is part of the fingerprint"
    );
});

fn decode_args(data: &[u8]) -> Vec<u64> {
    data.chunks(8)
        .take(MAX_ARGS)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            u64::from_le_bytes(bytes)
        })
        .collect()
}
