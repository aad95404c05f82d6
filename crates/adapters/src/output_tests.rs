// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn buffer_accumulates_in_order() {
    let (callback, buffer) = buffer_chunks();
    callback(OutputChunk {
        source: ChunkSource::Stdout,
        data: b"one ".to_vec(),
    });
    callback(OutputChunk {
        source: ChunkSource::Stderr,
        data: b"two".to_vec(),
    });
    assert_eq!(&*buffer.lock(), b"one two");
}

#[test]
fn exec_output_text_is_lossy() {
    let output = ExecOutput {
        output: vec![b'h', b'i', 0xFF],
        exit_code: 0,
    };
    assert!(output.success());
    assert!(output.text().starts_with("hi"));
}
