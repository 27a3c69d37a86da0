// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=proto/kinetic.proto");
    prost_build::compile_protos(&["proto/kinetic.proto"], &["proto/"])
}
